//! Fingertip tracking: raw hand landmarks in, finished paths out.
//!
//! Each call to [`GestureTracker::update`] consumes one detection result.
//! Every finger that is extended contributes a point to its in-progress path;
//! a finger that curls back (or a hand that leaves the frame) hands its path
//! back to the caller as a [`FinalizedPath`].  Nothing else happens here: the
//! tracker does not touch physics or the session.

use ink_geom::{distance, Point};

// ════════════════════════════════════════════════════════════════════════════
// Landmarks
// ════════════════════════════════════════════════════════════════════════════

/// Indices into the 21-point hand model the detector reports.
pub mod landmark {
    pub const WRIST:      usize = 0;
    pub const THUMB_TIP:  usize = 4;
    pub const INDEX_MCP:  usize = 5;
    pub const INDEX_TIP:  usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP:   usize = 13;
    pub const RING_TIP:   usize = 16;
    pub const PINKY_MCP:  usize = 17;
    pub const PINKY_TIP:  usize = 20;

    pub const COUNT: usize = 21;
}

/// One detected hand: 21 points, normalized to `[0, 1]` in camera space
/// (not mirrored).
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    points: [Point; landmark::COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Point; landmark::COUNT]) -> Self {
        HandLandmarks { points }
    }

    /// `None` unless `points` holds exactly 21 entries.
    pub fn from_slice(points: &[Point]) -> Option<Self> {
        let points: [Point; landmark::COUNT] = points.try_into().ok()?;
        Some(HandLandmarks { points })
    }

    pub fn point(&self, index: usize) -> Point { self.points[index] }
    pub fn points(&self) -> &[Point]           { &self.points }
    pub fn wrist(&self) -> Point               { self.points[landmark::WRIST] }
    pub fn tip(&self, finger: Finger) -> Point { self.points[finger.tip_landmark()] }
    pub fn mcp(&self, finger: Finger) -> Point { self.points[finger.mcp_landmark()] }

    pub fn is_extended(&self, finger: Finger, ratio: f32) -> bool {
        is_extended(self.tip(finger), self.mcp(finger), self.wrist(), ratio)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// Position in [`Finger::ALL`]; used to index per-finger arrays.
    pub fn slot(self) -> usize {
        match self {
            Finger::Index  => 0,
            Finger::Middle => 1,
            Finger::Ring   => 2,
            Finger::Pinky  => 3,
        }
    }

    pub fn tip_landmark(self) -> usize {
        match self {
            Finger::Index  => landmark::INDEX_TIP,
            Finger::Middle => landmark::MIDDLE_TIP,
            Finger::Ring   => landmark::RING_TIP,
            Finger::Pinky  => landmark::PINKY_TIP,
        }
    }

    pub fn mcp_landmark(self) -> usize {
        match self {
            Finger::Index  => landmark::INDEX_MCP,
            Finger::Middle => landmark::MIDDLE_MCP,
            Finger::Ring   => landmark::RING_MCP,
            Finger::Pinky  => landmark::PINKY_MCP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Finger::Index  => "index",
            Finger::Middle => "middle",
            Finger::Ring   => "ring",
            Finger::Pinky  => "pinky",
        }
    }
}

/// A finger is extended when its tip is more than `ratio` times as far from
/// the wrist as its knuckle is.
pub fn is_extended(tip: Point, mcp: Point, wrist: Point, ratio: f32) -> bool {
    distance(tip, wrist) > ratio * distance(mcp, wrist)
}

// ════════════════════════════════════════════════════════════════════════════
// GestureTracker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerSettings {
    pub canvas_width:    f32,
    pub canvas_height:   f32,
    pub extension_ratio: f32,
    pub min_move_px:     f32,
}

impl TrackerSettings {
    pub fn new(canvas_width: f32, canvas_height: f32) -> Self {
        TrackerSettings { canvas_width, canvas_height, extension_ratio: 1.5, min_move_px: 2.0 }
    }
}

/// A path whose finger stopped drawing.  Ownership moves to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalizedPath {
    pub finger: Finger,
    pub points: Vec<Point>,
}

pub struct GestureTracker {
    settings: TrackerSettings,
    /// In-progress path per finger, indexed by [`Finger::slot`].  `Some` while
    /// the finger is extended.
    active:   [Option<Vec<Point>>; 4],
}

impl GestureTracker {
    pub fn new(settings: TrackerSettings) -> Self {
        GestureTracker { settings, active: Default::default() }
    }

    pub fn settings(&self) -> &TrackerSettings { &self.settings }

    /// Normalized camera coordinates → mirrored canvas pixels.
    pub fn to_canvas(&self, p: Point) -> Point {
        Point::new(
            (1.0 - p.x) * self.settings.canvas_width,
            p.y * self.settings.canvas_height,
        )
    }

    /// Consume one detection result.  Returns the paths that ended this frame.
    pub fn update(&mut self, hand: Option<&HandLandmarks>) -> Vec<FinalizedPath> {
        let Some(hand) = hand else {
            return self.finalize_all();
        };

        let mut finished = Vec::new();
        for finger in Finger::ALL {
            let extended = hand.is_extended(finger, self.settings.extension_ratio);
            let tip      = self.to_canvas(hand.tip(finger));
            let min_move = self.settings.min_move_px;
            let slot     = &mut self.active[finger.slot()];

            if extended {
                match slot {
                    Some(path) => {
                        let moved = path.last().map_or(true, |&last| distance(last, tip) > min_move);
                        if moved {
                            path.push(tip);
                        }
                    }
                    None => {
                        tracing::trace!(finger = finger.name(), x = tip.x, y = tip.y, "path started");
                        *slot = Some(vec![tip]);
                    }
                }
            } else if let Some(points) = slot.take() {
                tracing::trace!(finger = finger.name(), points = points.len(), "path finished");
                finished.push(FinalizedPath { finger, points });
            }
        }
        finished
    }

    /// In-progress paths, in finger order.
    pub fn active_paths(&self) -> impl Iterator<Item = (Finger, &[Point])> + '_ {
        Finger::ALL
            .into_iter()
            .filter_map(|f| self.active[f.slot()].as_deref().map(|p| (f, p)))
    }

    pub fn is_drawing(&self, finger: Finger) -> bool {
        self.active[finger.slot()].is_some()
    }

    /// Drop every in-progress path without emitting it.
    pub fn reset(&mut self) {
        self.active = Default::default();
    }

    fn finalize_all(&mut self) -> Vec<FinalizedPath> {
        Finger::ALL
            .into_iter()
            .filter_map(|finger| {
                self.active[finger.slot()]
                    .take()
                    .map(|points| FinalizedPath { finger, points })
            })
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A hand with the wrist at (0.5, 0.9), knuckles 0.2 above it and each
    /// fingertip either 0.4 (extended) or 0.25 (curled) above the wrist.
    /// `shift` slides the whole hand horizontally.
    pub(crate) fn hand(extended: [bool; 4], shift: f32) -> HandLandmarks {
        let wrist = Point::new(0.5 + shift, 0.9);
        let mut pts = [wrist; landmark::COUNT];
        for finger in Finger::ALL {
            let dx = (finger.slot() as f32 - 1.5) * 0.04;
            let reach = if extended[finger.slot()] { 0.4 } else { 0.25 };
            pts[finger.mcp_landmark()] = wrist + Point::new(dx, -0.2);
            pts[finger.tip_landmark()] = wrist + Point::new(dx, -reach);
        }
        HandLandmarks::new(pts)
    }

    fn tracker() -> GestureTracker {
        GestureTracker::new(TrackerSettings::new(1000.0, 500.0))
    }

    const INDEX_ONLY: [bool; 4] = [true, false, false, false];
    const NONE: [bool; 4] = [false; 4];

    #[test]
    fn extension_test_is_ratio_of_distances() {
        let wrist = Point::new(0.0, 0.0);
        let mcp   = Point::new(0.0, 1.0);
        assert!(is_extended(Point::new(0.0, 1.6), mcp, wrist, 1.5));
        assert!(!is_extended(Point::new(0.0, 1.5), mcp, wrist, 1.5));
        assert!(!is_extended(Point::new(0.0, 0.5), mcp, wrist, 1.5));
    }

    #[test]
    fn from_slice_needs_21_points() {
        assert!(HandLandmarks::from_slice(&[Point::ZERO; 20]).is_none());
        assert!(HandLandmarks::from_slice(&[Point::ZERO; 21]).is_some());
    }

    #[test]
    fn canvas_mapping_is_mirrored() {
        let t = tracker();
        let p = t.to_canvas(Point::new(0.25, 0.5));
        assert_relative_eq!(p.x, 750.0);
        assert_relative_eq!(p.y, 250.0);
    }

    #[test]
    fn first_point_always_recorded() {
        let mut t = tracker();
        assert!(t.update(Some(&hand(INDEX_ONLY, 0.0))).is_empty());
        let (finger, path) = t.active_paths().next().unwrap();
        assert_eq!(finger, Finger::Index);
        assert_eq!(path.len(), 1);
        assert!(!t.is_drawing(Finger::Middle));
    }

    #[test]
    fn small_moves_are_ignored() {
        let mut t = tracker();
        t.update(Some(&hand(INDEX_ONLY, 0.0)));
        // 0.001 normalized = 1 px on a 1000 px canvas, under the 2 px minimum.
        t.update(Some(&hand(INDEX_ONLY, 0.001)));
        assert_eq!(t.active_paths().next().unwrap().1.len(), 1);
        t.update(Some(&hand(INDEX_ONLY, 0.01)));
        assert_eq!(t.active_paths().next().unwrap().1.len(), 2);
    }

    #[test]
    fn retraction_finalizes_one_finger() {
        let mut t = tracker();
        t.update(Some(&hand([true, true, false, false], 0.0)));
        t.update(Some(&hand([true, true, false, false], 0.05)));
        let done = t.update(Some(&hand(INDEX_ONLY, 0.1)));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].finger, Finger::Middle);
        assert_eq!(done[0].points.len(), 2);
        assert!(t.is_drawing(Finger::Index));
        assert!(!t.is_drawing(Finger::Middle));
    }

    #[test]
    fn single_point_path_is_still_emitted() {
        let mut t = tracker();
        t.update(Some(&hand(INDEX_ONLY, 0.0)));
        let done = t.update(Some(&hand(NONE, 0.0)));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].points.len(), 1);
    }

    #[test]
    fn hand_loss_finalizes_everything_at_once() {
        let mut t = tracker();
        t.update(Some(&hand([true, false, true, false], 0.0)));
        t.update(Some(&hand([true, false, true, false], 0.05)));
        let done = t.update(None);
        assert_eq!(done.len(), 2);
        assert_eq!(done[0].finger, Finger::Index);
        assert_eq!(done[1].finger, Finger::Ring);
        assert_eq!(t.active_paths().count(), 0);
        assert!(t.update(None).is_empty());
    }

    #[test]
    fn reextension_starts_a_fresh_path() {
        let mut t = tracker();
        t.update(Some(&hand(INDEX_ONLY, 0.0)));
        t.update(Some(&hand(INDEX_ONLY, 0.05)));
        t.update(Some(&hand(NONE, 0.05)));
        t.update(Some(&hand(INDEX_ONLY, 0.1)));
        assert_eq!(t.active_paths().next().unwrap().1.len(), 1);
    }

    #[test]
    fn reset_drops_without_emitting() {
        let mut t = tracker();
        t.update(Some(&hand([true; 4], 0.0)));
        t.reset();
        assert_eq!(t.active_paths().count(), 0);
        assert!(t.update(None).is_empty());
    }
}
