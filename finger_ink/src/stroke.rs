//! Finished path → compound rigid body.
//!
//! A path is resampled so its points sit exactly `thickness × 0.4` apart, and
//! every resampled point becomes a circle of radius `thickness / 2`.  The
//! overlap between neighbouring circles is what makes the body read as a
//! continuous line once the physics engine starts moving it.

use ink_geom::{resample, Point};
use ink_physics::{BodyHandle, BodyParams, CirclePart, PhysicsWorld};

use crate::config::InkConfig;

/// Resample spacing as a fraction of stroke thickness.
pub const SPACING_FACTOR: f32 = 0.4;

/// A persisted stroke.  Owns exactly one physics body.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub body:       BodyHandle,
    pub color:      u32,
    pub thickness:  f32,
    /// Number of circle parts; equals the resampled point count.
    pub part_count: usize,
}

/// Material shared by every stroke body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeBuilder {
    pub friction:    f32,
    pub air_damping: f32,
    pub density:     f32,
}

impl Default for StrokeBuilder {
    fn default() -> Self {
        StrokeBuilder { friction: 0.6, air_damping: 0.5, density: 1.0 }
    }
}

impl From<&InkConfig> for StrokeBuilder {
    fn from(ink: &InkConfig) -> Self {
        StrokeBuilder {
            friction:    ink.friction,
            air_damping: ink.air_damping,
            density:     ink.density,
        }
    }
}

impl StrokeBuilder {
    pub fn spacing(thickness: f32) -> f32 {
        thickness * SPACING_FACTOR
    }

    /// Static while gravity is off so fresh ink stays exactly where it was
    /// drawn; dynamic otherwise.
    pub fn body_params(&self, gravity_enabled: bool) -> BodyParams {
        BodyParams {
            is_static:   !gravity_enabled,
            friction:    self.friction,
            air_damping: self.air_damping,
            restitution: 0.0,
            density:     self.density,
        }
    }

    /// The circle parts for `path` at `thickness`.
    pub fn parts(path: &[Point], thickness: f32) -> Vec<CirclePart> {
        let radius = thickness / 2.0;
        resample(path, Self::spacing(thickness))
            .into_iter()
            .map(|center| CirclePart::new(center, radius))
            .collect()
    }

    /// Create the body for a finished path.  The body is *not* added to the
    /// world; that is the session's job.
    ///
    /// Returns `None` for paths shorter than two points and when the engine
    /// rejects the body.
    pub fn build<W: PhysicsWorld + ?Sized>(
        &self,
        world:           &mut W,
        path:            &[Point],
        thickness:       f32,
        color:           u32,
        gravity_enabled: bool,
    ) -> Option<Stroke> {
        if path.len() < 2 {
            tracing::debug!(points = path.len(), "discarding short path");
            return None;
        }

        let parts = Self::parts(path, thickness);
        match world.create_compound_body(&parts, &self.body_params(gravity_enabled)) {
            Ok(body) => {
                tracing::debug!(%body, parts = parts.len(), thickness, "stroke body created");
                Some(Stroke { body, color, thickness, part_count: parts.len() })
            }
            Err(e) => {
                tracing::warn!(error = %e, "physics engine rejected stroke body");
                None
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ink_physics::RapierWorld;

    #[test]
    fn ten_pixel_line_at_thickness_ten() {
        let parts = StrokeBuilder::parts(&[Point::new(0.0, 0.0), Point::new(10.0, 0.0)], 10.0);
        assert_eq!(parts.len(), 3);
        for (part, x) in parts.iter().zip([0.0, 4.0, 8.0]) {
            assert_relative_eq!(part.center.x, x, epsilon = 1e-4);
            assert_eq!(part.radius, 5.0);
        }
    }

    #[test]
    fn build_creates_static_body_when_gravity_off() {
        let mut world = RapierWorld::new(980.0);
        let stroke = StrokeBuilder::default()
            .build(&mut world, &[Point::new(0.0, 0.0), Point::new(10.0, 0.0)], 10.0, 0xFFFF0000, false)
            .unwrap();
        assert_eq!(stroke.part_count, 3);
        assert_eq!(stroke.color, 0xFFFF0000);
        assert_eq!(world.is_static(stroke.body), Some(true));
        assert!(!world.is_in_world(stroke.body));
        assert_eq!(world.part_positions(stroke.body).unwrap().len(), 3);
    }

    #[test]
    fn build_creates_dynamic_body_when_gravity_on() {
        let mut world = RapierWorld::new(980.0);
        let stroke = StrokeBuilder::default()
            .build(&mut world, &[Point::new(0.0, 0.0), Point::new(0.0, 40.0)], 6.0, 0xFFFFFFFF, true)
            .unwrap();
        assert_eq!(world.is_static(stroke.body), Some(false));
    }

    #[test]
    fn short_paths_create_nothing() {
        let mut world = RapierWorld::new(980.0);
        let b = StrokeBuilder::default();
        assert!(b.build(&mut world, &[], 10.0, 0, false).is_none());
        assert!(b.build(&mut world, &[Point::new(5.0, 5.0)], 10.0, 0, false).is_none());
        assert_eq!(world.live_body_count(), 0);
    }

    #[test]
    fn engine_rejection_yields_none() {
        let mut world = RapierWorld::new(980.0);
        let path = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert!(StrokeBuilder::default().build(&mut world, &path, 0.0, 0, false).is_none());
    }

    #[test]
    fn material_comes_from_config() {
        let ink = InkConfig { friction: 0.9, air_damping: 2.0, density: 3.0, ..InkConfig::default() };
        let params = StrokeBuilder::from(&ink).body_params(true);
        assert_eq!(params.friction, 0.9);
        assert_eq!(params.air_damping, 2.0);
        assert_eq!(params.density, 3.0);
        assert_eq!(params.restitution, 0.0);
        assert!(!params.is_static);
    }
}
