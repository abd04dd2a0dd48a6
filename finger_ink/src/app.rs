//! Top-level application state machine.
//!
//! `AppState` owns the [`GestureTracker`] and the [`SessionState`] (and with
//! it the physics world).  Each frame it applies every detection that arrived
//! since the last one, in order, commits whatever paths finished, and steps
//! the simulation once.  UI commands
//! arrive separately as [`UiCommand`]s.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ink_physics::{PhysicsWorld, RapierWorld};

use crate::canvas::{Canvas, VideoFrame};
use crate::clock::{FrameClock, FrameTick};
use crate::config::AppConfig;
use crate::detector::{Detection, DetectionGate, DetectorFeed, SimulatedHand, SubprocessDetector};
use crate::error::Result;
use crate::gesture::{GestureTracker, TrackerSettings};
use crate::renderer::FrameRenderer;
use crate::session::SessionState;
use crate::stroke::StrokeBuilder;
use crate::visualizer::Visualizer;

/// How long a notice stays on screen.
const MESSAGE_MS: f64 = 2000.0;

// ════════════════════════════════════════════════════════════════════════════
// UiCommand
// ════════════════════════════════════════════════════════════════════════════

/// A user action from the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    ToggleGravity,
    ToggleWiggle,
    Clear,
    Thinner,
    Thicker,
    NextColor,
    /// Save the next composited frame as a PNG.
    Export,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState<W: PhysicsWorld> {
    tracker:    GestureTracker,
    session:    SessionState<W>,
    gate:       DetectionGate,

    palette:    Vec<u32>,
    export_dir: PathBuf,
    export_requested: bool,

    now_ms:     f64,
    message:    Option<(String, f64)>,
}

impl<W: PhysicsWorld> AppState<W> {
    pub fn new(cfg: &AppConfig, world: W) -> Self {
        let tracker = GestureTracker::new(TrackerSettings {
            canvas_width:    cfg.canvas.width as f32,
            canvas_height:   cfg.canvas.height as f32,
            extension_ratio: cfg.tracker.extension_ratio,
            min_move_px:     cfg.tracker.min_move_px,
        });
        let session = SessionState::new(cfg.session.clone(), StrokeBuilder::from(&cfg.ink), world);

        AppState {
            tracker,
            session,
            gate:             DetectionGate::default(),
            palette:          cfg.ink.palette.iter().map(|c| c.0).collect(),
            export_dir:       cfg.export.dir.clone(),
            export_requested: false,
            now_ms:           0.0,
            message:          None,
        }
    }

    // ── per-frame logic ──────────────────────────────────────────────────

    /// One frame: apply `detections` oldest first (each only if newer than
    /// the last one applied), then advance the physics once.  Returns the
    /// number of strokes committed.
    pub fn frame(&mut self, tick: FrameTick, detections: &[Detection]) -> usize {
        self.now_ms = tick.time_ms;
        let committed = detections.iter().map(|d| self.apply_detection(d)).sum();
        self.session.step(tick.dt);
        committed
    }

    pub fn apply_detection(&mut self, detection: &Detection) -> usize {
        if !self.gate.admit(detection.timestamp_ms) {
            tracing::trace!(ts = detection.timestamp_ms, "stale detection skipped");
            return 0;
        }
        let mut committed = 0;
        for path in self.tracker.update(detection.hand.as_ref()) {
            if self.session.commit_path(&path.points).is_some() {
                committed += 1;
            }
        }
        committed
    }

    // ── UI commands ──────────────────────────────────────────────────────

    /// Returns `false` when the application should quit.
    pub fn handle_command(&mut self, cmd: UiCommand) -> bool {
        match cmd {
            UiCommand::ToggleGravity => {
                let on = self.session.toggle_gravity();
                self.notify(if on { "GRAVITY ON" } else { "GRAVITY OFF" });
            }
            UiCommand::ToggleWiggle => {
                let on = self.session.toggle_wiggle();
                self.notify(if on { "WIGGLE ON" } else { "WIGGLE OFF" });
            }
            UiCommand::Clear => {
                self.tracker.reset();
                let n = self.session.clear();
                self.notify(format!("CLEARED {n}"));
            }
            UiCommand::Thinner | UiCommand::Thicker => {
                let current = self.session.config().thickness;
                let next = if cmd == UiCommand::Thinner { current.thinner() } else { current.thicker() };
                self.session.set_thickness(next);
                self.notify(next.name().to_ascii_uppercase());
            }
            UiCommand::NextColor => {
                let current = self.session.config().color();
                let next = match self.palette.iter().position(|&c| c == current) {
                    Some(i) => self.palette[(i + 1) % self.palette.len()],
                    None    => self.palette.first().copied().unwrap_or(current),
                };
                self.session.set_color(next);
                self.notify(ink_geom::color::to_hex(next));
            }
            UiCommand::Export => {
                self.export_requested = true;
            }
            UiCommand::Quit => {
                tracing::info!("quit requested");
                return false;
            }
        }
        true
    }

    /// `true` once per [`UiCommand::Export`].
    pub fn take_export_request(&mut self) -> bool {
        std::mem::take(&mut self.export_requested)
    }

    pub fn export_path(&self, stamp_ms: u128) -> PathBuf {
        self.export_dir.join(format!("finger_ink_{stamp_ms}.png"))
    }

    // ── notices ──────────────────────────────────────────────────────────

    pub fn notify(&mut self, text: impl Into<String>) {
        self.message = Some((text.into(), self.now_ms + MESSAGE_MS));
    }

    pub fn message(&self) -> Option<&str> {
        match &self.message {
            Some((text, until)) if self.now_ms < *until => Some(text.as_str()),
            _ => None,
        }
    }

    // ── accessors for the render loop ────────────────────────────────────

    pub fn tracker(&self) -> &GestureTracker   { &self.tracker }
    pub fn session(&self) -> &SessionState<W>  { &self.session }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Opens the window, starts the landmark source (the configured detector
/// command, or the mouse-driven simulated hand), and drives the
/// input/update/render loop at ~60 fps.
pub fn run(cfg: AppConfig) -> Result<()> {
    cfg.validate()?;
    let (width, height) = (cfg.canvas.width, cfg.canvas.height);

    // ── Physics ──────────────────────────────────────────────────────────
    let world = if cfg.physics.bounds {
        RapierWorld::with_bounds(cfg.physics.gravity_px_s2, width as f32, height as f32)
    } else {
        RapierWorld::new(cfg.physics.gravity_px_s2)
    };
    let mut app = AppState::new(&cfg, world);

    // ── Landmark source ──────────────────────────────────────────────────
    // The process handle stays alive for the whole loop; dropping it kills
    // the detector.
    let (mut detector, mut feed) = if cfg.detector.command.is_empty() {
        tracing::info!("no detector configured; mouse button draws, hold 2/3/4 for more fingers");
        (None, None)
    } else {
        let (process, rx) = SubprocessDetector::new(&cfg.detector.command)?.start()?;
        (Some(process), Some(DetectorFeed::new(rx)))
    };
    let sim = SimulatedHand::new(width as f32, height as f32, cfg.tracker.extension_ratio);

    // ── Backdrop ─────────────────────────────────────────────────────────
    let backdrop = cfg.canvas.backdrop.as_deref().and_then(|path| match VideoFrame::open(path) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "backdrop unavailable; using solid color");
            None
        }
    });

    // ── Window + render state ────────────────────────────────────────────
    let mut vis      = Visualizer::new(width, height)?;
    let renderer     = FrameRenderer::from_config(&cfg.canvas);
    let mut canvas   = Canvas::new(width, height);
    let mut clock    = FrameClock::new(cfg.physics.max_step_s);

    tracing::info!(width, height, "finger ink running");

    // ── Main loop ────────────────────────────────────────────────────────
    while vis.is_open() {
        let tick = clock.tick();

        // 1. Window input
        if !vis.poll_commands().into_iter().all(|cmd| app.handle_command(cmd)) {
            break;
        }

        // 2. Detection → gesture → strokes, then physics
        let detections = match feed.as_mut() {
            Some(feed) => feed.poll(),
            None       => vec![sim.detect(tick.time_ms, vis.pointer(), vis.held_fingers())],
        };
        app.frame(tick, &detections);

        // 3. Composite
        renderer.render_frame(&mut canvas, tick.time_ms, app.tracker(), app.session(), backdrop.as_ref(), app.message());

        // 4. Export exactly what is about to be shown
        if app.take_export_request() {
            let path = app.export_path(unix_ms());
            match canvas.export_png(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "frame exported");
                    app.notify("SAVED");
                }
                Err(e) => {
                    tracing::error!(error = %e, path = %path.display(), "export failed");
                    app.notify("EXPORT FAILED");
                }
            }
        }

        // 5. Present
        vis.present(&canvas)?;
    }

    if let Some(process) = detector.as_mut() {
        process.shutdown();
    }
    Ok(())
}

fn unix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HexColor, Thickness};
    use approx::assert_relative_eq;
    use ink_geom::Point;

    const W: f32 = 400.0;
    const H: f32 = 300.0;

    fn make_app() -> AppState<RapierWorld> {
        let mut cfg = AppConfig::default();
        cfg.canvas.width = W as usize;
        cfg.canvas.height = H as usize;
        AppState::new(&cfg, RapierWorld::with_bounds(980.0, W, H))
    }

    fn sim() -> SimulatedHand {
        SimulatedHand::new(W, H, 1.5)
    }

    const INDEX: [bool; 4] = [true, false, false, false];
    const NONE: [bool; 4] = [false; 4];

    /// Drive the app with the simulated hand drawing a horizontal line.
    fn draw_line(app: &mut AppState<RapierWorld>, t0: f64, y: f32) -> f64 {
        let mut t = t0;
        for i in 0..10 {
            t += 16.0;
            let d = sim().detect(t, Some(Point::new(50.0 + i as f32 * 20.0, y)), INDEX);
            app.frame(FrameTick::new(t, 0.016), &[d]);
        }
        t += 16.0;
        let committed = app.frame(FrameTick::new(t, 0.016), &[sim().detect(t, Some(Point::new(240.0, y)), NONE)]);
        assert_eq!(committed, 1);
        t
    }

    #[test]
    fn drawing_commits_a_stroke() {
        let mut app = make_app();
        draw_line(&mut app, 0.0, 100.0);
        assert_eq!(app.session().strokes().len(), 1);
        assert_eq!(app.tracker().active_paths().count(), 0);
    }

    #[test]
    fn queued_detections_are_all_applied() {
        use std::sync::mpsc;

        let mut app = make_app();
        let (tx, rx) = mpsc::channel();
        let mut feed = DetectorFeed::new(rx);
        tx.send(sim().detect(1.0, Some(Point::new(50.0, 50.0)), INDEX)).unwrap();
        tx.send(sim().detect(2.0, Some(Point::new(150.0, 50.0)), INDEX)).unwrap();
        tx.send(sim().detect(3.0, Some(Point::new(150.0, 50.0)), NONE)).unwrap();
        tx.send(sim().detect(4.0, Some(Point::new(300.0, 200.0)), INDEX)).unwrap();

        let committed = app.frame(FrameTick::new(16.0, 0.016), &feed.poll());
        assert_eq!(committed, 1);
        assert_eq!(app.session().strokes().len(), 1);
        let (_, live) = app.tracker().active_paths().next().unwrap();
        assert_eq!(live.len(), 1);
        assert_relative_eq!(live[0].x, 300.0, epsilon = 1e-3);
        assert_relative_eq!(live[0].y, 200.0, epsilon = 1e-3);
    }

    #[test]
    fn stale_detections_are_ignored() {
        let mut app = make_app();
        let d = sim().detect(10.0, Some(Point::new(50.0, 50.0)), INDEX);
        app.frame(FrameTick::new(10.0, 0.016), &[d]);
        let moved = sim().detect(10.0, Some(Point::new(150.0, 50.0)), INDEX);
        app.frame(FrameTick::new(26.0, 0.016), &[moved]);
        assert_eq!(app.tracker().active_paths().next().unwrap().1.len(), 1);
    }

    #[test]
    fn pointer_leaving_commits_everything() {
        let mut app = make_app();
        let both = [true, true, false, false];
        app.frame(FrameTick::new(16.0, 0.0), &[sim().detect(16.0, Some(Point::new(100.0, 100.0)), both)]);
        app.frame(FrameTick::new(32.0, 0.0), &[sim().detect(32.0, Some(Point::new(200.0, 120.0)), both)]);
        let n = app.frame(FrameTick::new(48.0, 0.0), &[sim().detect(48.0, None, both)]);
        assert_eq!(n, 2);
    }

    #[test]
    fn gravity_command_drops_strokes_onto_the_floor() {
        let mut app = make_app();
        let mut t = draw_line(&mut app, 0.0, 100.0);
        let stroke = app.session().strokes()[0].clone();
        let before = app.session().stroke_points(&stroke).unwrap();

        assert!(app.handle_command(UiCommand::ToggleGravity));
        for _ in 0..240 {
            t += 16.0;
            app.frame(FrameTick::new(t, 0.016), &[]);
        }
        let after = app.session().stroke_points(&stroke).unwrap();
        assert!(after[0].y > before[0].y + 50.0);
        assert!(after.iter().all(|p| p.y < H + 1.0));
    }

    #[test]
    fn clear_drops_strokes_and_live_paths() {
        let mut app = make_app();
        let t = draw_line(&mut app, 0.0, 100.0);
        app.frame(FrameTick::new(t + 16.0, 0.0), &[sim().detect(t + 16.0, Some(Point::new(10.0, 10.0)), INDEX)]);
        assert_eq!(app.tracker().active_paths().count(), 1);

        app.handle_command(UiCommand::Clear);
        assert!(app.session().strokes().is_empty());
        assert_eq!(app.tracker().active_paths().count(), 0);
        assert_eq!(app.message(), Some("CLEARED 1"));
    }

    #[test]
    fn thickness_commands_step_presets() {
        let mut app = make_app();
        app.handle_command(UiCommand::Thicker);
        assert_eq!(app.session().config().thickness, Thickness::Thick);
        app.handle_command(UiCommand::Thinner);
        app.handle_command(UiCommand::Thinner);
        assert_eq!(app.session().config().thickness, Thickness::Thin);
    }

    #[test]
    fn color_command_cycles_palette() {
        let mut cfg = AppConfig::default();
        cfg.ink.palette = vec![HexColor(0xFF111111), HexColor(0xFF222222)];
        let mut app = AppState::new(&cfg, RapierWorld::new(980.0));
        // Session color is not in the palette: start at the first entry.
        app.handle_command(UiCommand::NextColor);
        assert_eq!(app.session().config().color(), 0xFF111111);
        app.handle_command(UiCommand::NextColor);
        assert_eq!(app.session().config().color(), 0xFF222222);
        app.handle_command(UiCommand::NextColor);
        assert_eq!(app.session().config().color(), 0xFF111111);
    }

    #[test]
    fn export_request_is_taken_once() {
        let mut app = make_app();
        assert!(!app.take_export_request());
        app.handle_command(UiCommand::Export);
        assert!(app.take_export_request());
        assert!(!app.take_export_request());
        assert_eq!(app.export_path(42), PathBuf::from("./finger_ink_42.png"));
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut app = make_app();
        assert!(app.handle_command(UiCommand::ToggleWiggle));
        assert!(!app.handle_command(UiCommand::Quit));
    }

    #[test]
    fn messages_expire() {
        let mut app = make_app();
        app.handle_command(UiCommand::ToggleWiggle);
        assert_eq!(app.message(), Some("WIGGLE ON"));
        app.frame(FrameTick::new(MESSAGE_MS + 1.0, 0.0), &[]);
        assert_eq!(app.message(), None);
    }
}
