//! Per-frame compositor.
//!
//! Layers, bottom to top:
//!
//! ```text
//!   backdrop     mirrored video frame (cover-scaled) or solid color
//!   strokes      settled ink, read back from the physics bodies
//!   live ink     in-progress paths, one per extended finger
//!   sparks       one at the (displaced) tip of each live path, over all ink
//!   HUD          status line + key legend
//! ```
//!
//! With wiggle on, every ink point is pushed by a small time-varying offset
//! computed from scratch each frame; nothing about the distortion is stored.

use ink_geom::{color, Point};
use ink_physics::PhysicsWorld;

use crate::canvas::{text_width, Canvas, VideoFrame, GLYPH_HEIGHT};
use crate::config::{CanvasConfig, SessionConfig};
use crate::gesture::GestureTracker;
use crate::session::SessionState;
use crate::spark::SparkEffect;

// ════════════════════════════════════════════════════════════════════════════
// Wiggle
// ════════════════════════════════════════════════════════════════════════════

/// Peak displacement in pixels.
pub const WIGGLE_AMPLITUDE: f32 = 2.5;
/// Radians per millisecond.
pub const WIGGLE_SPEED: f32 = 0.006;
/// Radians per pixel of the other coordinate.
pub const WIGGLE_FREQUENCY: f32 = 0.045;

/// Displace `p` by `(sin(t·k + y·f)·a, cos(t·k + x·f)·a)`.
pub fn wiggle(p: Point, time_ms: f64) -> Point {
    let phase = (time_ms % 1_000_000.0) as f32 * WIGGLE_SPEED;
    Point::new(
        p.x + (phase + p.y * WIGGLE_FREQUENCY).sin() * WIGGLE_AMPLITUDE,
        p.y + (phase + p.x * WIGGLE_FREQUENCY).cos() * WIGGLE_AMPLITUDE,
    )
}

/// Spark diameter for a stroke of the given thickness.
pub fn spark_size(thickness: f32) -> f32 {
    (thickness * 1.8).max(14.0)
}

// ════════════════════════════════════════════════════════════════════════════
// HUD text
// ════════════════════════════════════════════════════════════════════════════

const HUD_SCALE:  i32 = 2;
const HUD_MARGIN: i32 = 10;
const HUD_TEXT:   u32 = 0xFFE8E8F0;
const HUD_DIM:    u32 = 0xFF9090A8;
const HUD_BG:     u32 = 0xFF000000;

const LEGEND: &str = "G GRAVITY  W WIGGLE  C CLEAR  [ ] SIZE  TAB COLOR  P SAVE  Q QUIT";

/// `"MEDIUM  #ff3366  GRAVITY ON  WIGGLE OFF  STROKES 3"`
pub fn status_line(config: &SessionConfig, stroke_count: usize) -> String {
    let on_off = |b: bool| if b { "ON" } else { "OFF" };
    format!(
        "{}  {}  GRAVITY {}  WIGGLE {}  STROKES {}",
        config.thickness.name().to_ascii_uppercase(),
        color::to_hex(config.color()),
        on_off(config.gravity),
        on_off(config.wiggle),
        stroke_count,
    )
}

// ════════════════════════════════════════════════════════════════════════════
// FrameRenderer
// ════════════════════════════════════════════════════════════════════════════

pub struct FrameRenderer {
    background: u32,
    hud:        bool,
}

impl FrameRenderer {
    pub fn new(background: u32, hud: bool) -> Self {
        FrameRenderer { background, hud }
    }

    pub fn from_config(cfg: &CanvasConfig) -> Self {
        Self::new(cfg.background.0, cfg.hud)
    }

    /// Composite one frame.  `message` is an optional transient notice shown
    /// above the status line.
    pub fn render_frame<W: PhysicsWorld>(
        &self,
        canvas:  &mut Canvas,
        time_ms: f64,
        tracker: &GestureTracker,
        session: &SessionState<W>,
        video:   Option<&VideoFrame>,
        message: Option<&str>,
    ) {
        match video {
            Some(frame) => canvas.draw_video_mirrored(frame),
            None        => canvas.clear(self.background),
        }

        let config = session.config();
        let shake = |pts: Vec<Point>| -> Vec<Point> {
            if config.wiggle {
                pts.into_iter().map(|p| wiggle(p, time_ms)).collect()
            } else {
                pts
            }
        };

        for stroke in session.strokes() {
            let Some(points) = session.stroke_points(stroke) else {
                continue;
            };
            canvas.stroke_polyline(&shake(points), stroke.thickness, stroke.color);
        }

        let thickness = config.thickness_px();
        let ink = config.color();
        let mut tips = Vec::new();
        for (_, path) in tracker.active_paths() {
            let points = shake(path.to_vec());
            canvas.stroke_polyline(&points, thickness, ink);
            tips.extend(points.last().copied());
        }

        // Sparks go over all ink, including other fingers' paths.
        for tip in tips {
            SparkEffect::render(canvas, tip.x, tip.y, ink, spark_size(thickness), time_ms);
        }

        if self.hud {
            self.draw_hud(canvas, &status_line(config, session.strokes().len()), message);
        }
    }

    fn draw_hud(&self, canvas: &mut Canvas, status: &str, message: Option<&str>) {
        let line_h = GLYPH_HEIGHT * HUD_SCALE;
        let bottom = canvas.height() as i32 - HUD_MARGIN;

        let legend_y = bottom - line_h;
        let status_y = legend_y - line_h - 6;
        let band_y   = status_y - 8;
        canvas.fill_rect_alpha(0, band_y, canvas.width() as i32, bottom - band_y + HUD_MARGIN, HUD_BG, 0.45);

        canvas.draw_text(status, HUD_MARGIN, status_y, HUD_SCALE, HUD_TEXT);
        canvas.draw_text(LEGEND, HUD_MARGIN, legend_y, HUD_SCALE, HUD_DIM);

        if let Some(msg) = message.filter(|m| !m.is_empty()) {
            let w = text_width(msg, HUD_SCALE);
            let x = (canvas.width() as i32 - w) / 2;
            canvas.fill_rect_alpha(x - 6, HUD_MARGIN - 6, w + 12, line_h + 12, HUD_BG, 0.45);
            canvas.draw_text(msg, x, HUD_MARGIN, HUD_SCALE, HUD_TEXT);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
