//! # ink_geom
//!
//! Scalar geometry shared by the finger-ink crates:
//!
//! * [`distance`] / [`lerp`]: the two primitives every other stage uses.
//! * [`resample`]: walk a freehand polyline and emit points at a fixed
//!   spacing (the input to compound-body synthesis).
//! * [`color`]: packed `0xAARRGGBB` helpers for the software canvas.
//!
//! Points are [`glam::Vec2`] in canvas pixels, y pointing down.
//!
//! ## Quick start
//!
//! ```rust
//! use ink_geom::{resample, Point};
//!
//! let path = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
//! let pts  = resample(&path, 4.0);
//! assert_eq!(pts.len(), 3); // x = 0, 4, 8
//! ```

pub mod color;

mod resample;
pub use resample::{resample, centroid};

pub use glam::Vec2 as Point;

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Point, b: Point) -> f32 {
    (b - a).length()
}

/// Linear interpolation: `t = 0` → `a`, `t = 1` → `b`.
#[inline]
pub fn lerp(a: Point, b: Point, t: f32) -> Point {
    a + (b - a) * t
}

/// Move from `from` toward `to` by exactly `step` pixels.
///
/// Returns `from` unchanged when the two points coincide.
pub fn step_toward(from: Point, to: Point, step: f32) -> Point {
    let d = distance(from, to);
    if d <= f32::EPSILON {
        return from;
    }
    lerp(from, to, step / d)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
