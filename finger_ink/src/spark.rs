//! The sparkle drawn at the tip of every in-progress stroke.
//!
//! Entirely procedural: ray count, angles, lengths and twinkle are pure
//! functions of the ray index and the frame time, so the same `(time, size)`
//! always produces the same picture.

use std::f32::consts::TAU;

use ink_geom::{color, Point};

use crate::canvas::Canvas;

pub const RAY_COUNT: usize = 32;

/// Rays whose twinkle wave is below this are skipped for the frame.
const TWINKLE_CUTOFF: f32 = -0.55;
/// Largest angular jitter of a ray, as a fraction of the even spacing.
const ANGLE_JITTER: f32 = 0.35;

/// Sine hash of the ray index.
///
/// The remainder keeps the sign of the dividend, so the result lies in
/// `(-1, 1)`, not `[0, 1)`.
pub fn noise_a(i: usize) -> f32 {
    ((i as f32 * 12.9898).sin() * 43758.547) % 1.0
}

/// A second, uncorrelated sine hash; same range as [`noise_a`].
pub fn noise_b(i: usize) -> f32 {
    ((i as f32 * 78.233 + 1.7).sin() * 24634.635) % 1.0
}

/// One visible ray of a spark.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub index:  usize,
    /// Offset of the ray's tip from the spark center.
    pub tip:    Point,
    /// Offset where the ray starts (just outside the core).
    pub base:   Point,
    pub width:  f32,
    pub color:  u32,
    /// Offset of this ray's ember dot, if it has one.
    pub ember:  Option<Point>,
}

pub struct SparkEffect;

impl SparkEffect {
    /// Geometry of every ray visible at `time_ms`, relative to the center.
    pub fn spark_rays(stroke_color: u32, size: f32, time_ms: f64) -> Vec<Ray> {
        // Keep the phase argument small so f32 sin stays precise in long sessions.
        let t = (time_ms % 1_000_000.0) as f32;
        let core = size * 0.15;
        let step = TAU / RAY_COUNT as f32;

        (0..RAY_COUNT)
            .filter_map(|i| {
                let na = noise_a(i);
                let nb = noise_b(i);
                let fi = i as f32;

                let twinkle = (t * 0.011 + fi * 1.9 + nb * 3.0).sin();
                if twinkle < TWINKLE_CUTOFF {
                    return None;
                }

                let angle = fi * step + na * step * ANGLE_JITTER;
                let pulse = 0.75 + 0.25 * (t * 0.007 + fi * 0.8).sin();
                let length = size * (0.55 + 0.45 * nb.abs()) * pulse;
                let dir = Point::new(angle.cos(), angle.sin());

                let tinted = i % 3 == 0;
                let ember = (i % 4 == 0).then(|| {
                    let swing = 0.9 + 0.35 * (t * 0.005 + fi * 2.3).sin();
                    dir * (length * swing)
                });

                Some(Ray {
                    index: i,
                    tip:   dir * length.max(core),
                    base:  dir * core,
                    width: if tinted { 2.0 } else { 1.0 },
                    color: if tinted { stroke_color } else { color::WHITE },
                    ember,
                })
            })
            .collect()
    }

    /// Draw a spark centered on `(x, y)`.
    pub fn render(canvas: &mut Canvas, x: f32, y: f32, stroke_color: u32, size: f32, time_ms: f64) {
        let center = Point::new(x, y);
        canvas.fill_circle_alpha(center, size * 0.35, stroke_color, 0.3);

        for ray in Self::spark_rays(stroke_color, size, time_ms) {
            canvas.stroke_segment(center + ray.base, center + ray.tip, ray.width, ray.color);
            if let Some(ember) = ray.ember {
                canvas.fill_circle(center + ember, (size * 0.06).max(1.0), ray.color);
            }
        }

        canvas.fill_circle(center, size * 0.15, color::WHITE);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const PINK: u32 = 0xFFFF3366;

    #[test]
    fn noise_stays_in_open_unit_interval() {
        for i in 0..1000 {
            for n in [noise_a(i), noise_b(i)] {
                assert!(n > -1.0 && n < 1.0, "noise {n} at {i}");
            }
        }
        assert!((0..RAY_COUNT).any(|i| noise_b(i) < 0.0));
    }

    #[test]
    fn rays_are_deterministic() {
        let a = SparkEffect::spark_rays(PINK, 20.0, 1234.5);
        let b = SparkEffect::spark_rays(PINK, 20.0, 1234.5);
        assert_eq!(a, b);
        assert_ne!(a, SparkEffect::spark_rays(PINK, 20.0, 1834.5));
    }

    #[test]
    fn some_rays_twinkle_out() {
        // Over a range of frames each ray is hidden at least once and the
        // spark is never empty.
        let mut hidden = [false; RAY_COUNT];
        for frame in 0..600 {
            let rays = SparkEffect::spark_rays(PINK, 20.0, frame as f64 * 16.0);
            assert!(!rays.is_empty());
            assert!(rays.len() <= RAY_COUNT);
            for i in 0..RAY_COUNT {
                if !rays.iter().any(|r| r.index == i) {
                    hidden[i] = true;
                }
            }
        }
        assert!(hidden.iter().all(|&h| h));
    }

    #[test]
    fn color_and_ember_cadence() {
        for frame in 0..60 {
            for ray in SparkEffect::spark_rays(PINK, 20.0, frame as f64 * 16.0) {
                let expected = if ray.index % 3 == 0 { PINK } else { color::WHITE };
                assert_eq!(ray.color, expected);
                assert_eq!(ray.ember.is_some(), ray.index % 4 == 0);
            }
        }
    }

    #[test]
    fn rays_scale_with_size() {
        let t = 500.0;
        let small = SparkEffect::spark_rays(PINK, 10.0, t);
        let large = SparkEffect::spark_rays(PINK, 40.0, t);
        assert_eq!(small.len(), large.len());
        for (s, l) in small.iter().zip(&large) {
            assert!(l.tip.length() > s.tip.length());
            assert!(s.tip.length() <= 10.0 + 1e-3);
        }
    }

    #[test]
    fn render_lights_the_center() {
        let mut canvas = Canvas::new(64, 64);
        SparkEffect::render(&mut canvas, 32.0, 32.0, PINK, 24.0, 100.0);
        assert_eq!(canvas.pixel(32, 32), Some(color::WHITE));
        assert_eq!(canvas.pixel(0, 0), Some(color::BLACK));
    }
}
