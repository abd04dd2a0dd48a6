//! Fixed-spacing path resampling.

use crate::{distance, step_toward, Point};

/// Resample `path` so consecutive output points are exactly `spacing` apart.
///
/// The first raw point is always emitted verbatim. From the last emitted
/// point we measure to the next raw point; while that distance is at least
/// `spacing` we emit a point exactly `spacing` along the segment and keep
/// measuring from it. A long raw segment therefore yields several points and
/// a run of tightly clustered raw points yields none. Whatever is left over
/// at the end (shorter than `spacing`) is dropped.
///
/// A non-positive or non-finite `spacing` yields just the first point.
pub fn resample(path: &[Point], spacing: f32) -> Vec<Point> {
    let Some(&first) = path.first() else {
        return Vec::new();
    };

    let mut out = vec![first];
    if !(spacing > 0.0 && spacing.is_finite()) {
        return out;
    }

    let mut last = first;
    for &next in &path[1..] {
        let mut remaining = distance(last, next);
        while remaining >= spacing {
            last = step_toward(last, next, spacing);
            out.push(last);
            remaining = distance(last, next);
        }
    }
    out
}

/// Arithmetic mean of `points`; `None` for an empty slice.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum: Point = points.iter().copied().sum();
    Some(sum / points.len() as f32)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
