//! Software canvas: a `width × height` buffer of `0xAARRGGBB` pixels, the
//! format `minifb` presents directly.
//!
//! Everything is drawn with pixel-center coverage tests; there is no
//! anti-aliasing.  Strokes are unions of capsules, which gives round caps and
//! round joins for free.

use std::path::Path;

use ink_geom::{color, Point};

use crate::error::Result;

// ════════════════════════════════════════════════════════════════════════════
// VideoFrame
// ════════════════════════════════════════════════════════════════════════════

/// A backdrop image in camera orientation (drawn mirrored).
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl VideoFrame {
    pub fn from_rgba(img: &image::RgbaImage) -> Self {
        let pixels = img
            .pixels()
            .map(|p| {
                let [r, g, b, _] = p.0;
                0xFF000000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
            })
            .collect();
        VideoFrame { width: img.width() as usize, height: img.height() as usize, pixels }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path)?.to_rgba8();
        Ok(Self::from_rgba(&img))
    }
}

/// Scale and offset that make a `src` image cover a `dst` area, preserving
/// aspect ratio and centering the overflow.  Returns `(scale, off_x, off_y)`;
/// offsets are ≤ 0.
pub fn cover_transform(src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> (f32, f32, f32) {
    let scale = (dst_w as f32 / src_w as f32).max(dst_h as f32 / src_h as f32);
    let off_x = (dst_w as f32 - src_w as f32 * scale) / 2.0;
    let off_y = (dst_h as f32 - src_h as f32 * scale) / 2.0;
    (scale, off_x, off_y)
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, buf: vec![color::BLACK; width * height] }
    }

    pub fn width(&self) -> usize   { self.width }
    pub fn height(&self) -> usize  { self.height }
    pub fn pixels(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    pub fn clear(&mut self, color: u32) {
        self.buf.fill(color);
    }

    // ── primitives ───────────────────────────────────────────────────────

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    /// Mix `color` over the existing pixel with weight `alpha`.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: u32, alpha: f32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            let i = y as usize * self.width + x as usize;
            self.buf[i] = color::blend(self.buf[i], color, alpha);
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        self.fill_rect_alpha(x, y, w, h, color, 1.0);
    }

    pub fn fill_rect_alpha(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32, alpha: f32) {
        let (x0, x1) = (x.max(0), (x + w).min(self.width as i32));
        let (y0, y1) = (y.max(0), (y + h).min(self.height as i32));
        for row in y0..y1 {
            for col in x0..x1 {
                self.paint(col, row, color, alpha);
            }
        }
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, color: u32) {
        self.fill_circle_alpha(center, radius, color, 1.0);
    }

    pub fn fill_circle_alpha(&mut self, center: Point, radius: f32, color: u32, alpha: f32) {
        if !(radius > 0.0) || !center.is_finite() || alpha <= 0.0 {
            return;
        }
        let r = radius.max(0.5);
        let r2 = r * r;
        self.for_each_in_box(center - Point::splat(r), center + Point::splat(r), |canvas, x, y, p| {
            if p.distance_squared(center) <= r2 {
                canvas.paint(x, y, color, alpha);
            }
        });
    }

    /// A line segment of the given width with round ends.
    pub fn stroke_segment(&mut self, a: Point, b: Point, width: f32, color: u32) {
        self.stroke_segment_alpha(a, b, width, color, 1.0);
    }

    pub fn stroke_segment_alpha(&mut self, a: Point, b: Point, width: f32, color: u32, alpha: f32) {
        if !(width > 0.0) || !a.is_finite() || !b.is_finite() || alpha <= 0.0 {
            return;
        }
        let r = (width / 2.0).max(0.5);
        let lo = a.min(b) - Point::splat(r);
        let hi = a.max(b) + Point::splat(r);
        self.for_each_in_box(lo, hi, |canvas, x, y, p| {
            if distance_to_segment(p, a, b) <= r {
                canvas.paint(x, y, color, alpha);
            }
        });
    }

    /// Polyline with round caps and joins.  A single point draws a dot.
    pub fn stroke_polyline(&mut self, points: &[Point], width: f32, color: u32) {
        match points {
            []    => {}
            [p]   => self.fill_circle(*p, width / 2.0, color),
            _     => {
                for w in points.windows(2) {
                    self.stroke_segment(w[0], w[1], width, color);
                }
            }
        }
    }

    // ── text ─────────────────────────────────────────────────────────────

    /// Draw `text` with the built-in 3×5 font, each font pixel `scale`
    /// canvas pixels wide.  Returns the x just past the last glyph.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: i32, color: u32) -> i32 {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let bits = glyph(ch);
            for row in 0..5 {
                for col in 0..3 {
                    if bits & (1 << (14 - row * 3 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += GLYPH_ADVANCE * scale;
        }
        cx
    }

    // ── backdrop ─────────────────────────────────────────────────────────

    /// Fill the whole canvas with `frame`, cover-scaled and mirrored
    /// horizontally.
    pub fn draw_video_mirrored(&mut self, frame: &VideoFrame) {
        if frame.width == 0 || frame.height == 0 || frame.pixels.len() < frame.width * frame.height {
            return;
        }
        let (scale, off_x, off_y) = cover_transform(frame.width, frame.height, self.width, self.height);
        for y in 0..self.height {
            let sy = ((y as f32 + 0.5 - off_y) / scale) as usize;
            let src_row = sy.min(frame.height - 1) * frame.width;
            for x in 0..self.width {
                let mirrored = self.width - 1 - x;
                let sx = ((mirrored as f32 + 0.5 - off_x) / scale) as usize;
                self.buf[y * self.width + x] = frame.pixels[src_row + sx.min(frame.width - 1)];
            }
        }
    }

    // ── export ───────────────────────────────────────────────────────────

    /// Pixels as tightly packed RGBA bytes, fully opaque.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.buf.len() * 4);
        for &px in &self.buf {
            let [r, g, b, _] = color::to_rgba(px);
            out.extend_from_slice(&[r, g, b, 0xFF]);
        }
        out
    }

    /// Write the canvas as a PNG.  The file appears atomically: it is encoded
    /// to a temporary sibling first and renamed into place.
    pub fn export_png(&self, path: &Path) -> Result<()> {
        use image::codecs::png::PngEncoder;
        use image::{ExtendedColorType, ImageEncoder};

        let tmp = path.with_extension("png.tmp");
        let file = std::fs::File::create(&tmp)?;
        let encoded = PngEncoder::new(std::io::BufWriter::new(file)).write_image(
            &self.to_rgba_bytes(),
            self.width as u32,
            self.height as u32,
            ExtendedColorType::Rgba8,
        );
        if let Err(e) = encoded {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    // ── internals ────────────────────────────────────────────────────────

    fn paint(&mut self, x: i32, y: i32, color: u32, alpha: f32) {
        if alpha >= 1.0 {
            self.set_pixel(x, y, color);
        } else {
            self.blend_pixel(x, y, color, alpha);
        }
    }

    /// Visit every on-canvas pixel whose box intersects `[lo, hi]`, passing
    /// its center point.
    fn for_each_in_box(&mut self, lo: Point, hi: Point, mut f: impl FnMut(&mut Self, i32, i32, Point)) {
        let x0 = (lo.x.floor() as i32).max(0);
        let y0 = (lo.y.floor() as i32).max(0);
        let x1 = (hi.x.ceil() as i32).min(self.width as i32 - 1);
        let y1 = (hi.y.ceil() as i32).min(self.height as i32 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                f(self, x, y, Point::new(x as f32 + 0.5, y as f32 + 0.5));
            }
        }
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    let t = if len2 > 0.0 { ((p - a).dot(ab) / len2).clamp(0.0, 1.0) } else { 0.0 };
    p.distance(a + ab * t)
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

/// Horizontal distance between glyph origins, in font pixels.
pub const GLYPH_ADVANCE: i32 = 4;
pub const GLYPH_HEIGHT:  i32 = 5;

/// Width of `text` in canvas pixels at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 { 0 } else { (n * GLYPH_ADVANCE - 1) * scale.max(1) }
}

/// Rows top to bottom, three bits each, leftmost column in the high bit.
fn glyph(c: char) -> u16 {
    match c.to_ascii_uppercase() {
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_011_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_010_010_010,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'A' => 0b010_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b011_100_100_100_011,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_110_100_111,
        'F' => 0b111_100_110_100_100,
        'G' => 0b011_100_101_101_011,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b001_001_001_101_010,
        'K' => 0b101_101_110_101_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_111_101_101,
        'N' => 0b110_101_101_101_101,
        'O' => 0b010_101_101_101_010,
        'P' => 0b110_101_110_100_100,
        'Q' => 0b010_101_101_110_011,
        'R' => 0b110_101_110_101_101,
        'S' => 0b011_100_010_001_110,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_101_010,
        'W' => 0b101_101_111_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_010_010_010,
        'Z' => 0b111_001_010_100_111,
        '#' => 0b101_111_101_111_101,
        ':' => 0b000_010_000_010_000,
        '[' => 0b110_100_100_100_110,
        ']' => 0b011_001_001_001_011,
        '(' => 0b010_100_100_100_010,
        ')' => 0b010_001_001_001_010,
        '/' => 0b001_001_010_100_100,
        '-' => 0b000_000_111_000_000,
        '+' => 0b000_010_111_010_000,
        '=' => 0b000_111_000_111_000,
        '.' => 0b000_000_000_000_010,
        ',' => 0b000_000_000_010_100,
        ' ' => 0,
        _   => 0b111_001_010_000_010, // '?'
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
