//! Packed ARGB colors (`0xAARRGGBB`), the pixel format of the canvas buffer.

pub const WHITE: u32 = 0xFFFFFFFF;
pub const BLACK: u32 = 0xFF000000;

/// Parse `"#RRGGBB"` (leading `#` optional) into opaque ARGB.
pub fn parse_hex(text: &str) -> Option<u32> {
    let hex = text.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(|rgb| 0xFF000000 | rgb)
}

/// Format as `"#rrggbb"`, ignoring alpha.
pub fn to_hex(color: u32) -> String {
    format!("#{:06x}", color & 0x00FF_FFFF)
}

/// Split into `[r, g, b, a]` bytes.
pub fn to_rgba(color: u32) -> [u8; 4] {
    [
        ((color >> 16) & 0xFF) as u8,
        ((color >>  8) & 0xFF) as u8,
        ( color        & 0xFF) as u8,
        ((color >> 24) & 0xFF) as u8,
    ]
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
/// The result is always opaque.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t).round() as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_and_without_hash() {
        assert_eq!(parse_hex("#ff8800"), Some(0xFFFF8800));
        assert_eq!(parse_hex("00FFcc"),  Some(0xFF00FFCC));
        assert_eq!(parse_hex(" #000000 "), Some(BLACK));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gg0000"), None);
        assert_eq!(parse_hex(""), None);
        assert_eq!(parse_hex("#+12345"), None);
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(to_hex(0xFF12AB9C), "#12ab9c");
        assert_eq!(parse_hex(&to_hex(0xFF12AB9C)), Some(0xFF12AB9C));
    }

    #[test]
    fn rgba_bytes() {
        assert_eq!(to_rgba(0x80102030), [0x10, 0x20, 0x30, 0x80]);
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(BLACK, WHITE, 0.0), BLACK);
        assert_eq!(blend(BLACK, WHITE, 1.0), WHITE);
        assert_eq!(blend(BLACK, WHITE, 0.5), 0xFF808080);
        assert_eq!(blend(BLACK, WHITE, 7.0), WHITE);
    }
}
