use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::WHITE
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Hex value of a token with its optional `&`, `H` and trailing `&` removed.
fn parse_hex(token: &str) -> Option<u32> {
    let digits = token.trim();
    let digits = digits.strip_prefix('&').unwrap_or(digits);
    let digits = digits
        .strip_prefix('H')
        .or_else(|| digits.strip_prefix('h'))
        .unwrap_or(digits);
    let digits = digits.strip_suffix('&').unwrap_or(digits);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Decode an `&HBBGGRR&` token.
///
/// The leading `&`, the `H` marker and the trailing `&` are all optional and
/// case-insensitive. Any digits above the low 24 bits (the alpha byte of
/// `&HAABBGGRR`) are dropped. Anything unparseable decodes to white.
pub fn decode(token: &str) -> Rgb {
    match parse_hex(token) {
        Some(bgr) => Rgb {
            r: (bgr & 0xFF) as u8,
            g: ((bgr >> 8) & 0xFF) as u8,
            b: ((bgr >> 16) & 0xFF) as u8,
        },
        None => {
            tracing::debug!("Unparseable color {:?}, using white", token);
            Rgb::WHITE
        }
    }
}

/// Whether [`decode`] keeps everything the token says: it parses and carries
/// no alpha byte.
pub fn decodes_exactly(token: &str) -> bool {
    parse_hex(token).is_some_and(|bgr| bgr <= 0xFF_FFFF)
}

/// Encode as `&HBBGGRR&`.
pub fn encode(rgb: Rgb) -> String {
    let bgr = (rgb.b as u32) << 16 | (rgb.g as u32) << 8 | rgb.r as u32;
    format!("&H{:06X}&", bgr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_is_bgr() {
        assert_eq!(decode("&H0000FF&"), Rgb::new(255, 0, 0));
        assert_eq!(decode("&H00FF00&"), Rgb::new(0, 255, 0));
        assert_eq!(decode("&HFF0000&"), Rgb::new(0, 0, 255));
        assert_eq!(decode("&H000000&"), Rgb::BLACK);
    }

    #[test]
    fn test_decode_lenient_forms() {
        assert_eq!(decode("H0000ff"), Rgb::new(255, 0, 0));
        assert_eq!(decode("&h0000FF"), Rgb::new(255, 0, 0));
        assert_eq!(decode("&H00FFFFFF"), Rgb::WHITE);
        assert_eq!(decode("&H80FF0000"), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_decode_malformed_is_white() {
        assert_eq!(decode(""), Rgb::WHITE);
        assert_eq!(decode("not-a-color"), Rgb::WHITE);
        assert_eq!(decode("&H&"), Rgb::WHITE);
        assert_eq!(decode("&H12345678901&"), Rgb::WHITE);
    }

    #[test]
    fn test_encode_pads_to_six_digits() {
        assert_eq!(encode(Rgb::new(255, 0, 0)), "&H0000FF&");
        assert_eq!(encode(Rgb::new(1, 2, 3)), "&H030201&");
    }

    #[test]
    fn test_decodes_exactly() {
        assert!(decodes_exactly("&H00FFFF&"));
        assert!(decodes_exactly("h0000ff"));
        assert!(decodes_exactly("&H00FFFFFF&"));
        assert!(!decodes_exactly("&H80FFFFFF&"));
        assert!(!decodes_exactly("&HGGFFFF&"));
        assert!(!decodes_exactly(""));
    }

    #[test]
    fn test_round_trip_grid() {
        let channel = || (0..=255u8).step_by(15).chain([255]);
        for r in channel() {
            for g in channel() {
                for b in channel() {
                    let rgb = Rgb::new(r, g, b);
                    assert_eq!(decode(&encode(rgb)), rgb, "{}", rgb);
                }
            }
        }
    }
}
