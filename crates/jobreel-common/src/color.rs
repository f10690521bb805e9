//! Brand color handling.
//!
//! Colors arrive as `#RRGGBB` hex strings. Captions are styled in the ASS
//! subtitle format, which spells colors as `&HAABBGGRR`; [`HexColor::to_ass`]
//! performs that byte reordering. Contrast follows the WCAG 2.x relative
//! luminance definition.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum contrast ratio for body text (WCAG AA).
pub const MIN_TEXT_CONTRAST: f64 = 4.5;

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const WHITE: HexColor = HexColor::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: HexColor = HexColor::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (leading `#` optional, case-insensitive).
    pub fn parse(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::validation(format!("invalid hex color: {:?}", s)));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| Error::validation(format!("invalid hex color {:?}: {}", s, e)))
        };
        Ok(Self::new(byte(0)?, byte(2)?, byte(4)?))
    }

    /// ASS color literal: alpha, then blue, green, red (`&HAABBGGRR`).
    pub fn to_ass(&self, alpha: u8) -> String {
        format!("&H{:02X}{:02X}{:02X}{:02X}", alpha, self.b, self.g, self.r)
    }

    /// Inverse of [`HexColor::to_ass`], returning the color and its alpha.
    pub fn from_ass(s: &str) -> Result<(Self, u8)> {
        let body = s
            .trim()
            .strip_prefix("&H")
            .ok_or_else(|| Error::validation(format!("invalid ASS color: {:?}", s)))?;
        if body.len() != 8 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::validation(format!("invalid ASS color: {:?}", s)));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&body[i..i + 2], 16)
                .map_err(|e| Error::validation(format!("invalid ASS color {:?}: {}", s, e)))
        };
        let (a, b, g, r) = (byte(0)?, byte(2)?, byte(4)?, byte(6)?);
        Ok((Self::new(r, g, b), a))
    }

    /// Color literal accepted by ffmpeg filter options (`0xRRGGBB`).
    pub fn to_ffmpeg(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// WCAG relative luminance in `[0, 1]`.
    pub fn relative_luminance(&self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl std::str::FromStr for HexColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<HexColor> for String {
    fn from(c: HexColor) -> Self {
        c.to_string()
    }
}

/// Outcome of a text/background contrast check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrastCheck {
    pub foreground: HexColor,
    pub background: HexColor,
    pub ratio: f64,
    pub passes: bool,
}

/// `(L_lighter + 0.05) / (L_darker + 0.05)`, in `[1, 21]`.
pub fn contrast_ratio(a: HexColor, b: HexColor) -> f64 {
    let (la, lb) = (a.relative_luminance(), b.relative_luminance());
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Check two colors against `threshold`.
pub fn check_contrast(foreground: HexColor, background: HexColor, threshold: f64) -> ContrastCheck {
    let ratio = contrast_ratio(foreground, background);
    ContrastCheck {
        foreground,
        background,
        ratio,
        passes: ratio >= threshold,
    }
}

/// Parse both hex strings and check them against the body-text threshold.
pub fn check_hex_contrast(foreground: &str, background: &str) -> Result<ContrastCheck> {
    Ok(check_contrast(
        HexColor::parse(foreground)?,
        HexColor::parse(background)?,
        MIN_TEXT_CONTRAST,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse() {
        assert_eq!(HexColor::parse("#0B5FFF").unwrap(), HexColor::new(0x0B, 0x5F, 0xFF));
        assert_eq!(HexColor::parse("0b5fff").unwrap(), HexColor::new(0x0B, 0x5F, 0xFF));
        assert_matches!(HexColor::parse("#0B5FF"), Err(Error::Validation(_)));
        assert_matches!(HexColor::parse("#GGGGGG"), Err(Error::Validation(_)));
        assert_matches!(HexColor::parse(""), Err(Error::Validation(_)));
    }

    #[test]
    fn test_ass_byte_order() {
        let color = HexColor::parse("#0B5FFF").unwrap();
        let ass = color.to_ass(0x40);
        assert_eq!(ass, "&H40FF5F0B");
        // alpha, blue, green, red
        assert_eq!(&ass[2..4], "40");
        assert_eq!(&ass[4..6], "FF");
        assert_eq!(&ass[6..8], "5F");
        assert_eq!(&ass[8..10], "0B");
    }

    #[test]
    fn test_ass_round_trip() {
        let color = HexColor::parse("#12AB34").unwrap();
        let (back, alpha) = HexColor::from_ass(&color.to_ass(0x80)).unwrap();
        assert_eq!(back, color);
        assert_eq!(alpha, 0x80);
        assert!(HexColor::from_ass("H40FF5F0B").is_err());
    }

    #[test]
    fn test_display_and_ffmpeg() {
        let color = HexColor::parse("#0b5fff").unwrap();
        assert_eq!(color.to_string(), "#0B5FFF");
        assert_eq!(color.to_ffmpeg(), "0x0B5FFF");
    }

    #[test]
    fn test_contrast_extremes() {
        let check = check_hex_contrast("#FFFFFF", "#000000").unwrap();
        assert!((check.ratio - 21.0).abs() < 1e-9);
        assert!(check.passes);

        // order does not matter
        let reversed = check_hex_contrast("#000000", "#FFFFFF").unwrap();
        assert!((reversed.ratio - check.ratio).abs() < 1e-12);
    }

    #[test]
    fn test_contrast_similar_grays_fail() {
        let check = check_hex_contrast("#777777", "#888888").unwrap();
        assert!(check.ratio < MIN_TEXT_CONTRAST);
        assert!(!check.passes);
    }

    #[test]
    fn test_serde_as_string() {
        let color: HexColor = serde_json::from_str(r##""#0B5FFF""##).unwrap();
        assert_eq!(color, HexColor::new(0x0B, 0x5F, 0xFF));
        assert_eq!(serde_json::to_string(&color).unwrap(), r##""#0B5FFF""##);
        assert!(serde_json::from_str::<HexColor>(r#""blue""#).is_err());
    }
}
