//! Stamp color parsing

use crate::error::{Error, Result};

/// RGB color with each channel normalized to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    /// Black
    pub const BLACK: RgbColor = RgbColor { r: 0.0, g: 0.0, b: 0.0 };

    /// Parse a `#RRGGBB` color (hex digits in either case).
    ///
    /// Anything else, including `#RGB` shorthand and color names, is rejected
    /// with [`Error::InvalidColor`]. No correction is attempted.
    pub fn parse_hex(hex: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(hex.to_string());

        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| -> Result<f32> {
            let value = u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())?;
            Ok(value as f32 / 255.0)
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Format back to `#RRGGBB` (uppercase)
    pub fn to_hex(&self) -> String {
        let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02X}{:02X}{:02X}", to_byte(self.r), to_byte(self.g), to_byte(self.b))
    }
}
