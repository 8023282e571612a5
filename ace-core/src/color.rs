//! RGBA colors.

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// An 8-bit-per-channel RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    /// Create a color from its channels.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from a packed `0xAARRGGBB` value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Parse `#RRGGBB` or `#AARRGGBB`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidColor`] for any other shape.
    pub fn from_hex(hex: &str) -> CoreResult<Self> {
        let digits = hex
            .strip_prefix('#')
            .ok_or_else(|| CoreError::InvalidColor(hex.to_string()))?;
        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| CoreError::InvalidColor(hex.to_string()))?;
        match digits.len() {
            6 => Ok(Self::from_argb(0xFF00_0000 | value)),
            8 => Ok(Self::from_argb(value)),
            _ => Err(CoreError::InvalidColor(hex.to_string())),
        }
    }

    /// Return this color with its alpha multiplied by `opacity` (clamped to `[0, 1]`).
    #[must_use]
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: scale_channel(self.a, opacity.clamp(0.0, 1.0)),
            ..self
        }
    }

    /// Channel-wise blend towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    #[must_use]
    pub fn blend(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: mix_channel(self.r, other.r, t),
            g: mix_channel(self.g, other.g, t),
            b: mix_channel(self.b, other.b, t),
            a: mix_channel(self.a, other.a, t),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_channel(channel: u8, factor: f32) -> u8 {
    (f32::from(channel) * factor).round().clamp(0.0, 255.0) as u8
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn mix_channel(from: u8, to: u8, t: f32) -> u8 {
    crate::lerp(f32::from(from), f32::from(to), t)
        .round()
        .clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#FF0000").unwrap(), Color::rgba(255, 0, 0, 255));
        assert_eq!(
            Color::from_hex("#80007DFF").unwrap(),
            Color::rgba(0, 0x7D, 0xFF, 0x80)
        );
        assert!(Color::from_hex("FF0000").is_err());
        assert!(Color::from_hex("#FFF").is_err());
        assert!(Color::from_hex("#GG0000").is_err());
    }

    #[test]
    fn test_with_opacity() {
        assert_eq!(Color::WHITE.with_opacity(0.5).a, 128);
        assert_eq!(Color::WHITE.with_opacity(2.0).a, 255);
        assert_eq!(Color::WHITE.with_opacity(-1.0).a, 0);
    }

    #[test]
    fn test_blend() {
        let mid = Color::BLACK.blend(Color::WHITE, 0.5);
        assert_eq!(mid.r, 128);
        assert_eq!(Color::BLACK.blend(Color::WHITE, 0.0), Color::BLACK);
        assert_eq!(Color::BLACK.blend(Color::WHITE, 1.0), Color::WHITE);
    }
}
