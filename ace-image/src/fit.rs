//! Pixel sizes, image fit and size levels.

use ace_core::SizeF;
use serde::{Deserialize, Serialize};

/// Integer size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Create a size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Smallest pixel size covering a layout size, or `None` for an empty or
    /// non-finite one.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn from_layout(size: SizeF) -> Option<Self> {
        if size.is_empty() || !size.width.is_finite() || !size.height.is_finite() {
            return None;
        }
        let to_px = |v: f32| v.ceil().min(u32::MAX as f32) as u32;
        Some(Self::new(to_px(size.width), to_px(size.height)))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn scaled(self, scale: f64) -> Self {
        let dim = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
        Self::new(dim(self.width), dim(self.height))
    }
}

impl std::fmt::Display for PixelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How an image is fitted into its layout box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    /// Stretch to the box, ignoring the aspect ratio.
    Fill,
    /// Scale to fit inside the box.
    Contain,
    /// Scale to cover the box.
    #[default]
    Cover,
    /// Keep the intrinsic size.
    None,
    /// Like [`ImageFit::Contain`] but never larger than the intrinsic size.
    ScaleDown,
}

impl ImageFit {
    /// Decode size for showing `source` in a box of `dst`.
    ///
    /// Never larger than `source`. Returns `None` when either size is empty.
    #[must_use]
    pub fn resize_target(self, source: PixelSize, dst: PixelSize) -> Option<PixelSize> {
        if source.is_empty() || dst.is_empty() {
            return None;
        }
        let scale_x = f64::from(dst.width) / f64::from(source.width);
        let scale_y = f64::from(dst.height) / f64::from(source.height);
        let target = match self {
            Self::Fill => PixelSize::new(
                dst.width.min(source.width),
                dst.height.min(source.height),
            ),
            Self::Contain | Self::ScaleDown => source.scaled(scale_x.min(scale_y).min(1.0)),
            Self::Cover => source.scaled(scale_x.max(scale_y).min(1.0)),
            Self::None => source,
        };
        Some(target)
    }
}

/// Size level of a request: the source width halved while the half still
/// covers `requested` width.
///
/// Requests within the same level reuse the same canvas image. Returns `None`
/// for a zero source or request.
#[must_use]
pub fn round_up(source_width: u32, requested_width: u32) -> Option<u32> {
    if source_width == 0 || requested_width == 0 {
        return None;
    }
    let mut level = source_width;
    while level / 2 >= requested_width {
        level /= 2;
    }
    Some(level)
}
