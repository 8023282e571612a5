//! Decode backends.
//!
//! [`ImageDecodeBackend`] is the seam between the task registry and a codec.
//! [`RasterBackend`] implements it on top of the `image` crate.

use std::io::Cursor;

use image::imageops::FilterType;
use tokio_util::sync::CancellationToken;

use crate::error::{ImageError, ImageResult};
use crate::fit::PixelSize;
use crate::loader::ImageFormat;

/// How a sized decode may reach its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResizeMode {
    /// Only sizes the codec reaches by itself.
    #[default]
    Native,
    /// Scale to exactly the target, whatever the codec supports.
    Force,
}

/// Header information of an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    /// Intrinsic size.
    pub size: PixelSize,
    /// Encoded format.
    pub format: ImageFormat,
}

/// Decoded RGBA8 bitmap, shared read-only with the paint layer.
#[derive(Clone, PartialEq, Eq)]
pub struct CanvasImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 pixels, row-major.
    pub pixels: Vec<u8>,
    /// Format the bitmap was decoded from.
    pub format: ImageFormat,
}

impl CanvasImage {
    /// Size of the bitmap.
    #[must_use]
    pub const fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Memory held by the pixels.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// A bitmap filled with one colour.
    #[must_use]
    pub fn solid(size: PixelSize, rgba: [u8; 4]) -> Self {
        let pixel_count = size.width as usize * size.height as usize;
        Self {
            width: size.width,
            height: size.height,
            pixels: rgba.repeat(pixel_count),
            format: ImageFormat::Unknown,
        }
    }

    fn from_dynamic(img: &image::DynamicImage, format: ImageFormat) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
            format,
        }
    }
}

impl std::fmt::Debug for CanvasImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .field("format", &self.format)
            .finish()
    }
}

/// A codec the task registry decodes with.
///
/// Methods run on a blocking worker thread, never on the UI thread.
pub trait ImageDecodeBackend: Send + Sync + 'static {
    /// Read the header only.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a recognised image.
    fn probe(&self, bytes: &[u8]) -> ImageResult<ImageInfo>;

    /// Decode `bytes`, at `target` size when given.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ResizeUnsupported`] when `mode` is
    /// [`ResizeMode::Native`] and the codec cannot reach `target`,
    /// [`ImageError::Cancelled`] if `cancel` fired, or a decode error.
    fn decode(
        &self,
        bytes: &[u8],
        target: Option<PixelSize>,
        mode: ResizeMode,
        cancel: &CancellationToken,
    ) -> ImageResult<CanvasImage>;

    /// Smallest size at least `target` the codec decodes to without a full
    /// decode and resize.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be read.
    fn best_native_size(&self, bytes: &[u8], target: PixelSize) -> ImageResult<PixelSize>;

    /// Whether [`decode`](Self::decode) observes its cancellation token.
    fn supports_cancel(&self) -> bool {
        false
    }
}

/// Largest JPEG DCT scale denominator as a power of two (1/8).
const MAX_JPEG_SCALE_SHIFT: u32 = 3;

/// Smallest `1/2^k` scale of `source` still covering `target`.
#[must_use]
pub fn jpeg_native_size(source: PixelSize, target: PixelSize) -> PixelSize {
    let scale = |v: u32, shift: u32| v.div_ceil(1 << shift);
    (0..=MAX_JPEG_SCALE_SHIFT)
        .rev()
        .map(|shift| PixelSize::new(scale(source.width, shift), scale(source.height, shift)))
        .find(|size| size.width >= target.width && size.height >= target.height)
        .unwrap_or(source)
}

/// Backend decoding with the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterBackend;

impl RasterBackend {
    /// Create the backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn check_cancelled(cancel: &CancellationToken) -> ImageResult<()> {
    if cancel.is_cancelled() {
        Err(ImageError::Cancelled)
    } else {
        Ok(())
    }
}

impl ImageDecodeBackend for RasterBackend {
    fn probe(&self, bytes: &[u8]) -> ImageResult<ImageInfo> {
        let (width, height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidSize(format!("{width}x{height}")));
        }
        Ok(ImageInfo {
            size: PixelSize::new(width, height),
            format: ImageFormat::from_magic_bytes(bytes),
        })
    }

    fn decode(
        &self,
        bytes: &[u8],
        target: Option<PixelSize>,
        mode: ResizeMode,
        cancel: &CancellationToken,
    ) -> ImageResult<CanvasImage> {
        check_cancelled(cancel)?;
        let ImageInfo {
            size: source,
            format,
        } = self.probe(bytes)?;
        let plan = match target.filter(|t| *t != source) {
            None => None,
            Some(target) if target.is_empty() => {
                return Err(ImageError::InvalidSize(target.to_string()));
            }
            Some(target) => Some(match mode {
                ResizeMode::Force => (target, FilterType::Lanczos3),
                ResizeMode::Native if format == ImageFormat::Jpeg => {
                    (jpeg_native_size(source, target), FilterType::Triangle)
                }
                ResizeMode::Native => {
                    return Err(ImageError::ResizeUnsupported {
                        width: target.width,
                        height: target.height,
                    })
                }
            }),
        };

        let img = image::load_from_memory(bytes)?;
        check_cancelled(cancel)?;
        let Some((size, filter)) = plan.filter(|(size, _)| *size != source) else {
            return Ok(CanvasImage::from_dynamic(&img, format));
        };
        tracing::trace!("Resizing {source} -> {size} ({mode:?})");
        let resized = img.resize_exact(size.width, size.height, filter);
        Ok(CanvasImage::from_dynamic(&resized, format))
    }

    fn best_native_size(&self, bytes: &[u8], target: PixelSize) -> ImageResult<PixelSize> {
        let info = self.probe(bytes)?;
        Ok(match info.format {
            ImageFormat::Jpeg => jpeg_native_size(info.size, target),
            _ => info.size,
        })
    }

    fn supports_cancel(&self) -> bool {
        true
    }
}
