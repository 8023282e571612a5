//! Reading encoded bytes from an [`ImageSourceInfo`].
//!
//! Supports files, base64 or percent-encoded `data:` URIs and in-memory
//! buffers. Formats are sniffed from magic bytes, falling back to the MIME
//! type of a data URI or the file extension.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ImageError, ImageResult};
use crate::source::ImageSourceInfo;

/// Encoded image formats the pipeline recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame only).
    Gif,
    /// Windows bitmap.
    Bmp,
    /// Unknown/other format.
    #[default]
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::WebP,
            "gif" => Self::Gif,
            "bmp" => Self::Bmp,
            _ => Self::Unknown,
        }
    }

    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/gif" => Self::Gif,
            "image/bmp" => Self::Bmp,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }
        if data.starts_with(b"BM") {
            return Self::Bmp;
        }
        Self::Unknown
    }

    /// Matching format of the `image` crate.
    #[must_use]
    pub fn to_image_format(self) -> Option<image::ImageFormat> {
        match self {
            Self::Png => Some(image::ImageFormat::Png),
            Self::Jpeg => Some(image::ImageFormat::Jpeg),
            Self::WebP => Some(image::ImageFormat::WebP),
            Self::Gif => Some(image::ImageFormat::Gif),
            Self::Bmp => Some(image::ImageFormat::Bmp),
            Self::Unknown => None,
        }
    }
}

/// Decoded payload of a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Format named by the MIME type.
    pub format: ImageFormat,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

/// Parse `data:[<mime>][;base64],<payload>`.
///
/// # Errors
///
/// Returns [`ImageError::InvalidDataUri`] if the prefix or comma is missing,
/// or the payload is not valid base64 / percent-encoding.
pub fn parse_data_uri(uri: &str) -> ImageResult<DataUri> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::InvalidDataUri("missing data: prefix".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::InvalidDataUri("missing comma".to_string()))?;

    let mut params = metadata.split(';');
    let format = ImageFormat::from_mime(params.next().unwrap_or_default());
    let is_base64 = params.any(|param| param.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ImageError::InvalidDataUri(format!("bad base64: {e}")))?
    } else {
        percent_decode(payload)?
    };
    Ok(DataUri { format, bytes })
}

fn percent_decode(input: &str) -> ImageResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| {
                    ImageError::InvalidDataUri(format!("bad percent escape at byte {i}"))
                })?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Ok(result)
}

/// Encoded bytes of a source plus the format hinted by its name or MIME type.
#[derive(Debug, Clone)]
pub struct SourceBytes {
    /// Encoded bytes.
    pub bytes: Arc<[u8]>,
    /// Format from magic bytes, else from the name or MIME type.
    pub format: ImageFormat,
}

/// Read the encoded bytes of `source`. Blocks on file IO.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the data URI is malformed.
pub fn load_source_bytes(source: &ImageSourceInfo) -> ImageResult<SourceBytes> {
    let (bytes, hint): (Arc<[u8]>, ImageFormat) = match source {
        ImageSourceInfo::File(path) => {
            let hint = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(ImageFormat::Unknown, ImageFormat::from_extension);
            (std::fs::read(path)?.into(), hint)
        }
        ImageSourceInfo::DataUri(uri) => {
            let parsed = parse_data_uri(uri)?;
            (parsed.bytes.into(), parsed.format)
        }
        ImageSourceInfo::Memory { bytes, .. } => (Arc::clone(bytes), ImageFormat::Unknown),
    };

    let format = match ImageFormat::from_magic_bytes(&bytes) {
        ImageFormat::Unknown => hint,
        sniffed => sniffed,
    };
    tracing::trace!("Loaded {} bytes from {source} ({format:?})", bytes.len());
    Ok(SourceBytes { bytes, format })
}
