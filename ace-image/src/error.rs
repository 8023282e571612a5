//! Image pipeline error types.

use thiserror::Error;

/// Result type for image operations.
pub type ImageResult<T> = Result<T, ImageError>;

/// Errors that can occur while loading or decoding an image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The bytes are not in a format the backend understands.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Reading the source failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A `data:` URI could not be parsed.
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// The request was cancelled before it finished.
    #[error("Image load cancelled")]
    Cancelled,

    /// The backend cannot reach the requested size without a forced resize.
    #[error("Cannot resize to {width}x{height} natively")]
    ResizeUnsupported {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A zero or otherwise unusable size.
    #[error("Invalid size: {0}")]
    InvalidSize(String),

    /// The provider was shut down before the request could run.
    #[error("Image provider has shut down")]
    ShutDown,

    /// No async runtime to run decode work on.
    #[error("No async runtime: {0}")]
    Runtime(String),

    /// Configuration serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => Self::UnsupportedFormat(e.to_string()),
            image::ImageError::IoError(e) => Self::Io(e),
            other => Self::Decode(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_crate_errors_map_by_kind() {
        let io = image::ImageError::IoError(std::io::Error::other("disk gone"));
        assert!(matches!(ImageError::from(io), ImageError::Io(_)));

        let garbage = image::load_from_memory(b"definitely not an image").unwrap_err();
        assert!(matches!(
            ImageError::from(garbage),
            ImageError::UnsupportedFormat(_) | ImageError::Decode(_)
        ));
    }

    #[test]
    fn test_messages() {
        let err = ImageError::ResizeUnsupported {
            width: 10,
            height: 20,
        };
        assert_eq!(err.to_string(), "Cannot resize to 10x20 natively");
        assert_eq!(ImageError::Cancelled.to_string(), "Image load cancelled");
    }
}
