//! Image sources and request keys.

use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

use crate::fit::{ImageFit, PixelSize};

/// Where image bytes come from.
#[derive(Debug, Clone)]
pub enum ImageSourceInfo {
    /// A file on disk.
    File(PathBuf),
    /// An inline `data:` URI.
    DataUri(String),
    /// Bytes already in memory, identified by a caller-chosen id.
    Memory {
        /// Identity used for de-duplication and caching.
        id: String,
        /// Encoded image bytes.
        bytes: Arc<[u8]>,
    },
}

impl ImageSourceInfo {
    /// Interpret a `src` attribute: `data:` URIs inline, anything else a file
    /// path (with an optional `file://` prefix).
    #[must_use]
    pub fn parse(src: &str) -> Self {
        if src.starts_with("data:") {
            Self::DataUri(src.to_string())
        } else {
            Self::File(PathBuf::from(src.strip_prefix("file://").unwrap_or(src)))
        }
    }

    /// In-memory bytes.
    #[must_use]
    pub fn memory(id: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory {
            id: id.into(),
            bytes: bytes.into(),
        }
    }

    /// String identifying the source; equal locators are the same source.
    #[must_use]
    pub fn locator(&self) -> String {
        match self {
            Self::File(path) => format!("file://{}", path.display()),
            Self::DataUri(uri) => uri.clone(),
            Self::Memory { id, .. } => format!("memory://{id}"),
        }
    }
}

impl PartialEq for ImageSourceInfo {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::File(a), Self::File(b)) => a == b,
            (Self::DataUri(a), Self::DataUri(b)) => a == b,
            (Self::Memory { id: a, .. }, Self::Memory { id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for ImageSourceInfo {}

impl Hash for ImageSourceInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::File(path) => path.hash(state),
            Self::DataUri(uri) => uri.hash(state),
            Self::Memory { id, .. } => id.hash(state),
        }
    }
}

impl std::fmt::Display for ImageSourceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const MAX_URI_CHARS: usize = 48;
        match self {
            Self::DataUri(uri) if uri.chars().count() > MAX_URI_CHARS => {
                let head: String = uri.chars().take(MAX_URI_CHARS).collect();
                write!(f, "{head}...")
            }
            _ => f.write_str(&self.locator()),
        }
    }
}

/// Kind of work a key names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Load the bytes and probe the header.
    Data,
    /// Produce a canvas image.
    Canvas,
}

/// Identity of one unit of work; equal keys share one task.
///
/// A data key loads and probes the bytes; a canvas key also names the decode
/// size and how it was derived. Keys of different kinds never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageSourceKey {
    /// Kind of work.
    pub kind: KeyKind,
    /// The source.
    pub source: ImageSourceInfo,
    /// Requested box size, `None` for the intrinsic size.
    pub size: Option<PixelSize>,
    /// Fit used to derive the decode size.
    pub fit: ImageFit,
    /// Decode at the box size instead of the intrinsic size.
    pub auto_resize: bool,
    /// Scale exactly to the size even if the codec cannot.
    pub force_resize: bool,
}

impl ImageSourceKey {
    /// Key of the load-and-probe task for `source`.
    #[must_use]
    pub fn data(source: ImageSourceInfo) -> Self {
        Self {
            kind: KeyKind::Data,
            source,
            size: None,
            fit: ImageFit::default(),
            auto_resize: false,
            force_resize: false,
        }
    }

    /// Key of a canvas-image task.
    #[must_use]
    pub fn canvas(
        source: ImageSourceInfo,
        size: Option<PixelSize>,
        fit: ImageFit,
        auto_resize: bool,
        force_resize: bool,
    ) -> Self {
        Self {
            kind: KeyKind::Canvas,
            source,
            size,
            fit,
            auto_resize,
            force_resize,
        }
    }

    /// Decode size for a source of `intrinsic` size, `None` for a full decode.
    #[must_use]
    pub fn decode_target(&self, intrinsic: PixelSize) -> Option<PixelSize> {
        if !self.auto_resize && !self.force_resize {
            return None;
        }
        let target = self.fit.resize_target(intrinsic, self.size?)?;
        (target != intrinsic).then_some(target)
    }
}

impl std::fmt::Display for ImageSourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)?;
        if self.kind == KeyKind::Data {
            return write!(f, " [data]");
        }
        if let Some(size) = self.size {
            write!(f, " @{size} {:?}", self.fit)?;
        }
        Ok(())
    }
}
