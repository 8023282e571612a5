//! # Ace Image
//!
//! Image loading for the Ace native engine.
//!
//! Each image component owns an [`ImageLoadingContext`], a small state
//! machine that loads the source bytes, probes their size and produces a
//! [`CanvasImage`] sized for the layout box. The work runs through the
//! [`ImageProvider`], which merges concurrent requests for the same
//! [`ImageSourceKey`], bounds the number of decodes in flight and caches the
//! produced images.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ace_core::SizeF;
//! use ace_image::{
//!     ImageFit, ImageLoaderConfig, ImageLoadingContext, ImageProvider, ImageSourceInfo,
//!     QueuedExecutor, RasterBackend,
//! };
//!
//! # async fn run() -> ace_image::ImageResult<()> {
//! let executor = Arc::new(QueuedExecutor::new());
//! let provider = ImageProvider::with_current_runtime(
//!     ImageLoaderConfig::default(),
//!     Arc::new(RasterBackend::new()),
//!     executor.clone(),
//! )?;
//!
//! let ctx = ImageLoadingContext::new(ImageSourceInfo::parse("/tmp/photo.jpg"), provider);
//! ctx.load_image_data();
//!
//! // On every UI tick:
//! executor.run_pending();
//! ctx.make_canvas_image_if_need(SizeF::new(120.0, 80.0), true, ImageFit::Cover, None);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod context;
pub mod decode;
pub mod error;
pub mod executor;
pub mod fit;
pub mod loader;
pub mod provider;
pub mod source;
pub mod state;

pub use cache::{CacheStats, ImageCache, ImageCacheConfig};
pub use config::ImageLoaderConfig;
pub use context::{ContextId, ImageLoadingContext, LoadNotifier};
pub use decode::{
    jpeg_native_size, CanvasImage, ImageDecodeBackend, ImageInfo, RasterBackend, ResizeMode,
};
pub use error::{ImageError, ImageResult};
pub use executor::{InlineExecutor, QueuedExecutor, UiTask, UiTaskExecutor};
pub use fit::{round_up, ImageFit, PixelSize};
pub use loader::{load_source_bytes, parse_data_uri, DataUri, ImageFormat, SourceBytes};
pub use provider::{ImageProvider, LoadedData};
pub use source::{ImageSourceInfo, ImageSourceKey, KeyKind};
pub use state::{next_state, ImageLoadingCommand, ImageLoadingState, ImageStateManager, TRANSITIONS};
