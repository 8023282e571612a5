//! One image request as seen by its host component.
//!
//! An [`ImageLoadingContext`] drives an [`ImageStateManager`] and runs the
//! entry hook of every state it enters: loading data and producing canvas
//! images through the [`ImageProvider`], and notifying the host through its
//! [`LoadNotifier`]. Hooks run after the context lock is released, so a
//! notifier may call back into the context.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use ace_core::SizeF;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::decode::CanvasImage;
use crate::fit::{round_up, ImageFit, PixelSize};
use crate::provider::{ImageProvider, LoadedData};
use crate::source::{ImageSourceInfo, ImageSourceKey};
use crate::state::{ImageLoadingCommand, ImageLoadingState, ImageStateManager};

/// Unique identifier of a loading context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Create a new random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callbacks a host registers to learn about load progress. It is expected to
/// schedule a repaint from them.
#[allow(unused_variables)]
pub trait LoadNotifier: Send + Sync {
    /// The source bytes were loaded and probed.
    fn on_data_ready(&self, key: &ImageSourceKey) {}

    /// A canvas image is available.
    fn on_load_success(&self, key: &ImageSourceKey) {}

    /// Loading or decoding failed.
    fn on_load_fail(&self, key: &ImageSourceKey, message: &str) {}
}

/// Parameters of the last canvas image production.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SizeRequest {
    dst_size: SizeF,
    auto_resize: bool,
    fit: ImageFit,
    source_size: Option<SizeF>,
    level: Option<u32>,
}

impl SizeRequest {
    fn same_params(&self, auto_resize: bool, fit: ImageFit, source_size: Option<SizeF>) -> bool {
        self.auto_resize == auto_resize && self.fit == fit && self.source_size == source_size
    }
}

struct ContextInner {
    state: ImageStateManager,
    notifier: Option<Arc<dyn LoadNotifier>>,
    data: Option<LoadedData>,
    canvas_key: Option<ImageSourceKey>,
    canvas_image: Option<Arc<CanvasImage>>,
    last_request: Option<SizeRequest>,
    failure: Option<(ImageSourceKey, String)>,
    /// Keys registered with the provider and not yet delivered.
    pending: Vec<ImageSourceKey>,
}

pub(crate) struct ContextShared {
    id: ContextId,
    source: ImageSourceInfo,
    provider: Arc<ImageProvider>,
    inner: Mutex<ContextInner>,
}

impl Drop for ContextShared {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        for key in inner.pending.drain(..) {
            trace!("Context {} dropped while waiting for {key}", self.id);
            self.provider.cancel_request(&key, self.id);
        }
    }
}

/// Registry-side reference to a context; does not keep it alive.
pub(crate) struct WeakContext {
    id: ContextId,
    shared: Weak<ContextShared>,
}

impl WeakContext {
    pub(crate) fn id(&self) -> ContextId {
        self.id
    }

    pub(crate) fn upgrade(&self) -> Option<ImageLoadingContext> {
        self.shared
            .upgrade()
            .map(|shared| ImageLoadingContext { shared })
    }
}

/// Loading state of one image source.
///
/// Clones share the same request. When the last clone is dropped, work still
/// pending for it is cancelled.
#[derive(Clone)]
pub struct ImageLoadingContext {
    shared: Arc<ContextShared>,
}

impl ImageLoadingContext {
    /// Create an unloaded context for `source`.
    #[must_use]
    pub fn new(source: ImageSourceInfo, provider: Arc<ImageProvider>) -> Self {
        Self {
            shared: Arc::new(ContextShared {
                id: ContextId::new(),
                source,
                provider,
                inner: Mutex::new(ContextInner {
                    state: ImageStateManager::new(),
                    notifier: None,
                    data: None,
                    canvas_key: None,
                    canvas_image: None,
                    last_request: None,
                    failure: None,
                    pending: Vec::new(),
                }),
            }),
        }
    }

    /// Create a context that reports to `notifier`.
    #[must_use]
    pub fn with_notifier(
        source: ImageSourceInfo,
        provider: Arc<ImageProvider>,
        notifier: Arc<dyn LoadNotifier>,
    ) -> Self {
        let ctx = Self::new(source, provider);
        ctx.set_notifier(Some(notifier));
        ctx
    }

    /// Replace the notifier.
    pub fn set_notifier(&self, notifier: Option<Arc<dyn LoadNotifier>>) {
        self.lock().notifier = notifier;
    }

    fn lock(&self) -> MutexGuard<'_, ContextInner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn downgrade(&self) -> WeakContext {
        WeakContext {
            id: self.shared.id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Identifier of this request.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.shared.id
    }

    /// The source being loaded.
    #[must_use]
    pub fn source(&self) -> &ImageSourceInfo {
        &self.shared.source
    }

    /// Key of the load-and-probe task.
    #[must_use]
    pub fn data_key(&self) -> ImageSourceKey {
        ImageSourceKey::data(self.shared.source.clone())
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ImageLoadingState {
        self.lock().state.state()
    }

    /// Latest canvas image, kept while a re-resize is in flight.
    #[must_use]
    pub fn canvas_image(&self) -> Option<Arc<CanvasImage>> {
        self.lock().canvas_image.clone()
    }

    /// Intrinsic size once the data is ready.
    #[must_use]
    pub fn image_size(&self) -> Option<PixelSize> {
        self.lock().data.as_ref().map(|data| data.info.size)
    }

    /// Message of the last failure.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.lock().failure.as_ref().map(|(_, message)| message.clone())
    }

    /// Key of the current canvas image request.
    #[must_use]
    pub fn canvas_key(&self) -> Option<ImageSourceKey> {
        self.lock().canvas_key.clone()
    }

    /// Start loading the source. Ignored unless unloaded.
    pub fn load_image_data(&self) {
        self.apply(ImageLoadingCommand::LoadData);
    }

    /// Drop the loaded data and image, cancelling pending work.
    pub fn reset_state(&self) {
        self.apply(ImageLoadingCommand::ResetState);
    }

    /// Produce a canvas image for a layout box of `dst_size` if the current
    /// one does not fit it. Returns `true` iff production was started.
    ///
    /// The first call after the data is ready always produces, as does a
    /// change of `auto_resize`, `fit` or `source_size`. Otherwise the call is
    /// skipped when `dst_size` is unchanged or rounds to the same size level
    /// as the current image. `source_size`, when set, is the decode size
    /// instead of `dst_size`.
    pub fn make_canvas_image_if_need(
        &self,
        dst_size: SizeF,
        auto_resize: bool,
        fit: ImageFit,
        source_size: Option<SizeF>,
    ) -> bool {
        let mut inner = self.lock();
        let Some(intrinsic) = inner.data.as_ref().map(|data| data.info.size) else {
            return false;
        };
        if !matches!(
            inner.state.state(),
            ImageLoadingState::DataReady | ImageLoadingState::LoadSuccess
        ) {
            return false;
        }
        let Some(requested) = PixelSize::from_layout(source_size.unwrap_or(dst_size)) else {
            trace!("Skipping canvas image for empty size {dst_size:?}");
            return false;
        };
        let level = round_up(intrinsic.width, requested.width);

        if let Some(last) = inner.last_request {
            if last.same_params(auto_resize, fit, source_size)
                && (last.dst_size == dst_size || level.is_none() || level == last.level)
            {
                trace!("Canvas image for {dst_size:?} already at level {level:?}");
                return false;
            }
        }

        let entered = inner.state.handle_command(ImageLoadingCommand::MakeCanvasImage);
        if entered.is_none() {
            return false;
        }
        let explicit_size = source_size.is_some();
        inner.canvas_key = Some(ImageSourceKey::canvas(
            self.shared.source.clone(),
            (auto_resize || explicit_size).then_some(requested),
            fit,
            auto_resize,
            explicit_size,
        ));
        inner.last_request = Some(SizeRequest {
            dst_size,
            auto_resize,
            fit,
            source_size,
            level,
        });
        drop(inner);
        self.run_hooks(entered);
        true
    }

    /// Deliver the result of the load-and-probe task.
    pub(crate) fn on_data_result(&self, key: &ImageSourceKey, result: Result<LoadedData, String>) {
        let entered = {
            let mut inner = self.lock();
            inner.pending.retain(|k| k != key);
            let command = if result.is_ok() {
                ImageLoadingCommand::LoadDataSuccess
            } else {
                ImageLoadingCommand::LoadFail
            };
            let entered = inner.state.handle_command(command);
            if entered.is_some() {
                match result {
                    Ok(data) => {
                        inner.data = Some(data);
                        inner.last_request = None;
                    }
                    Err(message) => inner.failure = Some((key.clone(), message)),
                }
            }
            entered
        };
        self.run_hooks(entered);
    }

    /// Deliver a canvas image or its failure.
    pub(crate) fn on_canvas_result(
        &self,
        key: &ImageSourceKey,
        result: Result<Arc<CanvasImage>, String>,
    ) {
        let entered = {
            let mut inner = self.lock();
            inner.pending.retain(|k| k != key);
            if inner.canvas_key.as_ref() != Some(key) {
                debug!("Ignoring stale canvas image {key}");
                return;
            }
            let command = if result.is_ok() {
                ImageLoadingCommand::MakeCanvasImageSuccess
            } else {
                ImageLoadingCommand::LoadFail
            };
            let entered = inner.state.handle_command(command);
            if entered.is_some() {
                match result {
                    Ok(image) => inner.canvas_image = Some(image),
                    Err(message) => inner.failure = Some((key.clone(), message)),
                }
            }
            entered
        };
        self.run_hooks(entered);
    }

    fn apply(&self, command: ImageLoadingCommand) {
        let entered = self.lock().state.handle_command(command);
        self.run_hooks(entered);
    }

    fn run_hooks(&self, entered: Option<ImageLoadingState>) {
        match entered {
            Some(ImageLoadingState::Unloaded) => self.on_unloaded(),
            Some(ImageLoadingState::DataLoading) => self.on_data_loading(),
            Some(ImageLoadingState::DataReady) => self.on_data_ready(),
            Some(ImageLoadingState::MakeCanvasImage) => self.on_make_canvas_image(),
            Some(ImageLoadingState::LoadSuccess) => self.on_load_success(),
            Some(ImageLoadingState::LoadFail) => self.on_load_fail(),
            None => {}
        }
    }

    fn on_unloaded(&self) {
        let pending = {
            let mut inner = self.lock();
            inner.data = None;
            inner.canvas_key = None;
            inner.canvas_image = None;
            inner.last_request = None;
            inner.failure = None;
            std::mem::take(&mut inner.pending)
        };
        for key in &pending {
            self.shared.provider.cancel_request(key, self.shared.id);
        }
    }

    fn on_data_loading(&self) {
        let key = self.data_key();
        self.lock().pending.push(key);
        self.shared.provider.load_image_data(self);
    }

    fn on_data_ready(&self) {
        let notifier = self.lock().notifier.clone();
        if let Some(notifier) = notifier {
            notifier.on_data_ready(&self.data_key());
        }
    }

    fn on_make_canvas_image(&self) {
        let (key, bytes) = {
            let mut inner = self.lock();
            let key = inner.canvas_key.clone();
            let bytes = inner.data.as_ref().map(|data| Arc::clone(&data.bytes));
            if let Some(key) = &key {
                inner.pending.push(key.clone());
            }
            (key, bytes)
        };
        match (key, bytes) {
            (Some(key), Some(bytes)) => self.shared.provider.make_canvas_image(self, key, bytes),
            (key, _) => {
                let key = key.unwrap_or_else(|| self.data_key());
                warn!("No data to make a canvas image for {key}");
                let entered = {
                    let mut inner = self.lock();
                    inner.pending.retain(|k| k != &key);
                    inner.failure = Some((key, "image data not loaded".to_string()));
                    inner.state.handle_command(ImageLoadingCommand::LoadFail)
                };
                self.run_hooks(entered);
            }
        }
    }

    fn on_load_success(&self) {
        let (notifier, key) = {
            let inner = self.lock();
            (inner.notifier.clone(), inner.canvas_key.clone())
        };
        if let (Some(notifier), Some(key)) = (notifier, key) {
            notifier.on_load_success(&key);
        }
    }

    fn on_load_fail(&self) {
        let (notifier, failure) = {
            let inner = self.lock();
            (inner.notifier.clone(), inner.failure.clone())
        };
        if let (Some(notifier), Some((key, message))) = (notifier, failure) {
            notifier.on_load_fail(&key, &message);
        }
    }
}

impl std::fmt::Debug for ImageLoadingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoadingContext")
            .field("id", &self.shared.id)
            .field("source", &self.shared.source.to_string())
            .field("state", &self.state())
            .finish()
    }
}
