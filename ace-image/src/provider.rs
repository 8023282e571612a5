//! De-duplicating registry of image load and decode tasks.
//!
//! Every request is keyed by [`ImageSourceKey`]. The first request for a key
//! starts a background task; later requests for the same key join it. When
//! the task finishes, the result is posted to the owning thread through the
//! [`UiTaskExecutor`], the entry is removed and every context still alive
//! receives the result once, in the order it registered.
//!
//! The registry lock only guards the map. Decoding runs on the tokio blocking
//! pool, at most `max_concurrent_decodes` at a time.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::cache::{CacheStats, ImageCache};
use crate::config::ImageLoaderConfig;
use crate::context::{ContextId, ImageLoadingContext, WeakContext};
use crate::decode::{CanvasImage, ImageDecodeBackend, ImageInfo, RasterBackend, ResizeMode};
use crate::error::{ImageError, ImageResult};
use crate::executor::{InlineExecutor, UiTaskExecutor};
use crate::loader::{load_source_bytes, ImageFormat};
use crate::source::{ImageSourceKey, KeyKind};

static GLOBAL: Mutex<Option<Arc<ImageProvider>>> = Mutex::new(None);

/// Loaded bytes of a source with its header information.
#[derive(Debug, Clone)]
pub struct LoadedData {
    /// Encoded bytes.
    pub bytes: Arc<[u8]>,
    /// Intrinsic size and format.
    pub info: ImageInfo,
}

enum Job {
    Data,
    Canvas(Arc<[u8]>),
}

enum Completion {
    Data(Result<LoadedData, String>),
    Canvas(Result<Arc<CanvasImage>, String>),
}

impl Completion {
    fn failed(is_data: bool, message: String) -> Self {
        if is_data {
            Self::Data(Err(message))
        } else {
            Self::Canvas(Err(message))
        }
    }
}

struct TaskEntry {
    ctxs: Vec<WeakContext>,
    generation: u64,
    cancel: CancellationToken,
    abort: AbortHandle,
}

/// Process-wide task registry and canvas image cache.
pub struct ImageProvider {
    config: ImageLoaderConfig,
    backend: Arc<dyn ImageDecodeBackend>,
    executor: Arc<dyn UiTaskExecutor>,
    runtime: Handle,
    permits: Arc<Semaphore>,
    tasks: Mutex<HashMap<ImageSourceKey, TaskEntry>>,
    cache: Mutex<ImageCache>,
    next_generation: AtomicU64,
}

impl ImageProvider {
    /// Create a provider running its tasks on `runtime`.
    #[must_use]
    pub fn new(
        config: ImageLoaderConfig,
        backend: Arc<dyn ImageDecodeBackend>,
        executor: Arc<dyn UiTaskExecutor>,
        runtime: Handle,
    ) -> Arc<Self> {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_decodes.max(1)));
        let cache = ImageCache::with_config(config.cache.clone());
        Arc::new(Self {
            config,
            backend,
            executor,
            runtime,
            permits,
            tasks: Mutex::new(HashMap::new()),
            cache: Mutex::new(cache),
            next_generation: AtomicU64::new(0),
        })
    }

    /// Create a provider on the runtime of the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Runtime`] outside a tokio runtime.
    pub fn with_current_runtime(
        config: ImageLoaderConfig,
        backend: Arc<dyn ImageDecodeBackend>,
        executor: Arc<dyn UiTaskExecutor>,
    ) -> ImageResult<Arc<Self>> {
        let runtime = Handle::try_current().map_err(|e| ImageError::Runtime(e.to_string()))?;
        Ok(Self::new(config, backend, executor, runtime))
    }

    /// The process-wide provider, created on first use with the default
    /// configuration, the [`RasterBackend`] and an [`InlineExecutor`].
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Runtime`] if it has to be created outside a
    /// tokio runtime.
    pub fn global() -> ImageResult<Arc<Self>> {
        let mut slot = GLOBAL.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(provider) = slot.as_ref() {
            return Ok(Arc::clone(provider));
        }
        let provider = Self::with_current_runtime(
            ImageLoaderConfig::default(),
            Arc::new(RasterBackend::new()),
            Arc::new(InlineExecutor),
        )?;
        debug!("Created global image provider");
        *slot = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Make `provider` the process-wide provider, replacing any previous one.
    pub fn install_global(provider: Arc<Self>) {
        let previous = GLOBAL
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(provider);
        if let Some(previous) = previous {
            previous.shutdown();
        }
    }

    /// Tear down the process-wide provider. The next [`global`](Self::global)
    /// call creates a fresh one.
    pub fn shutdown_global() {
        let provider = GLOBAL.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(provider) = provider {
            provider.shutdown();
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ImageLoaderConfig {
        &self.config
    }

    fn lock_tasks(&self) -> MutexGuard<'_, HashMap<ImageSourceKey, TaskEntry>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cache(&self) -> MutexGuard<'_, ImageCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load and probe the source of `ctx`, joining a task already running
    /// for the same source.
    pub fn load_image_data(self: &Arc<Self>, ctx: &ImageLoadingContext) {
        let key = ctx.data_key();
        self.register(ctx, key, Job::Data);
    }

    /// Produce the canvas image for `key` from `data`.
    ///
    /// A cached image is delivered before this returns.
    pub fn make_canvas_image(
        self: &Arc<Self>,
        ctx: &ImageLoadingContext,
        key: ImageSourceKey,
        data: Arc<[u8]>,
    ) {
        let cached = self.lock_cache().get(&key);
        if let Some(image) = cached {
            debug!("Cache hit for {key}");
            ctx.on_canvas_result(&key, Ok(image));
            return;
        }
        self.register(ctx, key, Job::Canvas(data));
    }

    fn register(self: &Arc<Self>, ctx: &ImageLoadingContext, key: ImageSourceKey, job: Job) {
        let mut tasks = self.lock_tasks();
        if let Some(entry) = tasks.get_mut(&key) {
            if entry.ctxs.iter().all(|c| c.id() != ctx.id()) {
                entry.ctxs.push(ctx.downgrade());
            }
            debug!("Joined task for {key} ({} waiting)", entry.ctxs.len());
            return;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let abort = self.spawn_task(key.clone(), job, generation, cancel.clone());
        debug!("Started task for {key}");
        tasks.insert(
            key,
            TaskEntry {
                ctxs: vec![ctx.downgrade()],
                generation,
                cancel,
                abort,
            },
        );
    }

    fn spawn_task(
        self: &Arc<Self>,
        key: ImageSourceKey,
        job: Job,
        generation: u64,
        cancel: CancellationToken,
    ) -> AbortHandle {
        let provider = Arc::downgrade(self);
        let backend = Arc::clone(&self.backend);
        let permits = Arc::clone(&self.permits);
        let is_data = key.kind == KeyKind::Data;

        let handle = self.runtime.spawn(async move {
            let completion = if let Ok(permit) = permits.acquire_owned().await {
                let task_key = key.clone();
                tokio::task::spawn_blocking(move || {
                    // Held until the decode returns, even if this task is aborted.
                    let _permit = permit;
                    run_job(backend.as_ref(), &task_key, job, &cancel)
                })
                .await
                .unwrap_or_else(|e| {
                    Completion::failed(is_data, format!("decode task failed: {e}"))
                })
            } else {
                warn!("Rejecting {key}: provider is shut down");
                Completion::failed(is_data, ImageError::ShutDown.to_string())
            };
            if let Some(provider) = provider.upgrade() {
                provider.post_completion(key, generation, completion);
            }
        });
        handle.abort_handle()
    }

    fn post_completion(self: &Arc<Self>, key: ImageSourceKey, generation: u64, completion: Completion) {
        let provider = Arc::downgrade(self);
        self.executor.post(Box::new(move || {
            if let Some(provider) = provider.upgrade() {
                provider.complete(&key, generation, completion);
            }
        }));
    }

    fn complete(&self, key: &ImageSourceKey, generation: u64, completion: Completion) {
        if let Completion::Canvas(Ok(image)) = &completion {
            self.lock_cache().insert(key.clone(), Arc::clone(image));
        }

        let ctxs = match self.lock_tasks().entry(key.clone()) {
            Entry::Occupied(entry) if entry.get().generation == generation => entry.remove().ctxs,
            _ => {
                debug!("Discarding result for {key}: no longer requested");
                return;
            }
        };

        deliver(key, &ctxs, &completion);
    }

    /// Withdraw context `id` from the task for `key`. The task is cancelled
    /// once no context waits for it.
    pub fn cancel_request(&self, key: &ImageSourceKey, id: ContextId) {
        let mut tasks = self.lock_tasks();
        let Some(entry) = tasks.get_mut(key) else {
            return;
        };
        entry.ctxs.retain(|c| c.id() != id);
        if !entry.ctxs.is_empty() {
            return;
        }
        if let Some(entry) = tasks.remove(key) {
            debug!(
                "Cancelling task for {key} (cooperative: {})",
                self.backend.supports_cancel()
            );
            entry.cancel.cancel();
            entry.abort.abort();
        }
    }

    /// Cancel every task.
    pub fn cancel_all(&self) {
        let drained: Vec<TaskEntry> = self.lock_tasks().drain().map(|(_, entry)| entry).collect();
        if !drained.is_empty() {
            debug!("Cancelling {} task(s)", drained.len());
        }
        for entry in drained {
            entry.cancel.cancel();
            entry.abort.abort();
        }
    }

    /// Cancel every task, stop accepting decode work and clear the cache.
    ///
    /// Contexts still waiting, and requests made afterwards, fail with
    /// [`ImageError::ShutDown`].
    pub fn shutdown(&self) {
        self.permits.close();
        let drained: Vec<(ImageSourceKey, TaskEntry)> = self.lock_tasks().drain().collect();
        debug!("Shutting down with {} task(s) in flight", drained.len());
        for (key, entry) in drained {
            entry.cancel.cancel();
            entry.abort.abort();
            let ctxs = entry.ctxs;
            self.executor.post(Box::new(move || {
                let message = ImageError::ShutDown.to_string();
                let completion = Completion::failed(key.kind == KeyKind::Data, message);
                deliver(&key, &ctxs, &completion);
            }));
        }
        self.clear_cache();
    }

    /// Number of tasks in flight.
    #[must_use]
    pub fn pending_task_count(&self) -> usize {
        self.lock_tasks().len()
    }

    /// Whether a task for `key` is in flight.
    #[must_use]
    pub fn has_task(&self, key: &ImageSourceKey) -> bool {
        self.lock_tasks().contains_key(key)
    }

    /// Contexts waiting for `key`.
    #[must_use]
    pub fn waiting_contexts(&self, key: &ImageSourceKey) -> usize {
        self.lock_tasks().get(key).map_or(0, |entry| entry.ctxs.len())
    }

    /// Cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    /// Drop every cached canvas image.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }
}

impl std::fmt::Debug for ImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageProvider")
            .field("config", &self.config)
            .field("pending_tasks", &self.pending_task_count())
            .finish_non_exhaustive()
    }
}

fn deliver(key: &ImageSourceKey, ctxs: &[WeakContext], completion: &Completion) {
    debug!("Delivering {key} to {} context(s)", ctxs.len());
    for ctx in ctxs.iter().filter_map(WeakContext::upgrade) {
        match completion {
            Completion::Data(result) => ctx.on_data_result(key, result.clone()),
            Completion::Canvas(result) => ctx.on_canvas_result(key, result.clone()),
        }
    }
}

fn run_job(
    backend: &dyn ImageDecodeBackend,
    key: &ImageSourceKey,
    job: Job,
    cancel: &CancellationToken,
) -> Completion {
    let report = |e: ImageError| {
        warn!("Loading {key} failed: {e}");
        e.to_string()
    };
    match job {
        Job::Data => Completion::Data(load_data(backend, key, cancel).map_err(report)),
        Job::Canvas(bytes) => Completion::Canvas(
            decode_canvas(backend, key, &bytes, cancel)
                .map(Arc::new)
                .map_err(report),
        ),
    }
}

fn load_data(
    backend: &dyn ImageDecodeBackend,
    key: &ImageSourceKey,
    cancel: &CancellationToken,
) -> ImageResult<LoadedData> {
    if cancel.is_cancelled() {
        return Err(ImageError::Cancelled);
    }
    let source = load_source_bytes(&key.source)?;
    let mut info = backend.probe(&source.bytes)?;
    if info.format == ImageFormat::Unknown {
        info.format = source.format;
    }
    Ok(LoadedData {
        bytes: source.bytes,
        info,
    })
}

fn decode_canvas(
    backend: &dyn ImageDecodeBackend,
    key: &ImageSourceKey,
    bytes: &[u8],
    cancel: &CancellationToken,
) -> ImageResult<CanvasImage> {
    if cancel.is_cancelled() {
        return Err(ImageError::Cancelled);
    }
    let info = backend.probe(bytes)?;
    let target = key.decode_target(info.size);
    let native = match target {
        Some(target) if !key.force_resize => backend.best_native_size(bytes, target)?,
        _ => info.size,
    };
    let mode = if key.force_resize {
        ResizeMode::Force
    } else if target.is_some() && native == info.size {
        trace!("No native scale of {} helps {key}", info.size);
        ResizeMode::Force
    } else {
        ResizeMode::Native
    };
    match backend.decode(bytes, target, mode, cancel) {
        Err(ImageError::ResizeUnsupported { width, height }) if mode == ResizeMode::Native => {
            debug!("Retrying {key} with a forced resize to {width}x{height}");
            backend.decode(bytes, target, ResizeMode::Force, cancel)
        }
        result => result,
    }
}
