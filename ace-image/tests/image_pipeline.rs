//! Image loading through the provider: merging, cancellation, failures and
//! the canvas image cache.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use ace_core::SizeF;
use ace_image::{
    CanvasImage, ImageDecodeBackend, ImageError, ImageFit, ImageInfo, ImageLoaderConfig,
    ImageLoadingContext, ImageLoadingState, ImageProvider, ImageResult, ImageSourceInfo,
    ImageSourceKey, LoadNotifier, PixelSize, QueuedExecutor, RasterBackend, ResizeMode,
};
use tokio_util::sync::CancellationToken;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ace_image=debug")
        .with_test_writer()
        .try_init();
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}

/// Blocks backend calls until opened.
#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn opened() -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(true),
            opened: Condvar::new(),
        })
    }

    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }

    fn close(&self) {
        *self.open.lock().unwrap() = false;
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
    }
}

/// Counts backend calls and optionally fails every probe.
struct CountingBackend {
    inner: RasterBackend,
    gate: Arc<Gate>,
    probes: AtomicUsize,
    decodes: AtomicUsize,
    fail_with: Option<String>,
}

impl CountingBackend {
    fn new(gate: Arc<Gate>) -> Arc<Self> {
        Arc::new(Self {
            inner: RasterBackend::new(),
            gate,
            probes: AtomicUsize::new(0),
            decodes: AtomicUsize::new(0),
            fail_with: None,
        })
    }

    fn failing(gate: Arc<Gate>, message: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: RasterBackend::new(),
            gate,
            probes: AtomicUsize::new(0),
            decodes: AtomicUsize::new(0),
            fail_with: Some(message.to_string()),
        })
    }

    fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl ImageDecodeBackend for CountingBackend {
    fn probe(&self, bytes: &[u8]) -> ImageResult<ImageInfo> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.gate.wait();
        if let Some(message) = &self.fail_with {
            return Err(ImageError::Decode(message.clone()));
        }
        self.inner.probe(bytes)
    }

    fn decode(
        &self,
        bytes: &[u8],
        target: Option<PixelSize>,
        mode: ResizeMode,
        cancel: &CancellationToken,
    ) -> ImageResult<CanvasImage> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        self.inner.decode(bytes, target, mode, cancel)
    }

    fn best_native_size(&self, bytes: &[u8], target: PixelSize) -> ImageResult<PixelSize> {
        self.inner.best_native_size(bytes, target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    DataReady,
    Success,
    Fail(String),
}

struct Recorder {
    tag: usize,
    log: Arc<Mutex<Vec<(usize, Event)>>>,
}

impl LoadNotifier for Recorder {
    fn on_data_ready(&self, _key: &ImageSourceKey) {
        self.log.lock().unwrap().push((self.tag, Event::DataReady));
    }

    fn on_load_success(&self, _key: &ImageSourceKey) {
        self.log.lock().unwrap().push((self.tag, Event::Success));
    }

    fn on_load_fail(&self, _key: &ImageSourceKey, message: &str) {
        self.log
            .lock()
            .unwrap()
            .push((self.tag, Event::Fail(message.to_string())));
    }
}

fn provider(backend: Arc<dyn ImageDecodeBackend>) -> (Arc<ImageProvider>, Arc<QueuedExecutor>) {
    let executor = Arc::new(QueuedExecutor::new());
    let provider = ImageProvider::with_current_runtime(
        ImageLoaderConfig::default(),
        backend,
        executor.clone(),
    )
    .unwrap();
    (provider, executor)
}

/// Wait for a completion to be posted, then run everything queued.
async fn drain(executor: &QueuedExecutor) -> usize {
    let deadline = Instant::now() + Duration::from_secs(10);
    while executor.pending() == 0 {
        assert!(Instant::now() < deadline, "no completion was posted");
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    executor.run_pending()
}

fn recorded_contexts(
    count: usize,
    source: &ImageSourceInfo,
    provider: &Arc<ImageProvider>,
) -> (Vec<ImageLoadingContext>, Arc<Mutex<Vec<(usize, Event)>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let ctxs = (0..count)
        .map(|tag| {
            ImageLoadingContext::with_notifier(
                source.clone(),
                Arc::clone(provider),
                Arc::new(Recorder {
                    tag,
                    log: Arc::clone(&log),
                }),
            )
        })
        .collect();
    (ctxs, log)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_duplicate_requests_share_one_task() {
    init_tracing();
    let gate = Arc::new(Gate::default());
    let backend = CountingBackend::new(Arc::clone(&gate));
    let (provider, executor) = provider(backend.clone());
    let source = ImageSourceInfo::memory("shared", png_bytes(8, 8));

    let (ctxs, log) = recorded_contexts(5, &source, &provider);
    for ctx in &ctxs {
        ctx.load_image_data();
        assert_eq!(ctx.state(), ImageLoadingState::DataLoading);
    }
    let key = ImageSourceKey::data(source);
    assert_eq!(provider.pending_task_count(), 1);
    assert_eq!(provider.waiting_contexts(&key), 5);

    gate.open();
    drain(&executor).await;

    assert_eq!(backend.probes(), 1);
    let expected: Vec<(usize, Event)> = (0..5).map(|tag| (tag, Event::DataReady)).collect();
    assert_eq!(*log.lock().unwrap(), expected);
    for ctx in &ctxs {
        assert_eq!(ctx.state(), ImageLoadingState::DataReady);
        assert_eq!(ctx.image_size(), Some(PixelSize::new(8, 8)));
    }
    assert_eq!(provider.pending_task_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_duplicate_canvas_requests_share_one_decode() {
    init_tracing();
    let backend = CountingBackend::new(Gate::opened());
    let (provider, executor) = provider(backend.clone());
    let source = ImageSourceInfo::memory("thumb", png_bytes(16, 16));
    let size = SizeF::new(8.0, 8.0);

    let (ctxs, log) = recorded_contexts(4, &source, &provider);
    for ctx in &ctxs {
        ctx.load_image_data();
    }
    drain(&executor).await;
    log.lock().unwrap().clear();

    for ctx in &ctxs {
        assert!(ctx.make_canvas_image_if_need(size, true, ImageFit::Cover, None));
    }
    let key = ctxs[0].canvas_key().unwrap();
    assert!(ctxs.iter().all(|ctx| ctx.canvas_key().as_ref() == Some(&key)));
    assert_eq!(provider.pending_task_count(), 1);
    assert_eq!(provider.waiting_contexts(&key), 4);

    drain(&executor).await;
    assert_eq!(backend.decodes(), 1);
    let expected: Vec<(usize, Event)> = (0..4).map(|tag| (tag, Event::Success)).collect();
    assert_eq!(*log.lock().unwrap(), expected);
    let first = ctxs[0].canvas_image().unwrap();
    assert_eq!(first.size(), PixelSize::new(8, 8));
    for ctx in &ctxs[1..] {
        assert!(Arc::ptr_eq(&first, &ctx.canvas_image().unwrap()));
    }
    assert_eq!(provider.pending_task_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unsized_canvas_request_beside_data_load() {
    init_tracing();
    let gate = Gate::opened();
    let backend = CountingBackend::new(Arc::clone(&gate));
    let (provider, executor) = provider(backend.clone());
    let source = ImageSourceInfo::memory("overlap", png_bytes(16, 16));
    let (ctxs, log) = recorded_contexts(2, &source, &provider);

    ctxs[0].load_image_data();
    drain(&executor).await;
    assert_eq!(ctxs[0].state(), ImageLoadingState::DataReady);

    gate.close();
    ctxs[1].load_image_data();
    assert!(ctxs[0].make_canvas_image_if_need(SizeF::new(8.0, 8.0), false, ImageFit::Cover, None));
    assert_ne!(ctxs[0].canvas_key(), Some(ctxs[1].data_key()));
    assert_eq!(provider.pending_task_count(), 2);

    gate.open();
    while provider.pending_task_count() > 0 {
        drain(&executor).await;
    }

    assert_eq!(ctxs[0].state(), ImageLoadingState::LoadSuccess);
    assert_eq!(
        ctxs[0].canvas_image().unwrap().size(),
        PixelSize::new(16, 16)
    );
    assert_eq!(ctxs[1].state(), ImageLoadingState::DataReady);
    let log = log.lock().unwrap();
    assert!(log.contains(&(0, Event::Success)));
    assert!(log.contains(&(1, Event::DataReady)));
    assert_eq!(log.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_fails_waiting_and_later_requests() {
    init_tracing();
    let gate = Arc::new(Gate::default());
    let backend = CountingBackend::new(Arc::clone(&gate));
    let (provider, executor) = provider(backend.clone());
    let message = ImageError::ShutDown.to_string();

    let (waiting, log) = recorded_contexts(
        1,
        &ImageSourceInfo::memory("in-flight", png_bytes(4, 4)),
        &provider,
    );
    waiting[0].load_image_data();
    provider.shutdown();
    assert_eq!(provider.pending_task_count(), 0);
    executor.run_pending();
    assert_eq!(waiting[0].state(), ImageLoadingState::LoadFail);
    assert_eq!(waiting[0].error_message(), Some(message.clone()));
    assert_eq!(*log.lock().unwrap(), vec![(0, Event::Fail(message.clone()))]);
    gate.open();

    let later = ImageLoadingContext::new(
        ImageSourceInfo::memory("after", png_bytes(4, 4)),
        Arc::clone(&provider),
    );
    later.load_image_data();
    drain(&executor).await;
    assert_eq!(later.state(), ImageLoadingState::LoadFail);
    assert_eq!(later.error_message(), Some(message));
    assert_eq!(provider.pending_task_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropping_every_context_cancels_task() {
    init_tracing();
    let gate = Arc::new(Gate::default());
    let backend = CountingBackend::new(Arc::clone(&gate));
    let (provider, executor) = provider(backend.clone());
    let source = ImageSourceInfo::memory("dropped", png_bytes(4, 4));
    let key = ImageSourceKey::data(source.clone());

    let (ctxs, log) = recorded_contexts(3, &source, &provider);
    for ctx in &ctxs {
        ctx.load_image_data();
    }
    assert!(provider.has_task(&key));

    let clone = ctxs[0].clone();
    drop(ctxs);
    // A clone keeps the first request alive.
    assert_eq!(provider.waiting_contexts(&key), 1);
    drop(clone);
    assert!(!provider.has_task(&key));

    gate.open();
    tokio::time::sleep(Duration::from_millis(50)).await;
    executor.run_pending();
    assert_eq!(provider.pending_task_count(), 0);
    assert!(log.lock().unwrap().is_empty());

    // A new request for the same key starts over.
    let ctx = ImageLoadingContext::new(source, Arc::clone(&provider));
    ctx.load_image_data();
    assert!(provider.has_task(&key));
    drain(&executor).await;
    assert_eq!(ctx.state(), ImageLoadingState::DataReady);
    assert_eq!(provider.pending_task_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_decode_reaches_every_requester() {
    init_tracing();
    let gate = Arc::new(Gate::default());
    let backend = CountingBackend::failing(Arc::clone(&gate), "corrupt header");
    let (provider, executor) = provider(backend.clone());
    let source = ImageSourceInfo::memory("broken", vec![0_u8; 16]);

    let (ctxs, log) = recorded_contexts(2, &source, &provider);
    for ctx in &ctxs {
        ctx.load_image_data();
    }
    gate.open();
    drain(&executor).await;

    let message = "Failed to decode image: corrupt header".to_string();
    assert_eq!(
        *log.lock().unwrap(),
        vec![(0, Event::Fail(message.clone())), (1, Event::Fail(message.clone()))]
    );
    for ctx in &ctxs {
        assert_eq!(ctx.state(), ImageLoadingState::LoadFail);
        assert_eq!(ctx.error_message(), Some(message.clone()));
    }
    assert_eq!(provider.pending_task_count(), 0);
    assert_eq!(backend.probes(), 1);

    // Failures are not retried until the host asks again.
    ctxs[0].load_image_data();
    assert_eq!(ctxs[0].state(), ImageLoadingState::LoadFail);
    ctxs[0].reset_state();
    assert_eq!(ctxs[0].state(), ImageLoadingState::Unloaded);
    assert_eq!(ctxs[0].error_message(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_png_file_loads_and_resizes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("banner.png");
    std::fs::write(&path, png_bytes(40, 20)).unwrap();

    let (provider, executor) = provider(Arc::new(RasterBackend::new()));
    let (ctxs, log) = recorded_contexts(
        1,
        &ImageSourceInfo::parse(&path.to_string_lossy()),
        &provider,
    );
    let ctx = &ctxs[0];

    assert!(!ctx.make_canvas_image_if_need(SizeF::new(20.0, 10.0), true, ImageFit::Contain, None));
    ctx.load_image_data();
    drain(&executor).await;
    assert_eq!(ctx.state(), ImageLoadingState::DataReady);
    assert_eq!(ctx.image_size(), Some(PixelSize::new(40, 20)));

    assert!(ctx.make_canvas_image_if_need(SizeF::new(20.0, 10.0), true, ImageFit::Contain, None));
    assert_eq!(ctx.state(), ImageLoadingState::MakeCanvasImage);
    drain(&executor).await;

    assert_eq!(ctx.state(), ImageLoadingState::LoadSuccess);
    let image = ctx.canvas_image().unwrap();
    assert_eq!(image.size(), PixelSize::new(20, 10));
    assert_eq!(image.pixels[3], 255);
    assert!(image.pixels[0] > 190);
    assert_eq!(
        *log.lock().unwrap(),
        vec![(0, Event::DataReady), (0, Event::Success)]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_resize_skipped_within_size_level() {
    let (provider, executor) = provider(Arc::new(RasterBackend::new()));
    let ctx = ImageLoadingContext::new(
        ImageSourceInfo::memory("levels", png_bytes(40, 20)),
        provider,
    );
    ctx.load_image_data();
    drain(&executor).await;

    let make = |width: f32, fit: ImageFit| {
        ctx.make_canvas_image_if_need(SizeF::new(width, width / 2.0), true, fit, None)
    };
    assert!(make(20.0, ImageFit::Cover));
    drain(&executor).await;

    // Same box, then a box in the same level.
    assert!(!make(20.0, ImageFit::Cover));
    assert!(!make(19.0, ImageFit::Cover));
    assert_eq!(ctx.state(), ImageLoadingState::LoadSuccess);

    // A smaller level re-resizes while the old image stays visible.
    assert!(make(9.0, ImageFit::Cover));
    assert_eq!(ctx.state(), ImageLoadingState::MakeCanvasImage);
    assert!(ctx.canvas_image().is_some());
    // Busy: further requests wait for the current one.
    assert!(!make(4.0, ImageFit::Cover));
    drain(&executor).await;
    assert_eq!(ctx.canvas_image().unwrap().size(), PixelSize::new(10, 5));

    // A changed fit always produces.
    assert!(make(9.0, ImageFit::Fill));
    drain(&executor).await;
    assert_eq!(ctx.state(), ImageLoadingState::LoadSuccess);

    // Empty boxes are skipped without an error.
    assert!(!ctx.make_canvas_image_if_need(SizeF::new(0.0, 0.0), true, ImageFit::Cover, None));
    assert_eq!(ctx.state(), ImageLoadingState::LoadSuccess);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cached_canvas_image_completes_immediately() {
    let backend = CountingBackend::new(Gate::opened());
    let (provider, executor) = provider(backend.clone());
    let source = ImageSourceInfo::memory("cached", png_bytes(16, 16));
    let size = SizeF::new(8.0, 8.0);

    let first = ImageLoadingContext::new(source.clone(), Arc::clone(&provider));
    first.load_image_data();
    drain(&executor).await;
    assert!(first.make_canvas_image_if_need(size, true, ImageFit::Cover, None));
    drain(&executor).await;
    assert_eq!(first.state(), ImageLoadingState::LoadSuccess);
    assert_eq!(backend.decodes(), 1);

    let second = ImageLoadingContext::new(source, Arc::clone(&provider));
    second.load_image_data();
    drain(&executor).await;
    assert!(second.make_canvas_image_if_need(size, true, ImageFit::Cover, None));
    assert_eq!(second.state(), ImageLoadingState::LoadSuccess);
    assert_eq!(backend.decodes(), 1);
    assert_eq!(provider.cache_stats().hits, 1);
    assert!(Arc::ptr_eq(
        &first.canvas_image().unwrap(),
        &second.canvas_image().unwrap()
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_while_loading_discards_result() {
    let gate = Arc::new(Gate::default());
    let backend = CountingBackend::new(Arc::clone(&gate));
    let (provider, executor) = provider(backend.clone());
    let source = ImageSourceInfo::memory("reset", png_bytes(4, 4));
    let (ctxs, log) = recorded_contexts(1, &source, &provider);

    ctxs[0].load_image_data();
    ctxs[0].reset_state();
    assert_eq!(ctxs[0].state(), ImageLoadingState::Unloaded);
    assert_eq!(provider.pending_task_count(), 0);

    gate.open();
    tokio::time::sleep(Duration::from_millis(50)).await;
    executor.run_pending();
    assert_eq!(ctxs[0].state(), ImageLoadingState::Unloaded);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_global_provider_lifecycle() {
    let first = ImageProvider::global().unwrap();
    assert!(Arc::ptr_eq(&first, &ImageProvider::global().unwrap()));

    ImageProvider::shutdown_global();
    let second = ImageProvider::global().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    ImageProvider::shutdown_global();
}

#[test]
fn test_provider_needs_a_runtime() {
    let result = ImageProvider::with_current_runtime(
        ImageLoaderConfig::default(),
        Arc::new(RasterBackend::new()),
        Arc::new(QueuedExecutor::new()),
    );
    assert!(matches!(result, Err(ImageError::Runtime(_))));
}
