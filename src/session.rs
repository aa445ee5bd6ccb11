use futures_util::{Stream, StreamExt};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::classifier::{classify, Action};
use crate::client::GenClient;
use crate::config::SessionConfig;
use crate::decoder::FrameDecoder;
use crate::error::{GenError, RecoveredError, Result};
use crate::materializer::ImageMaterializer;
use crate::observer::{NoopObserver, Stage, StageObserver};
use crate::parser::ParseOutcome;
use crate::request::JobRequest;
use crate::state::JobProgressState;
use crate::types::{UpdateFrame, UpdateType};

/// Counters for a completed submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSummary {
    /// Frames decoded and handled.
    pub frames: usize,
    /// Errors recovered from along the way (bad segments, unknown kinds,
    /// unusable images).
    pub recovered: usize,
    /// Whether the server sent a `finished` frame before closing the stream.
    pub finished_seen: bool,
}

/// Marks the session busy for as long as it is alive.
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(Arc::clone(flag)))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs generation jobs one at a time and mirrors their progress.
///
/// Each [`submit`](Self::submit) resets the [`JobProgressState`], posts the job,
/// and reads the response body until the server closes it. Every frame's
/// effect is published before the next one is looked at; readers get
/// consistent snapshots through [`subscribe`](Self::subscribe).
///
/// The session is cheap to clone. Clones share the same state and running
/// flag, so [`cancel`](Self::cancel) and [`skip`](Self::skip) can be called
/// from another task while a submission is in flight.
///
/// # Example
/// ```no_run
/// use imagegen_stream::{GenerationSession, JobRequest, SessionConfig};
///
/// # async fn example() -> imagegen_stream::Result<()> {
/// let session = GenerationSession::new(SessionConfig::default())?;
/// let mut updates = session.subscribe();
///
/// tokio::spawn(async move {
///     while updates.changed().await.is_ok() {
///         let state = updates.borrow_and_update();
///         println!("{:?} {:?}", state.status.title, state.status.percentage);
///     }
/// });
///
/// let summary = session.submit(&JobRequest::new("a red fox in snow")).await?;
/// println!("{} frames, {} images", summary.frames, session.snapshot().gallery.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GenerationSession {
    client: GenClient,
    config: SessionConfig,
    materializer: ImageMaterializer,
    running: Arc<AtomicBool>,
    state: Arc<watch::Sender<JobProgressState>>,
    observer: Arc<dyn StageObserver>,
}

impl std::fmt::Debug for GenerationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationSession")
            .field("endpoint", &self.client.endpoint())
            .field("gallery_order", &self.config.gallery_order)
            .field("running", &self.is_running())
            .finish()
    }
}

impl GenerationSession {
    /// Create a session with its own HTTP client built from `config`.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let client = GenClient::from_config(&config)?;
        Ok(Self::with_client(client, config))
    }

    /// Create a session around an existing client.
    pub fn with_client(client: GenClient, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(JobProgressState::new());
        Self {
            client,
            config,
            materializer: ImageMaterializer::new(),
            running: Arc::new(AtomicBool::new(false)),
            state: Arc::new(state),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Install an observer for stage timings and recovered errors.
    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn client(&self) -> &GenClient {
        &self.client
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Receive a notification each time a frame changes the progress state.
    pub fn subscribe(&self) -> watch::Receiver<JobProgressState> {
        self.state.subscribe()
    }

    /// Copy of the current progress state.
    pub fn snapshot(&self) -> JobProgressState {
        self.state.borrow().clone()
    }

    /// Submit a job and follow its update stream to the end.
    ///
    /// Returns [`GenError::AlreadyRunning`] without touching any state if a
    /// submission is still in flight. Transport failures end the submission
    /// with an error; problems inside the stream are recovered and counted.
    pub async fn submit(&self, request: &JobRequest) -> Result<JobSummary> {
        let _guard = RunGuard::acquire(&self.running).ok_or(GenError::AlreadyRunning)?;
        request.validate()?;
        self.state.send_modify(JobProgressState::reset);

        debug!(?request, "submitting image generation job");
        let resp = self.client.open_stream(request).await.map_err(|e| {
            warn!("Image generation request failed: {}", e);
            e
        })?;

        let body = resp.bytes_stream().map(|chunk| {
            chunk.map_err(|e| GenError::Network {
                context: "Update stream interrupted".into(),
                source: e,
            })
        });
        self.drive(body).await
    }

    /// Like [`submit`](Self::submit), but reads updates from an already open
    /// byte stream instead of posting a request.
    pub async fn submit_stream<S, B>(&self, stream: S) -> Result<JobSummary>
    where
        S: Stream<Item = Result<B>>,
        B: AsRef<[u8]>,
    {
        let _guard = RunGuard::acquire(&self.running).ok_or(GenError::AlreadyRunning)?;
        self.state.send_modify(JobProgressState::reset);
        self.drive(stream).await
    }

    /// Ask the server to cancel the job. Failures are logged, not returned.
    pub async fn cancel(&self) {
        if let Err(e) = self.client.cancel().await {
            warn!("Error canceling image generation: {}", e);
        }
    }

    /// Ask the server to skip the current image. Failures are logged, not returned.
    pub async fn skip(&self) {
        if let Err(e) = self.client.skip().await {
            warn!("Error skipping image generation: {}", e);
        }
    }

    async fn drive<S, B>(&self, stream: S) -> Result<JobSummary>
    where
        S: Stream<Item = Result<B>>,
        B: AsRef<[u8]>,
    {
        let mut stream = std::pin::pin!(stream);
        let mut decoder = FrameDecoder::new();
        let mut summary = JobSummary::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                warn!("Update stream failed: {}", e);
                e
            })?;
            let started = Instant::now();
            let outcome = decoder.feed(chunk.as_ref());
            self.observer.on_stage(Stage::Decode, started.elapsed());
            self.handle_outcome(outcome, &mut summary);
        }

        if self.config.flush_on_end {
            let outcome = decoder.finish();
            self.handle_outcome(outcome, &mut summary);
        } else if !decoder.pending().trim().is_empty() {
            debug!(
                "Discarding {} bytes of undelimited text at end of stream",
                decoder.pending().len()
            );
        }

        info!(
            frames = summary.frames,
            recovered = summary.recovered,
            finished = summary.finished_seen,
            "Stream complete"
        );
        Ok(summary)
    }

    fn handle_outcome(&self, outcome: ParseOutcome, summary: &mut JobSummary) {
        for error in outcome.errors {
            self.report(error.into(), summary);
        }
        for frame in outcome.frames {
            self.handle_frame(frame, summary);
        }
    }

    fn handle_frame(&self, frame: UpdateFrame, summary: &mut JobSummary) {
        summary.frames += 1;
        let finished = frame.update_type == UpdateType::Finished;

        let started = Instant::now();
        let action = classify(frame);
        self.observer.on_stage(Stage::Classify, started.elapsed());

        if let Action::Unexpected(kind) = action {
            self.report(kind.into(), summary);
            return;
        }

        let started = Instant::now();
        let (change, errors) = action.resolve(&self.materializer);
        self.observer.on_stage(Stage::Materialize, started.elapsed());
        for error in errors {
            self.report(error.into(), summary);
        }

        let started = Instant::now();
        let order = self.config.gallery_order;
        self.state.send_if_modified(|state| state.apply(change, order));
        self.observer.on_stage(Stage::Apply, started.elapsed());

        if finished {
            summary.finished_seen = true;
            debug!("Server reported the job finished; reading until the stream closes");
        }
    }

    fn report(&self, error: RecoveredError, summary: &mut JobSummary) {
        warn!("Recovered from bad update: {}", error);
        self.observer.on_recovered(&error);
        summary.recovered += 1;
    }
}
