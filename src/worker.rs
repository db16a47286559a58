//! Per-job pipeline controller
//!
//! A [`DownloadWorker`] owns one [`Job`] and runs it on its own tokio task:
//! fetch, then either the re-encode phase (video jobs with a target codec) or
//! the best-effort cover art phase (audio jobs that asked for it).
//!
//! Observers see three signals on the broadcast channel: log lines, progress
//! percentages and exactly one terminal [`Event::Finished`]. The terminal result
//! is also delivered through [`JobHandle::finished`].
//!
//! Audio jobs report success as soon as the audio file exists. Cover art is
//! resolved and embedded afterwards and only ever produces diagnostics.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::progress::{FULL_SCALE, ProgressBudget, ProgressTracker};
use crate::source::{CliMediaSource, MediaSource, UnavailableMediaSource};
use crate::tagging::TagEmbedder;
use crate::thumbnail::ThumbnailResolver;
use crate::transcode::{CliMediaTools, MediaTools, Transcoder, UnavailableMediaTools};
use crate::types::{Event, Job, JobKind, JobState, PipelineResult};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Runs one job end to end
pub struct DownloadWorker {
    job: Job,
    config: Arc<Config>,
    source: Arc<dyn MediaSource>,
    tools: Arc<dyn MediaTools>,
    event_tx: broadcast::Sender<Event>,
}

impl DownloadWorker {
    /// Create a worker for `job` using the given capabilities.
    ///
    /// Fails if `config` does not validate.
    pub fn new(
        job: Job,
        config: Config,
        source: Arc<dyn MediaSource>,
        tools: Arc<dyn MediaTools>,
    ) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(config.events.channel_capacity);

        Ok(Self {
            job,
            config: Arc::new(config),
            source,
            tools,
            event_tx,
        })
    }

    /// Create a worker backed by the yt-dlp and ffmpeg binaries.
    ///
    /// Binaries come from [`crate::config::ToolsConfig`] or a PATH search. A missing
    /// binary does not fail construction: the affected phase fails when it runs.
    pub fn with_default_tools(job: Job, config: Config) -> Result<Self> {
        let source: Arc<dyn MediaSource> = match CliMediaSource::from_config(&config.tools) {
            Some(source) => Arc::new(source),
            None => Arc::new(UnavailableMediaSource),
        };
        let tools: Arc<dyn MediaTools> = match CliMediaTools::from_config(&config.tools) {
            Some(tools) => Arc::new(tools),
            None => Arc::new(UnavailableMediaTools),
        };

        info!(
            source = source.name(),
            tools = tools.name(),
            "media capabilities initialized"
        );

        Self::new(job, config, source, tools)
    }

    /// The job this worker runs
    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Subscribe to the job's events
    ///
    /// Subscribe before [`DownloadWorker::start`] to see every event. A subscriber
    /// that falls more than `channel_capacity` events behind receives
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run the job on a new tokio task
    pub fn start(self) -> JobHandle {
        let (result_tx, result_rx) = oneshot::channel();
        let event_tx = self.event_tx.clone();
        let task = tokio::spawn(self.run(result_tx));

        JobHandle {
            result_rx: Some(result_rx),
            result: None,
            task,
            event_tx,
        }
    }

    async fn run(self, result_tx: oneshot::Sender<PipelineResult>) -> PipelineResult {
        let pipeline = Pipeline {
            job: &self.job,
            config: &self.config,
            source: self.source.as_ref(),
            tools: self.tools.as_ref(),
            event_tx: &self.event_tx,
            budget: Arc::new(ProgressBudget::new(self.event_tx.clone())),
            result_tx: Some(result_tx),
        };
        pipeline.run().await
    }
}

/// State of one running job
struct Pipeline<'a> {
    job: &'a Job,
    config: &'a Config,
    source: &'a dyn MediaSource,
    tools: &'a dyn MediaTools,
    event_tx: &'a broadcast::Sender<Event>,
    budget: Arc<ProgressBudget>,
    /// Taken by the single terminal emission
    result_tx: Option<oneshot::Sender<PipelineResult>>,
}

impl Pipeline<'_> {
    fn log(&self, message: impl Into<String>) {
        self.event_tx
            .send(Event::Log {
                message: message.into(),
            })
            .ok();
    }

    fn set_state(&self, state: JobState) {
        info!(url = %self.job.url, ?state, "job state changed");
        self.event_tx.send(Event::StateChanged { state }).ok();
    }

    /// Emit the terminal result; later calls are ignored
    fn finish(&mut self, result: PipelineResult) -> PipelineResult {
        let Some(result_tx) = self.result_tx.take() else {
            warn!(url = %self.job.url, "terminal result already emitted");
            return result;
        };

        info!(
            url = %self.job.url,
            success = result.success,
            message = %result.message,
            "job finished"
        );
        self.event_tx
            .send(Event::Finished {
                success: result.success,
                message: result.message.clone(),
            })
            .ok();
        // The caller may have dropped its handle
        result_tx.send(result.clone()).ok();
        result
    }

    async fn run(mut self) -> PipelineResult {
        self.log(format!(
            "Starting download...\nFormat: {}\nCodec: {}",
            self.job.format, self.job.codec
        ));
        if self.job.wants_thumbnail() {
            self.log("Will download and embed thumbnail");
        }

        let fetcher = Fetcher::new(self.source, &self.config.download);
        let ceiling = fetcher.phase_ceiling(self.job);
        let tracker = ProgressTracker::new(ceiling, Arc::clone(&self.budget));

        self.set_state(JobState::Fetching);
        let outcome = match fetcher.fetch(self.job, &tracker).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(url = %self.job.url, error = %e, "fetch failed");
                self.log(format!("Error: {}", e));
                self.set_state(JobState::Finished);
                return self.finish(PipelineResult::failure(PipelineResult::DOWNLOAD_FAILED));
            }
        };
        info!(path = ?outcome.path, title = outcome.info.display_title(), "fetch complete");

        match self.job.kind() {
            JobKind::Video if self.job.wants_transcode() => {
                self.set_state(JobState::Transcoding);
                let result = Transcoder::new(
                    self.tools,
                    &self.config.transcode,
                    &self.budget,
                    self.event_tx,
                    ceiling,
                )
                .reencode(&outcome.path, &self.job.codec)
                .await;
                self.set_state(JobState::Finished);
                self.finish(result)
            }
            JobKind::Video => {
                self.budget.report(FULL_SCALE);
                self.set_state(JobState::Finished);
                self.finish(PipelineResult::success(PipelineResult::DOWNLOAD_COMPLETE))
            }
            JobKind::Audio => {
                self.budget.report(FULL_SCALE);
                if !self.job.wants_thumbnail() {
                    self.set_state(JobState::Finished);
                    return self.finish(PipelineResult::success(PipelineResult::DOWNLOAD_COMPLETE));
                }

                let result =
                    self.finish(PipelineResult::success(PipelineResult::DOWNLOAD_COMPLETE));
                self.attach_cover_art(&outcome.path).await;
                self.set_state(JobState::Finished);
                result
            }
        }
    }

    /// Resolve and embed the thumbnail of `audio`, reporting only diagnostics
    async fn attach_cover_art(&self, audio: &Path) {
        self.set_state(JobState::ResolvingArt);
        let Some(artifact) = ThumbnailResolver::new(self.event_tx).resolve(audio).await else {
            self.log("Thumbnail file not found or conversion failed");
            return;
        };

        self.set_state(JobState::Embedding);
        match TagEmbedder::new().embed(audio, &artifact).await {
            Ok(()) => self.log("Thumbnail embedded successfully"),
            Err(e) => {
                warn!(?audio, error = %e, "cover art embedding failed");
                self.log(format!("Failed to embed thumbnail: {}", e));
            }
        }
    }
}

/// Handle to a started job
pub struct JobHandle {
    result_rx: Option<oneshot::Receiver<PipelineResult>>,
    result: Option<PipelineResult>,
    task: JoinHandle<PipelineResult>,
    event_tx: broadcast::Sender<Event>,
}

impl JobHandle {
    /// Subscribe to the job's remaining events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Wait for the terminal result.
    ///
    /// For audio jobs this returns before cover art handling is done; use
    /// [`JobHandle::join`] to wait for that as well.
    pub async fn finished(&mut self) -> Result<PipelineResult> {
        if let Some(result) = &self.result {
            return Ok(result.clone());
        }

        let rx = self
            .result_rx
            .take()
            .ok_or_else(|| Error::Worker("result channel already consumed".to_string()))?;
        let result = rx
            .await
            .map_err(|_| Error::Worker("worker ended without a result".to_string()))?;
        self.result = Some(result.clone());
        Ok(result)
    }

    /// Wait for the worker task to exit and return the terminal result
    pub async fn join(self) -> Result<PipelineResult> {
        self.task.await.map_err(|e| Error::Worker(e.to_string()))
    }

    /// Whether the worker task has exited
    pub fn is_done(&self) -> bool {
        self.task.is_finished()
    }
}
