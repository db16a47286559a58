//! Acquisition step of the pipeline
//!
//! Turns a [`Job`] into a declarative [`FetchOptions`] for the configured
//! [`MediaSource`], feeds its progress reports into the job's
//! [`ProgressTracker`] and works out where the finished file actually ended up.

use crate::config::DownloadConfig;
use crate::error::{Error, FetchError, Result};
use crate::progress::{FULL_SCALE, ProgressTracker};
use crate::source::{FetchOptions, MediaSource, PostProcessor};
use crate::types::{Job, JobKind, MediaInfo, TransferReport};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A finished acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// Final local path of the deliverable
    pub path: PathBuf,
    /// Metadata reported by the source
    pub info: MediaInfo,
}

/// Drives a [`MediaSource`] for one job
pub struct Fetcher<'a> {
    source: &'a dyn MediaSource,
    config: &'a DownloadConfig,
}

impl<'a> Fetcher<'a> {
    /// Create a fetcher over `source`
    pub fn new(source: &'a dyn MediaSource, config: &'a DownloadConfig) -> Self {
        Self { source, config }
    }

    /// Upper bound of the download phase for `job`
    ///
    /// Video jobs that will be re-encoded leave the top of the scale to the
    /// transcode phase. Everything else downloads straight to 100.
    pub fn phase_ceiling(&self, job: &Job) -> u8 {
        if job.wants_transcode() {
            self.config.video_phase_ceiling.min(FULL_SCALE)
        } else {
            FULL_SCALE
        }
    }

    /// Fetch configuration for `job`
    pub fn options_for(&self, job: &Job) -> FetchOptions {
        let output_template = job.output_dir.join(&self.config.output_template);

        match job.kind() {
            JobKind::Video => FetchOptions {
                format: format!("{}+bestaudio/best", job.format),
                output_template,
                merge_output_format: Some(self.config.merge_output_format.clone()),
                postprocessors: Vec::new(),
                write_thumbnail: false,
                no_playlist: self.config.no_playlist,
            },
            JobKind::Audio => FetchOptions {
                format: job.format.clone(),
                output_template,
                merge_output_format: None,
                postprocessors: vec![PostProcessor::ExtractAudio {
                    codec: self.config.audio_format.clone(),
                    quality: self.config.audio_quality.clone(),
                }],
                write_thumbnail: job.embed_thumbnail,
                no_playlist: self.config.no_playlist,
            },
        }
    }

    /// Extension the deliverable carries after post-processing
    fn final_extension(&self, job: &Job) -> &str {
        match job.kind() {
            JobKind::Video => &self.config.merge_output_format,
            JobKind::Audio => &self.config.audio_format,
        }
    }

    /// Download `job`, reporting transfer progress to `tracker`.
    ///
    /// Any failure of the source is returned as [`FetchError`].
    pub async fn fetch(&self, job: &Job, tracker: &ProgressTracker) -> Result<FetchOutcome> {
        let options = self.options_for(job);
        info!(
            url = %job.url,
            source = self.source.name(),
            format = %options.format,
            ceiling = tracker.ceiling(),
            "fetching"
        );

        let on_progress = |report: &TransferReport| {
            tracker.observe(report);
        };

        let materialized = self
            .source
            .fetch(&job.url, &options, &on_progress)
            .await
            .map_err(|e| as_fetch_error(&job.url, e))?;

        let path = resolve_output_path(&materialized.filename, self.final_extension(job));
        debug!(reported = ?materialized.filename, resolved = ?path, "resolved output path");

        Ok(FetchOutcome {
            path,
            info: materialized.info,
        })
    }
}

fn as_fetch_error(url: &str, err: Error) -> Error {
    match err {
        Error::Fetch(_) => err,
        other => FetchError::Failed {
            url: url.to_string(),
            reason: other.to_string(),
        }
        .into(),
    }
}

/// Path of the file a post-processor rewrote to `extension`.
///
/// The fetch tool may report the pre-conversion name. If the rewritten sibling
/// exists it wins, otherwise the reported path is kept.
pub fn resolve_output_path(reported: &Path, extension: &str) -> PathBuf {
    let has_extension = reported
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if has_extension {
        return reported.to_path_buf();
    }

    let candidate = reported.with_extension(extension);
    if candidate.exists() {
        candidate
    } else {
        reported.to_path_buf()
    }
}
