//! Re-encode phase of video jobs
//!
//! The [`Transcoder`] maps a codec label to an encoder, probes the source's
//! duration, runs the encoder through a [`MediaTools`] implementation and turns
//! its `out_time` lines into the upper band of the job's progress scale. On
//! success the re-encoded file replaces the original.
//!
//! - [`CliMediaTools`]: ffprobe + ffmpeg binaries
//! - [`UnavailableMediaTools`]: stub used when either binary is missing
//!
//! Failure at any step ends the job, except for the final replacement, which
//! only produces a warning: the re-encoded file still exists under its
//! suffixed name.

mod cli;
mod progress;
mod traits;
mod unavailable;

pub use cli::CliMediaTools;
pub use progress::{
    ProgressEvents, TranscodeEvent, parse_progress_line, parse_timestamp, phase_percent,
};
pub use traits::{MediaTools, TranscodeExit, TranscodeProcess, TranscodeRequest};
pub use unavailable::UnavailableMediaTools;

use crate::config::TranscodeConfig;
use crate::error::{Error, PostProcessError, Result, TranscodeError};
use crate::progress::{FULL_SCALE, ProgressBudget};
use crate::types::{Codec, Event, PipelineResult};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Successful re-encode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutcome {
    /// Where the re-encoded file lives now
    pub path: PathBuf,
    /// Whether it replaced the original file
    pub replaced: bool,
}

/// `clip.mp4` + `H.264` -> `clip_H.264.mp4`
pub fn suffixed_output_path(source: &Path, codec: Codec) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match source.extension() {
        Some(ext) => format!("{}_{}.{}", stem, codec.label(), ext.to_string_lossy()),
        None => format!("{}_{}", stem, codec.label()),
    };
    source.with_file_name(name)
}

/// Runs the re-encode phase of one job
pub struct Transcoder<'a> {
    tools: &'a dyn MediaTools,
    config: &'a TranscodeConfig,
    budget: &'a ProgressBudget,
    event_tx: &'a broadcast::Sender<Event>,
    phase_floor: u8,
}

impl<'a> Transcoder<'a> {
    /// Create a transcoder whose progress spans `[phase_floor, 100]`
    pub fn new(
        tools: &'a dyn MediaTools,
        config: &'a TranscodeConfig,
        budget: &'a ProgressBudget,
        event_tx: &'a broadcast::Sender<Event>,
        phase_floor: u8,
    ) -> Self {
        Self {
            tools,
            config,
            budget,
            event_tx,
            phase_floor: phase_floor.min(FULL_SCALE),
        }
    }

    fn log(&self, message: impl Into<String>) {
        self.event_tx
            .send(Event::Log {
                message: message.into(),
            })
            .ok();
    }

    /// Re-encode `source` to `codec` and report the terminal result.
    ///
    /// Emits one diagnostic line per failure; never panics or propagates.
    pub async fn reencode(&self, source: &Path, codec: &str) -> PipelineResult {
        match self.run(source, codec).await {
            Ok(outcome) => {
                info!(path = ?outcome.path, replaced = outcome.replaced, "re-encode complete");
                PipelineResult::success(PipelineResult::REENCODE_COMPLETE)
            }
            Err(Error::Transcode(err @ TranscodeError::UnsupportedCodec { .. })) => {
                warn!(error = %err, "re-encode rejected");
                self.log(err.to_string());
                PipelineResult::failure(PipelineResult::UNSUPPORTED_CODEC)
            }
            Err(err) => {
                warn!(error = %err, ?source, "re-encode failed");
                self.log(err.to_string());
                PipelineResult::failure(PipelineResult::REENCODE_FAILED)
            }
        }
    }

    /// Re-encode `source` to `codec`.
    ///
    /// The codec is looked up before anything is spawned. A failed replacement of
    /// the original is logged and reported through [`TranscodeOutcome::replaced`].
    pub async fn run(&self, source: &Path, codec: &str) -> Result<TranscodeOutcome> {
        let codec = Codec::from_label(codec).ok_or_else(|| TranscodeError::UnsupportedCodec {
            codec: codec.to_string(),
        })?;

        let duration = self
            .tools
            .probe_duration(source)
            .await
            .map_err(|e| match e {
                Error::Transcode(TranscodeError::ProbeFailed { .. }) => e,
                other => TranscodeError::ProbeFailed {
                    path: source.to_path_buf(),
                    reason: other.to_string(),
                }
                .into(),
            })?;
        debug!(?source, duration, "probed duration");

        let output = suffixed_output_path(source, codec);
        let request = TranscodeRequest {
            input: source.to_path_buf(),
            output: output.clone(),
            video_encoder: codec.encoder().to_string(),
            audio_encoder: self.config.audio_codec.clone(),
            overwrite: self.config.overwrite,
        };

        info!(
            ?source,
            ?output,
            encoder = codec.encoder(),
            tools = self.tools.name(),
            "starting re-encode"
        );

        let process = self
            .tools
            .spawn_transcode(&request)
            .await
            .map_err(|e| failed(source, e.to_string()))?;

        let mut events = ProgressEvents::new(process);
        loop {
            match events.next().await {
                Ok(Some(TranscodeEvent::Elapsed { seconds })) => {
                    if let Some(percent) = phase_percent(seconds, duration, self.phase_floor) {
                        self.budget.report(percent);
                    }
                }
                Ok(Some(TranscodeEvent::Unparseable { .. })) => {}
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "error reading encoder progress, stopping encoder");
                    if let Err(kill_err) = events.abort().await {
                        warn!(error = %kill_err, "could not stop encoder");
                    }
                    break;
                }
            }
        }

        let exit = events.finish().await.map_err(|e| failed(source, e.to_string()))?;

        if !exit.success() {
            remove_partial_output(&output).await;
            return Err(failed(source, exit.to_string()));
        }

        self.budget.report(FULL_SCALE);

        match replace_original(source, &output).await {
            Ok(()) => Ok(TranscodeOutcome {
                path: source.to_path_buf(),
                replaced: true,
            }),
            Err(err) => {
                warn!(error = %err, "could not replace original file");
                self.log(format!("Warning: Could not replace original file: {}", err));
                Ok(TranscodeOutcome {
                    path: output,
                    replaced: false,
                })
            }
        }
    }
}

fn failed(source: &Path, reason: String) -> Error {
    TranscodeError::Failed {
        path: source.to_path_buf(),
        reason,
    }
    .into()
}

async fn remove_partial_output(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => debug!(?output, "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(?output, error = %e, "could not remove partial output"),
    }
}

/// Delete `original` and move `replacement` to its path
async fn replace_original(original: &Path, replacement: &Path) -> Result<()> {
    let replace_failed = |e: std::io::Error| -> Error {
        PostProcessError::ArtifactReplaceFailed {
            original: original.to_path_buf(),
            replacement: replacement.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    };

    tokio::fs::remove_file(original).await.map_err(replace_failed)?;
    tokio::fs::rename(replacement, original)
        .await
        .map_err(replace_failed)?;
    Ok(())
}
