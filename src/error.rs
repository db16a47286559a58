//! Error types for media-dl
//!
//! This module provides the error taxonomy for the download pipeline:
//! - Fetch errors (network, extraction or post-processing inside the fetch tool)
//! - Transcode errors (duration probe, codec lookup, encoder exit status)
//! - Post-processing errors (artifact replacement, thumbnail conversion, tag embedding)
//!
//! Only fetch and transcode errors are terminal for a job. Post-processing errors are
//! reported as diagnostics and never change a job's outcome.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "output_template")
        key: Option<String>,
    },

    /// Acquisition of the remote resource failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Re-encoding failed
    #[error("transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    /// Best-effort post-processing failed (never terminal)
    #[error("post-processing error: {0}")]
    PostProcess(#[from] PostProcessError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (yt-dlp, ffmpeg, ffprobe)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, not implemented, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The worker task ended without delivering a result (panicked or was aborted)
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl Error {
    /// Whether this error ends a job with a failed result.
    ///
    /// Post-processing errors are downgraded to diagnostics by the worker.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Error::PostProcess(_))
    }
}

/// Errors raised while acquiring the media resource
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch tool reported a failure
    #[error("failed to fetch {url}: {reason}")]
    Failed {
        /// Source URL of the job
        url: String,
        /// The reason reported by the fetch tool
        reason: String,
    },

    /// The fetch tool exited cleanly but never reported an output file
    #[error("fetch of {url} produced no output file")]
    MissingOutput {
        /// Source URL of the job
        url: String,
    },
}

/// Errors raised by the re-encode phase
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Duration probe failed or printed something that is not a number
    #[error("failed to get duration of {path}: {reason}")]
    ProbeFailed {
        /// File that was probed
        path: PathBuf,
        /// Why the probe failed
        reason: String,
    },

    /// The requested codec has no encoder mapping
    #[error("unsupported codec: {codec}")]
    UnsupportedCodec {
        /// The codec label as requested
        codec: String,
    },

    /// The encoder process exited unsuccessfully
    #[error("re-encoding of {path} failed: {reason}")]
    Failed {
        /// Source file of the re-encode
        path: PathBuf,
        /// Exit status or spawn failure
        reason: String,
    },
}

/// Best-effort post-processing errors (artifact replacement, thumbnails, tags)
#[derive(Debug, Error)]
pub enum PostProcessError {
    /// The re-encoded output could not be moved over the original file
    #[error("could not replace {original} with {replacement}: {reason}")]
    ArtifactReplaceFailed {
        /// The original (pre-encode) file
        original: PathBuf,
        /// The re-encoded output
        replacement: PathBuf,
        /// The reason the delete/rename failed
        reason: String,
    },

    /// A thumbnail could not be decoded or written as JPEG
    #[error("failed to convert thumbnail {path}: {reason}")]
    ThumbnailConvertFailed {
        /// The thumbnail that failed to convert
        path: PathBuf,
        /// Decoder or encoder error
        reason: String,
    },

    /// Cover art could not be written into the audio file's tag
    #[error("failed to embed thumbnail into {path}: {reason}")]
    EmbedFailed {
        /// The audio file
        path: PathBuf,
        /// Tag or I/O error
        reason: String,
    },
}
