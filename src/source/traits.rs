//! Traits and types for media acquisition

use crate::types::{MediaInfo, TransferReport};
use async_trait::async_trait;
use std::path::PathBuf;

/// Callback receiving every transfer report of a fetch run
///
/// May be invoked for several transfers in any interleaving.
pub type ProgressCallback<'a> = &'a (dyn Fn(&TransferReport) + Send + Sync);

/// Post-processing step the fetch tool runs after downloading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// Extract the audio track and transcode it
    ExtractAudio {
        /// Target audio codec (e.g. "mp3")
        codec: String,
        /// Bitrate in kbit/s (e.g. "320")
        quality: String,
    },
}

/// Declarative configuration of one fetch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Format selector (e.g. "137+bestaudio/best")
    pub format: String,
    /// Output path template, including the output directory
    pub output_template: PathBuf,
    /// Container separately fetched streams are merged into
    pub merge_output_format: Option<String>,
    /// Steps run after the download
    pub postprocessors: Vec<PostProcessor>,
    /// Keep the thumbnail as a sibling file of the output
    pub write_thumbnail: bool,
    /// Ignore the playlist part of a URL
    pub no_playlist: bool,
}

/// Result of a completed fetch run
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    /// Output path as reported by the fetch tool
    ///
    /// Post-processing may have written the final file under a different
    /// extension, so callers re-check the filesystem.
    pub filename: PathBuf,
    /// Metadata of the fetched resource
    pub info: MediaInfo,
}

/// Trait for media acquisition
///
/// Implementations can drive an external binary or provide stub
/// functionality for graceful degradation.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Read metadata and available formats without downloading
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be run or its output cannot be parsed.
    async fn extract_info(&self, url: &str) -> crate::Result<MediaInfo>;

    /// Download `url`, run the configured post-processors and report progress
    ///
    /// # Errors
    ///
    /// Returns an error if the download or any post-processing step fails.
    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        progress: ProgressCallback<'_>,
    ) -> crate::Result<Materialized>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
