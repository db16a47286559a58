//! Core types for media-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Format selector that marks a job as audio-only
pub const AUDIO_ONLY_FORMAT: &str = "bestaudio";

/// Codec label meaning "keep the fetched stream as is"
pub const ORIGINAL_CODEC: &str = "Original";

/// Codec labels offered to callers, in display order
pub const CODEC_CHOICES: [&str; 4] = [ORIGINAL_CODEC, "H.264", "H.265", "VP9"];

/// Kind of job, derived from the format selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Video stream merged with the best audio stream
    Video,
    /// Audio-only extraction
    Audio,
}

/// One end-to-end request to acquire a media resource
///
/// Immutable once handed to a [`crate::DownloadWorker`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Remote resource URL
    pub url: String,
    /// Directory the output file is written into
    pub output_dir: PathBuf,
    /// Format selector (a format id such as "137", or [`AUDIO_ONLY_FORMAT`])
    pub format: String,
    /// Target codec label (see [`CODEC_CHOICES`]); only used by video jobs
    pub codec: String,
    /// Retain the thumbnail and embed it as cover art (audio jobs only)
    pub embed_thumbnail: bool,
}

impl Job {
    /// Create a new job
    pub fn new(
        url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        format: impl Into<String>,
        codec: impl Into<String>,
        embed_thumbnail: bool,
    ) -> Self {
        Self {
            url: url.into(),
            output_dir: output_dir.into(),
            format: format.into(),
            codec: codec.into(),
            embed_thumbnail,
        }
    }

    /// Audio-only job for `url`
    pub fn audio(url: impl Into<String>, output_dir: impl Into<PathBuf>, embed_thumbnail: bool) -> Self {
        Self::new(url, output_dir, AUDIO_ONLY_FORMAT, ORIGINAL_CODEC, embed_thumbnail)
    }

    /// Video job for `url` using format id `format`
    pub fn video(
        url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        format: impl Into<String>,
        codec: impl Into<String>,
    ) -> Self {
        Self::new(url, output_dir, format, codec, false)
    }

    /// Whether this is an audio or a video job
    pub fn kind(&self) -> JobKind {
        if self.format == AUDIO_ONLY_FORMAT {
            JobKind::Audio
        } else {
            JobKind::Video
        }
    }

    /// Whether a re-encode phase follows the download
    pub fn wants_transcode(&self) -> bool {
        self.kind() == JobKind::Video && self.codec != ORIGINAL_CODEC
    }

    /// Whether cover art should be resolved and embedded after the download
    pub fn wants_thumbnail(&self) -> bool {
        self.kind() == JobKind::Audio && self.embed_thumbnail
    }
}

/// Video codecs a finished download can be re-encoded to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Codec {
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,
    /// VP9
    Vp9,
}

impl Codec {
    /// All re-encode targets
    pub const ALL: [Codec; 3] = [Codec::H264, Codec::H265, Codec::Vp9];

    /// Look a codec up by its display label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Display label, also used as the output filename suffix
    pub fn label(&self) -> &'static str {
        match self {
            Codec::H264 => "H.264",
            Codec::H265 => "H.265",
            Codec::Vp9 => "VP9",
        }
    }

    /// ffmpeg encoder name
    pub fn encoder(&self) -> &'static str {
        match self {
            Codec::H264 => "libx264",
            Codec::H265 => "libx265",
            Codec::Vp9 => "libvpx-vp9",
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Pipeline state of a running job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created, not started
    Idle,
    /// Fetch tool running
    Fetching,
    /// Re-encode running
    Transcoding,
    /// Looking for a thumbnail next to the audio file
    ResolvingArt,
    /// Writing cover art into the audio file
    Embedding,
    /// Terminal result emitted
    Finished,
}

/// Terminal outcome of a job, emitted exactly once
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Whether the primary deliverable exists
    pub success: bool,
    /// Human-readable status line
    pub message: String,
}

impl PipelineResult {
    /// Message for a completed download without re-encode
    pub const DOWNLOAD_COMPLETE: &'static str = "Download completed successfully!";
    /// Message for a failed fetch
    pub const DOWNLOAD_FAILED: &'static str = "Download failed";
    /// Message for a completed re-encode
    pub const REENCODE_COMPLETE: &'static str = "Re-encoding completed successfully!";
    /// Message for a failed probe or encoder run
    pub const REENCODE_FAILED: &'static str = "Re-encoding failed";
    /// Message for a codec without encoder mapping
    pub const UNSUPPORTED_CODEC: &'static str = "Unsupported codec selected";

    /// Successful result
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Failed result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Event emitted to observers of a running job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Human-readable diagnostic line
    Log {
        /// Message text
        message: String,
    },

    /// Overall progress (0 to 100, never decreasing within a job)
    Progress {
        /// Percentage
        percent: u8,
    },

    /// Pipeline state transition
    StateChanged {
        /// New state
        state: JobState,
    },

    /// Terminal result of the job
    Finished {
        /// Whether the primary deliverable exists
        success: bool,
        /// Human-readable status line
        message: String,
    },
}

/// Status reported by the fetch tool for one transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Bytes are still arriving
    Downloading,
    /// The transfer is complete
    Finished,
}

/// One progress report for one transfer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferReport {
    /// Transfer status
    pub status: TransferStatus,
    /// In-progress local path, identifies the transfer
    pub filename: String,
    /// Bytes received so far
    pub downloaded_bytes: u64,
    /// Exact size if known
    pub total_bytes: Option<u64>,
    /// Estimated size if the exact one is unknown
    pub total_bytes_estimate: Option<u64>,
}

impl TransferReport {
    /// Exact total if known, otherwise the estimate
    pub fn total(&self) -> Option<u64> {
        self.total_bytes
            .or(self.total_bytes_estimate)
            .filter(|t| *t > 0)
    }
}

/// A single format offered by the remote resource
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Format id accepted as a format selector
    pub format_id: String,
    /// Video height in pixels (None for audio-only formats)
    #[serde(default)]
    pub height: Option<u32>,
    /// Video codec ("none" for audio-only formats)
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Container extension
    #[serde(default)]
    pub ext: Option<String>,
}

/// Metadata of a remote resource
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Extractor-specific id
    #[serde(default)]
    pub id: Option<String>,
    /// Title
    #[serde(default)]
    pub title: Option<String>,
    /// Extension of the selected format
    #[serde(default)]
    pub ext: Option<String>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Available formats
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

/// A selectable format: label plus the selector to put into a [`Job`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOption {
    /// Display text, e.g. "1080p avc1 (mp4)"
    pub label: String,
    /// Format selector
    pub selector: String,
}

impl MediaInfo {
    /// Selectable options: every video format with a known height, then audio-only.
    pub fn format_options(&self) -> Vec<FormatOption> {
        let mut options: Vec<FormatOption> = self
            .formats
            .iter()
            .filter(|f| f.vcodec.as_deref() != Some("none"))
            .filter_map(|f| {
                let height = f.height?;
                let vcodec = f
                    .vcodec
                    .as_deref()
                    .and_then(|v| v.split('.').next())
                    .unwrap_or("unknown");
                let ext = f.ext.as_deref().unwrap_or("unknown");
                Some(FormatOption {
                    label: format!("{}p {} ({})", height, vcodec, ext),
                    selector: f.format_id.clone(),
                })
            })
            .collect();

        options.push(FormatOption {
            label: "Audio only".to_string(),
            selector: AUDIO_ONLY_FORMAT.to_string(),
        });
        options
    }

    /// Title, or "Video" when the extractor did not report one
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Video")
    }
}
