//! Configuration types for media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Acquisition behavior (output naming, containers, audio extraction)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Output filename template relative to the job's output directory
    /// (default: "%(title)s.%(ext)s")
    #[serde(default = "default_output_template")]
    pub output_template: String,

    /// Container that separately fetched video and audio streams are merged into
    /// (default: "mp4")
    #[serde(default = "default_merge_output_format")]
    pub merge_output_format: String,

    /// Codec audio-only jobs are extracted to (default: "mp3")
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Audio bitrate in kbit/s for extraction (default: "320")
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Upper bound of the download phase for video jobs that will be re-encoded
    /// (default: 90). The remainder of the scale belongs to the transcode phase.
    #[serde(default = "default_video_phase_ceiling")]
    pub video_phase_ceiling: u8,

    /// Only fetch the single referenced video when the URL points into a playlist
    #[serde(default = "default_true")]
    pub no_playlist: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_template: default_output_template(),
            merge_output_format: default_merge_output_format(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            video_phase_ceiling: default_video_phase_ceiling(),
            no_playlist: true,
        }
    }
}

/// External tool paths (yt-dlp, ffmpeg, ffprobe)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Path to ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Path to ffprobe executable (auto-detected if None)
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            ffmpeg_path: None,
            ffprobe_path: None,
            search_path: true,
        }
    }
}

/// Re-encode settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Audio codec used for the audio track of re-encoded videos (default: "aac")
    #[serde(default = "default_transcode_audio_codec")]
    pub audio_codec: String,

    /// Overwrite a stale suffixed output left behind by an earlier run (default: true)
    #[serde(default = "default_true")]
    pub overwrite: bool,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            audio_codec: default_transcode_audio_codec(),
            overwrite: true,
        }
    }
}

/// Observer channel settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventConfig {
    /// Capacity of the broadcast channel carrying [`crate::Event`]s (default: 1024)
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Main configuration for media-dl
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Acquisition settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// External binary locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Re-encode settings
    #[serde(default)]
    pub transcode: TranscodeConfig,

    /// Observer channel settings
    #[serde(default)]
    pub events: EventConfig,
}

impl Config {
    /// Check settings that would otherwise fail deep inside a running job.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.download.video_phase_ceiling) {
            return Err(Error::Config {
                message: format!(
                    "phase ceiling must be within 1..=100, got {}",
                    self.download.video_phase_ceiling
                ),
                key: Some("video_phase_ceiling".to_string()),
            });
        }

        if self.download.output_template.trim().is_empty() {
            return Err(Error::Config {
                message: "output template must not be empty".to_string(),
                key: Some("output_template".to_string()),
            });
        }

        if self.events.channel_capacity == 0 {
            return Err(Error::Config {
                message: "event channel capacity must be positive".to_string(),
                key: Some("channel_capacity".to_string()),
            });
        }

        Ok(())
    }
}

fn default_output_template() -> String {
    "%(title)s.%(ext)s".to_string()
}

fn default_merge_output_format() -> String {
    "mp4".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "320".to_string()
}

fn default_video_phase_ceiling() -> u8 {
    90
}

fn default_transcode_audio_codec() -> String {
    "aac".to_string()
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_true() -> bool {
    true
}
