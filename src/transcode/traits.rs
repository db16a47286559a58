//! Traits and types for the probe/transcode capability

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// One re-encode invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    /// File to re-encode
    pub input: PathBuf,
    /// File to write
    pub output: PathBuf,
    /// Video encoder name (e.g. "libx264")
    pub video_encoder: String,
    /// Audio encoder name (e.g. "aac")
    pub audio_encoder: String,
    /// Replace `output` if it already exists
    pub overwrite: bool,
}

/// How a transcode process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeExit {
    /// Exit code (None if killed by a signal)
    pub code: Option<i32>,
    /// Trailing error output, if the process wrote any
    pub detail: Option<String>,
}

impl TranscodeExit {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl std::fmt::Display for TranscodeExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code, &self.detail) {
            (Some(code), Some(detail)) => write!(f, "exit code {}: {}", code, detail),
            (Some(code), None) => write!(f, "exit code {}", code),
            (None, Some(detail)) => write!(f, "terminated by signal: {}", detail),
            (None, None) => f.write_str("terminated by signal"),
        }
    }
}

/// A running transcode whose progress output is read line by line
#[async_trait]
pub trait TranscodeProcess: Send {
    /// Next line of machine-readable progress output, None once the stream closes
    async fn next_line(&mut self) -> crate::Result<Option<String>>;

    /// Wait for the process to exit
    async fn wait(&mut self) -> crate::Result<TranscodeExit>;

    /// Stop the process; used when its output can no longer be drained
    async fn kill(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

/// Trait for the duration probe and the transcoder
///
/// # Examples
///
/// ```no_run
/// use media_dl::transcode::{CliMediaTools, MediaTools};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tools = CliMediaTools::from_path().expect("ffmpeg/ffprobe not found");
/// let seconds = tools.probe_duration(Path::new("clip.mp4")).await?;
/// println!("{seconds:.1}s");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Total duration of `path` in seconds
    ///
    /// # Errors
    ///
    /// Returns an error if the probe cannot be run or does not print a number.
    async fn probe_duration(&self, path: &Path) -> crate::Result<f64>;

    /// Start a re-encode
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    async fn spawn_transcode(
        &self,
        request: &TranscodeRequest,
    ) -> crate::Result<Box<dyn TranscodeProcess>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
