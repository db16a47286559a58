//! CLI-based probe/transcode tools using external ffprobe and ffmpeg binaries

use super::traits::{MediaTools, TranscodeExit, TranscodeProcess, TranscodeRequest};
use crate::config::ToolsConfig;
use crate::error::TranscodeError;
use crate::lines::LossyLines;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::debug;

/// ffprobe/ffmpeg pair
pub struct CliMediaTools {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl CliMediaTools {
    /// Create with explicit binary paths
    pub fn new(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
        }
    }

    /// Attempt to find both ffmpeg and ffprobe in PATH
    pub fn from_path() -> Option<Self> {
        let ffmpeg = which::which("ffmpeg").ok()?;
        let ffprobe = which::which("ffprobe").ok()?;
        Some(Self::new(ffmpeg, ffprobe))
    }

    /// Use configured binaries, falling back to a PATH search for any that are unset
    pub fn from_config(tools: &ToolsConfig) -> Option<Self> {
        let locate = |explicit: &Option<PathBuf>, name: &str| match explicit {
            Some(path) => Some(path.clone()),
            None if tools.search_path => which::which(name).ok(),
            None => None,
        };
        let ffmpeg = locate(&tools.ffmpeg_path, "ffmpeg")?;
        let ffprobe = locate(&tools.ffprobe_path, "ffprobe")?;
        Some(Self::new(ffmpeg, ffprobe))
    }
}

/// ffmpeg arguments for `request`, progress goes to stdout
pub(crate) fn build_transcode_args(request: &TranscodeRequest) -> Vec<std::ffi::OsString> {
    let mut args: Vec<std::ffi::OsString> = vec![
        "-nostdin".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        request.input.clone().into_os_string(),
        "-c:v".into(),
        request.video_encoder.clone().into(),
        "-c:a".into(),
        request.audio_encoder.clone().into(),
    ];
    let overwrite = if request.overwrite { "-y" } else { "-n" };
    args.push(overwrite.into());
    args.push("-progress".into());
    args.push("pipe:1".into());
    args.push(request.output.clone().into_os_string());
    args
}

fn parse_duration(stdout: &[u8]) -> Option<f64> {
    let value: f64 = String::from_utf8_lossy(stdout).trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

#[async_trait]
impl MediaTools for CliMediaTools {
    async fn probe_duration(&self, path: &Path) -> crate::Result<f64> {
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(TranscodeError::ProbeFailed {
                path: path.to_path_buf(),
                reason: format!(
                    "ffprobe exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }
            .into());
        }

        parse_duration(&output.stdout).ok_or_else(|| {
            TranscodeError::ProbeFailed {
                path: path.to_path_buf(),
                reason: format!(
                    "could not convert '{}' to a duration",
                    String::from_utf8_lossy(&output.stdout).trim()
                ),
            }
            .into()
        })
    }

    async fn spawn_transcode(
        &self,
        request: &TranscodeRequest,
    ) -> crate::Result<Box<dyn TranscodeProcess>> {
        let args = build_transcode_args(request);
        debug!(binary = ?self.ffmpeg_path, ?args, "spawning ffmpeg");

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| crate::Error::ExternalTool("ffmpeg stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| crate::Error::ExternalTool("ffmpeg stderr not captured".into()))?;

        // Drained concurrently so a chatty encoder never blocks on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = BufReader::new(stderr).read_to_end(&mut buf).await;
            buf
        });

        Ok(Box::new(CliTranscodeProcess {
            child,
            lines: LossyLines::new(stdout),
            stderr_task: Some(stderr_task),
        }))
    }

    fn name(&self) -> &'static str {
        "cli-ffmpeg"
    }
}

struct CliTranscodeProcess {
    child: Child,
    lines: LossyLines<ChildStdout>,
    stderr_task: Option<JoinHandle<Vec<u8>>>,
}

#[async_trait]
impl TranscodeProcess for CliTranscodeProcess {
    async fn next_line(&mut self) -> crate::Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    async fn kill(&mut self) -> crate::Result<()> {
        self.child.start_kill()?;
        Ok(())
    }

    async fn wait(&mut self) -> crate::Result<TranscodeExit> {
        let status = self.child.wait().await?;

        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        let detail = String::from_utf8_lossy(&stderr)
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| l.trim().to_string());

        Ok(TranscodeExit {
            code: status.code(),
            detail,
        })
    }
}
