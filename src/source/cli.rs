//! CLI-based media source using an external yt-dlp binary

use super::parser::{FILE_PREFIX, INFO_PREFIX, PROGRESS_PREFIX, SourceLine, parse_source_line};
use super::traits::{FetchOptions, Materialized, MediaSource, PostProcessor, ProgressCallback};
use crate::config::ToolsConfig;
use crate::error::FetchError;
use crate::lines::LossyLines;
use crate::types::MediaInfo;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// CLI-based media source using an external yt-dlp binary
///
/// # Examples
///
/// ```no_run
/// use media_dl::source::CliMediaSource;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let source = CliMediaSource::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let source = CliMediaSource::from_path().expect("yt-dlp not found in PATH");
/// ```
pub struct CliMediaSource {
    binary_path: PathBuf,
}

impl CliMediaSource {
    /// Create a new CLI source with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find yt-dlp in PATH
    ///
    /// Returns `None` if the binary is not found.
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Use the configured binary, falling back to a PATH search if allowed
    pub fn from_config(tools: &ToolsConfig) -> Option<Self> {
        match &tools.ytdlp_path {
            Some(path) => Some(Self::new(path.clone())),
            None if tools.search_path => Self::from_path(),
            None => None,
        }
    }

    /// Path of the binary this source runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

/// Command line for a fetch run
pub(crate) fn build_fetch_args(url: &str, options: &FetchOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--newline".into(),
        "--no-simulate".into(),
        "--progress".into(),
        "--progress-template".into(),
        format!(
            "download:{}%(progress.status)s|%(progress.filename)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s",
            PROGRESS_PREFIX
        )
        .into(),
        "--print".into(),
        format!("before_dl:{}%(.{{id,title,ext,duration}})j", INFO_PREFIX).into(),
        "--print".into(),
        format!("after_move:{}%(filepath)s", FILE_PREFIX).into(),
        "-f".into(),
        options.format.clone().into(),
        "-o".into(),
        options.output_template.clone().into_os_string(),
    ];

    if options.no_playlist {
        args.push("--no-playlist".into());
    }

    if let Some(container) = &options.merge_output_format {
        args.push("--merge-output-format".into());
        args.push(container.into());
    }

    for postprocessor in &options.postprocessors {
        match postprocessor {
            PostProcessor::ExtractAudio { codec, quality } => {
                args.push("--extract-audio".into());
                args.push("--audio-format".into());
                args.push(codec.into());
                args.push("--audio-quality".into());
                args.push(format!("{}K", quality).into());
            }
        }
    }

    if options.write_thumbnail {
        args.push("--write-thumbnail".into());
    }

    args.push("--".into());
    args.push(url.into());
    args
}

fn tool_error(url: &str, reason: impl Into<String>) -> crate::Error {
    FetchError::Failed {
        url: url.to_string(),
        reason: reason.into(),
    }
    .into()
}

#[async_trait]
impl MediaSource for CliMediaSource {
    async fn extract_info(&self, url: &str) -> crate::Result<MediaInfo> {
        let output = Command::new(&self.binary_path)
            .arg("--dump-single-json")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--")
            .arg(url)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(tool_error(url, last_error_line(&stderr, output.status)));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        progress: ProgressCallback<'_>,
    ) -> crate::Result<Materialized> {
        let args = build_fetch_args(url, options);
        debug!(binary = ?self.binary_path, ?args, "spawning yt-dlp");

        let mut child = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| crate::Error::ExternalTool("yt-dlp stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| crate::Error::ExternalTool("yt-dlp stderr not captured".into()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = BufReader::new(stderr).read_to_end(&mut buf).await;
            buf
        });

        let mut info = MediaInfo::default();
        let mut filename: Option<PathBuf> = None;
        let mut lines = LossyLines::new(stdout);

        while let Some(line) = lines.next_line().await? {
            match parse_source_line(&line) {
                SourceLine::Progress(report) => progress(&report),
                SourceLine::Info(parsed) => info = parsed,
                SourceLine::File(path) => filename = Some(path),
                SourceLine::Other(text) => {
                    if !text.is_empty() {
                        debug!(line = %text, "yt-dlp");
                    }
                }
            }
        }

        let status = child.wait().await?;
        let stderr_buf = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_buf);
            return Err(tool_error(url, last_error_line(&stderr, status)));
        }

        let filename = filename.ok_or_else(|| FetchError::MissingOutput {
            url: url.to_string(),
        })?;

        Ok(Materialized { filename, info })
    }

    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }
}

/// Last `ERROR:` line of yt-dlp's stderr, or the exit status when there is none
fn last_error_line(stderr: &str, status: std::process::ExitStatus) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr.lines().rev().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| format!("yt-dlp exited with {}", status))
}
