//! Fake capabilities and stub binaries for integration tests

use async_trait::async_trait;
use media_dl::source::{FetchOptions, Materialized, MediaSource, ProgressCallback};
use media_dl::transcode::{MediaTools, TranscodeExit, TranscodeProcess, TranscodeRequest};
use media_dl::types::{MediaInfo, TransferReport, TransferStatus};
use media_dl::{FetchError, TranscodeError};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A transfer report for `filename`
pub fn transfer(
    status: TransferStatus,
    filename: &str,
    downloaded: u64,
    total: Option<u64>,
) -> TransferReport {
    TransferReport {
        status,
        filename: filename.to_string(),
        downloaded_bytes: downloaded,
        total_bytes: total,
        total_bytes_estimate: None,
    }
}

/// Media source replaying canned reports and writing canned files
pub struct ScriptedSource {
    pub reports: Vec<TransferReport>,
    pub output_name: String,
    pub files: Vec<(String, Vec<u8>)>,
    pub failure: Option<String>,
    pub fetch_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(output_name: &str) -> Self {
        Self {
            reports: Vec::new(),
            output_name: output_name.to_string(),
            files: vec![(output_name.to_string(), b"media".to_vec())],
            failure: None,
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            files: Vec::new(),
            ..Self::new("unused")
        }
    }

    pub fn with_reports(mut self, reports: Vec<TransferReport>) -> Self {
        self.reports = reports;
        self
    }

    pub fn with_file(mut self, name: &str, contents: &[u8]) -> Self {
        self.files.push((name.to_string(), contents.to_vec()));
        self
    }
}

#[async_trait]
impl MediaSource for ScriptedSource {
    async fn extract_info(&self, _url: &str) -> media_dl::Result<MediaInfo> {
        Ok(MediaInfo::default())
    }

    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        progress: ProgressCallback<'_>,
    ) -> media_dl::Result<Materialized> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(FetchError::Failed {
                url: url.to_string(),
                reason: reason.clone(),
            }
            .into());
        }

        for report in &self.reports {
            progress(report);
        }

        let dir = options
            .output_template
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        for (name, contents) in &self.files {
            std::fs::write(dir.join(name), contents)?;
        }

        Ok(Materialized {
            filename: dir.join(&self.output_name),
            info: MediaInfo::default(),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Probe/transcode fake counting its invocations
pub struct ScriptedTools {
    pub duration: Option<f64>,
    pub lines: Vec<String>,
    pub exit_code: i32,
    pub probe_calls: AtomicUsize,
    pub spawn_calls: AtomicUsize,
}

impl ScriptedTools {
    pub fn new(duration: Option<f64>, lines: &[&str], exit_code: i32) -> Self {
        Self {
            duration,
            lines: lines.iter().map(|l| l.to_string()).collect(),
            exit_code,
            probe_calls: AtomicUsize::new(0),
            spawn_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaTools for ScriptedTools {
    async fn probe_duration(&self, path: &Path) -> media_dl::Result<f64> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.duration.ok_or_else(|| {
            TranscodeError::ProbeFailed {
                path: path.to_path_buf(),
                reason: "could not convert 'N/A' to a duration".to_string(),
            }
            .into()
        })
    }

    async fn spawn_transcode(
        &self,
        request: &TranscodeRequest,
    ) -> media_dl::Result<Box<dyn TranscodeProcess>> {
        self.spawn_calls.fetch_add(1, Ordering::SeqCst);
        std::fs::write(&request.output, b"encoded")?;
        Ok(Box::new(ScriptedProcess {
            lines: self.lines.iter().cloned().collect(),
            exit_code: self.exit_code,
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedProcess {
    lines: VecDeque<String>,
    exit_code: i32,
}

#[async_trait]
impl TranscodeProcess for ScriptedProcess {
    async fn next_line(&mut self) -> media_dl::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    async fn wait(&mut self) -> media_dl::Result<TranscodeExit> {
        Ok(TranscodeExit {
            code: Some(self.exit_code),
            detail: None,
        })
    }
}

/// Write an executable shell script named `name` into `dir`
#[cfg(unix)]
pub fn write_stub_binary(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
