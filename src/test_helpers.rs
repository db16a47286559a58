//! Fakes for the external capabilities, shared by unit tests

use crate::source::{FetchOptions, Materialized, MediaSource, ProgressCallback};
use crate::transcode::{MediaTools, TranscodeExit, TranscodeProcess, TranscodeRequest};
use crate::types::{Event, MediaInfo, TransferReport, TransferStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

/// Everything currently buffered on `rx`
pub(crate) fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

/// Percentages among `events`, in order
pub(crate) fn progress_values(events: &[Event]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}

/// Log messages among `events`, in order
pub(crate) fn log_messages(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Log { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

pub(crate) fn report(
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

/// Media source replaying canned progress reports and writing canned files
pub(crate) struct FakeSource {
    pub reports: Vec<TransferReport>,
    /// Output filename relative to the output directory derived from the template
    pub reported_name: String,
    /// Files (relative names) written into the output directory on fetch
    pub files: Vec<(String, Vec<u8>)>,
    pub failure: Option<String>,
    pub fetch_calls: AtomicUsize,
    pub last_options: Mutex<Option<FetchOptions>>,
}

impl FakeSource {
    pub(crate) fn new(reported_name: &str) -> Self {
        Self {
            reports: Vec::new(),
            reported_name: reported_name.to_string(),
            files: Vec::new(),
            failure: None,
            fetch_calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::new("unused.mp4")
        }
    }

    pub(crate) fn with_reports(mut self, reports: Vec<TransferReport>) -> Self {
        self.reports = reports;
        self
    }

    pub(crate) fn with_file(mut self, name: &str, contents: &[u8]) -> Self {
        self.files.push((name.to_string(), contents.to_vec()));
        self
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    async fn extract_info(&self, _url: &str) -> crate::Result<MediaInfo> {
        Ok(MediaInfo::default())
    }

    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        progress: ProgressCallback<'_>,
    ) -> crate::Result<Materialized> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());

        if let Some(reason) = &self.failure {
            return Err(crate::error::FetchError::Failed {
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
            filename: dir.join(&self.reported_name),
            info: MediaInfo {
                title: Some("Clip".to_string()),
                ..Default::default()
            },
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Probe/transcode fake with invocation counters
pub(crate) struct FakeTools {
    pub duration: Result<f64, String>,
    pub lines: Vec<String>,
    pub exit_code: i32,
    /// Fail the read after the scripted lines instead of ending the stream
    pub read_error: bool,
    pub probe_calls: AtomicUsize,
    pub spawn_calls: AtomicUsize,
    pub kill_calls: Arc<AtomicUsize>,
    pub last_request: Mutex<Option<TranscodeRequest>>,
}

impl FakeTools {
    pub(crate) fn exiting_with(duration: f64, lines: &[&str], exit_code: i32) -> Self {
        Self {
            duration: Ok(duration),
            lines: lines.iter().map(|l| l.to_string()).collect(),
            exit_code,
            read_error: false,
            probe_calls: AtomicUsize::new(0),
            spawn_calls: AtomicUsize::new(0),
            kill_calls: Arc::new(AtomicUsize::new(0)),
            last_request: Mutex::new(None),
        }
    }

    pub(crate) fn succeeding(duration: f64, lines: &[&str]) -> Self {
        Self::exiting_with(duration, lines, 0)
    }

    pub(crate) fn breaking_stream(duration: f64, lines: &[&str]) -> Self {
        Self {
            read_error: true,
            ..Self::succeeding(duration, lines)
        }
    }

    pub(crate) fn probe_failing(output: &str) -> Self {
        Self {
            duration: Err(output.to_string()),
            ..Self::succeeding(0.0, &[])
        }
    }
}

#[async_trait]
impl MediaTools for FakeTools {
    async fn probe_duration(&self, path: &Path) -> crate::Result<f64> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.duration.clone().map_err(|output| {
            crate::error::TranscodeError::ProbeFailed {
                path: path.to_path_buf(),
                reason: format!("could not convert '{}' to a duration", output),
            }
            .into()
        })
    }

    async fn spawn_transcode(
        &self,
        request: &TranscodeRequest,
    ) -> crate::Result<Box<dyn TranscodeProcess>> {
        self.spawn_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        // Like ffmpeg, the output exists as soon as encoding starts
        std::fs::write(&request.output, b"encoded")?;

        Ok(Box::new(FakeProcess {
            lines: self.lines.iter().cloned().collect(),
            exit_code: self.exit_code,
            read_error: self.read_error,
            killed: false,
            kill_calls: Arc::clone(&self.kill_calls),
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FakeProcess {
    lines: VecDeque<String>,
    exit_code: i32,
    read_error: bool,
    killed: bool,
    kill_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TranscodeProcess for FakeProcess {
    async fn next_line(&mut self) -> crate::Result<Option<String>> {
        match self.lines.pop_front() {
            Some(line) => Ok(Some(line)),
            None if self.read_error => Err(std::io::Error::other("pipe broke").into()),
            None => Ok(None),
        }
    }

    async fn kill(&mut self) -> crate::Result<()> {
        self.killed = true;
        self.kill_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn wait(&mut self) -> crate::Result<TranscodeExit> {
        if self.killed {
            return Ok(TranscodeExit {
                code: None,
                detail: Some("killed".to_string()),
            });
        }
        Ok(TranscodeExit {
            code: Some(self.exit_code),
            detail: (self.exit_code != 0).then(|| "Conversion failed!".to_string()),
        })
    }
}
