//! Progress aggregation for a single job
//!
//! A job's progress is a single integer in `[0, 100]` split into two phases: the
//! download phase runs up to a phase ceiling (90 for video jobs that will be
//! re-encoded, 100 otherwise) and the transcode phase covers the rest.
//!
//! [`ProgressTracker`] folds any number of concurrently reported transfers into the
//! download phase. [`ProgressBudget`] is the job-wide emitter both phases report
//! through; it never lets the published value go backwards.

use crate::types::{Event, TransferReport, TransferStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::trace;

/// Upper bound of the progress scale
pub const FULL_SCALE: u8 = 100;

/// Job-wide progress emitter with a high-water mark
pub struct ProgressBudget {
    event_tx: broadcast::Sender<Event>,
    /// Last published value, also serializes sends
    last: Mutex<Option<u8>>,
}

impl ProgressBudget {
    /// Create a budget publishing [`Event::Progress`] on `event_tx`
    pub fn new(event_tx: broadcast::Sender<Event>) -> Self {
        Self {
            event_tx,
            last: Mutex::new(None),
        }
    }

    /// Publish `percent` unless it would not advance the last published value.
    ///
    /// Values above 100 are clamped. Returns the value actually published.
    pub fn report(&self, percent: u8) -> Option<u8> {
        let percent = percent.min(FULL_SCALE);
        let mut last = lock(&self.last);

        if matches!(*last, Some(prev) if percent <= prev) {
            return None;
        }

        *last = Some(percent);
        self.event_tx.send(Event::Progress { percent }).ok();
        Some(percent)
    }

    /// Last published value (0 before anything was published)
    pub fn current(&self) -> u8 {
        lock(&self.last).unwrap_or(0)
    }
}

/// One registered transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transfer {
    total: u64,
    downloaded: u64,
}

/// Per-transfer byte counts, keyed by the in-progress local path
///
/// Entries are only ever added. A finished transfer keeps its entry with
/// `downloaded == total` so the denominator stays stable.
#[derive(Debug, Default)]
pub struct TransferState {
    transfers: HashMap<String, Transfer>,
    total_bytes: u64,
}

impl TransferState {
    /// Number of registered transfers
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    /// Whether no transfer has been registered yet
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Sum of the registered transfers' totals
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Sum of the registered transfers' received bytes
    pub fn downloaded_bytes(&self) -> u64 {
        self.transfers.values().map(|t| t.downloaded).sum()
    }

    fn apply(&mut self, report: &TransferReport) {
        if !self.transfers.contains_key(&report.filename) {
            // Unknown size: the transfer contributes nothing until a later report has one
            let Some(total) = report.total() else {
                return;
            };
            self.transfers.insert(
                report.filename.clone(),
                Transfer {
                    total,
                    downloaded: 0,
                },
            );
            self.total_bytes += total;
        }

        if let Some(transfer) = self.transfers.get_mut(&report.filename) {
            transfer.downloaded = match report.status {
                TransferStatus::Downloading => report.downloaded_bytes,
                TransferStatus::Finished => transfer.total,
            };
        }
    }

    /// `downloaded / total * ceiling`, floored; None while no total is known
    fn percent(&self, ceiling: u8) -> Option<u8> {
        if self.total_bytes == 0 {
            return None;
        }
        let scaled =
            u128::from(self.downloaded_bytes()) * u128::from(ceiling) / u128::from(self.total_bytes);
        Some(scaled.min(u128::from(ceiling)) as u8)
    }
}

/// Aggregates transfer reports into the download phase of a job's progress
pub struct ProgressTracker {
    state: Mutex<TransferState>,
    ceiling: u8,
    budget: Arc<ProgressBudget>,
}

impl ProgressTracker {
    /// Create a tracker whose phase spans `[0, ceiling]`
    pub fn new(ceiling: u8, budget: Arc<ProgressBudget>) -> Self {
        Self {
            state: Mutex::new(TransferState::default()),
            ceiling: ceiling.min(FULL_SCALE),
            budget,
        }
    }

    /// Upper bound of this tracker's phase
    pub fn ceiling(&self) -> u8 {
        self.ceiling
    }

    /// Record one transfer report and publish the aggregate percentage.
    ///
    /// Safe to call from several transfer callbacks at once. Returns the aggregate
    /// percentage, or None while no transfer has a known size.
    pub fn observe(&self, report: &TransferReport) -> Option<u8> {
        let percent = {
            let mut state = lock(&self.state);
            state.apply(report);
            state.percent(self.ceiling)
        }?;

        trace!(
            filename = %report.filename,
            status = ?report.status,
            downloaded = report.downloaded_bytes,
            percent,
            "transfer progress"
        );

        self.budget.report(percent);
        Some(percent)
    }

    /// Run `f` against the current transfer state
    pub fn with_state<R>(&self, f: impl FnOnce(&TransferState) -> R) -> R {
        f(&lock(&self.state))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
