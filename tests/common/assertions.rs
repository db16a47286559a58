//! Event collection helpers for integration tests

use media_dl::{Event, JobState};
use std::time::Duration;
use tokio::sync::broadcast;

/// Receive events until the channel closes or `timeout` elapses
///
/// The worker drops its sender once the job (including cover art handling) is
/// done, so this returns the complete event history of a job.
pub async fn collect_all_events(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
) -> Vec<Event> {
    let mut collected = Vec::new();
    let _ = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) => collected.push(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    panic!("event receiver lagged by {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
    .await;
    collected
}

/// Percentages among `events`, in order
pub fn progress_values(events: &[Event]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}

/// Log messages among `events`, in order
pub fn log_messages(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Log { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// State transitions among `events`, in order
pub fn states(events: &[Event]) -> Vec<JobState> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StateChanged { state } => Some(*state),
            _ => None,
        })
        .collect()
}

/// Terminal results among `events`
pub fn finished_events(events: &[Event]) -> Vec<(bool, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Finished { success, message } => Some((*success, message.clone())),
            _ => None,
        })
        .collect()
}

/// Assert that the published progress never decreases
pub fn assert_monotonic(progress: &[u8]) {
    assert!(
        progress.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {:?}",
        progress
    );
}
