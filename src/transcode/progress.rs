//! Parsing of ffmpeg `-progress` output
//!
//! ffmpeg writes blocks of `key=value` lines. Only `out_time=HH:MM:SS.micros`
//! matters here; every other line, and any `out_time` that does not parse
//! (ffmpeg prints `N/A` or a negative time before the first frame), is skipped.

use super::traits::{TranscodeExit, TranscodeProcess};
use crate::progress::FULL_SCALE;

/// One parsed progress line
#[derive(Debug, Clone, PartialEq)]
pub enum TranscodeEvent {
    /// Output timestamp reached, in seconds
    Elapsed {
        /// Seconds of output written
        seconds: f64,
    },
    /// A line that carries no usable timestamp
    Unparseable {
        /// The line as read
        raw: String,
    },
}

/// Classify one progress line
pub fn parse_progress_line(line: &str) -> TranscodeEvent {
    let trimmed = line.trim();
    trimmed
        .strip_prefix("out_time=")
        .and_then(parse_timestamp)
        .map(|seconds| TranscodeEvent::Elapsed { seconds })
        .unwrap_or_else(|| TranscodeEvent::Unparseable {
            raw: trimmed.to_string(),
        })
}

/// `HH:MM:SS.fraction` to seconds
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let mut parts = value.trim().splitn(3, ':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;

    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    let whole = hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)?;
    Some(whole as f64 + seconds)
}

/// Position on the overall scale: `floor + elapsed / duration * (100 - floor)`,
/// clamped to `[floor, 100]` and floored. None when the duration is unusable.
pub fn phase_percent(elapsed: f64, duration: f64, floor: u8) -> Option<u8> {
    if duration.is_nan() || duration <= 0.0 || !elapsed.is_finite() {
        return None;
    }
    let floor = floor.min(FULL_SCALE);
    let span = f64::from(FULL_SCALE - floor);
    let value = f64::from(floor) + (elapsed / duration) * span;
    Some(value.clamp(f64::from(floor), f64::from(FULL_SCALE)).floor() as u8)
}

/// Lazily parsed progress events of one transcode run
///
/// Iteration ends when the process closes its output; [`ProgressEvents::finish`]
/// then waits for the exit status.
pub struct ProgressEvents {
    process: Box<dyn TranscodeProcess>,
}

impl ProgressEvents {
    /// Wrap a running process
    pub fn new(process: Box<dyn TranscodeProcess>) -> Self {
        Self { process }
    }

    /// Next event, None once the output stream is closed
    pub async fn next(&mut self) -> crate::Result<Option<TranscodeEvent>> {
        Ok(self
            .process
            .next_line()
            .await?
            .map(|line| parse_progress_line(&line)))
    }

    /// Stop the process without reading the rest of its output
    pub async fn abort(&mut self) -> crate::Result<()> {
        self.process.kill().await
    }

    /// Wait for the process to exit
    pub async fn finish(mut self) -> crate::Result<TranscodeExit> {
        self.process.wait().await
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_out_time() {
        assert_eq!(
            parse_progress_line("out_time=00:01:00.000000"),
            TranscodeEvent::Elapsed { seconds: 60.0 }
        );
        assert_eq!(
            parse_progress_line("out_time=01:02:03.500000\n"),
            TranscodeEvent::Elapsed { seconds: 3723.5 }
        );
    }

    #[test]
    fn test_other_keys_are_unparseable() {
        for line in ["frame=120", "out_time_ms=60000000", "progress=continue", ""] {
            assert!(matches!(
                parse_progress_line(line),
                TranscodeEvent::Unparseable { .. }
            ));
        }
    }

    #[test]
    fn test_bad_timestamps_are_unparseable() {
        for line in [
            "out_time=N/A",
            "out_time=-577014:32:22.770193",
            "out_time=00:01",
            "out_time=aa:bb:cc",
            "out_time=9999999999999999:00:00.000000",
            "out_time=00:999999999999999999:00.000000",
        ] {
            assert_eq!(
                parse_progress_line(line),
                TranscodeEvent::Unparseable {
                    raw: line.to_string()
                }
            );
        }
    }

    #[test]
    fn test_phase_percent_maps_into_upper_band() {
        assert_eq!(phase_percent(0.0, 120.0, 90), Some(90));
        assert_eq!(phase_percent(60.0, 120.0, 90), Some(95));
        assert_eq!(phase_percent(119.0, 120.0, 90), Some(99));
        assert_eq!(phase_percent(120.0, 120.0, 90), Some(100));
    }

    #[test]
    fn test_phase_percent_clamps_overshoot() {
        assert_eq!(phase_percent(130.0, 120.0, 90), Some(100));
    }

    #[test]
    fn test_phase_percent_rejects_zero_duration() {
        assert_eq!(phase_percent(10.0, 0.0, 90), None);
        assert_eq!(phase_percent(10.0, f64::NAN, 90), None);
    }
}
