//! Parser for yt-dlp output lines
//!
//! The CLI source asks yt-dlp for three kinds of machine-readable lines via
//! `--progress-template` and `--print`, each tagged with a prefix:
//!
//! ```text
//! [progress]downloading|/out/Clip.f137.mp4|1048576|20971520|NA
//! [info]{"id": "abc", "title": "Clip", "ext": "mp4", "duration": 120.0}
//! [file]/out/Clip.mp4
//! ```
//!
//! Everything else (warnings, merger notices) is passed through untouched.

use crate::types::{MediaInfo, TransferReport, TransferStatus};
use std::path::PathBuf;

pub(crate) const PROGRESS_PREFIX: &str = "[progress]";
pub(crate) const INFO_PREFIX: &str = "[info]";
pub(crate) const FILE_PREFIX: &str = "[file]";

/// One classified output line
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLine {
    /// Transfer progress
    Progress(TransferReport),
    /// Resource metadata
    Info(MediaInfo),
    /// Output file path
    File(PathBuf),
    /// Anything else
    Other(String),
}

/// Classify one line of yt-dlp output
pub fn parse_source_line(line: &str) -> SourceLine {
    let trimmed = line.trim_end();

    if let Some(rest) = trimmed.strip_prefix(PROGRESS_PREFIX)
        && let Some(report) = parse_progress(rest)
    {
        return SourceLine::Progress(report);
    }

    if let Some(rest) = trimmed.strip_prefix(INFO_PREFIX)
        && let Ok(info) = serde_json::from_str::<MediaInfo>(rest)
    {
        return SourceLine::Info(info);
    }

    if let Some(rest) = trimmed.strip_prefix(FILE_PREFIX)
        && !rest.is_empty()
    {
        return SourceLine::File(PathBuf::from(rest));
    }

    SourceLine::Other(trimmed.to_string())
}

/// `status|filename|downloaded|total|estimate`; the filename may itself contain `|`
fn parse_progress(rest: &str) -> Option<TransferReport> {
    let (status, rest) = rest.split_once('|')?;
    let status = match status {
        "downloading" => TransferStatus::Downloading,
        "finished" => TransferStatus::Finished,
        _ => return None,
    };

    let mut tail = rest.rsplitn(4, '|');
    let estimate = tail.next()?;
    let total = tail.next()?;
    let downloaded = tail.next()?;
    let filename = tail.next()?;

    if filename.is_empty() {
        return None;
    }

    Some(TransferReport {
        status,
        filename: filename.to_string(),
        downloaded_bytes: parse_bytes(downloaded).unwrap_or(0),
        total_bytes: parse_bytes(total),
        total_bytes_estimate: parse_bytes(estimate),
    })
}

/// Byte counts are integers, estimates may be floats, missing values are "NA"
fn parse_bytes(field: &str) -> Option<u64> {
    let value: f64 = field.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}
