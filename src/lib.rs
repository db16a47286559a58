//! # media-dl
//!
//! Media download pipeline library: fetch a remote video or audio stream with
//! `yt-dlp`, optionally re-encode it with `ffmpeg`, and embed cover art into
//! extracted audio.
//!
//! ## Design
//!
//! - **One worker per job** - a [`DownloadWorker`] runs exactly one [`Job`] on its own task
//! - **Event-driven** - observers subscribe to log, progress and completion [`Event`]s
//! - **Pluggable tools** - external binaries sit behind the [`MediaSource`] and
//!   [`MediaTools`] traits
//! - **Best-effort extras** - cover art handling never changes a job's outcome
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, DownloadWorker, Event, Job};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let job = Job::video("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "downloads", "137", "H.264");
//!     let worker = DownloadWorker::with_default_tools(job, Config::default())?;
//!
//!     let mut events = worker.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             match event {
//!                 Event::Progress { percent } => println!("{percent}%"),
//!                 Event::Log { message } => println!("{message}"),
//!                 _ => {}
//!             }
//!         }
//!     });
//!
//!     let result = worker.start().join().await?;
//!     println!("{} ({})", result.message, result.success);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Acquisition step (fetch options, output path resolution)
pub mod fetcher;
mod lines;
/// Progress aggregation and emission
pub mod progress;
/// Media acquisition capability (yt-dlp)
pub mod source;
/// Cover art embedding
pub mod tagging;
/// Thumbnail discovery and conversion
pub mod thumbnail;
/// Re-encode phase (ffprobe/ffmpeg)
pub mod transcode;
/// Core types and events
pub mod types;
/// Per-job pipeline controller
pub mod worker;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, FetchError, PostProcessError, Result, TranscodeError};
pub use source::{CliMediaSource, MediaSource, UnavailableMediaSource};
pub use transcode::{CliMediaTools, MediaTools, UnavailableMediaTools};
pub use types::{
    Codec, Event, FormatInfo, FormatOption, Job, JobKind, JobState, MediaInfo, PipelineResult,
};
pub use worker::{DownloadWorker, JobHandle};
