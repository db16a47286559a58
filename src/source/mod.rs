//! Media acquisition capability
//!
//! The pipeline never talks to a fetch tool directly. It goes through the
//! [`MediaSource`] trait, which covers metadata extraction and the actual
//! download-plus-post-processing run. Implementations:
//!
//! - [`CliMediaSource`]: drives an external `yt-dlp` binary
//! - [`UnavailableMediaSource`]: stub used when no fetch tool is available
//!
//! ## Usage
//!
//! ```no_run
//! use media_dl::source::{CliMediaSource, MediaSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = CliMediaSource::from_path().expect("yt-dlp binary not found");
//!
//!     let info = source.extract_info("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//!     for option in info.format_options() {
//!         println!("{} -> {}", option.label, option.selector);
//!     }
//!     Ok(())
//! }
//! ```

mod cli;
mod parser;
mod traits;
mod unavailable;

pub use cli::CliMediaSource;
pub use parser::{SourceLine, parse_source_line};
pub use traits::{FetchOptions, Materialized, MediaSource, PostProcessor, ProgressCallback};
pub use unavailable::UnavailableMediaSource;
