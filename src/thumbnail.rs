//! Thumbnail discovery next to a downloaded audio file
//!
//! The fetch tool writes the thumbnail as a sibling of the output, sharing its
//! base name but with whatever image extension the remote side served. WebP
//! thumbnails are converted to JPEG because ID3 readers rarely display WebP.

use crate::error::{PostProcessError, Result};
use crate::types::Event;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Sibling extensions probed, in priority order
pub const THUMBNAIL_EXTENSIONS: [&str; 4] = ["webp", "jpg", "jpeg", "png"];

/// Normalized image format of a resolved thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFormat {
    /// JPEG (also the result of a WebP conversion)
    Jpeg,
    /// PNG
    Png,
}

impl ThumbnailFormat {
    /// MIME type for a picture frame
    pub fn mime_type(&self) -> &'static str {
        match self {
            ThumbnailFormat::Jpeg => "image/jpeg",
            ThumbnailFormat::Png => "image/png",
        }
    }
}

/// A thumbnail ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// Image file on disk
    pub path: PathBuf,
    /// Its format
    pub format: ThumbnailFormat,
}

/// `dir/Song.mp3` + `webp` -> `dir/Song.webp`, keeping dots inside the title intact
fn sibling_with_extension(audio_file: &Path, extension: &str) -> PathBuf {
    let mut name: OsString = audio_file.with_extension("").into_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Existing sibling thumbnail of `audio_file`, first match in [`THUMBNAIL_EXTENSIONS`] order
pub fn find_thumbnail(audio_file: &Path) -> Option<PathBuf> {
    THUMBNAIL_EXTENSIONS
        .iter()
        .map(|ext| sibling_with_extension(audio_file, ext))
        .find(|candidate| candidate.is_file())
}

/// Decode `source` and write it as an RGB JPEG next to it.
///
/// The format is sniffed from the content, so a mislabeled file still converts.
/// Alpha and animation are dropped.
pub fn convert_to_jpeg(source: &Path) -> Result<PathBuf> {
    let convert_failed = |reason: String| PostProcessError::ThumbnailConvertFailed {
        path: source.to_path_buf(),
        reason,
    };

    let target = source.with_extension("jpg");
    let image = image::io::Reader::open(source)
        .map_err(|e| convert_failed(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| convert_failed(e.to_string()))?
        .decode()
        .map_err(|e| convert_failed(e.to_string()))?;

    image
        .into_rgb8()
        .save_with_format(&target, image::ImageFormat::Jpeg)
        .map_err(|e| convert_failed(e.to_string()))?;

    Ok(target)
}

/// Locates and normalizes the thumbnail of an audio file
pub struct ThumbnailResolver<'a> {
    event_tx: &'a broadcast::Sender<Event>,
}

impl<'a> ThumbnailResolver<'a> {
    /// Create a resolver reporting diagnostics on `event_tx`
    pub fn new(event_tx: &'a broadcast::Sender<Event>) -> Self {
        Self { event_tx }
    }

    fn log(&self, message: impl Into<String>) {
        self.event_tx
            .send(Event::Log {
                message: message.into(),
            })
            .ok();
    }

    /// Thumbnail for `audio_file`, or None when there is none or it cannot be used.
    ///
    /// A missing thumbnail is a normal outcome and is not logged here. A WebP that
    /// fails to convert emits one diagnostic and ends resolution; later candidates
    /// are not tried.
    pub async fn resolve(&self, audio_file: &Path) -> Option<ResolvedArtifact> {
        let Some(found) = find_thumbnail(audio_file) else {
            debug!(?audio_file, "no thumbnail next to audio file");
            return None;
        };

        let extension = found
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let resolved = match extension.as_str() {
            "webp" => {
                let source = found.clone();
                let converted = tokio::task::spawn_blocking(move || convert_to_jpeg(&source))
                    .await
                    .unwrap_or_else(|e| {
                        Err(PostProcessError::ThumbnailConvertFailed {
                            path: found.clone(),
                            reason: e.to_string(),
                        }
                        .into())
                    });

                match converted {
                    Ok(path) => ResolvedArtifact {
                        path,
                        format: ThumbnailFormat::Jpeg,
                    },
                    Err(err) => {
                        warn!(error = %err, "thumbnail conversion failed");
                        self.log(format!("Failed to convert thumbnail: {}", err));
                        return None;
                    }
                }
            }
            "jpg" | "jpeg" => ResolvedArtifact {
                path: found,
                format: ThumbnailFormat::Jpeg,
            },
            _ => ResolvedArtifact {
                path: found,
                format: ThumbnailFormat::Png,
            },
        };

        info!(path = ?resolved.path, format = ?resolved.format, "resolved thumbnail");
        Some(resolved)
    }
}
