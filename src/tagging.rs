//! Cover art embedding into ID3 tags

use crate::error::{PostProcessError, Result};
use crate::thumbnail::{ResolvedArtifact, ThumbnailFormat};
use id3::frame::{Picture, PictureType};
use id3::{Tag, TagLike, Version};
use std::path::Path;
use tracing::{debug, info};

/// Description stored alongside the embedded picture
pub const COVER_DESCRIPTION: &str = "Cover";

/// Writes a front-cover picture into an audio file's tag
#[derive(Debug, Clone, Copy, Default)]
pub struct TagEmbedder;

impl TagEmbedder {
    /// Create an embedder
    pub fn new() -> Self {
        Self
    }

    /// Embed `artwork` as the front cover of `audio`.
    ///
    /// The picture's MIME type comes from the artwork's resolved format. A missing
    /// tag is created and any existing front cover is replaced. The audio stream
    /// itself is left as is; on failure the file is not modified.
    pub async fn embed(&self, audio: &Path, artwork: &ResolvedArtifact) -> Result<()> {
        let audio_path = audio.to_path_buf();
        let image_path = artwork.path.clone();
        let format = artwork.format;

        tokio::task::spawn_blocking(move || embed_cover(&audio_path, &image_path, format))
            .await
            .map_err(|e| embed_failed(audio, e.to_string()))??;

        info!(?audio, image = ?artwork.path, ?format, "embedded cover art");
        Ok(())
    }
}

fn embed_failed(audio: &Path, reason: String) -> crate::Error {
    PostProcessError::EmbedFailed {
        path: audio.to_path_buf(),
        reason,
    }
    .into()
}

fn embed_cover(audio: &Path, image: &Path, format: ThumbnailFormat) -> Result<()> {
    let data = std::fs::read(image).map_err(|e| embed_failed(audio, e.to_string()))?;

    let mut tag = match Tag::read_from_path(audio) {
        Ok(tag) => tag,
        Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => {
            debug!(?audio, "no existing tag, creating one");
            Tag::new()
        }
        Err(e) => return Err(embed_failed(audio, e.to_string())),
    };

    tag.remove_picture_by_type(PictureType::CoverFront);
    tag.add_frame(Picture {
        mime_type: format.mime_type().to_string(),
        picture_type: PictureType::CoverFront,
        description: COVER_DESCRIPTION.to_string(),
        data,
    });

    tag.write_to_path(audio, Version::Id3v24)
        .map_err(|e| embed_failed(audio, e.to_string()))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn artwork(path: PathBuf, format: ThumbnailFormat) -> ResolvedArtifact {
        ResolvedArtifact { path, format }
    }

    #[tokio::test]
    async fn test_embed_creates_tag() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("Song.mp3");
        let image = dir.path().join("Song.jpg");
        std::fs::write(&audio, b"not really an mp3 stream").unwrap();
        std::fs::write(&image, b"jpeg bytes").unwrap();

        TagEmbedder::new()
            .embed(&audio, &artwork(image, ThumbnailFormat::Jpeg))
            .await
            .unwrap();

        let tag = Tag::read_from_path(&audio).unwrap();
        let pictures: Vec<_> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].mime_type, "image/jpeg");
        assert_eq!(pictures[0].picture_type, PictureType::CoverFront);
        assert_eq!(pictures[0].description, COVER_DESCRIPTION);
        assert_eq!(pictures[0].data, b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_mime_type_follows_resolved_format() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("Song.mp3");
        let image = dir.path().join("cover.bin");
        std::fs::write(&audio, b"audio").unwrap();
        std::fs::write(&image, b"png bytes").unwrap();

        TagEmbedder::new()
            .embed(&audio, &artwork(image, ThumbnailFormat::Png))
            .await
            .unwrap();

        let tag = Tag::read_from_path(&audio).unwrap();
        let pictures: Vec<_> = tag.pictures().collect();
        assert_eq!(pictures[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_embed_replaces_existing_cover() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("Song.mp3");
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.jpg");
        std::fs::write(&audio, b"audio").unwrap();
        std::fs::write(&first, b"png bytes").unwrap();
        std::fs::write(&second, b"jpeg bytes").unwrap();

        let embedder = TagEmbedder::new();
        embedder
            .embed(&audio, &artwork(first, ThumbnailFormat::Png))
            .await
            .unwrap();
        embedder
            .embed(&audio, &artwork(second, ThumbnailFormat::Jpeg))
            .await
            .unwrap();

        let tag = Tag::read_from_path(&audio).unwrap();
        let pictures: Vec<_> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].mime_type, "image/jpeg");
        assert_eq!(pictures[0].data, b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_embed_into_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("Song.jpg");
        std::fs::write(&image, b"jpeg bytes").unwrap();

        let err = TagEmbedder::new()
            .embed(
                &dir.path().join("missing.mp3"),
                &artwork(image, ThumbnailFormat::Jpeg),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::PostProcess(PostProcessError::EmbedFailed { .. })
        ));
        assert!(!err.is_terminal());
    }

    #[tokio::test]
    async fn test_missing_image_leaves_audio_untouched() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("Song.mp3");
        std::fs::write(&audio, b"audio").unwrap();

        let result = TagEmbedder::new()
            .embed(
                &audio,
                &artwork(dir.path().join("missing.jpg"), ThumbnailFormat::Jpeg),
            )
            .await;
        assert!(result.is_err());
        assert_eq!(std::fs::read(&audio).unwrap(), b"audio");
    }
}
