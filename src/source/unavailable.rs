//! Stub media source for graceful degradation

use super::traits::{FetchOptions, Materialized, MediaSource, ProgressCallback};
use crate::types::MediaInfo;
use async_trait::async_trait;

/// Media source used when no fetch tool is available
///
/// Every operation returns `Error::NotSupported`, which the worker reports as a
/// failed download instead of refusing to construct.
pub struct UnavailableMediaSource;

const UNAVAILABLE_MSG: &str =
    "media fetching requires the yt-dlp binary. Configure ytdlp_path in config or ensure yt-dlp is in PATH.";

#[async_trait]
impl MediaSource for UnavailableMediaSource {
    async fn extract_info(&self, _url: &str) -> crate::Result<MediaInfo> {
        Err(crate::Error::NotSupported(UNAVAILABLE_MSG.into()))
    }

    async fn fetch(
        &self,
        _url: &str,
        _options: &FetchOptions,
        _progress: ProgressCallback<'_>,
    ) -> crate::Result<Materialized> {
        Err(crate::Error::NotSupported(UNAVAILABLE_MSG.into()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
