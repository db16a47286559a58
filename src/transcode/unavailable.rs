//! Stub probe/transcode tools for graceful degradation

use super::traits::{MediaTools, TranscodeProcess, TranscodeRequest};
use async_trait::async_trait;
use std::path::Path;

/// Tools used when ffmpeg or ffprobe cannot be found
///
/// Every operation returns `Error::NotSupported`. Jobs that never re-encode are
/// unaffected; a re-encode fails with "Re-encoding failed".
pub struct UnavailableMediaTools;

const UNAVAILABLE_MSG: &str = "re-encoding requires the ffmpeg and ffprobe binaries. Configure ffmpeg_path/ffprobe_path in config or ensure both are in PATH.";

#[async_trait]
impl MediaTools for UnavailableMediaTools {
    async fn probe_duration(&self, _path: &Path) -> crate::Result<f64> {
        Err(crate::Error::NotSupported(UNAVAILABLE_MSG.into()))
    }

    async fn spawn_transcode(
        &self,
        _request: &TranscodeRequest,
    ) -> crate::Result<Box<dyn TranscodeProcess>> {
        Err(crate::Error::NotSupported(UNAVAILABLE_MSG.into()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
