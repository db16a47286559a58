//! Line reading for external tool output
//!
//! Tools echo titles and file names in whatever encoding the filesystem or the
//! remote side used, so lines are decoded lossily instead of failing the read.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};

/// Newline-separated lines of `R`, invalid UTF-8 replaced with U+FFFD
pub(crate) struct LossyLines<R> {
    segments: Split<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            segments: BufReader::new(reader).split(b'\n'),
        }
    }

    /// Next line without its terminator, None at end of stream
    pub(crate) async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let Some(mut segment) = self.segments.next_segment().await? else {
            return Ok(None);
        };
        if segment.last() == Some(&b'\r') {
            segment.pop();
        }
        Ok(Some(String::from_utf8_lossy(&segment).into_owned()))
    }
}
