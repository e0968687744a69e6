//! Line framing over a byte stream.
//!
//! Commands and responses are delimited by a single `\n` byte, regardless of
//! how the underlying transport chunks the data. The framer buffers partial
//! reads per connection and hands out exactly one line at a time.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read buffer size
const BUFFER_SIZE: usize = 4 * 1024;

/// Buffered line reader for one connection.
///
/// Owns the inbound byte buffer so that bytes arriving after a terminator
/// stay queued for the next call.
pub struct LineFramer {
    buffer: BytesMut,
}

impl LineFramer {
    pub fn new() -> Self {
        LineFramer {
            buffer: BytesMut::with_capacity(BUFFER_SIZE),
        }
    }

    /// Read one `\n`-terminated line, exclusive of the terminator.
    ///
    /// Returns `Ok(None)` when the transport closes before a terminator
    /// arrives; any undelimited bytes accumulated at that point are dropped
    /// rather than executed as a partial command. Invalid UTF-8 is replaced
    /// rather than rejected.
    pub async fn read_line<R>(&mut self, transport: &mut R) -> std::io::Result<Option<String>>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
                self.buffer.advance(pos + 1);
                return Ok(Some(line));
            }

            let n = transport.read_buf(&mut self.buffer).await?;
            if n == 0 {
                self.buffer.clear();
                return Ok(None);
            }
        }
    }

    /// Write one line, appending the terminator.
    pub async fn write_line<W>(transport: &mut W, text: &str) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        transport.write_all(text.as_bytes()).await?;
        transport.write_all(b"\n").await?;
        transport.flush().await
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}
