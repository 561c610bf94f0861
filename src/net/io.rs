//! Socket boundary used by the message engine.
//!
//! Two primitives: read whatever is available into a buffer, and write a
//! whole buffer, resuming after partial writes. Both run under a deadline
//! and map I/O failures onto the socket error variants.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProxyError, Result};
use crate::resilience::with_deadline;

/// Size of a single socket read.
pub const READ_CHUNK: usize = 8 * 1024;

/// Read available bytes into `buf`; `Ok(0)` means the peer closed.
pub async fn read_some<R>(stream: &mut R, buf: &mut [u8], timeout: Duration) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    with_deadline("socket read", timeout, async {
        stream.read(buf).await.map_err(ProxyError::SocketRead)
    })
    .await
}

/// Write all of `bytes`; a failure part-way is reported, never swallowed.
pub async fn write_all<W>(stream: &mut W, bytes: &[u8], timeout: Duration) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    with_deadline("socket write", timeout, async {
        stream.write_all(bytes).await.map_err(ProxyError::SocketWrite)?;
        stream.flush().await.map_err(ProxyError::SocketWrite)
    })
    .await
}
