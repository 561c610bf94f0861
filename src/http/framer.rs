//! Header boundary detection over a byte stream.
//!
//! # Responsibilities
//! - Accumulate socket reads until `\r\n\r\n` appears
//! - Hand back bytes read past the terminator as body spillover
//! - Refuse header blocks larger than the configured bound
//!
//! # Design Decisions
//! - The buffer grows on demand but never past `max_header_bytes + 4`
//! - Each read asks for at most the remaining budget, so an oversized head
//!   is detected without ever buffering more than the bound
//! - The terminator search resumes three bytes before the previous end, so a
//!   terminator split across reads is still found

use std::time::Duration;

use tokio::io::AsyncRead;

use crate::error::{ProxyError, Result};
use crate::net::io::{read_some, READ_CHUNK};

pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// A header block and whatever body bytes arrived with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Header bytes, terminator excluded.
    pub head: Vec<u8>,
    /// Bytes after the terminator; they belong to the body.
    pub spillover: Vec<u8>,
}

/// Read until the end of the header block.
///
/// Returns `Ok(None)` when the peer closes before a terminator arrives.
pub async fn read_head<R>(
    stream: &mut R,
    max_header_bytes: usize,
    read_timeout: Duration,
) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let limit = max_header_bytes + HEADER_TERMINATOR.len();
    let mut buffer = Vec::with_capacity(limit.min(READ_CHUNK));
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let room = limit - buffer.len();
        if room == 0 {
            return Err(ProxyError::MalformedMessage(format!(
                "header block exceeds {} bytes",
                max_header_bytes
            )));
        }

        let wanted = room.min(chunk.len());
        let read = read_some(stream, &mut chunk[..wanted], read_timeout).await?;
        if read == 0 {
            if !buffer.is_empty() {
                tracing::debug!(buffered = buffer.len(), "Peer closed inside header block");
            }
            return Ok(None);
        }

        let search_from = buffer.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        buffer.extend_from_slice(&chunk[..read]);

        if let Some(offset) = find_terminator(&buffer[search_from..]) {
            let end = search_from + offset;
            let spillover = buffer.split_off(end + HEADER_TERMINATOR.len());
            buffer.truncate(end);
            return Ok(Some(Frame {
                head: buffer,
                spillover,
            }));
        }
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}
