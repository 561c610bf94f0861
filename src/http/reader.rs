//! Whole-message reads: framer, parser and body resolver in sequence.

use std::time::Duration;

use tokio::io::AsyncRead;

use crate::config::LimitsConfig;
use crate::error::{ProxyError, Result};
use crate::http::body::{resolve_body, BodyLimits};
use crate::http::framer::read_head;
use crate::http::message::{Message, MessageKind};
use crate::http::parser::parse_head;

/// Bounds applied to every message read from a socket.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    pub max_header_bytes: usize,
    pub body: BodyLimits,
}

impl ReadLimits {
    pub fn from_config(limits: &LimitsConfig, read_timeout: Duration) -> Self {
        Self {
            max_header_bytes: limits.max_header_bytes,
            body: BodyLimits {
                max_body_bytes: limits.max_body_bytes,
                max_decompressed_bytes: limits.max_decompressed_bytes,
                read_timeout,
            },
        }
    }
}

/// Read one complete message.
///
/// `Ok(None)` means the peer closed before a full header block arrived.
/// An unparseable start line is a [`ProxyError::MalformedMessage`].
pub async fn read_message<R>(stream: &mut R, limits: &ReadLimits) -> Result<Option<Message>>
where
    R: AsyncRead + Unpin,
{
    let Some(frame) = read_head(stream, limits.max_header_bytes, limits.body.read_timeout).await?
    else {
        return Ok(None);
    };

    let head = String::from_utf8_lossy(&frame.head);
    let mut message = parse_head(&head);
    if message.kind() == MessageKind::Malformed {
        let first_line = head.lines().next().unwrap_or_default();
        return Err(ProxyError::MalformedMessage(format!(
            "unparseable start line '{}'",
            first_line
        )));
    }

    resolve_body(stream, &mut message, frame.spillover, &limits.body).await?;
    Ok(Some(message))
}
