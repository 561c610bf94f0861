//! Body resolution.
//!
//! # Responsibilities
//! - Decide from the header fields how the body is delimited
//! - Read the rest of the body after the framer's spillover
//! - Decode compressed bodies and rewrite the framing headers to match
//!
//! # Design Decisions
//! - `Content-Length` is honoured only for identity (or absent) encodings
//! - Any other signal means read-until-close; no chunked decoding
//! - A body that is still chunk-framed passes through untouched, since
//!   neither decoding nor a new `Content-Length` would match its framing
//! - A short length-delimited body is returned as-is (best effort)

use std::time::Duration;

use tokio::io::AsyncRead;

use crate::error::{ProxyError, Result};
use crate::http::decode::{decompress, ContentEncoding};
use crate::http::message::{Headers, Message};
use crate::net::io::{read_some, READ_CHUNK};

/// How the body of a message is delimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyPlan {
    /// No framing header at all.
    Empty,
    /// Exactly this many bytes.
    Length(usize),
    /// Everything until the peer closes, then decoded.
    UntilClose(ContentEncoding),
}

/// Limits applied while reading a body.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimits {
    pub max_body_bytes: usize,
    pub max_decompressed_bytes: usize,
    pub read_timeout: Duration,
}

pub fn plan_body(headers: &Headers) -> BodyPlan {
    let length = headers.get("Content-Length");
    let encoding = headers.get("Content-Encoding").map(ContentEncoding::parse);
    let transfer = headers.get("Transfer-Encoding");

    if length.is_none() && encoding.is_none() && transfer.is_none() {
        return BodyPlan::Empty;
    }

    match (length, encoding) {
        (Some(length), None) | (Some(length), Some(ContentEncoding::Identity)) => {
            // Anything that is not a non-negative integer counts as zero.
            BodyPlan::Length(length.trim().parse().unwrap_or(0))
        }
        (_, encoding) => BodyPlan::UntilClose(encoding.unwrap_or(ContentEncoding::Identity)),
    }
}

/// True when `Transfer-Encoding` lists `chunked`.
pub fn is_chunk_framed(headers: &Headers) -> bool {
    headers
        .get("Transfer-Encoding")
        .is_some_and(|value| value.split(',').any(|coding| coding.trim().eq_ignore_ascii_case("chunked")))
}

/// Read and decode the body of `message`, starting from `spillover`.
///
/// For read-until-close bodies the framing headers are rewritten afterwards:
/// `Content-Encoding: identity` and `Content-Length` set to the final length,
/// with any `Transfer-Encoding` removed. Chunk-framed bodies are kept raw.
pub async fn resolve_body<R>(
    stream: &mut R,
    message: &mut Message,
    spillover: Vec<u8>,
    limits: &BodyLimits,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    match plan_body(&message.headers) {
        BodyPlan::Empty => {
            message.body = Vec::new();
        }
        BodyPlan::Length(length) => {
            if length > limits.max_body_bytes {
                return Err(ProxyError::MalformedMessage(format!(
                    "Content-Length {} exceeds limit of {} bytes",
                    length, limits.max_body_bytes
                )));
            }
            message.body = read_exact_best_effort(stream, spillover, length, limits.read_timeout).await?;
        }
        BodyPlan::UntilClose(encoding) => {
            let raw = read_to_close(stream, spillover, limits).await?;
            if is_chunk_framed(&message.headers) {
                tracing::debug!(bytes = raw.len(), "Passing chunk-framed body through undecoded");
                message.body = raw;
                return Ok(());
            }
            if encoding != ContentEncoding::Identity {
                tracing::debug!(encoding = ?encoding, compressed = raw.len(), "Decompressing body");
            }
            let decoded = decompress(&encoding, &raw, limits.max_decompressed_bytes)?;
            message.headers.remove("Transfer-Encoding");
            message.headers.insert("Content-Encoding", "identity");
            message.headers.insert("Content-Length", decoded.len().to_string());
            message.body = decoded;
        }
    }
    Ok(())
}

async fn read_exact_best_effort<R>(
    stream: &mut R,
    mut body: Vec<u8>,
    length: usize,
    read_timeout: Duration,
) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    body.truncate(length);
    body.reserve(length - body.len());

    let mut chunk = [0u8; READ_CHUNK];
    while body.len() < length {
        let wanted = (length - body.len()).min(chunk.len());
        let read = read_some(stream, &mut chunk[..wanted], read_timeout).await?;
        if read == 0 {
            tracing::debug!(expected = length, received = body.len(), "Peer closed before full body");
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }
    Ok(body)
}

async fn read_to_close<R>(stream: &mut R, mut body: Vec<u8>, limits: &BodyLimits) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        if body.len() > limits.max_body_bytes {
            return Err(ProxyError::MalformedMessage(format!(
                "close-delimited body exceeds {} bytes",
                limits.max_body_bytes
            )));
        }
        let read = read_some(stream, &mut chunk, limits.read_timeout).await?;
        if read == 0 {
            return Ok(body);
        }
        body.extend_from_slice(&chunk[..read]);
    }
}
