//! Content decoding.
//!
//! Reverses `gzip` and `deflate` bodies so filters and clients downstream
//! only ever see identity-encoded payloads. Output is bounded; a stream that
//! stops before its end-of-stream marker is an error, not a short body.

use std::io::Read;

use flate2::read::GzDecoder;
use flate2::{Decompress, FlushDecompress, Status};

use crate::error::DecompressionError;

const INFLATE_CHUNK: usize = 32 * 1024;

/// A `Content-Encoding` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEncoding {
    Identity,
    Gzip,
    Deflate,
    Other(String),
}

impl ContentEncoding {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("identity") {
            ContentEncoding::Identity
        } else if value.eq_ignore_ascii_case("gzip") || value.eq_ignore_ascii_case("x-gzip") {
            ContentEncoding::Gzip
        } else if value.eq_ignore_ascii_case("deflate") {
            ContentEncoding::Deflate
        } else {
            ContentEncoding::Other(value.to_string())
        }
    }
}

/// Decode `body`, producing at most `limit` bytes.
pub fn decompress(
    encoding: &ContentEncoding,
    body: &[u8],
    limit: usize,
) -> Result<Vec<u8>, DecompressionError> {
    match encoding {
        ContentEncoding::Identity => Ok(body.to_vec()),
        ContentEncoding::Other(name) => Err(DecompressionError::Unsupported(name.clone())),
        // Bodiless replies (HEAD, 304) still carry the encoding header.
        _ if body.is_empty() => Ok(Vec::new()),
        ContentEncoding::Gzip => gunzip(body, limit),
        ContentEncoding::Deflate => inflate(body, limit),
    }
}

fn gunzip(body: &[u8], limit: usize) -> Result<Vec<u8>, DecompressionError> {
    let mut decoded = Vec::new();
    GzDecoder::new(body)
        .take(limit as u64 + 1)
        .read_to_end(&mut decoded)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => DecompressionError::Truncated,
            _ => DecompressionError::Corrupt(e.to_string()),
        })?;

    if decoded.len() > limit {
        return Err(DecompressionError::TooLarge { limit });
    }
    Ok(decoded)
}

/// zlib-wrapped DEFLATE, falling back to raw DEFLATE when the zlib header
/// check fails.
fn inflate(body: &[u8], limit: usize) -> Result<Vec<u8>, DecompressionError> {
    let mut inflater = Decompress::new(has_zlib_header(body));
    let mut decoded = Vec::with_capacity(INFLATE_CHUNK.min(limit.max(1)));

    loop {
        if decoded.len() == decoded.capacity() {
            decoded.reserve(INFLATE_CHUNK);
        }

        let consumed_before = inflater.total_in();
        let produced_before = inflater.total_out();
        let status = inflater
            .decompress_vec(
                &body[consumed_before as usize..],
                &mut decoded,
                FlushDecompress::Finish,
            )
            .map_err(|e| DecompressionError::Corrupt(e.to_string()))?;

        if decoded.len() > limit {
            return Err(DecompressionError::TooLarge { limit });
        }

        match status {
            Status::StreamEnd => return Ok(decoded),
            Status::Ok | Status::BufError => {
                let progressed = inflater.total_in() != consumed_before
                    || inflater.total_out() != produced_before;
                if !progressed {
                    return Err(DecompressionError::Truncated);
                }
            }
        }
    }
}

fn has_zlib_header(body: &[u8]) -> bool {
    match body {
        [cmf, flg, ..] => cmf & 0x0f == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}
