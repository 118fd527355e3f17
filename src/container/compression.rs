//! Zlib support for compressed array properties.
//!
//! Array payloads with encoding 1 are a complete zlib stream (header,
//! deflate data, adler32) that must inflate to exactly `count * element_size`
//! bytes.

use std::io::Read;

use flate2::read::ZlibDecoder;
use thiserror::Error;

/// Failure while inflating an array payload.
#[derive(Error, Debug)]
pub enum InflateError {
    #[error("zlib stream invalid: {0}")]
    Stream(#[from] std::io::Error),

    #[error("inflated to {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("{compressed} compressed bytes cannot inflate to {expected}")]
    Implausible { expected: usize, compressed: usize },
}

/// Upper bound on deflate expansion.
pub const MAX_INFLATE_RATIO: usize = 1032;

/// Inflate a zlib stream, requiring exactly `expected` output bytes.
///
/// Claims beyond [`MAX_INFLATE_RATIO`] times the input are rejected before
/// any output is reserved.
pub fn inflate(data: &[u8], expected: usize) -> Result<Vec<u8>, InflateError> {
    if expected > data.len().saturating_mul(MAX_INFLATE_RATIO) {
        return Err(InflateError::Implausible {
            expected,
            compressed: data.len(),
        });
    }
    let decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(expected);
    // One extra byte is enough to detect oversized streams without
    // inflating all of them.
    decoder.take(expected as u64 + 1).read_to_end(&mut out)?;
    if out.len() != expected {
        return Err(InflateError::SizeMismatch {
            expected,
            actual: out.len(),
        });
    }
    Ok(out)
}
