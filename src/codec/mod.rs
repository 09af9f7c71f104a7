//! Payload decoders, one per [`EncodingKind`].
//!
//! Every decoder takes the compressed payload and the largest output it may
//! produce. Growing past that bound is [`ChunkError::DestinationTooSmall`],
//! never a silent truncation.

use tap::Pipe;

use crate::chunk::EncodingKind;
use crate::error::{ChunkError, ChunkResult};

mod rle;
mod rotate;

pub use rle::{decode_rle, decode_rle_compressed};
pub use rotate::decode_rotate;

pub fn decode(encoding: EncodingKind, src: &[u8], max_len: usize) -> ChunkResult<Vec<u8>> {
    match encoding {
        EncodingKind::Identity => decode_identity(src, max_len)?,
        EncodingKind::Rle => decode_rle(src, max_len)?,
        EncodingKind::RleCompressed => decode_rle_compressed(src, max_len)?,
        EncodingKind::Rotate => decode_rotate(src, max_len)?,
    }
    .pipe(Ok)
}

pub fn decode_identity(src: &[u8], max_len: usize) -> ChunkResult<Vec<u8>> {
    ensure_room(0, src.len(), max_len)?;
    Ok(src.to_vec())
}

/// Fails when `len + extra` bytes would not fit in `max_len`.
fn ensure_room(len: usize, extra: usize, max_len: usize) -> ChunkResult<()> {
    match len.checked_add(extra) {
        Some(total) if total <= max_len => Ok(()),
        _ => Err(ChunkError::DestinationTooSmall),
    }
}
