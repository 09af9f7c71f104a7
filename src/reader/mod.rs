//! Transactional chunk reading over a seekable stream.
//!
//! Every public operation either succeeds or leaves the stream exactly where
//! it found it, so a caller can retry with another interpretation.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::chunk::{ChunkHeader, DecodedChunk, EncodingKind};
use crate::codec;
use crate::error::{ChunkError, ChunkResult};
use crate::limits::Limits;

mod guard;
mod stream;

use guard::Rewind;
use stream::StreamExt;

/// Bytes at the end of a track file holding the checksum the caller verifies.
pub const TRACK_CHECKSUM_SIZE: u64 = 4;

#[derive(Debug)]
pub struct ChunkReader<S> {
    stream: S,
    limits: Limits,
}

impl<S: Read + Seek> ChunkReader<S> {
    pub fn new(stream: S) -> Self {
        Self::with_limits(stream, Limits::default())
    }

    pub fn with_limits(stream: S, limits: Limits) -> Self {
        Self { stream, limits }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn position(&mut self) -> ChunkResult<u64> {
        Ok(self.stream.stream_position()?)
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Parses the next header without consuming it.
    pub fn peek_header(&mut self) -> ChunkResult<ChunkHeader> {
        let mut stream = Rewind::new(&mut self.stream)?;
        ChunkHeader::read(&mut *stream)
    }

    /// Reads and decodes the next chunk.
    ///
    /// # Errors
    /// - [`ChunkError::CorruptChunkSize`] if the declared length reaches the
    ///   size limit or the stream holds fewer bytes than declared.
    /// - [`ChunkError::InvalidChunkEncoding`] for an unknown tag.
    /// - [`ChunkError::CorruptRle`] / [`ChunkError::DestinationTooSmall`] from
    ///   the payload decoder.
    /// - [`ChunkError::ZeroSizedChunk`] if the payload decodes to nothing.
    ///
    /// On any error the stream is back at the position it had on entry.
    pub fn read_chunk(&mut self) -> ChunkResult<DecodedChunk> {
        let max_len = self.limits.max_chunk_size;
        let mut stream = Rewind::new(&mut self.stream)?;

        let header = ChunkHeader::read(&mut *stream)?;
        let length = usize::try_from(header.length()).map_err(|_| ChunkError::CorruptChunkSize)?;
        if length >= max_len {
            return Err(ChunkError::CorruptChunkSize);
        }

        let encoding = header.encoding()?;

        let mut compressed = vec![0u8; length];
        if stream.try_read(&mut compressed)? != length {
            return Err(ChunkError::CorruptChunkSize);
        }

        let data = codec::decode(encoding, &compressed, max_len)?;
        if data.is_empty() {
            return Err(ChunkError::ZeroSizedChunk);
        }

        debug!(
            position = stream.origin(),
            ?encoding,
            compressed = length,
            decoded = data.len(),
            "decoded chunk"
        );
        stream.commit();

        Ok(DecodedChunk::new(encoding, data))
    }

    /// Moves past the next chunk without decoding its payload.
    ///
    /// The payload must be fully present in the stream, otherwise this fails
    /// with [`ChunkError::CorruptChunkSize`].
    pub fn skip_chunk(&mut self) -> ChunkResult<ChunkHeader> {
        let mut stream = Rewind::new(&mut self.stream)?;

        let header = ChunkHeader::read(&mut *stream)?;
        let here = stream.stream_position()?;
        let remaining = stream.length()?.saturating_sub(here);
        if u64::from(header.length()) > remaining {
            return Err(ChunkError::CorruptChunkSize);
        }

        stream.seek(SeekFrom::Current(i64::from(header.length())))?;

        debug!(position = stream.origin(), length = header.length(), "skipped chunk");
        stream.commit();

        Ok(header)
    }

    /// Decodes the rest of the stream as one headerless RLE chunk, leaving the
    /// trailing checksum bytes unread.
    ///
    /// # Errors
    /// [`ChunkError::ZeroSizedChunk`] if fewer than [`TRACK_CHECKSUM_SIZE`]
    /// bytes follow the current position, the remaining length does not fit
    /// in a `u32`, or the payload decodes to nothing.
    pub fn read_chunk_track(&mut self) -> ChunkResult<DecodedChunk> {
        let max_len = self.limits.max_chunk_size;
        let mut stream = Rewind::new(&mut self.stream)?;

        let length = stream
            .length()?
            .checked_sub(stream.origin())
            .and_then(|n| n.checked_sub(TRACK_CHECKSUM_SIZE))
            .and_then(|n| u32::try_from(n).ok())
            .ok_or(ChunkError::ZeroSizedChunk)?;
        let length = usize::try_from(length).map_err(|_| ChunkError::ZeroSizedChunk)?;

        let mut compressed = vec![0u8; length];
        if stream.try_read(&mut compressed)? != length {
            return Err(ChunkError::CorruptChunkSize);
        }

        let data = codec::decode_rle(&compressed, max_len)?;
        if data.is_empty() {
            return Err(ChunkError::ZeroSizedChunk);
        }

        debug!(
            position = stream.origin(),
            compressed = length,
            decoded = data.len(),
            "decoded track chunk"
        );
        stream.commit();

        Ok(DecodedChunk::new(EncodingKind::Rle, data))
    }

    /// Decodes the next chunk into a fixed-size destination.
    ///
    /// A larger chunk is truncated to `dst.len()`; a smaller one leaves the
    /// rest of `dst` zeroed. Returns the decoded length before truncation.
    /// `dst` is untouched when an error is returned.
    pub fn read_chunk_into(&mut self, dst: &mut [u8]) -> ChunkResult<usize> {
        let chunk = self.read_chunk()?;
        let data = chunk.data();

        let copied = data.len().min(dst.len());
        let (head, tail) = dst.split_at_mut(copied);
        head.copy_from_slice(&data[..copied]);
        tail.fill(0);

        Ok(data.len())
    }
}
