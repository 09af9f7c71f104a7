//! Decoder for the chunked "Sawyer" container used by legacy game saves,
//! scenarios and track designs.
//!
//! Layout of a chunk:
//! \[u8\] encoding tag, \[u32 LE\] compressed length, then that many payload
//! bytes encoded as described by [`EncodingKind`].
//!
//! Track designs omit the header: the whole file minus a trailing 4-byte
//! checksum is one RLE payload, see [`ChunkReader::read_chunk_track`].

pub mod chunk;
pub mod codec;
mod error;
mod limits;
pub mod reader;

pub use chunk::{ChunkHeader, DecodedChunk, EncodingKind};
pub use error::{ChunkError, ChunkResult};
pub use limits::{Limits, MAX_UNCOMPRESSED_CHUNK_SIZE};
pub use reader::{ChunkReader, TRACK_CHECKSUM_SIZE};
