//! Bounds applied while reading chunks.

/// Chunks may decode to at most 16 MiB.
pub const MAX_UNCOMPRESSED_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Size limits enforced by [`ChunkReader`](crate::ChunkReader).
///
/// `max_chunk_size` bounds the declared compressed length of a chunk (a length
/// at or above it is rejected before anything is allocated) and, separately,
/// the size a payload may expand to while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_chunk_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_chunk_size: MAX_UNCOMPRESSED_CHUNK_SIZE,
        }
    }
}

impl Limits {
    #[must_use]
    pub const fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }

    /// Small limits so tests can hit the bounds without megabytes of input.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_chunk_size: 1024,
        }
    }

    /// Effectively no bound; only use on trusted input.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_chunk_size: usize::MAX,
        }
    }
}
