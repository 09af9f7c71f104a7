use std::io;
use thiserror::Error;

pub type ChunkResult<T> = Result<T, ChunkError>;

/// Every way reading a chunk can fail. All of them are fatal for the chunk
/// being read; the reader has already rewound the stream when one is returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChunkError {
    /// Declared length is absurd or fewer bytes were available than declared.
    #[error("Corrupt chunk size.")]
    CorruptChunkSize,

    /// A run or back-reference points outside its bounds or misses follow-on bytes.
    #[error("Corrupt RLE compression data.")]
    CorruptRle,

    #[error("Chunk data larger than allocated destination capacity.")]
    DestinationTooSmall,

    #[error("Invalid chunk encoding {0}.")]
    InvalidChunkEncoding(u8),

    #[error("Encountered zero-sized chunk.")]
    ZeroSizedChunk,

    /// Stream ended before a full header could be read.
    #[error("Malformed chunk header.")]
    MalformedHeader,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::ChunkError;

    #[test]
    fn display_keeps_legacy_messages() {
        assert_eq!(ChunkError::CorruptChunkSize.to_string(), "Corrupt chunk size.");
        assert_eq!(ChunkError::CorruptRle.to_string(), "Corrupt RLE compression data.");
        assert_eq!(ChunkError::ZeroSizedChunk.to_string(), "Encountered zero-sized chunk.");
    }

    #[test]
    fn invalid_encoding_names_the_tag() {
        let msg = ChunkError::InvalidChunkEncoding(9).to_string();
        assert!(msg.contains('9'));
    }

    #[test]
    fn io_errors_convert() {
        let err: ChunkError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, ChunkError::Io(_)));
    }
}
