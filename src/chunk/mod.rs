use core::fmt::Debug;
use std::io::{ErrorKind, Read};
use tracing::trace;
use zerocopy::{
    FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, LittleEndian, TryFromBytes,
    Unaligned, U32,
};

use crate::error::{ChunkError, ChunkResult};

/// Header in front of every chunk payload, exactly as stored on disk.
///
/// The encoding tag is kept raw so inspection tools can report tags this crate
/// does not know about; [`ChunkHeader::encoding`] validates it.
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct ChunkHeader {
    pub encoding: u8,
    length: U32<LittleEndian>,
}

impl ChunkHeader {
    pub const SIZE: usize = 5;

    pub fn new(encoding: EncodingKind, length: u32) -> Self {
        Self {
            encoding: encoding as u8,
            length: length.into(),
        }
    }

    /// Reads a header from `reader`. Running out of bytes before all
    /// [`Self::SIZE`] bytes arrive is [`ChunkError::MalformedHeader`].
    ///
    /// Neither the tag nor the length is validated here.
    pub fn read(mut reader: impl Read) -> ChunkResult<Self> {
        let mut header = Self::new_zeroed();
        reader
            .read_exact(header.as_mut_bytes())
            .map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => ChunkError::MalformedHeader,
                _ => ChunkError::Io(e),
            })?;

        trace!(encoding = header.encoding, length = header.length(), "read chunk header");
        Ok(header)
    }

    pub fn from_prefix(bytes: &[u8]) -> ChunkResult<(Self, &[u8])> {
        Self::read_from_prefix(bytes).map_err(|_| ChunkError::MalformedHeader)
    }

    /// Compressed payload length in bytes.
    pub fn length(&self) -> u32 {
        self.length.get()
    }

    pub fn encoding(&self) -> ChunkResult<EncodingKind> {
        EncodingKind::try_read_from_bytes(&[self.encoding])
            .map_err(|_| ChunkError::InvalidChunkEncoding(self.encoding))
    }
}

impl Debug for ChunkHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkHeader")
            .field("encoding", &self.encoding().ok())
            .field("raw_encoding", &self.encoding)
            .field("length()", &self.length())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromBytes, IntoBytes, Immutable)]
#[repr(u8)]
pub enum EncodingKind {
    Identity = 0,
    Rle = 1,
    /// RLE followed by a back-reference pass.
    RleCompressed = 2,
    Rotate = 3,
}

impl EncodingKind {
    pub const ALL: [EncodingKind; 4] = [
        EncodingKind::Identity,
        EncodingKind::Rle,
        EncodingKind::RleCompressed,
        EncodingKind::Rotate,
    ];
}

/// A fully decoded chunk. Never mutated once built.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedChunk {
    encoding: EncodingKind,
    data: Vec<u8>,
}

impl DecodedChunk {
    pub(crate) fn new(encoding: EncodingKind, data: Vec<u8>) -> Self {
        Self { encoding, data }
    }

    /// Encoding the payload was stored with.
    pub fn encoding(&self) -> EncodingKind {
        self.encoding
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for DecodedChunk {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Debug for DecodedChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedChunk")
            .field("encoding", &self.encoding)
            .field("data.len()", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bytes::{BufMut, BytesMut};
    use zerocopy::IntoBytes;

    use super::{ChunkHeader, EncodingKind};
    use crate::error::ChunkError;

    #[test]
    fn header_is_five_bytes_little_endian() {
        let header = ChunkHeader::new(EncodingKind::Rotate, 0x0102_0304);
        assert_eq!(header.as_bytes(), &[3, 4, 3, 2, 1]);
        assert_eq!(core::mem::size_of::<ChunkHeader>(), ChunkHeader::SIZE);
    }

    #[test]
    fn read_header() {
        let mut buf = BytesMut::new();
        (&mut buf).writer().write_all(&[1, 0x10, 0, 0, 0, 0xAA]).unwrap();

        let header = ChunkHeader::read(&buf[..]).unwrap();
        assert_eq!(header.encoding().unwrap(), EncodingKind::Rle);
        assert_eq!(header.length(), 16);
    }

    #[test]
    fn short_header_is_malformed() {
        let err = ChunkHeader::read(&[0u8, 1, 0][..]).unwrap_err();
        assert!(matches!(err, ChunkError::MalformedHeader));

        let err = ChunkHeader::from_prefix(&[]).unwrap_err();
        assert!(matches!(err, ChunkError::MalformedHeader));
    }

    #[test]
    fn unknown_tag_parses_but_does_not_validate() {
        let (header, rest) = ChunkHeader::from_prefix(&[7, 1, 0, 0, 0, 9]).unwrap();
        assert_eq!(rest, &[9]);
        assert_eq!(header.length(), 1);
        assert!(matches!(header.encoding(), Err(ChunkError::InvalidChunkEncoding(7))));
    }

    #[test]
    fn every_known_tag_round_trips() {
        for kind in EncodingKind::ALL {
            assert_eq!(ChunkHeader::new(kind, 0).encoding().unwrap(), kind);
        }
    }
}
