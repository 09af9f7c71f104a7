use bytes::BufMut;

use super::ensure_room;
use crate::error::{ChunkError, ChunkResult};

const BACK_REFERENCE_ESCAPE: u8 = 0xFF;

/// Decodes the primary run-length scheme.
///
/// A control byte with the high bit set repeats the following byte
/// `257 - code` times (2..=129). Any other control byte is followed by
/// `code + 1` literal bytes (1..=128).
pub fn decode_rle(src: &[u8], max_len: usize) -> ChunkResult<Vec<u8>> {
    let mut out = Vec::with_capacity(src.len().min(max_len));

    let mut i = 0;
    while i < src.len() {
        let code = src[i];
        if code & 0x80 != 0 {
            let count = 257 - usize::from(code);
            let &value = src.get(i + 1).ok_or(ChunkError::CorruptRle)?;
            ensure_room(out.len(), count, max_len)?;

            out.put_bytes(value, count);
            i += 2;
        } else {
            let len = usize::from(code) + 1;
            if i + 1 >= src.len() {
                return Err(ChunkError::CorruptRle);
            }
            ensure_room(out.len(), len, max_len)?;
            let literal = src.get(i + 1..i + 1 + len).ok_or(ChunkError::CorruptRle)?;

            out.put_slice(literal);
            i += 1 + len;
        }
    }

    Ok(out)
}

/// Decodes RLE, then expands back-references over the result.
pub fn decode_rle_compressed(src: &[u8], max_len: usize) -> ChunkResult<Vec<u8>> {
    let intermediate = decode_rle(src, max_len)?;
    expand_back_references(&intermediate, max_len)
}

/// `0xFF` escapes one literal byte. Any other code copies `(code & 7) + 1`
/// bytes starting `32 - (code >> 3)` bytes behind the end of the output built
/// so far. The whole source range must already exist in the output.
fn expand_back_references(src: &[u8], max_len: usize) -> ChunkResult<Vec<u8>> {
    let mut out = Vec::with_capacity(src.len().min(max_len));

    let mut codes = src.iter().copied();
    while let Some(code) = codes.next() {
        if code == BACK_REFERENCE_ESCAPE {
            let literal = codes.next().ok_or(ChunkError::CorruptRle)?;
            ensure_room(out.len(), 1, max_len)?;
            out.push(literal);
            continue;
        }

        let count = usize::from(code & 0x07) + 1;
        let distance = 32 - usize::from(code >> 3);
        let start = out
            .len()
            .checked_sub(distance)
            .ok_or(ChunkError::CorruptRle)?;
        if start + count > out.len() {
            return Err(ChunkError::CorruptRle);
        }
        ensure_room(out.len(), count, max_len)?;

        for at in start..start + count {
            let byte = out[at];
            out.push(byte);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_run() {
        assert_eq!(decode_rle(&[0x02, 7, 8, 9], 64).unwrap(), vec![7, 8, 9]);
    }

    #[test]
    fn repeat_run() {
        assert_eq!(decode_rle(&[0xFE, 0x05], 64).unwrap(), vec![5, 5, 5]);
    }

    #[test]
    fn repeat_run_bounds() {
        assert_eq!(decode_rle(&[0xFF, 1], 1024).unwrap().len(), 2);
        assert_eq!(decode_rle(&[0x80, 1], 1024).unwrap().len(), 129);
    }

    #[test]
    fn mixed_runs_concatenate() {
        let src = [0x01, b'a', b'b', 0xFD, b'c', 0x00, b'd'];
        assert_eq!(decode_rle(&src, 64).unwrap(), b"abccccd".to_vec());
    }

    #[test]
    fn empty_input_decodes_to_nothing() {
        assert!(decode_rle(&[], 64).unwrap().is_empty());
    }

    #[test]
    fn repeat_without_value_is_corrupt() {
        assert!(matches!(decode_rle(&[0xFE], 64), Err(ChunkError::CorruptRle)));
    }

    #[test]
    fn trailing_literal_code_is_corrupt() {
        assert!(matches!(decode_rle(&[0xFE, 1, 0x00], 64), Err(ChunkError::CorruptRle)));
    }

    #[test]
    fn short_literal_is_corrupt() {
        assert!(matches!(decode_rle(&[0x02, 7, 8], 64), Err(ChunkError::CorruptRle)));
    }

    #[test]
    fn output_over_limit_fails() {
        let err = decode_rle(&[0xFE, 5, 0xFE, 5], 4).unwrap_err();
        assert!(matches!(err, ChunkError::DestinationTooSmall));

        let err = decode_rle(&[0x04, 1, 2, 3, 4, 5], 4).unwrap_err();
        assert!(matches!(err, ChunkError::DestinationTooSmall));
    }

    #[test]
    fn back_reference_copies_previous_bytes() {
        let src = [0xFF, b'A', 0xFF, b'B', 0xF1];
        assert_eq!(expand_back_references(&src, 64).unwrap(), b"ABAB".to_vec());
    }

    #[test]
    fn back_reference_extends_single_byte_run() {
        // distance 1, count 1, three times
        let src = [0xFF, b'z', 0xF8, 0xF8, 0xF8];
        assert_eq!(expand_back_references(&src, 64).unwrap(), b"zzzz".to_vec());
    }

    #[test]
    fn back_reference_before_origin_is_corrupt() {
        assert!(matches!(
            expand_back_references(&[0xFF, b'A', 0xF1], 64),
            Err(ChunkError::CorruptRle)
        ));
        assert!(matches!(
            expand_back_references(&[0x00], 64),
            Err(ChunkError::CorruptRle)
        ));
    }

    #[test]
    fn back_reference_past_output_end_is_corrupt() {
        // distance 1, count 2 with two bytes emitted
        let src = [0xFF, b'A', 0xFF, b'B', 0xF9];
        assert!(matches!(expand_back_references(&src, 64), Err(ChunkError::CorruptRle)));
    }

    #[test]
    fn escape_without_literal_is_corrupt() {
        assert!(matches!(
            expand_back_references(&[0xFF, b'A', 0xFF], 64),
            Err(ChunkError::CorruptRle)
        ));
    }

    #[test]
    fn back_reference_over_limit_fails() {
        let src = [0xFF, b'A', 0xFF, b'B', 0xF1];
        assert!(matches!(
            expand_back_references(&src, 3),
            Err(ChunkError::DestinationTooSmall)
        ));
    }

    #[test]
    fn rle_then_back_references() {
        let src = [0x04, 0xFF, b'A', 0xFF, b'B', 0xF1];
        assert_eq!(decode_rle_compressed(&src, 64).unwrap(), b"ABAB".to_vec());
    }
}
