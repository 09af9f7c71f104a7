use tap::Pipe;

use super::ensure_room;
use crate::error::ChunkResult;

const ROTATIONS: [u32; 4] = [1, 3, 5, 7];

/// Undoes the byte scrambling: each byte is rotated right by 1, 3, 5, 7 and
/// then the cycle starts over.
pub fn decode_rotate(src: &[u8], max_len: usize) -> ChunkResult<Vec<u8>> {
    ensure_room(0, src.len(), max_len)?;

    src.iter()
        .zip(ROTATIONS.iter().cycle())
        .map(|(&byte, &amount)| byte.rotate_right(amount))
        .collect::<Vec<u8>>()
        .pipe(Ok)
}
