use std::io::{ErrorKind, Read, Result, Seek, SeekFrom};

/// Stream primitives the chunk reader needs on top of `Read + Seek`.
pub(crate) trait StreamExt: Read + Seek {
    /// Reads until `buf` is full or the stream ends, returning how many bytes
    /// landed in `buf`.
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(filled)
    }

    /// Total stream length. The position is left where it was.
    fn length(&mut self) -> Result<u64> {
        let pos = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        if pos != len {
            self.seek(SeekFrom::Start(pos))?;
        }

        Ok(len)
    }
}

impl<S: Read + Seek + ?Sized> StreamExt for S {}
