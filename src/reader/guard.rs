use core::ops::{Deref, DerefMut};
use std::io::{Result, Seek, SeekFrom};

use tracing::{debug, warn};

/// Captures the stream position on creation and seeks back to it when dropped,
/// unless [`Rewind::commit`] was called first.
///
/// Any early return through `?` therefore leaves the stream where the
/// operation found it.
pub(crate) struct Rewind<'a, S: Seek> {
    stream: &'a mut S,
    origin: u64,
    armed: bool,
}

impl<'a, S: Seek> Rewind<'a, S> {
    pub fn new(stream: &'a mut S) -> Result<Self> {
        let origin = stream.stream_position()?;

        Ok(Self {
            stream,
            origin,
            armed: true,
        })
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }

    /// Keeps the stream where it is now.
    pub fn commit(mut self) {
        self.armed = false;
    }
}

impl<S: Seek> Deref for Rewind<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.stream
    }
}

impl<S: Seek> DerefMut for Rewind<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.stream
    }
}

impl<S: Seek> Drop for Rewind<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        match self.stream.seek(SeekFrom::Start(self.origin)) {
            Ok(_) => debug!(origin = self.origin, "rewound stream"),
            Err(e) => warn!(origin = self.origin, error = %e, "unable to rewind stream"),
        }
    }
}
