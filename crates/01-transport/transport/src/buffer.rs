//! Owned byte buffers handed between the codec and the RPC transport.
//!
//! A [`Buffer`] owns exactly one contiguous array at a time. Replacing or
//! resetting the contents hands the old array to its [`Release`] strategy, and
//! dropping the buffer does the same, so every installed array is released
//! exactly once.

use crate::{TransportError, TransportResult};
use std::fmt;

type ReleaseFn = Box<dyn FnOnce(Box<[u8]>) + Send>;

/// Strategy used to give a buffer's backing array back once the buffer lets go of it.
pub enum Release {
    /// Drop the array (the default for arrays allocated by the codec).
    Free,
    /// Hand the array to a caller-provided function, e.g. to recycle it into a pool.
    Callback(ReleaseFn),
}

impl Release {
    /// Wraps `f` as a release strategy.
    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce(Box<[u8]>) + Send + 'static,
    {
        Release::Callback(Box::new(f))
    }

    fn run(self, data: Box<[u8]>) {
        match self {
            Release::Free => drop(data),
            Release::Callback(f) => f(data),
        }
    }
}

impl Default for Release {
    fn default() -> Self {
        Release::Free
    }
}

impl fmt::Debug for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Release::Free => f.write_str("Free"),
            Release::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Contiguous, exclusively owned byte region.
///
/// The buffer never writes into its backing array itself; callers may fill a
/// reserved header through [`Buffer::header_mut`] or [`Buffer::data_mut`].
#[derive(Default)]
pub struct Buffer {
    contents: Option<(Box<[u8]>, Release)>,
}

impl Buffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self { contents: None }
    }

    /// Creates a buffer owning `data`, released with [`Release::Free`].
    pub fn from_vec(data: Vec<u8>) -> Self {
        let mut buffer = Self::new();
        buffer.set_data(data.into_boxed_slice(), Release::Free);
        buffer
    }

    /// Replaces the contents with `data`, releasing the previous array first.
    pub fn set_data(&mut self, data: Box<[u8]>, release: Release) {
        self.release_contents();
        self.contents = Some((data, release));
    }

    /// Releases the current contents and returns to the empty state.
    pub fn reset(&mut self) {
        self.release_contents();
    }

    /// Borrow the full contents.
    pub fn data(&self) -> &[u8] {
        match &self.contents {
            Some((data, _)) => &data[..],
            None => &[],
        }
    }

    /// Borrow the full contents mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        match &mut self.contents {
            Some((data, _)) => &mut data[..],
            None => &mut [],
        }
    }

    /// Total number of bytes held.
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns true when the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutable view of the first `len` bytes, reserved for a transport header.
    pub fn header_mut(&mut self, len: usize) -> TransportResult<&mut [u8]> {
        let length = self.len();
        if len > length {
            return Err(TransportError::HeaderOutOfBounds {
                requested: len,
                length,
            });
        }
        Ok(&mut self.data_mut()[..len])
    }

    /// Everything after a header reservation of `skip_bytes`.
    pub fn payload(&self, skip_bytes: usize) -> TransportResult<&[u8]> {
        let data = self.data();
        data.get(skip_bytes..)
            .ok_or(TransportError::HeaderOutOfBounds {
                requested: skip_bytes,
                length: data.len(),
            })
    }

    fn release_contents(&mut self) {
        if let Some((data, release)) = self.contents.take() {
            release.run(data);
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.release_contents();
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len())
            .field("release", &self.contents.as_ref().map(|(_, release)| release))
            .finish()
    }
}
