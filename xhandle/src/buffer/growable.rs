//! Growable byte buffer with a read cursor.
//!
//! Bytes are appended at the write end and consumed from the read cursor, the
//! way data moves between the codecs and the handles.

use core::fmt;

use bytes::{Buf, Bytes};

use super::double_capacity;

/// A growable byte buffer.
///
/// `storage[..position]` has already been consumed; `storage[position..]` is
/// the unread region. Growth never moves or discards written bytes.
#[derive(Clone, Default)]
pub struct Buffer {
    /// The underlying storage. Its length is the write extent.
    storage: Vec<u8>,

    /// Read cursor.
    position: usize,
}

impl Buffer {
    /// Creates a new empty buffer.
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            position: 0,
        }
    }

    /// Creates an empty buffer able to hold `capacity` bytes without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Vec::with_capacity(capacity),
            position: 0,
        }
    }

    /// Wraps an existing vector; all of its bytes are unread.
    pub fn from_vec(storage: Vec<u8>) -> Self {
        Self {
            storage,
            position: 0,
        }
    }

    /// Creates a buffer holding a copy of `data`.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Returns the number of unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len() - self.position
    }

    /// Returns true if there is nothing left to read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the allocated capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns the read cursor.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the unread bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.position..]
    }

    /// Appends `data`, doubling the capacity as many times as needed.
    pub fn put_slice(&mut self, data: &[u8]) {
        while self.storage.capacity() - self.storage.len() < data.len() {
            self.double();
        }
        self.storage.extend_from_slice(data);
    }

    /// Doubles the capacity (minimum 1) keeping all content at the same offsets.
    pub fn double(&mut self) {
        double_capacity(&mut self.storage);
    }

    /// Releases capacity beyond the written extent.
    pub fn shrink_to_fit(&mut self) {
        self.storage.shrink_to_fit();
    }

    /// Overwrites the whole allocation with zeros and resets the buffer to empty.
    ///
    /// Meant for scrubbing secrets such as passwords after use.
    pub fn zero(&mut self) {
        let capacity = self.storage.capacity();
        self.storage.resize(capacity, 0);
        self.storage.fill(0);
        let _ = core::hint::black_box(&mut self.storage);
        self.storage.clear();
        self.position = 0;
    }

    /// Copies the unread bytes into a new, independent buffer.
    ///
    /// The source cursor does not move.
    pub fn duplicate(&self) -> Buffer {
        Buffer::copy_from_slice(self.as_slice())
    }

    /// Discards all content.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.position = 0;
    }

    /// Returns the unread bytes as an immutable, shareable `Bytes`.
    pub fn into_bytes(mut self) -> Bytes {
        if self.position > 0 {
            self.storage.drain(..self.position);
        }
        Bytes::from(self.storage)
    }

    /// Returns the unread bytes as a vector.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.storage.drain(..self.position);
        self.storage
    }

    /// Write end for the codecs, which fill spare capacity directly.
    pub(crate) fn storage_mut(&mut self) -> &mut Vec<u8> {
        &mut self.storage
    }
}

/// Concatenates two optional buffers, consuming both.
///
/// Absent buffers count as empty. Returns `None` when there is nothing to
/// read in either; when only one is present it is returned as is.
pub fn concat(first: Option<Buffer>, second: Option<Buffer>) -> Option<Buffer> {
    let total = first.as_ref().map_or(0, Buffer::len) + second.as_ref().map_or(0, Buffer::len);
    if total == 0 {
        return None;
    }

    match (first, second) {
        (Some(first), None) => Some(first),
        (None, Some(second)) => Some(second),
        (Some(first), Some(second)) => {
            let mut joined = Buffer::with_capacity(total);
            joined.put_slice(first.as_slice());
            joined.put_slice(second.as_slice());
            Some(joined)
        }
        (None, None) => None,
    }
}

impl Buf for Buffer {
    fn remaining(&self) -> usize {
        self.len()
    }

    fn chunk(&self) -> &[u8] {
        self.as_slice()
    }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.len(),
            "cannot advance past the end: {} > {}",
            cnt,
            self.len()
        );
        self.position += cnt;
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[u8]> for Buffer {
    fn from(data: &[u8]) -> Self {
        Self::copy_from_slice(data)
    }
}

impl From<Bytes> for Buffer {
    fn from(data: Bytes) -> Self {
        Self::from_vec(data.to_vec())
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Buffer {}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("position", &self.position)
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
