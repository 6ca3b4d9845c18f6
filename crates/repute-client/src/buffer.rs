//! Growable receive buffer for response bodies.

use repute_core::{ReputeError, Result};

/// Smallest allocation made on the first write
pub const BUFFER_BASE: usize = 1024;

/// Byte buffer that response chunks are appended to.
///
/// The backing storage is always zero-filled out to the current capacity.
/// Growth goes through fallible reservation, so running out of memory (or
/// past the configured limit) surfaces as [`ReputeError::ShortWrite`]
/// instead of aborting.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    data: Vec<u8>,
    len: usize,
    limit: Option<usize>,
}

impl ResponseBuffer {
    /// Create an empty buffer with no size limit
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            len: 0,
            limit: None,
        }
    }

    /// Create an empty buffer that refuses to grow past `limit` bytes
    #[must_use]
    pub const fn with_limit(limit: Option<usize>) -> Self {
        Self {
            data: Vec::new(),
            len: 0,
            limit,
        }
    }

    /// Bytes received so far
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Number of bytes received so far
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing has been received
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated size in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Forget the contents but keep the allocation for the next response.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append a chunk, growing the buffer as needed.
    ///
    /// The first write allocates `max(BUFFER_BASE, chunk.len())`. Later
    /// writes that do not fit grow to `max(2 * capacity, len + chunk.len())`.
    pub fn write(&mut self, chunk: &[u8]) -> Result<usize> {
        let need = chunk.len();
        let end = self
            .len
            .checked_add(need)
            .ok_or(ReputeError::ShortWrite { requested: usize::MAX })?;

        if self.data.is_empty() {
            self.grow_to(BUFFER_BASE.max(need), end)?;
        } else if end > self.data.len() {
            self.grow_to(self.data.len().saturating_mul(2).max(end), end)?;
        }

        self.data[self.len..end].copy_from_slice(chunk);
        self.len = end;
        Ok(need)
    }

    fn grow_to(&mut self, size: usize, end: usize) -> Result<()> {
        let size = match self.limit {
            Some(limit) if end > limit => return Err(ReputeError::ShortWrite { requested: end }),
            Some(limit) => size.min(limit),
            None => size,
        };

        self.data
            .try_reserve_exact(size - self.data.len())
            .map_err(|_| ReputeError::ShortWrite { requested: size })?;
        self.data.resize(size, 0);
        Ok(())
    }
}
