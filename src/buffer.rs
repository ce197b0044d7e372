//! Growable byte accumulator used for partial socket reads.
//!
//! The buffer keeps a logical window `[start, end)` into a backing array of
//! `capacity` bytes. Appends grow the backing array by doubling; consuming a
//! prefix only moves `start`, and the window is shifted back to offset 0 once
//! the consumed prefix passes half the capacity (or the buffer empties), so a
//! long run of small reads stays amortized O(1) per byte.

use bytes::Bytes;

use crate::error::BufferUnderflow;

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug)]
pub struct ByteBuffer {
    data: Vec<u8>,
    start: usize,
    end: usize,
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity.max(1)],
            start: 0,
            end: 0,
        }
    }

    /// Number of readable bytes.
    pub fn size(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The current `(start, end)` offsets of the readable window.
    pub fn window(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// The readable bytes.
    pub fn data(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    /// Appends `bytes`, growing the backing storage if they do not fit.
    pub fn push(&mut self, bytes: &[u8]) {
        self.ensure_capacity(bytes.len());
        self.data[self.end..self.end + bytes.len()].copy_from_slice(bytes);
        self.end += bytes.len();
    }

    /// Removes and returns the first `n` bytes.
    ///
    /// The returned bytes are a copy; nothing in them aliases the buffer.
    pub fn pop(&mut self, n: usize) -> Result<Bytes, BufferUnderflow> {
        let available = self.size();
        if n > available {
            return Err(BufferUnderflow {
                requested: n,
                available,
            });
        }

        let out = Bytes::copy_from_slice(&self.data[self.start..self.start + n]);
        self.start += n;

        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        } else if self.start > self.capacity() / 2 {
            self.compact();
        }

        Ok(out)
    }

    /// Position of the first occurrence of `delimiter` at or after `from`,
    /// relative to the start of the readable window.
    pub fn index_of(&self, delimiter: &[u8], from: usize) -> Option<usize> {
        if delimiter.is_empty() {
            return (from <= self.size()).then_some(from);
        }

        let data = self.data();
        if from >= data.len() {
            return None;
        }

        data[from..]
            .windows(delimiter.len())
            .position(|w| w == delimiter)
            .map(|pos| pos + from)
    }

    fn compact(&mut self) {
        self.data.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
    }

    fn ensure_capacity(&mut self, additional: usize) {
        if self.end + additional <= self.capacity() {
            return;
        }

        let size = self.size();
        let required = size + additional;
        let mut capacity = self.capacity();
        while capacity < required {
            capacity *= 2;
        }

        if capacity > self.capacity() {
            let mut grown = vec![0; capacity];
            grown[..size].copy_from_slice(self.data());
            self.data = grown;
            self.start = 0;
            self.end = size;
        } else {
            // Enough room once the consumed prefix is reclaimed.
            self.compact();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_by_doubling() {
        let mut buf = ByteBuffer::with_capacity(4);
        buf.push(b"0123456789");

        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.data(), b"0123456789");
    }

    #[test]
    fn reuses_consumed_prefix_before_growing() {
        let mut buf = ByteBuffer::with_capacity(8);
        buf.push(b"abcdef");
        buf.pop(3).unwrap();
        buf.push(b"ghijk");

        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.data(), b"defghijk");
    }
}
