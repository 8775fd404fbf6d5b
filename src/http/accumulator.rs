//! Growable byte buffer with incremental delimiter search.
//!
//! Chunks are appended to one owned [`BytesMut`]. A scan offset remembers how
//! far previous searches got, so each search only looks at bytes that could
//! complete a match, while still finding delimiters that straddle two chunks.

use bytes::{Bytes, BytesMut};

/// The byte sequence separating an HTTP/1.1 head from its body.
pub const HEAD_DELIMITER: &[u8] = b"\r\n\r\n";

/// Accumulates incoming chunks and finds a fixed delimiter in them.
///
/// # Examples
///
/// ```
/// use h1wire::http::accumulator::{ByteAccumulator, HEAD_DELIMITER};
///
/// let mut acc = ByteAccumulator::with_capacity(64);
/// acc.buffer_mut().extend_from_slice(b"GET / HTTP/1.1\r\n\r");
/// assert_eq!(acc.find(HEAD_DELIMITER), None);
///
/// acc.buffer_mut().extend_from_slice(b"\nbody");
/// assert_eq!(acc.find(HEAD_DELIMITER), Some(14));
/// ```
#[derive(Debug)]
pub struct ByteAccumulator {
    buf: BytesMut,
    // Bytes before this offset are known not to start a match.
    scanned: usize,
}

impl ByteAccumulator {
    /// Creates an empty accumulator with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            scanned: 0,
        }
    }

    /// Direct access to the backing buffer, for `read_buf`-style filling.
    ///
    /// Callers may only append; bytes already present must stay untouched.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Returns the number of accumulated bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the offset of the first occurrence of `delimiter`, if any.
    ///
    /// The result is the same as searching the whole buffer from the start;
    /// repeated calls resume just before the previously scanned end so that a
    /// partial match at the tail is re-examined once more bytes arrive.
    pub fn find(&mut self, delimiter: &[u8]) -> Option<usize> {
        if delimiter.is_empty() {
            return Some(0);
        }
        if self.buf.len() < delimiter.len() {
            return None;
        }

        let start = self.scanned.min(self.buf.len());
        let found = self.buf[start..]
            .windows(delimiter.len())
            .position(|window| window == delimiter)
            .map(|pos| start + pos);

        if found.is_none() {
            self.scanned = self.buf.len() + 1 - delimiter.len();
        }
        found
    }

    /// Removes and returns the first `at` bytes, leaving the rest buffered.
    ///
    /// # Panics
    ///
    /// Panics if `at > self.len()`.
    pub fn split_to(&mut self, at: usize) -> Bytes {
        self.scanned = self.scanned.saturating_sub(at);
        self.buf.split_to(at).freeze()
    }

    /// Consumes the accumulator and returns whatever is still buffered.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(input: &[u8]) -> ByteAccumulator {
        let mut acc = ByteAccumulator::with_capacity(input.len());
        acc.buffer_mut().extend_from_slice(input);
        acc
    }

    #[test]
    fn finds_delimiter_in_single_chunk() {
        let mut acc = filled(b"abc\r\n\r\ndef");
        assert_eq!(acc.find(HEAD_DELIMITER), Some(3));
    }

    #[test]
    fn delimiter_split_across_chunks() {
        let mut acc = filled(b"abc\r\n\r");
        assert_eq!(acc.find(HEAD_DELIMITER), None);
        acc.buffer_mut().extend_from_slice(b"\n");
        assert_eq!(acc.find(HEAD_DELIMITER), Some(3));
    }

    #[test]
    fn delimiter_fed_one_byte_at_a_time() {
        let input = b"GET / HTTP/1.1\r\nHost: x\r\n\r\nrest";
        let mut acc = ByteAccumulator::with_capacity(0);
        let mut found = None;
        for byte in input {
            acc.buffer_mut().extend_from_slice(std::slice::from_ref(byte));
            if let Some(pos) = acc.find(HEAD_DELIMITER) {
                found = Some(pos);
                break;
            }
        }
        assert_eq!(found, Some(23));
        assert_eq!(acc.len(), 27);
    }

    #[test]
    fn short_buffer_has_no_match() {
        let mut acc = filled(b"\r\n");
        assert_eq!(acc.find(HEAD_DELIMITER), None);
        assert!(!acc.is_empty());
    }

    #[test]
    fn split_keeps_remainder() {
        let mut acc = filled(b"head\r\n\r\nbody");
        let pos = acc.find(HEAD_DELIMITER).unwrap();
        let head = acc.split_to(pos + HEAD_DELIMITER.len());
        assert_eq!(&head[..], b"head\r\n\r\n");
        assert_eq!(acc.len(), 4);
        assert_eq!(&acc.into_bytes()[..], b"body");
    }

    #[test]
    fn first_occurrence_wins() {
        let mut acc = filled(b"a\r\n\r\nb\r\n\r\n");
        assert_eq!(acc.find(HEAD_DELIMITER), Some(1));
    }
}
