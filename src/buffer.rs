//! `ByteSpan`: the zero-copy, cheap-to-clone buffer primitive the diff and
//! patch engines are built on (component C1).
//!
//! Wraps a [`bytes::Bytes`] so that `clone()`, `head`/`tail`/`slice_at` are
//! all O(1) — no data is ever copied until two spans are concatenated.

use bytes::{Bytes, BytesMut};
use std::fmt;

/// An immutable view of a byte range, plus the absolute offset of that view
/// within whatever larger buffer it was cut from. The offset is carried
/// purely so bitap search results (which report positions in a padded,
/// concatenated buffer) can be translated back to caller-relevant
/// coordinates; it plays no role in equality.
#[derive(Clone)]
pub struct ByteSpan {
    bytes: Bytes,
    offset: usize,
}

impl ByteSpan {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { bytes: bytes.into(), offset: 0 }
    }

    pub fn with_offset(bytes: impl Into<Bytes>, offset: usize) -> Self {
        Self { bytes: bytes.into(), offset }
    }

    pub fn empty() -> Self {
        Self { bytes: Bytes::new(), offset: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Absolute offset of this span's first byte within its parent buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// First `n` bytes (n is clamped to `len()`).
    pub fn head(&self, n: usize) -> ByteSpan {
        let n = n.min(self.len());
        ByteSpan { bytes: self.bytes.slice(0..n), offset: self.offset }
    }

    /// Last `n` bytes (n is clamped to `len()`).
    pub fn tail(&self, n: usize) -> ByteSpan {
        let n = n.min(self.len());
        let start = self.len() - n;
        ByteSpan { bytes: self.bytes.slice(start..), offset: self.offset + start }
    }

    /// Drop the first `n` bytes, returning the remainder.
    pub fn cut(&self, n: usize) -> ByteSpan {
        let n = n.min(self.len());
        ByteSpan { bytes: self.bytes.slice(n..), offset: self.offset + n }
    }

    /// Keep only the first `n` bytes. Alias for [`ByteSpan::head`] provided
    /// for symmetry with `cut`.
    pub fn trunc(&self, n: usize) -> ByteSpan {
        self.head(n)
    }

    /// A sub-span `[start, end)`.
    pub fn slice_at(&self, start: usize, end: usize) -> ByteSpan {
        let start = start.min(self.len());
        let end = end.clamp(start, self.len());
        ByteSpan { bytes: self.bytes.slice(start..end), offset: self.offset + start }
    }

    pub fn concat(&self, other: &ByteSpan) -> ByteSpan {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut buf = BytesMut::with_capacity(self.len() + other.len());
        buf.extend_from_slice(&self.bytes);
        buf.extend_from_slice(&other.bytes);
        ByteSpan { bytes: buf.freeze(), offset: self.offset }
    }

    pub fn read_relative(&self, i: usize) -> Option<u8> {
        self.bytes.get(i).copied()
    }

    pub fn common_prefix_len(&self, other: &ByteSpan) -> usize {
        self.as_bytes()
            .iter()
            .zip(other.as_bytes())
            .take_while(|(a, b)| a == b)
            .count()
    }

    pub fn common_suffix_len(&self, other: &ByteSpan) -> usize {
        self.as_bytes()
            .iter()
            .rev()
            .zip(other.as_bytes().iter().rev())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Byte position of `pattern` within this span, searching from `from`.
    pub fn position_of(&self, pattern: &[u8], from: usize) -> Option<usize> {
        if pattern.is_empty() {
            return Some(from.min(self.len()));
        }
        let hay = self.as_bytes();
        if from >= hay.len() {
            return None;
        }
        hay[from..]
            .windows(pattern.len())
            .position(|w| w == pattern)
            .map(|p| p + from)
    }

    pub fn contains(&self, pattern: &[u8]) -> bool {
        self.position_of(pattern, 0).is_some()
    }

    /// Number of positions at which `pattern` occurs in this span.
    pub fn count_occurrences(&self, pattern: &[u8]) -> usize {
        if pattern.is_empty() {
            return 0;
        }
        let hay = self.as_bytes();
        let mut count = 0;
        let mut from = 0;
        while let Some(p) = self.position_of(pattern, from) {
            count += 1;
            from = p + 1;
            if from > hay.len() {
                break;
            }
        }
        count
    }
}

impl PartialEq for ByteSpan {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}
impl Eq for ByteSpan {}

impl fmt::Debug for ByteSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteSpan({} bytes @ {})", self.len(), self.offset)
    }
}

impl From<&str> for ByteSpan {
    fn from(s: &str) -> Self {
        ByteSpan::new(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<&[u8]> for ByteSpan {
    fn from(s: &[u8]) -> Self {
        ByteSpan::new(Bytes::copy_from_slice(s))
    }
}

impl From<Vec<u8>> for ByteSpan {
    fn from(v: Vec<u8>) -> Self {
        ByteSpan::new(Bytes::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_tail_cut_trunc() {
        let s = ByteSpan::from("hello world");
        assert_eq!(s.head(5).as_bytes(), b"hello");
        assert_eq!(s.tail(5).as_bytes(), b"world");
        assert_eq!(s.cut(6).as_bytes(), b"world");
        assert_eq!(s.trunc(5).as_bytes(), b"hello");
    }

    #[test]
    fn clamped_bounds_do_not_panic() {
        let s = ByteSpan::from("hi");
        assert_eq!(s.head(100).as_bytes(), b"hi");
        assert_eq!(s.tail(100).as_bytes(), b"hi");
        assert_eq!(s.cut(100).as_bytes(), b"");
    }

    #[test]
    fn concat_roundtrip() {
        let a = ByteSpan::from("foo");
        let b = ByteSpan::from("bar");
        assert_eq!(a.concat(&b).as_bytes(), b"foobar");
    }

    #[test]
    fn common_prefix_and_suffix() {
        let a = ByteSpan::from("abcdef");
        let b = ByteSpan::from("abcxyz");
        assert_eq!(a.common_prefix_len(&b), 3);

        let c = ByteSpan::from("xyzdef");
        assert_eq!(a.common_suffix_len(&c), 3);
    }

    #[test]
    fn position_of_finds_and_misses() {
        let s = ByteSpan::from("the quick brown fox");
        assert_eq!(s.position_of(b"quick", 0), Some(4));
        assert_eq!(s.position_of(b"quick", 5), None);
        assert_eq!(s.position_of(b"slow", 0), None);
    }

    #[test]
    fn offset_tracks_through_cut() {
        let s = ByteSpan::from("0123456789");
        let cut = s.cut(4);
        assert_eq!(cut.offset(), 4);
        assert_eq!(cut.as_bytes(), b"456789");
    }

    #[test]
    fn count_occurrences_counts_all_matches() {
        let s = ByteSpan::from("abcabcabc");
        assert_eq!(s.count_occurrences(b"abc"), 3);
        assert_eq!(s.count_occurrences(b"bc"), 3);
        assert_eq!(s.count_occurrences(b"z"), 0);
    }
}
