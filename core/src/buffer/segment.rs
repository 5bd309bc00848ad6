// # 📂 src/buffer/segment.rs

use std::collections::VecDeque;
use bytes::{Bytes, BytesMut};

/// One appended byte run. Immutable once appended; reads only shrink it from the front.
#[derive(Debug, Clone)]
pub struct Segment {
    data: Bytes,
}

impl Segment {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.data.is_empty()
    }

    /// Split off up to `max` unread bytes (zero-copy).
    pub fn take(&mut self, max: usize) -> Bytes {
        let n = max.min(self.data.len());
        self.data.split_to(n)
    }
}

/// Segments in append order: head is the oldest unread run, tail the newest.
///
/// Exhausted segments are dropped as soon as the head moves past them, so an
/// empty chain always reports zero remaining bytes.
#[derive(Debug, Default)]
pub struct SegmentChain {
    segments: VecDeque<Segment>,
    remaining: usize,
}

impl SegmentChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Unread bytes across all segments.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Link a new segment onto the tail. Empty runs are not linked.
    pub fn push_back(&mut self, data: Bytes) {
        if data.is_empty() {
            return;
        }
        self.remaining += data.len();
        self.segments.push_back(Segment::new(data));
    }

    /// Put bytes back in front of the head; they are read next.
    pub fn push_front(&mut self, data: Bytes) {
        if data.is_empty() {
            return;
        }
        self.remaining += data.len();
        self.segments.push_front(Segment::new(data));
    }

    /// Remove up to `max` bytes from the head, crossing segment boundaries.
    ///
    /// Zero-copy when the head segment alone satisfies the request.
    pub fn take(&mut self, max: usize) -> Bytes {
        let want = max.min(self.remaining);
        if want == 0 {
            return Bytes::new();
        }

        if let Some(head) = self.segments.front_mut() {
            if head.remaining() >= want {
                let out = head.take(want);
                self.finish_take(out.len());
                return out;
            }
        }

        let mut out = BytesMut::with_capacity(want);
        while out.len() < want {
            let Some(head) = self.segments.front_mut() else { break };
            let part = head.take(want - out.len());
            out.extend_from_slice(&part);
            self.finish_take(part.len());
        }
        out.freeze()
    }

    /// Copy as many bytes as fit into `dst`, advancing the head.
    pub fn read_into(&mut self, dst: &mut [u8]) -> usize {
        let mut n = 0;
        while n < dst.len() {
            let Some(head) = self.segments.front_mut() else { break };
            let part = head.take(dst.len() - n);
            dst[n..n + part.len()].copy_from_slice(&part);
            n += part.len();
            self.finish_take(part.len());
        }
        n
    }

    fn finish_take(&mut self, taken: usize) {
        self.remaining -= taken;
        while self.segments.front().map_or(false, Segment::is_exhausted) {
            self.segments.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(parts: &[&'static [u8]]) -> SegmentChain {
        let mut c = SegmentChain::new();
        for p in parts {
            c.push_back(Bytes::from_static(p));
        }
        c
    }

    #[test]
    fn take_within_head_is_partial() {
        let mut c = chain(&[b"hello", b" world"]);
        assert_eq!(&c.take(3)[..], b"hel");
        assert_eq!(c.remaining(), 8);
        assert_eq!(c.segment_count(), 2);
    }

    #[test]
    fn take_crosses_segments_and_drops_exhausted() {
        let mut c = chain(&[b"ab", b"cd", b"ef"]);
        assert_eq!(&c.take(5)[..], b"abcde");
        assert_eq!(c.segment_count(), 1);
        assert_eq!(&c.take(10)[..], b"f");
        assert!(c.is_empty());
        assert_eq!(c.segment_count(), 0);
    }

    #[test]
    fn empty_runs_are_not_linked() {
        let mut c = SegmentChain::new();
        c.push_back(Bytes::new());
        assert_eq!(c.segment_count(), 0);
        assert!(c.take(4).is_empty());
    }

    #[test]
    fn push_front_is_read_first() {
        let mut c = chain(&[b"world"]);
        c.push_front(Bytes::from_static(b"hello "));
        let mut dst = [0u8; 32];
        let n = c.read_into(&mut dst);
        assert_eq!(&dst[..n], b"hello world");
    }

    #[test]
    fn read_into_short_destination() {
        let mut c = chain(&[b"abc"]);
        let mut dst = [0u8; 2];
        assert_eq!(c.read_into(&mut dst), 2);
        assert_eq!(&dst, b"ab");
        assert_eq!(c.remaining(), 1);
    }
}
