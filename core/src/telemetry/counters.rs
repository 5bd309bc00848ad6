// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Live counters shared by a stream buffer handle and its worker.
//!
//! Summary: Collects segment, byte and read-outcome counts while a channel is open.
//! Converted into an immutable `BufferSnapshot` on demand.
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated concurrently by the producer, the consumer and the worker.
#[derive(Debug, Default)]
pub struct BufferCounters {
    segments_appended: AtomicU64,
    bytes_appended: AtomicU64,
    bytes_read: AtomicU64,
    reads_completed: AtomicU64,
    reads_cancelled: AtomicU64,
    reads_parked: AtomicU64,
    bytes_requeued: AtomicU64,
}

/// Plain copy of `BufferCounters` at one instant.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterValues {
    pub segments_appended: u64,
    pub bytes_appended: u64,
    pub bytes_read: u64,
    pub reads_completed: u64,
    pub reads_cancelled: u64,
    pub reads_parked: u64,
    pub bytes_requeued: u64,
}

impl BufferCounters {
    /// Record one segment linked onto the tail.
    pub fn add_append(&self, len: usize) {
        self.segments_appended.fetch_add(1, Ordering::Relaxed);
        self.bytes_appended.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Record one read that returned `len > 0` bytes to the consumer.
    pub fn add_read(&self, len: usize) {
        self.reads_completed.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn add_cancelled(&self) {
        self.reads_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// A read found no data and waits on the worker for the next append.
    pub fn add_parked(&self) {
        self.reads_parked.fetch_add(1, Ordering::Relaxed);
    }

    /// Bytes taken for a reader that had already gone and were put back.
    pub fn add_requeued(&self, len: usize) {
        self.bytes_requeued.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn load(&self) -> CounterValues {
        CounterValues {
            segments_appended: self.segments_appended.load(Ordering::Relaxed),
            bytes_appended: self.bytes_appended.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            reads_completed: self.reads_completed.load(Ordering::Relaxed),
            reads_cancelled: self.reads_cancelled.load(Ordering::Relaxed),
            reads_parked: self.reads_parked.load(Ordering::Relaxed),
            bytes_requeued: self.bytes_requeued.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let c = BufferCounters::default();
        c.add_append(5);
        c.add_append(6);
        c.add_read(11);
        c.add_cancelled();

        let v = c.load();
        assert_eq!(v.segments_appended, 2);
        assert_eq!(v.bytes_appended, 11);
        assert_eq!(v.bytes_read, 11);
        assert_eq!(v.reads_completed, 1);
        assert_eq!(v.reads_cancelled, 1);
    }
}
