// ## src/telemetry/snapshot.rs

//! Immutable, serializable view of one stream buffer's counters.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::telemetry::counters::CounterValues;
use crate::telemetry::timers::TelemetryTimer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferSnapshot {
    pub segments_appended: u64,
    pub bytes_appended: u64,
    pub bytes_read: u64,
    /// Appended but not yet handed to the consumer.
    pub bytes_pending: u64,
    pub reads_completed: u64,
    pub reads_cancelled: u64,
    pub reads_parked: u64,
    pub bytes_requeued: u64,
    pub closed: bool,
    pub throughput_read_bytes_per_sec: f64,
    pub elapsed: Duration,
}

impl BufferSnapshot {
    pub fn from(values: &CounterValues, timer: &TelemetryTimer, closed: bool) -> Self {
        let elapsed = timer.elapsed();

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            values.bytes_read as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            segments_appended: values.segments_appended,
            bytes_appended: values.bytes_appended,
            bytes_read: values.bytes_read,
            bytes_pending: values.bytes_appended.saturating_sub(values.bytes_read),
            reads_completed: values.reads_completed,
            reads_cancelled: values.reads_cancelled,
            reads_parked: values.reads_parked,
            bytes_requeued: values.bytes_requeued,
            closed,
            throughput_read_bytes_per_sec: throughput,
            elapsed,
        }
    }

    /// Bytes read never exceed bytes appended.
    pub fn sanity_check(&self) -> bool {
        self.bytes_read <= self.bytes_appended
            && self.bytes_pending == self.bytes_appended - self.bytes_read
    }

    /// Closed with every appended byte delivered.
    pub fn is_drained(&self) -> bool {
        self.closed && self.bytes_pending == 0
    }
}
