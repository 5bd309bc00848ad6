use std::time::SystemTime;

/// Deadline installed by the cancellation trigger: clearly in the past.
pub const EXPIRED_DEADLINE: SystemTime = SystemTime::UNIX_EPOCH;

/// Defaults when a config field is absent
pub const DEFAULT_IO_BUFFER_CAPACITY: usize = 4 * 1024; // 4 KiB, bufio-sized
pub const DEFAULT_PUMP_CHUNK_SIZE: usize = 32 * 1024; // 32 KiB
pub const DEFAULT_WORKER_NAME: &str = "stream-buffer";

/// Sanity bounds for the read-ahead / write-behind buffers.
pub const MIN_IO_BUFFER_CAPACITY: usize = 16;
pub const MAX_IO_BUFFER_CAPACITY: usize = 16 * 1024 * 1024; // 16 MiB

/// Sanity bounds for one pump read.
pub const MIN_PUMP_CHUNK_SIZE: usize = 1;
pub const MAX_PUMP_CHUNK_SIZE: usize = 4 * 1024 * 1024; // 4 MiB
