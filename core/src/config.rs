//! config.rs
//! Tuning for the stream buffer, the deadline wrappers and the delivery pump.
//!
//! Every field has a default so partial JSON documents are accepted.
//! Call `validate()` (or load through `CoreConfig::from_json_str`) before use.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_IO_BUFFER_CAPACITY, DEFAULT_PUMP_CHUNK_SIZE, DEFAULT_WORKER_NAME,
    MAX_IO_BUFFER_CAPACITY, MAX_PUMP_CHUNK_SIZE, MIN_IO_BUFFER_CAPACITY, MIN_PUMP_CHUNK_SIZE,
};
use crate::types::ChannelError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub deadline: DeadlineConfig,
    #[serde(default)]
    pub pump: PumpConfig,
}

impl CoreConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ChannelError> {
        let config: CoreConfig = serde_json::from_str(json)
            .map_err(|e| ChannelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChannelError> {
        self.buffer.validate()?;
        self.deadline.validate()?;
        self.pump.validate()
    }
}

/// Stream buffer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Thread name for the buffer worker.
    #[serde(default = "default_worker_name")]
    pub worker_name: String,

    /// Per-read timeout applied by `ChannelReader`. `None` waits forever.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
}

fn default_worker_name() -> String {
    DEFAULT_WORKER_NAME.to_string()
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            worker_name: default_worker_name(),
            read_timeout_ms: None,
        }
    }
}

impl BufferConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ChannelError> {
        check_thread_name("buffer.worker_name", &self.worker_name)?;
        if self.read_timeout_ms == Some(0) {
            return Err(ChannelError::Config(
                "buffer.read_timeout_ms must be positive (omit it to wait forever)".into(),
            ));
        }
        Ok(())
    }
}

/// Read-ahead / write-behind capacities for `DeadlineReader` and `DeadlineWriter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineConfig {
    #[serde(default = "default_io_buffer_capacity")]
    pub read_buffer_capacity: usize,
    #[serde(default = "default_io_buffer_capacity")]
    pub write_buffer_capacity: usize,
}

fn default_io_buffer_capacity() -> usize {
    DEFAULT_IO_BUFFER_CAPACITY
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            read_buffer_capacity: default_io_buffer_capacity(),
            write_buffer_capacity: default_io_buffer_capacity(),
        }
    }
}

impl DeadlineConfig {
    pub fn validate(&self) -> Result<(), ChannelError> {
        check_range(
            "deadline.read_buffer_capacity",
            self.read_buffer_capacity,
            MIN_IO_BUFFER_CAPACITY,
            MAX_IO_BUFFER_CAPACITY,
        )?;
        check_range(
            "deadline.write_buffer_capacity",
            self.write_buffer_capacity,
            MIN_IO_BUFFER_CAPACITY,
            MAX_IO_BUFFER_CAPACITY,
        )
    }
}

/// Delivery pump settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpConfig {
    /// Size of one transport read; each non-empty read becomes one segment.
    #[serde(default = "default_pump_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_pump_thread_name")]
    pub thread_name: String,
}

fn default_pump_chunk_size() -> usize {
    DEFAULT_PUMP_CHUNK_SIZE
}

fn default_pump_thread_name() -> String {
    "stream-pump".to_string()
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_pump_chunk_size(),
            thread_name: default_pump_thread_name(),
        }
    }
}

impl PumpConfig {
    pub fn validate(&self) -> Result<(), ChannelError> {
        check_thread_name("pump.thread_name", &self.thread_name)?;
        check_range("pump.chunk_size", self.chunk_size, MIN_PUMP_CHUNK_SIZE, MAX_PUMP_CHUNK_SIZE)
    }
}

// `thread::Builder::spawn` panics on interior NUL bytes.
fn check_thread_name(field: &str, name: &str) -> Result<(), ChannelError> {
    if name.is_empty() {
        return Err(ChannelError::Config(format!("{field} must not be empty")));
    }
    if name.contains('\0') {
        return Err(ChannelError::Config(format!("{field} must not contain NUL")));
    }
    Ok(())
}

fn check_range(field: &str, value: usize, min: usize, max: usize) -> Result<(), ChannelError> {
    if value < min || value > max {
        return Err(ChannelError::Config(format!(
            "{field} must be within {min}..={max}, got {value}"
        )));
    }
    Ok(())
}
