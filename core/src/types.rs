// # 📂 src/types.rs

//! Unified channel error covering cancellation, end-of-stream, capability
//! probing, transport I/O and configuration.
//! - Ergonomic `From<T>` impls enable `?` across the buffer, deadline and pump layers.
//! - `From<ChannelError> for io::Error` lets the core sit behind `std::io` traits.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    /// The object does not expose the requested deadline capability.
    #[error("unsupported")]
    Unsupported,

    /// The cancel token fired before any byte was obtained.
    #[error("operation cancelled")]
    Cancelled,

    /// The buffer is closed and fully drained.
    #[error("end of stream")]
    EndOfStream,

    /// Append attempted after end-of-stream was signaled.
    #[error("append after end of stream")]
    Closed,

    /// The buffer worker is no longer running.
    #[error("buffer worker disconnected unexpectedly")]
    WorkerGone,

    /// Error reported by the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid configuration with a descriptive message.
    #[error("config error: {0}")]
    Config(String),
}

impl ChannelError {
    /// Non-fatal outcomes after which the same object may be used again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChannelError::Cancelled | ChannelError::Unsupported)
    }
}

impl From<ChannelError> for io::Error {
    fn from(e: ChannelError) -> Self {
        match e {
            ChannelError::Io(inner) => inner,
            ChannelError::Unsupported => io::Error::new(io::ErrorKind::Unsupported, e),
            ChannelError::Cancelled => io::Error::new(io::ErrorKind::TimedOut, e),
            ChannelError::EndOfStream => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            ChannelError::Closed => io::Error::new(io::ErrorKind::BrokenPipe, e),
            ChannelError::Config(_) => io::Error::new(io::ErrorKind::InvalidInput, e),
            ChannelError::WorkerGone => io::Error::new(io::ErrorKind::Other, e),
        }
    }
}
