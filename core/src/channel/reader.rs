// # 📂 src/channel/reader.rs

use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

use crate::buffer::StreamBuffer;
use crate::cancel::CancelToken;
use crate::config::BufferConfig;
use crate::types::ChannelError;

/// `std::io::Read` over a stream buffer.
///
/// End-of-stream reads as `Ok(0)`. A read that times out or is cancelled
/// fails with `ErrorKind::TimedOut` and may be retried.
#[derive(Debug)]
pub struct ChannelReader {
    buffer: Arc<StreamBuffer>,
    cancel: CancelToken,
    read_timeout: Option<Duration>,
}

impl ChannelReader {
    pub fn new(buffer: Arc<StreamBuffer>) -> Self {
        Self {
            buffer,
            cancel: CancelToken::new(),
            read_timeout: None,
        }
    }

    pub fn with_config(buffer: Arc<StreamBuffer>, config: &BufferConfig) -> Self {
        let mut reader = Self::new(buffer);
        reader.read_timeout = config.read_timeout();
        reader
    }

    /// Every read also aborts when `token` fires.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn buffer(&self) -> &Arc<StreamBuffer> {
        &self.buffer
    }

    fn token(&self) -> CancelToken {
        match self.read_timeout {
            Some(timeout) => self.cancel.child_with_timeout(timeout),
            None => self.cancel.clone(),
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let token = self.token();
        match self.buffer.cancelable_read(&token, buf) {
            Ok(n) => Ok(n),
            Err(ChannelError::EndOfStream) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}
