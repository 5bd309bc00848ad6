// # 📂 src/deadline/wrapper.rs

// ## Buffered adapters with optional deadline forwarding

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::time::SystemTime;

use crate::config::DeadlineConfig;
use crate::deadline::capability::{Capabilities, DeadlineProbe, ReadDeadline, WriteDeadline};
use crate::types::ChannelError;

/// Read-ahead buffer around a source whose deadline capability was probed at wrap time.
#[derive(Debug)]
pub struct DeadlineReader<R> {
    inner: BufReader<R>,
    caps: Capabilities,
}

impl<R: Read + DeadlineProbe> DeadlineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_config(&DeadlineConfig::default(), inner)
    }

    pub fn with_config(config: &DeadlineConfig, inner: R) -> Self {
        let caps = inner.capabilities();
        tracing::debug!(read_deadline = caps.contains(Capabilities::READ_DEADLINE), "wrapped reader");
        Self {
            inner: BufReader::with_capacity(config.read_buffer_capacity, inner),
            caps,
        }
    }
}

impl<R: DeadlineProbe> DeadlineReader<R> {
    /// Forward to the wrapped source, or `Unsupported` without touching it.
    pub fn set_read_deadline(&self, deadline: Option<SystemTime>) -> Result<(), ChannelError> {
        match self.read_deadline() {
            Some(setter) => Ok(setter.set_read_deadline(deadline)?),
            None => Err(ChannelError::Unsupported),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }
}

impl<R> DeadlineReader<R> {
    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    pub fn get_mut(&mut self) -> &mut R {
        self.inner.get_mut()
    }

    /// Bytes read ahead but not yet consumed.
    pub fn buffer(&self) -> &[u8] {
        self.inner.buffer()
    }

    /// Unwrap; read-ahead bytes are discarded.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read> Read for DeadlineReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> BufRead for DeadlineReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

impl<R: DeadlineProbe> DeadlineProbe for DeadlineReader<R> {
    fn read_deadline(&self) -> Option<&dyn ReadDeadline> {
        if !self.caps.contains(Capabilities::READ_DEADLINE) {
            return None;
        }
        self.inner.get_ref().read_deadline()
    }

    fn write_deadline(&self) -> Option<&dyn WriteDeadline> {
        if !self.caps.contains(Capabilities::WRITE_DEADLINE) {
            return None;
        }
        self.inner.get_ref().write_deadline()
    }
}

/// Write-behind buffer around a sink whose deadline capability was probed at wrap time.
#[derive(Debug)]
pub struct DeadlineWriter<W: Write> {
    inner: BufWriter<W>,
    caps: Capabilities,
}

impl<W: Write + DeadlineProbe> DeadlineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_config(&DeadlineConfig::default(), inner)
    }

    pub fn with_config(config: &DeadlineConfig, inner: W) -> Self {
        let caps = inner.capabilities();
        tracing::debug!(write_deadline = caps.contains(Capabilities::WRITE_DEADLINE), "wrapped writer");
        Self {
            inner: BufWriter::with_capacity(config.write_buffer_capacity, inner),
            caps,
        }
    }

    /// Forward to the wrapped sink, or `Unsupported` without touching it.
    pub fn set_write_deadline(&self, deadline: Option<SystemTime>) -> Result<(), ChannelError> {
        match self.write_deadline() {
            Some(setter) => Ok(setter.set_write_deadline(deadline)?),
            None => Err(ChannelError::Unsupported),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }
}

impl<W: Write> DeadlineWriter<W> {
    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Bytes written but not yet flushed to the sink.
    pub fn buffer(&self) -> &[u8] {
        self.inner.buffer()
    }

    /// Flush and unwrap.
    pub fn into_inner(self) -> Result<W, ChannelError> {
        self.inner.into_inner().map_err(|e| ChannelError::Io(e.into_error()))
    }
}

impl<W: Write> Write for DeadlineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + DeadlineProbe> DeadlineProbe for DeadlineWriter<W> {
    fn read_deadline(&self) -> Option<&dyn ReadDeadline> {
        if !self.caps.contains(Capabilities::READ_DEADLINE) {
            return None;
        }
        self.inner.get_ref().read_deadline()
    }

    fn write_deadline(&self) -> Option<&dyn WriteDeadline> {
        if !self.caps.contains(Capabilities::WRITE_DEADLINE) {
            return None;
        }
        self.inner.get_ref().write_deadline()
    }
}
