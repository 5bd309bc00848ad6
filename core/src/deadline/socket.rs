// # 📂 src/deadline/socket.rs

// ## Absolute deadlines on stream sockets

use std::io::{self, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use crate::deadline::capability::{DeadlineProbe, ReadDeadline, WriteDeadline};

/// Sockets that accept per-operation read and write timeouts.
pub trait SocketTimeouts {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

impl SocketTimeouts for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }
}

#[cfg(unix)]
impl SocketTimeouts for std::os::unix::net::UnixStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_write_timeout(self, timeout)
    }
}

/// Socket with absolute read and write deadlines.
///
/// Socket timeouts restart with every call, so the deadline is kept here and
/// the remaining time is installed before each operation. Once a deadline has
/// passed, operations fail with `ErrorKind::TimedOut` without touching the
/// socket. Reads and writes work through `&DeadlineStream` too, so one stream
/// can be shared with a `CancelWatch`.
#[derive(Debug)]
pub struct DeadlineStream<S> {
    inner: S,
    read_at: Mutex<Option<SystemTime>>,
    write_at: Mutex<Option<SystemTime>>,
}

impl<S: SocketTimeouts> DeadlineStream<S> {
    /// Wrap `inner`, clearing any timeouts already set on it.
    pub fn new(inner: S) -> io::Result<Self> {
        inner.set_read_timeout(None)?;
        inner.set_write_timeout(None)?;
        Ok(Self {
            inner,
            read_at: Mutex::new(None),
            write_at: Mutex::new(None),
        })
    }

    pub fn read_deadline_at(&self) -> Option<SystemTime> {
        *lock(&self.read_at)
    }

    pub fn write_deadline_at(&self) -> Option<SystemTime> {
        *lock(&self.write_at)
    }

    fn before_read(&self) -> io::Result<Option<SystemTime>> {
        let at = *lock(&self.read_at);
        if let Some(at) = at {
            self.inner.set_read_timeout(Some(remaining(at, "read")?))?;
        }
        Ok(at)
    }

    fn before_write(&self) -> io::Result<Option<SystemTime>> {
        let at = *lock(&self.write_at);
        if let Some(at) = at {
            self.inner.set_write_timeout(Some(remaining(at, "write")?))?;
        }
        Ok(at)
    }
}

impl<S> DeadlineStream<S> {
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Unwrap. The socket keeps whatever timeout was installed last.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: SocketTimeouts> ReadDeadline for DeadlineStream<S> {
    fn set_read_deadline(&self, deadline: Option<SystemTime>) -> io::Result<()> {
        let mut at = lock(&self.read_at);
        *at = deadline;
        // Also applies to a read that starts on the raw socket right after.
        self.inner.set_read_timeout(timeout_until(deadline))
    }
}

impl<S: SocketTimeouts> WriteDeadline for DeadlineStream<S> {
    fn set_write_deadline(&self, deadline: Option<SystemTime>) -> io::Result<()> {
        let mut at = lock(&self.write_at);
        *at = deadline;
        self.inner.set_write_timeout(timeout_until(deadline))
    }
}

impl<S: SocketTimeouts> DeadlineProbe for DeadlineStream<S> {
    fn read_deadline(&self) -> Option<&dyn ReadDeadline> {
        Some(self)
    }

    fn write_deadline(&self) -> Option<&dyn WriteDeadline> {
        Some(self)
    }
}

impl<S: SocketTimeouts + Read> Read for DeadlineStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let at = self.before_read()?;
        expired_as_timed_out(self.inner.read(buf), at, "read")
    }
}

impl<'a, S: SocketTimeouts> Read for &'a DeadlineStream<S>
where
    &'a S: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let stream: &'a DeadlineStream<S> = *self;
        let at = stream.before_read()?;
        let mut inner = &stream.inner;
        expired_as_timed_out(inner.read(buf), at, "read")
    }
}

impl<S: SocketTimeouts + Write> Write for DeadlineStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let at = self.before_write()?;
        expired_as_timed_out(self.inner.write(buf), at, "write")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<'a, S: SocketTimeouts> Write for &'a DeadlineStream<S>
where
    &'a S: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let stream: &'a DeadlineStream<S> = *self;
        let at = stream.before_write()?;
        let mut inner = &stream.inner;
        expired_as_timed_out(inner.write(buf), at, "write")
    }

    fn flush(&mut self) -> io::Result<()> {
        let stream: &'a DeadlineStream<S> = *self;
        let mut inner = &stream.inner;
        inner.flush()
    }
}

/// Socket timeout that expires at `deadline`. An elapsed deadline maps to the
/// smallest non-zero timeout, since zero is rejected by the socket API.
fn timeout_until(deadline: Option<SystemTime>) -> Option<Duration> {
    const SHORTEST: Duration = Duration::from_nanos(1);

    deadline.map(|at| match at.duration_since(SystemTime::now()) {
        Ok(left) if left > Duration::ZERO => left,
        _ => SHORTEST,
    })
}

fn remaining(at: SystemTime, op: &str) -> io::Result<Duration> {
    match at.duration_since(SystemTime::now()) {
        Ok(left) if left > Duration::ZERO => Ok(left),
        _ => Err(deadline_exceeded(op)),
    }
}

// A socket timeout surfaces as WouldBlock on Unix and TimedOut on Windows.
fn expired_as_timed_out<T>(result: io::Result<T>, at: Option<SystemTime>, op: &str) -> io::Result<T> {
    match result {
        Err(e) if at.is_some() && matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
            Err(deadline_exceeded(op))
        }
        result => result,
    }
}

fn deadline_exceeded(op: &str) -> io::Error {
    io::Error::new(ErrorKind::TimedOut, format!("{op} deadline exceeded"))
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}
