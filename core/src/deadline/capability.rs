// # 📂 src/deadline/capability.rs

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::SystemTime;

use bitflags::bitflags;

/// A source whose blocked and future reads fail once an absolute deadline passes.
pub trait ReadDeadline {
    /// `None` clears the deadline.
    fn set_read_deadline(&self, deadline: Option<SystemTime>) -> io::Result<()>;
}

/// A sink whose blocked and future writes fail once an absolute deadline passes.
pub trait WriteDeadline {
    /// `None` clears the deadline.
    fn set_write_deadline(&self, deadline: Option<SystemTime>) -> io::Result<()>;
}

bitflags! {
    /// Deadline capabilities advertised by a transport.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const READ_DEADLINE  = 0b01;
        const WRITE_DEADLINE = 0b10;
    }
}

/// Capability descriptor. Transports without deadlines keep the defaults and
/// never implement a no-op setter. Sockets gain the capability through
/// `DeadlineStream`.
pub trait DeadlineProbe {
    fn read_deadline(&self) -> Option<&dyn ReadDeadline> {
        None
    }

    fn write_deadline(&self) -> Option<&dyn WriteDeadline> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::empty();
        caps.set(Capabilities::READ_DEADLINE, self.read_deadline().is_some());
        caps.set(Capabilities::WRITE_DEADLINE, self.write_deadline().is_some());
        caps
    }
}

// In-memory streams: no deadlines.
impl<T> DeadlineProbe for io::Cursor<T> {}
impl DeadlineProbe for [u8] {}
impl DeadlineProbe for Vec<u8> {}
impl DeadlineProbe for io::Empty {}
impl DeadlineProbe for io::Sink {}
impl DeadlineProbe for io::Repeat {}

impl<T: DeadlineProbe + ?Sized> DeadlineProbe for &T {
    fn read_deadline(&self) -> Option<&dyn ReadDeadline> {
        (**self).read_deadline()
    }

    fn write_deadline(&self) -> Option<&dyn WriteDeadline> {
        (**self).write_deadline()
    }
}

impl<T: DeadlineProbe + ?Sized> DeadlineProbe for Box<T> {
    fn read_deadline(&self) -> Option<&dyn ReadDeadline> {
        (**self).read_deadline()
    }

    fn write_deadline(&self) -> Option<&dyn WriteDeadline> {
        (**self).write_deadline()
    }
}

impl<T: DeadlineProbe + ?Sized> DeadlineProbe for Arc<T> {
    fn read_deadline(&self) -> Option<&dyn ReadDeadline> {
        (**self).read_deadline()
    }

    fn write_deadline(&self) -> Option<&dyn WriteDeadline> {
        (**self).write_deadline()
    }
}

/// Wraps any foreign stream as "no deadline capability".
#[derive(Debug, Default, Clone)]
pub struct NoDeadline<T>(pub T);

impl<T> DeadlineProbe for NoDeadline<T> {}

impl<T: Read> Read for NoDeadline<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<T: Write> Write for NoDeadline<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}
