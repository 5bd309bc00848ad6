//! deadline — optional deadline capability on arbitrary byte streams.
//!
//! - `capability`: the `ReadDeadline` / `WriteDeadline` traits and the
//!   `DeadlineProbe` descriptor transports use to advertise them
//! - `socket`: `DeadlineStream`, absolute deadlines on TCP and Unix sockets
//! - `wrapper`: buffered `DeadlineReader` / `DeadlineWriter` that forward
//!   deadline calls when the wrapped object is capable
//! - `trigger`: best-effort cancellation by installing an elapsed deadline

pub mod capability;
pub mod socket;
pub mod wrapper;
pub mod trigger;

pub use capability::{Capabilities, DeadlineProbe, NoDeadline, ReadDeadline, WriteDeadline};
pub use socket::{DeadlineStream, SocketTimeouts};
pub use wrapper::{DeadlineReader, DeadlineWriter};
pub use trigger::{try_cancel_read, try_cancel_write, CancelWatch, WatchOutcome};
