//! buffer — unbounded single-producer/single-consumer byte stream.
//!
//! Layering:
//! - `segment`: owned byte runs chained in append order
//! - `worker`: one thread per buffer owning the chain, executing commands in order
//! - `stream`: the shared `StreamBuffer` handle (append, end-of-stream, cancelable read)
//!
//! Memory is unbounded: append never waits on read progress.

pub mod segment;
pub mod worker;
pub mod stream;

pub use segment::{Segment, SegmentChain};
pub use stream::StreamBuffer;
