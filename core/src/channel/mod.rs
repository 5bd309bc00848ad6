//! channel — glue between a stream buffer and the code around a logical channel.
//!
//! - `pump`: delivery task moving transport bytes into a buffer
//! - `reader`: consumer view of a buffer as `std::io::Read`

pub mod pump;
pub mod reader;

pub use pump::spawn_pump;
pub use reader::ChannelReader;
