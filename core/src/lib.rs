//! streamlocal-core
//!
//! Data delivery and cooperative cancellation underneath a remote-shell
//! channel (Unix-domain-socket forwarding).
//! No async runtime; one worker thread per stream buffer.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod config;
pub mod types;
pub mod telemetry;

// Cancellation
pub mod cancel;
pub mod deadline;

// Data delivery
pub mod buffer;
pub mod channel;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::buffer::StreamBuffer;
    pub use crate::cancel::CancelToken;
    pub use crate::channel::{spawn_pump, ChannelReader};
    pub use crate::config::CoreConfig;
    pub use crate::deadline::{
        try_cancel_read, try_cancel_write, DeadlineProbe, DeadlineReader, DeadlineStream,
        DeadlineWriter,
    };
    pub use crate::types::ChannelError;
}
