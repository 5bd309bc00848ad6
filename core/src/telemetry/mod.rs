//! telemetry/mod.rs
//! Buffer telemetry: live counters, a lifetime timer and immutable snapshots.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
