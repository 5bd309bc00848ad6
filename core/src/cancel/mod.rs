//! Cooperative cancellation tokens.
//!
//! A token fires either when `cancel()` is called on any clone or when its
//! deadline passes. Blocking operations race the token's signals against
//! their own readiness with `crossbeam::select!`.

pub mod token;

pub use token::CancelToken;
