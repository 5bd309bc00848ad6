// Shared helpers for integration tests.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use streamlocal_core::buffer::StreamBuffer;
use streamlocal_core::cancel::CancelToken;
use streamlocal_core::types::ChannelError;

/// Install a fmt subscriber honoring `RUST_LOG`; later calls are no-ops.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Read until EndOfStream with `chunk`-sized reads.
#[allow(dead_code)]
pub fn read_all(buffer: &StreamBuffer, chunk: usize) -> Result<Vec<u8>, ChannelError> {
    let token = CancelToken::new();
    let mut out = Vec::new();
    let mut scratch = vec![0u8; chunk];
    loop {
        match buffer.cancelable_read(&token, &mut scratch) {
            Ok(n) => out.extend_from_slice(&scratch[..n]),
            Err(ChannelError::EndOfStream) => return Ok(out),
            Err(e) => return Err(e),
        }
    }
}

/// Append every part from another thread, then close.
#[allow(dead_code)]
pub fn spawn_producer(buffer: Arc<StreamBuffer>, parts: Vec<Vec<u8>>) -> JoinHandle<()> {
    thread::spawn(move || {
        for p in parts {
            buffer.append(p).expect("append while open");
        }
        buffer.signal_end_of_stream();
    })
}
