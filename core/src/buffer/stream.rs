// # 📂 src/buffer/stream.rs

// ## Shared handle: append / end-of-stream / cancelable read

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, Sender};

use crate::buffer::segment::SegmentChain;
use crate::buffer::worker::{BufferWorker, Command};
use crate::cancel::CancelToken;
use crate::config::BufferConfig;
use crate::telemetry::{BufferCounters, BufferSnapshot, TelemetryTimer};
use crate::types::ChannelError;

/// Unbounded byte stream with one producer and one consumer.
///
/// While open, every structural change goes through the buffer's worker
/// thread. Once end-of-stream is signaled the worker drains its queue, hands
/// the remaining segments back, and the consumer drains them directly.
///
/// Only one `cancelable_read` may be in flight at a time.
#[derive(Debug)]
pub struct StreamBuffer {
    state: Mutex<OpenState>,
    drained: Receiver<SegmentChain>,
    residual: Mutex<Option<SegmentChain>>,
    counters: Arc<BufferCounters>,
    timer: Mutex<TelemetryTimer>,
}

#[derive(Debug)]
struct OpenState {
    closed: bool,
    ops: Option<Sender<Command>>,
}

impl StreamBuffer {
    /// Empty, open buffer with default settings.
    ///
    /// # Panics
    /// If the worker thread cannot be spawned, like `std::thread::spawn`.
    pub fn new() -> Self {
        Self::with_config(&BufferConfig::default())
            .unwrap_or_else(|e| panic!("failed to spawn stream buffer worker: {e}"))
    }

    pub fn with_config(config: &BufferConfig) -> Result<Self, ChannelError> {
        config.validate()?;

        let counters = Arc::new(BufferCounters::default());
        let (ops_tx, ops_rx) = channel::unbounded();
        let (drained_tx, drained_rx) = channel::bounded(1);

        BufferWorker::new(Arc::clone(&counters)).spawn(&config.worker_name, ops_rx, drained_tx)?;

        Ok(Self {
            state: Mutex::new(OpenState { closed: false, ops: Some(ops_tx) }),
            drained: drained_rx,
            residual: Mutex::new(None),
            counters,
            timer: Mutex::new(TelemetryTimer::new()),
        })
    }

    /// Make `data` available to the consumer.
    ///
    /// Returns once the worker has linked the segment, so any read that is
    /// waiting or starts afterwards observes it.
    pub fn append(&self, data: impl Into<Bytes>) -> Result<(), ChannelError> {
        let data = data.into();
        let ops = self.sender().ok_or(ChannelError::Closed)?;
        if data.is_empty() {
            return Ok(());
        }

        let (ack_tx, ack_rx) = channel::bounded(1);
        ops.send(Command::Append { data, ack: ack_tx })
            .map_err(|_| ChannelError::WorkerGone)?;
        drop(ops);
        ack_rx.recv().map_err(|_| ChannelError::WorkerGone)
    }

    /// Close the buffer. Reads return `EndOfStream` once the remaining bytes
    /// are consumed. Idempotent.
    pub fn signal_end_of_stream(&self) {
        let mut state = lock(&self.state);
        if !state.closed {
            state.closed = true;
            // Last sender: the worker finishes queued commands, then drains.
            state.ops = None;
            tracing::debug!(appended = self.counters.load().bytes_appended, "end of stream signaled");
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Copy available bytes into `dst`, blocking until at least one byte is
    /// available, the buffer is closed and drained, or `token` fires.
    ///
    /// Short reads are normal. When data and cancellation are ready together,
    /// the data is returned.
    pub fn cancelable_read(&self, token: &CancelToken, dst: &mut [u8]) -> Result<usize, ChannelError> {
        if dst.is_empty() {
            return Ok(0);
        }
        let deadline = token.deadline_signal();

        loop {
            let n = match self.sender() {
                Some(ops) => {
                    let (reply_tx, reply_rx) = channel::bounded::<Bytes>(0);
                    ops.send(Command::Read { max: dst.len(), reply: reply_tx })
                        .map_err(|_| ChannelError::WorkerGone)?;
                    drop(ops);

                    let bytes = channel::select! {
                        // Disconnected: the queue shut down under us; re-check `closed`.
                        recv(reply_rx) -> msg => msg.unwrap_or_default(),
                        recv(token.signal()) -> _ => self.withdraw(&reply_rx)?,
                        recv(deadline) -> _ => self.withdraw(&reply_rx)?,
                    };
                    dst[..bytes.len()].copy_from_slice(&bytes);
                    bytes.len()
                }
                None => {
                    // Closed: the token is no longer consulted, so a fired token
                    // cannot produce `Cancelled` here. Remaining data, then EOF.
                    let n = self.drain_closed(dst)?;
                    if n == 0 {
                        lock(&self.timer).finish();
                        return Err(ChannelError::EndOfStream);
                    }
                    n
                }
            };

            if n > 0 {
                self.counters.add_read(n);
                return Ok(n);
            }
        }
    }

    pub fn stats(&self) -> BufferSnapshot {
        let closed = self.is_closed();
        let timer = lock(&self.timer).clone();
        BufferSnapshot::from(&self.counters.load(), &timer, closed)
    }

    fn sender(&self) -> Option<Sender<Command>> {
        let state = lock(&self.state);
        if state.closed {
            None
        } else {
            state.ops.clone()
        }
    }

    /// Token fired while a read command is outstanding. Withdraw it, keeping
    /// any bytes the worker had already taken for us.
    fn withdraw(&self, reply_rx: &Receiver<Bytes>) -> Result<Bytes, ChannelError> {
        let ack_rx = match self.sender() {
            Some(ops) => {
                let (ack_tx, ack_rx) = channel::bounded(1);
                ops.send(Command::Withdraw { ack: ack_tx })
                    .map_err(|_| ChannelError::WorkerGone)?;
                ack_rx
            }
            // Closing: the worker either serves the read or releases it on shutdown.
            None => channel::never(),
        };

        let outcome = channel::select! {
            recv(reply_rx) -> msg => msg.ok().filter(|b| !b.is_empty()),
            recv(ack_rx) -> _ => reply_rx.try_recv().ok().filter(|b| !b.is_empty()),
        };

        match outcome {
            Some(bytes) => Ok(bytes),
            None => {
                self.counters.add_cancelled();
                Err(ChannelError::Cancelled)
            }
        }
    }

    /// Drain directly after the worker has handed the chain back.
    ///
    /// The hand-off wait is not raced against the token: after close the
    /// worker only finishes commands already queued, none of which block.
    fn drain_closed(&self, dst: &mut [u8]) -> Result<usize, ChannelError> {
        let mut residual = lock(&self.residual);

        if residual.is_none() {
            let chain = self.drained.recv().map_err(|_| ChannelError::WorkerGone)?;
            *residual = Some(chain);
        }

        Ok(residual.as_mut().map_or(0, |chain| chain.read_into(dst)))
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// Guarded state is a flag, a sender or a chain; a panicked holder leaves it consistent.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}
