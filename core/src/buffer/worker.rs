// # 📂 `src/buffer/worker.rs`

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use crossbeam::channel::{Receiver, SendError, Sender};

use crate::buffer::segment::SegmentChain;
use crate::telemetry::BufferCounters;

/// Commands executed by the buffer worker, strictly in submission order.
#[derive(Debug)]
pub enum Command {
    /// Link `data` onto the tail, then acknowledge.
    Append { data: Bytes, ack: Sender<()> },
    /// Hand up to `max` bytes to the reader. Parked while the chain is empty.
    Read { max: usize, reply: Sender<Bytes> },
    /// Drop the parked read, if any, then acknowledge.
    Withdraw { ack: Sender<()> },
}

#[derive(Debug)]
struct ParkedRead {
    max: usize,
    reply: Sender<Bytes>,
}

/// Sole owner of a buffer's segment chain while the buffer is open.
pub struct BufferWorker {
    chain: SegmentChain,
    parked: Option<ParkedRead>,
    counters: Arc<BufferCounters>,
}

impl BufferWorker {
    pub fn new(counters: Arc<BufferCounters>) -> Self {
        Self {
            chain: SegmentChain::new(),
            parked: None,
            counters,
        }
    }

    /// Run loop on a dedicated thread: executes commands until every sender is
    /// dropped, then hands the remaining chain to `drained`.
    pub fn spawn(
        self,
        name: &str,
        rx: Receiver<Command>,
        drained: Sender<SegmentChain>,
    ) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || self.run(rx, drained))
    }

    fn run(mut self, rx: Receiver<Command>, drained: Sender<SegmentChain>) {
        tracing::trace!("buffer worker started");

        while let Ok(cmd) = rx.recv() {
            self.handle(cmd);
        }

        // Queue shut down: a parked reader sees its reply disconnect and re-checks `closed`.
        if self.parked.take().is_some() {
            tracing::trace!("released parked read on shutdown");
        }

        let remaining = self.chain.remaining();
        if drained.send(self.chain).is_err() {
            tracing::debug!(remaining, "buffer dropped before drain hand-off");
        }
        tracing::trace!(remaining, "buffer worker drained");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Append { data, ack } => {
                let len = data.len();
                self.chain.push_back(data);
                self.counters.add_append(len);
                let _ = ack.send(());
                self.serve_parked();
            }
            Command::Read { max, reply } => {
                if self.chain.is_empty() {
                    self.counters.add_parked();
                    // Single reader: an older parked read belongs to a reader that has left.
                    self.parked = Some(ParkedRead { max, reply });
                } else {
                    self.serve(max, reply);
                }
            }
            Command::Withdraw { ack } => {
                self.parked = None;
                let _ = ack.send(());
            }
        }
    }

    fn serve_parked(&mut self) {
        if self.chain.is_empty() {
            return;
        }
        if let Some(ParkedRead { max, reply }) = self.parked.take() {
            self.serve(max, reply);
        }
    }

    fn serve(&mut self, max: usize, reply: Sender<Bytes>) {
        let bytes = self.chain.take(max);
        if let Err(SendError(bytes)) = reply.send(bytes) {
            // Reader gone before taking the reply (it unwound mid-read): put the
            // bytes back so the next read sees them. A withdrawn read never gets here.
            tracing::debug!(len = bytes.len(), "reader left, requeueing bytes");
            self.counters.add_requeued(bytes.len());
            self.chain.push_front(bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;

    fn spawn_worker() -> (Sender<Command>, Receiver<SegmentChain>, Arc<BufferCounters>) {
        let counters = Arc::new(BufferCounters::default());
        let (ops_tx, ops_rx) = channel::unbounded();
        let (drained_tx, drained_rx) = channel::bounded(1);
        BufferWorker::new(Arc::clone(&counters))
            .spawn("worker-test", ops_rx, drained_tx)
            .unwrap();
        (ops_tx, drained_rx, counters)
    }

    fn append(ops: &Sender<Command>, data: &'static [u8]) {
        let (ack, ack_rx) = channel::bounded(1);
        ops.send(Command::Append { data: Bytes::from_static(data), ack }).unwrap();
        ack_rx.recv().unwrap();
    }

    #[test]
    fn reply_to_departed_reader_is_requeued() {
        let (ops, drained, counters) = spawn_worker();
        append(&ops, b"abcdef");

        let (reply, reply_rx) = channel::bounded::<Bytes>(0);
        drop(reply_rx);
        ops.send(Command::Read { max: 4, reply }).unwrap();

        let (reply, reply_rx) = channel::bounded::<Bytes>(0);
        ops.send(Command::Read { max: 16, reply }).unwrap();
        assert_eq!(&reply_rx.recv().unwrap()[..], b"abcdef");
        assert_eq!(counters.load().bytes_requeued, 4);

        drop(ops);
        assert!(drained.recv().unwrap().is_empty());
    }

    #[test]
    fn withdraw_drops_parked_read() {
        let (ops, drained, counters) = spawn_worker();

        let (reply, reply_rx) = channel::bounded::<Bytes>(0);
        ops.send(Command::Read { max: 8, reply }).unwrap();
        let (ack, ack_rx) = channel::bounded(1);
        ops.send(Command::Withdraw { ack }).unwrap();
        ack_rx.recv().unwrap();
        assert!(reply_rx.recv().is_err(), "withdrawn read must disconnect");

        append(&ops, b"kept");
        drop(ops);
        assert_eq!(drained.recv().unwrap().remaining(), 4);
        assert_eq!(counters.load().reads_parked, 1);
        assert_eq!(counters.load().bytes_requeued, 0);
    }
}
