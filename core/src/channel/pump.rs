// # 📂 src/channel/pump.rs

// ## Delivery task: transport → stream buffer

use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bytes::{Bytes, BytesMut};

use crate::buffer::StreamBuffer;
use crate::config::PumpConfig;
use crate::types::ChannelError;

/// Spawn a thread that appends everything read from `source` to `buffer`.
///
/// End-of-stream is signaled exactly once when the source reaches EOF or
/// fails. The join handle yields the number of bytes delivered.
pub fn spawn_pump<R>(
    mut source: R,
    buffer: Arc<StreamBuffer>,
    config: &PumpConfig,
) -> Result<JoinHandle<Result<u64, ChannelError>>, ChannelError>
where
    R: Read + Send + 'static,
{
    config.validate()?;
    let chunk_size = config.chunk_size;

    let handle = thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || {
            let result = deliver(&mut source, &buffer, chunk_size);
            buffer.signal_end_of_stream();
            match &result {
                Ok(total) => tracing::debug!(total, "pump reached end of source"),
                Err(e) => tracing::warn!(error = %e, "pump stopped on error"),
            }
            result
        })?;

    Ok(handle)
}

/// Read chunks until EOF; each non-empty read becomes one segment.
pub fn deliver<R: Read + ?Sized>(
    source: &mut R,
    buffer: &StreamBuffer,
    chunk_size: usize,
) -> Result<u64, ChannelError> {
    let mut chunks = ChunkReader::new(chunk_size);
    let mut total = 0u64;

    while let Some(chunk) = chunks.next_chunk(source)? {
        total += chunk.len() as u64;
        buffer.append(chunk)?;
    }
    Ok(total)
}

// Smallest tail worth reading into before moving to a new allocation.
const MIN_SPARE: usize = 512;

/// Reads into one reusable scratch allocation and splits each read off it.
///
/// Segments only own what was actually read: consecutive small reads share
/// the scratch allocation instead of each holding `chunk_size` bytes.
#[derive(Debug)]
pub struct ChunkReader {
    scratch: BytesMut,
    chunk_size: usize,
}

impl ChunkReader {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            scratch: BytesMut::with_capacity(chunk_size),
            chunk_size,
        }
    }

    /// Next non-empty chunk, or `None` at EOF. `Interrupted` reads are retried.
    pub fn next_chunk<R: Read + ?Sized>(&mut self, source: &mut R) -> Result<Option<Bytes>, ChannelError> {
        loop {
            if self.scratch.len() < self.chunk_size.min(MIN_SPARE) {
                // Tail used up: start a fresh allocation. Reclaimed in place
                // once every segment split off the old one has been consumed.
                self.scratch.clear();
                self.scratch.reserve(self.chunk_size);
                let capacity = self.scratch.capacity();
                self.scratch.resize(capacity, 0);
            }

            let want = self.scratch.len().min(self.chunk_size);
            match source.read(&mut self.scratch[..want]) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(self.scratch.split_to(n).freeze())),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Yields `step` bytes per read.
    struct Trickle {
        left: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.left.min(self.step).min(buf.len());
            buf[..n].fill(b'z');
            self.left -= n;
            Ok(n)
        }
    }

    #[test]
    fn small_reads_share_one_allocation() {
        let mut chunks = ChunkReader::new(4096);
        let mut source = Trickle { left: 500, step: 5 };

        let mut got = Vec::new();
        while let Some(chunk) = chunks.next_chunk(&mut source).unwrap() {
            got.push(chunk);
        }

        assert_eq!(got.len(), 100);
        assert!(got.iter().all(|c| c.len() == 5));
        // Contiguous slices of the same scratch buffer, not one chunk-sized allocation each.
        for pair in got.windows(2) {
            assert_eq!(pair[1].as_ptr() as usize, pair[0].as_ptr() as usize + 5);
        }
    }

    #[test]
    fn full_scratch_moves_to_a_new_allocation() {
        let mut chunks = ChunkReader::new(8);
        let mut source = Trickle { left: 24, step: 8 };

        let a = chunks.next_chunk(&mut source).unwrap().unwrap();
        let b = chunks.next_chunk(&mut source).unwrap().unwrap();
        let c = chunks.next_chunk(&mut source).unwrap().unwrap();
        assert_eq!((a.len(), b.len(), c.len()), (8, 8, 8));
        assert!(chunks.next_chunk(&mut source).unwrap().is_none());
        assert_eq!(&a[..], b"zzzzzzzz");
    }
}
