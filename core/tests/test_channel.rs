// Delivery pump and the `std::io::Read` consumer adapter.

mod common;

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use streamlocal_core::buffer::StreamBuffer;
    use streamlocal_core::cancel::CancelToken;
    use streamlocal_core::channel::{spawn_pump, ChannelReader};
    use streamlocal_core::config::{BufferConfig, PumpConfig};
    use streamlocal_core::types::ChannelError;

    use crate::common::init_tracing;

    /// Source yielding `data`, one `Interrupted` first, then `error` if set.
    struct FlakySource {
        data: Cursor<Vec<u8>>,
        interrupted: bool,
        error: Option<io::ErrorKind>,
    }

    impl Read for FlakySource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::ErrorKind::Interrupted.into());
            }
            match self.data.read(buf)? {
                0 => match self.error {
                    Some(kind) => Err(kind.into()),
                    None => Ok(0),
                },
                n => Ok(n),
            }
        }
    }

// # ✅ 1. Pump delivers the whole source, then end-of-stream

    #[test]
    fn pump_delivers_source_then_eof() -> anyhow::Result<()> {
        init_tracing();
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let buf = Arc::new(StreamBuffer::new());
        let cfg = PumpConfig { chunk_size: 777, ..Default::default() };

        let pump = spawn_pump(Cursor::new(payload.clone()), Arc::clone(&buf), &cfg)?;

        let mut out = Vec::new();
        ChannelReader::new(Arc::clone(&buf)).read_to_end(&mut out)?;
        assert_eq!(out, payload);

        let delivered = pump.join().map_err(|_| anyhow::anyhow!("pump thread panicked"))??;
        assert_eq!(delivered, payload.len() as u64);
        assert!(buf.is_closed());
        assert!(buf.stats().segments_appended >= 13);
        Ok(())
    }

    #[test]
    fn pump_retries_interrupted_reads() {
        let buf = Arc::new(StreamBuffer::new());
        let source = FlakySource { data: Cursor::new(b"abc".to_vec()), interrupted: false, error: None };
        let pump = spawn_pump(source, Arc::clone(&buf), &PumpConfig::default()).unwrap();

        assert_eq!(pump.join().unwrap().unwrap(), 3);
        let mut out = Vec::new();
        ChannelReader::new(buf).read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn pump_error_closes_buffer_and_keeps_data() {
        let buf = Arc::new(StreamBuffer::new());
        let source = FlakySource {
            data: Cursor::new(b"partial".to_vec()),
            interrupted: false,
            error: Some(io::ErrorKind::ConnectionReset),
        };
        let pump = spawn_pump(source, Arc::clone(&buf), &PumpConfig::default()).unwrap();

        match pump.join().unwrap() {
            Err(ChannelError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected io error, got {other:?}"),
        }
        assert!(buf.is_closed());

        let mut out = Vec::new();
        ChannelReader::new(buf).read_to_end(&mut out).unwrap();
        assert_eq!(out, b"partial");
    }

    #[test]
    fn pump_rejects_invalid_config() {
        let buf = Arc::new(StreamBuffer::new());
        let cfg = PumpConfig { chunk_size: 0, ..Default::default() };
        let res = spawn_pump(io::empty(), buf, &cfg);
        assert!(matches!(res, Err(ChannelError::Config(_))));
    }

// # ⏱ 2. Reader timeouts and cancellation

    #[test]
    fn reader_timeout_is_timed_out_and_retryable() {
        let buf = Arc::new(StreamBuffer::new());
        let cfg = BufferConfig { read_timeout_ms: Some(30), ..Default::default() };
        let mut reader = ChannelReader::with_config(Arc::clone(&buf), &cfg);
        assert_eq!(reader.read_timeout(), Some(Duration::from_millis(30)));

        let mut dst = [0u8; 8];
        let err = reader.read(&mut dst).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);

        // A fresh token per read: the next read succeeds once data arrives.
        buf.append("late").unwrap();
        let n = reader.read(&mut dst).unwrap();
        assert_eq!(&dst[..n], b"late");
    }

    #[test]
    fn parent_cancel_aborts_blocked_read() {
        let buf = Arc::new(StreamBuffer::new());
        let parent = CancelToken::new();
        let mut reader = ChannelReader::new(Arc::clone(&buf)).with_cancel(parent.clone());

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            parent.cancel();
        });

        let start = Instant::now();
        let err = reader.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(20));
        canceller.join().unwrap();
    }

    #[test]
    fn reader_reports_eof_as_zero() {
        let buf = Arc::new(StreamBuffer::new());
        buf.append("x").unwrap();
        buf.signal_end_of_stream();

        let mut reader = ChannelReader::new(buf);
        reader.set_read_timeout(Some(Duration::from_millis(50)));
        let mut dst = [0u8; 4];
        assert_eq!(reader.read(&mut dst).unwrap(), 1);
        assert_eq!(reader.read(&mut dst).unwrap(), 0);
        assert_eq!(reader.read(&mut dst).unwrap(), 0);
    }
}
