// # 📂 src/cancel/token.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};

/// Deadline and/or explicit cancel signal passed into blocking calls.
///
/// Clones share the explicit signal; `with_timeout` on a clone narrows only
/// that clone's deadline.
#[derive(Debug, Clone)]
pub struct CancelToken {
    shared: Arc<Shared>,
    deadline: Option<Instant>,
}

#[derive(Debug)]
struct Shared {
    cancelled: AtomicBool,
    // Dropping the sender disconnects `signal`, which wakes every receiver at once.
    trip: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl CancelToken {
    /// Token that fires only on an explicit `cancel()`.
    pub fn new() -> Self {
        let (tx, rx) = channel::bounded(0);
        Self {
            shared: Arc::new(Shared {
                cancelled: AtomicBool::new(false),
                trip: Mutex::new(Some(tx)),
                signal: rx,
            }),
            deadline: None,
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self::new().child_with_deadline(deadline)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Shares this token's cancel signal; fires at the earlier of both deadlines.
    pub fn child_with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            shared: Arc::clone(&self.shared),
            deadline: Some(deadline),
        }
    }

    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        self.child_with_deadline(Instant::now() + timeout)
    }

    /// Fire the token for every clone. Idempotent.
    pub fn cancel(&self) {
        if !self.shared.cancelled.swap(true, Ordering::SeqCst) {
            let mut trip = self.shared.trip.lock().unwrap_or_else(|p| p.into_inner());
            trip.take();
            tracing::trace!("cancel token fired");
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once `cancel()` was called or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
            || self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Becomes ready (disconnected) once `cancel()` is called.
    pub fn signal(&self) -> &Receiver<()> {
        &self.shared.signal
    }

    /// Fires once at the deadline; never fires without one.
    pub fn deadline_signal(&self) -> Receiver<Instant> {
        match self.deadline {
            Some(deadline) => channel::at(deadline),
            None => channel::never(),
        }
    }

    /// Block until the token fires.
    pub fn wait(&self) {
        let deadline = self.deadline_signal();
        channel::select! {
            recv(self.signal()) -> _ => {},
            recv(deadline) -> _ => {},
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.signal().try_recv().is_err());
        assert!(token.deadline_signal().try_recv().is_err());
    }

    #[test]
    fn cancel_is_shared_by_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(token.signal().recv().is_err(), "signal must be disconnected");
    }

    #[test]
    fn child_keeps_earlier_deadline() {
        let parent = CancelToken::with_timeout(Duration::from_millis(10));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn wait_returns_after_cancel_from_other_thread() {
        let token = CancelToken::new();
        let remote = token.clone();
        let h = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });
        token.wait();
        assert!(token.is_cancelled());
        h.join().unwrap();
    }

    #[test]
    fn deadline_fires() {
        let token = CancelToken::with_timeout(Duration::from_millis(10));
        token.wait();
        assert!(token.is_cancelled());
    }
}
