// # 📂 src/deadline/trigger.rs

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};

use crate::cancel::CancelToken;
use crate::constants::EXPIRED_DEADLINE;
use crate::deadline::capability::DeadlineProbe;
use crate::types::ChannelError;

/// Best-effort: make blocked and future reads on `target` fail promptly by
/// installing an elapsed deadline. `Unsupported` means the caller needs
/// another strategy, such as closing the connection.
pub fn try_cancel_read<T: DeadlineProbe + ?Sized>(target: &T) -> Result<(), ChannelError> {
    let setter = target.read_deadline().ok_or(ChannelError::Unsupported)?;
    setter.set_read_deadline(Some(EXPIRED_DEADLINE))?;
    Ok(())
}

/// Write-side counterpart of `try_cancel_read`.
pub fn try_cancel_write<T: DeadlineProbe + ?Sized>(target: &T) -> Result<(), ChannelError> {
    let setter = target.write_deadline().ok_or(ChannelError::Unsupported)?;
    setter.set_write_deadline(Some(EXPIRED_DEADLINE))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Disarmed before the token fired.
    Disarmed,
    /// The token fired; flags tell which triggers took effect.
    Fired { read: bool, write: bool },
}

/// Watcher thread that triggers both directions of a transport when a token fires.
#[derive(Debug)]
pub struct CancelWatch {
    disarm: Option<Sender<()>>,
    handle: Option<JoinHandle<WatchOutcome>>,
}

impl CancelWatch {
    pub fn spawn<T>(token: CancelToken, target: Arc<T>) -> Result<Self, ChannelError>
    where
        T: DeadlineProbe + Send + Sync + ?Sized + 'static,
    {
        let (disarm_tx, disarm_rx) = channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("cancel-watch".to_string())
            .spawn(move || {
                let deadline = token.deadline_signal();
                channel::select! {
                    recv(disarm_rx) -> _ => return WatchOutcome::Disarmed,
                    recv(token.signal()) -> _ => {},
                    recv(deadline) -> _ => {},
                }

                let read = log_trigger("read", try_cancel_read(&*target));
                let write = log_trigger("write", try_cancel_write(&*target));
                WatchOutcome::Fired { read, write }
            })?;

        Ok(Self {
            disarm: Some(disarm_tx),
            handle: Some(handle),
        })
    }

    /// Stop watching. Returns `Fired` if the token won the race.
    pub fn disarm(mut self) -> WatchOutcome {
        self.disarm.take();
        self.join_inner()
    }

    /// Block until the token fires and the triggers ran.
    pub fn join(mut self) -> WatchOutcome {
        self.join_inner()
    }

    fn join_inner(&mut self) -> WatchOutcome {
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(WatchOutcome::Disarmed),
            None => WatchOutcome::Disarmed,
        }
    }
}

impl Drop for CancelWatch {
    fn drop(&mut self) {
        // Disconnecting the disarm channel lets a still-waiting thread exit.
        self.disarm.take();
    }
}

fn log_trigger(direction: &str, result: Result<(), ChannelError>) -> bool {
    match result {
        Ok(()) => {
            tracing::debug!(direction, "installed expired deadline");
            true
        }
        Err(ChannelError::Unsupported) => {
            tracing::debug!(direction, "transport has no deadline capability");
            false
        }
        Err(e) => {
            tracing::warn!(direction, error = %e, "failed to install expired deadline");
            false
        }
    }
}
