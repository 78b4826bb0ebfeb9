//! Cooperative cancellation
//!
//! A one-shot cancel signal over a crossbeam channel. The token's
//! `sleep` doubles as the realtime pacing sleep: it parks on
//! `recv_timeout`, so a cancellation interrupts a pending sleep
//! immediately while cycle execution itself is never interrupted.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Create a connected cancel handle/token pair.
pub fn cancel_channel() -> (CancelHandle, CancelToken) {
    let (tx, rx) = bounded(1);
    (CancelHandle { tx }, CancelToken { rx: Some(rx) })
}

/// Requests cancellation. Dropping the handle also cancels.
#[derive(Debug)]
pub struct CancelHandle {
    tx: Sender<()>,
}

impl CancelHandle {
    pub fn cancel(self) {
        let _ = self.tx.try_send(());
    }
}

/// Observed by the engine at cycle boundaries and inside the pacing sleep.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<Receiver<()>>,
}

impl CancelToken {
    /// A token that never cancels (generator runs, tools).
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.rx {
            None => false,
            Some(rx) => match rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => true,
                Err(TryRecvError::Empty) => false,
            },
        }
    }

    /// Sleep up to `duration`; returns true if cancelled in the meantime.
    pub fn sleep(&self, duration: Duration) -> bool {
        match &self.rx {
            None => {
                std::thread::sleep(duration);
                false
            }
            Some(rx) => match rx.recv_timeout(duration) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
                Err(RecvTimeoutError::Timeout) => false,
            },
        }
    }
}
