//! One-shot broadcast stop signal
//!
//! A `StopSignal` is shared by every thread that must observe shutdown.
//! Firing it drops the only sender of an internal channel, so every clone
//! of the receiver becomes permanently ready. That lets a thread wait on
//! "next message or stop" with a single `crossbeam_channel::select!`.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Inner {
    trigger: Mutex<Option<Sender<()>>>,
    listener: Receiver<()>,
    fired: AtomicBool,
}

/// Idempotent stop signal; once fired it stays fired
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

impl StopSignal {
    /// Create a signal that has not fired
    pub fn new() -> Self {
        let (trigger, listener) = bounded(0);

        Self {
            inner: Arc::new(Inner {
                trigger: Mutex::new(Some(trigger)),
                listener,
                fired: AtomicBool::new(false),
            }),
        }
    }

    /// Fire the signal. Calling this more than once is harmless.
    pub fn fire(&self) {
        self.inner.fired.store(true, Ordering::SeqCst);
        self.inner.trigger.lock().take();
    }

    /// Check whether the signal has fired
    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Receiver that is ready (disconnected) once the signal fires
    ///
    /// Only meant for use inside `select!`; nothing is ever sent on it.
    pub fn listener(&self) -> &Receiver<()> {
        &self.inner.listener
    }

    /// Sleep until the timeout elapses or the signal fires
    ///
    /// Returns true if the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.inner.listener.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) | Ok(()) => true,
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("fired", &self.is_fired())
            .finish()
    }
}
