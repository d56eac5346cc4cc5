use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::info;

/// Why the radar is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ctrl+C / SIGINT
    Interrupted,
    /// Quit key in the radar window
    QuitKey,
}

const RUNNING: u8 = 0;
const INTERRUPTED: u8 = 1;
const QUIT_KEY: u8 = 2;

/// Stop flag shared by the frame loop, the Ctrl+C handler and the keyboard
/// monitor. Waits on it return early once it is triggered.
pub struct ShutdownSignal {
    state: AtomicU8,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(RUNNING),
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
        }
    }

    /// Route Ctrl+C to this signal.
    pub fn install_ctrlc_handler(self: &Arc<Self>) -> Result<(), ctrlc::Error> {
        let signal = Arc::clone(self);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal, stopping...");
            signal.trigger(StopReason::Interrupted);
        })
    }

    /// Record the first stop reason and wake every waiter.
    pub fn trigger(&self, reason: StopReason) {
        let code = match reason {
            StopReason::Interrupted => INTERRUPTED,
            StopReason::QuitKey => QUIT_KEY,
        };
        let _ = self
            .state
            .compare_exchange(RUNNING, code, Ordering::SeqCst, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.load(Ordering::SeqCst) != RUNNING
    }

    pub fn reason(&self) -> Option<StopReason> {
        match self.state.load(Ordering::SeqCst) {
            INTERRUPTED => Some(StopReason::Interrupted),
            QUIT_KEY => Some(StopReason::QuitKey),
            _ => None,
        }
    }

    /// Sleep for `duration` unless shutdown is triggered first.
    ///
    /// Returns `true` if shutdown was triggered.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_shutdown() {
            return true;
        }
        if duration.is_zero() {
            return false;
        }

        let Ok(guard) = self.mutex.lock() else {
            // poisoned: nobody can wake us reliably any more
            return true;
        };
        match self
            .condvar
            .wait_timeout_while(guard, duration, |_| !self.is_shutdown())
        {
            Ok((_, timeout)) => !timeout.timed_out(),
            Err(_) => true,
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
