//! Ctrl+C handling
//!
//! While the robot is busy an interrupt cancels the running wait; at the prompt it exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wallbot_core::protocol::CancelToken;

/// Exit status used when the operator interrupts at the prompt
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Clone)]
pub struct Interrupt {
    busy: Arc<AtomicBool>,
    cancel: CancelToken,
}

impl Interrupt {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            cancel,
        }
    }

    /// Install the process-wide Ctrl+C handler
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let this = self.clone();
        ctrlc::set_handler(move || {
            if this.is_busy() {
                tracing::warn!("Ctrl+C received, cancelling");
                this.cancel.cancel();
            } else {
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        })
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Mark the session busy until the guard is dropped
    pub fn busy(&self) -> BusyGuard<'_> {
        self.busy.store(true, Ordering::SeqCst);
        BusyGuard { interrupt: self }
    }
}

pub struct BusyGuard<'a> {
    interrupt: &'a Interrupt,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.interrupt.busy.store(false, Ordering::SeqCst);
        self.interrupt.cancel.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_clears_state() {
        let cancel = CancelToken::new();
        let interrupt = Interrupt::new(cancel.clone());
        {
            let _guard = interrupt.busy();
            assert!(interrupt.is_busy());
            cancel.cancel();
        }
        assert!(!interrupt.is_busy());
        assert!(!cancel.is_cancelled());
    }
}
