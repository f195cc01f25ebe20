//! Acknowledge waiting
//!
//! After every frame the firmware reports progress as free-form lines and finishes with a
//! bare `DONE`. There is no request ID in the protocol, so the waiter simply consumes lines
//! until the marker shows up.

use std::time::{Duration, Instant};

use super::{CancelToken, ProtocolError, Transport, DONE_MARKER};

/// How long a wait may block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaitPolicy {
    /// Give up after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl WaitPolicy {
    /// Wait until the device answers, however long that takes
    pub fn unbounded() -> Self {
        Self { timeout: None }
    }

    /// Fail with [`ProtocolError::Timeout`] after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Build from an optional millisecond value, as stored in configuration
    pub fn from_millis(timeout_ms: Option<u64>) -> Self {
        Self {
            timeout: timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Blocks until the device emits an expected line
#[derive(Debug, Clone, Default)]
pub struct AckWaiter {
    policy: WaitPolicy,
    cancel: CancelToken,
}

impl AckWaiter {
    /// Create a waiter with the given policy and cancellation token
    pub fn new(policy: WaitPolicy, cancel: CancelToken) -> Self {
        Self { policy, cancel }
    }

    /// The wait policy in effect
    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// Wait for `DONE`, returning the informational lines seen before it
    pub fn await_done<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<Vec<String>, ProtocolError> {
        let mut info = Vec::new();
        self.wait_until(transport, |line| {
            if line == DONE_MARKER {
                return true;
            }
            info.push(line.to_string());
            false
        })?;
        Ok(info)
    }

    /// Read and log device lines until `matches` accepts one (given trimmed), returning it.
    ///
    /// Lines that are not ASCII are logged and otherwise ignored. Any other transport error
    /// ends the wait.
    pub fn wait_until<T, F>(&self, transport: &mut T, mut matches: F) -> Result<String, ProtocolError>
    where
        T: Transport + ?Sized,
        F: FnMut(&str) -> bool,
    {
        let start = Instant::now();
        loop {
            if self.cancel.is_cancelled() {
                tracing::warn!("wait cancelled after {:?}", start.elapsed());
                return Err(ProtocolError::Cancelled);
            }
            if let Some(limit) = self.policy.timeout {
                if start.elapsed() >= limit {
                    return Err(ProtocolError::Timeout(limit));
                }
            }

            match transport.read_line() {
                Ok(Some(line)) => {
                    let line = line.trim();
                    tracing::info!("[ARDUINO] {line}");
                    if matches(line) {
                        return Ok(line.to_string());
                    }
                }
                Ok(None) => {}
                Err(ProtocolError::Decode { bytes }) => {
                    tracing::warn!("[ARDUINO] {}", String::from_utf8_lossy(&bytes));
                }
                Err(e) => return Err(e),
            }
        }
    }
}
