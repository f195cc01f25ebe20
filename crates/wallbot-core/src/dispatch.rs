//! Sequence dispatch
//!
//! Sends a [`CommandSequence`] to the robot one command at a time. The firmware has no way to
//! tell which request a `DONE` belongs to, so the next frame is only written after the previous
//! one was acknowledged. If a wait is abandoned after its frame went out, the device still owes
//! that `DONE`; it is collected before the next frame is written.
//!
//! ```text
//! Idle -> Sending -> AwaitingAck -> Idle -> ... -> Completed
//!            \            \
//!             +------------+--> Failed
//! ```

use std::time::{Duration, Instant};
use thiserror::Error;

use crate::protocol::{
    AckWaiter, CancelToken, Command, ProtocolError, Transport, WaitPolicy, SETUP_DONE_MARKER,
};
use crate::sequence::{CommandSequence, SequenceError};

/// Dispatch progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Nothing in flight
    Idle,
    /// Writing a frame
    Sending,
    /// Frame written, waiting for `DONE`
    AwaitingAck,
    /// Every command of the last sequence was acknowledged
    Completed,
    /// The last sequence was aborted
    Failed,
}

/// Why a dispatch did not complete
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl DispatchError {
    /// Whether the session can carry on with the next job
    pub fn is_recoverable(&self) -> bool {
        match self {
            DispatchError::Sequence(_) => true,
            DispatchError::Protocol(e) => e.is_recoverable(),
        }
    }
}

/// Outcome of a completed dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Commands written and acknowledged
    pub commands_sent: usize,
    /// Lines of the source file that were not commands
    pub lines_skipped: usize,
    /// Wall-clock time from the first write to the last `DONE`
    pub elapsed: Duration,
}

/// Drives the request/acknowledge loop
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ack: AckWaiter,
    handshake: AckWaiter,
    state: DispatchState,
    /// A frame was written whose `DONE` has not been read yet
    ack_owed: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(WaitPolicy::unbounded(), WaitPolicy::unbounded(), CancelToken::new())
    }
}

impl Dispatcher {
    /// Create a dispatcher.
    ///
    /// `ack_policy` bounds each wait for `DONE`, `handshake_policy` the wait for the
    /// device's setup message. Both waits stop when `cancel` is triggered.
    pub fn new(ack_policy: WaitPolicy, handshake_policy: WaitPolicy, cancel: CancelToken) -> Self {
        Self {
            ack: AckWaiter::new(ack_policy, cancel.clone()),
            handshake: AckWaiter::new(handshake_policy, cancel),
            state: DispatchState::Idle,
            ack_owed: false,
        }
    }

    /// Current state
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Whether the device still owes a `DONE` for an interrupted command
    pub fn ack_outstanding(&self) -> bool {
        self.ack_owed
    }

    fn transition(&mut self, next: DispatchState) {
        tracing::trace!("dispatch state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Wait until the device reports its setup finished
    pub fn handshake<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), ProtocolError> {
        tracing::info!("Waiting for Arduino");
        let line = self
            .handshake
            .wait_until(transport, |line| line.contains(SETUP_DONE_MARKER))?;
        tracing::debug!("handshake complete: {line:?}");
        Ok(())
    }

    /// Send every command of `sequence`, waiting for each acknowledgement.
    ///
    /// An empty sequence is rejected before anything is written. The first error aborts the
    /// rest of the sequence; commands that were already acknowledged are not undone.
    pub fn dispatch<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        sequence: &CommandSequence,
    ) -> Result<DispatchReport, DispatchError> {
        if sequence.is_empty() {
            return Err(SequenceError::Empty.into());
        }

        self.transition(DispatchState::Idle);
        if let Err(e) = self.collect_owed_ack(transport) {
            self.transition(DispatchState::Failed);
            return Err(e.into());
        }

        let start = Instant::now();
        for (idx, command) in sequence.iter().enumerate() {
            self.transition(DispatchState::Sending);
            tracing::info!("--> Sending: {command} ({}/{})", idx + 1, sequence.len());
            if let Err(e) = self.send_one(transport, command) {
                self.transition(DispatchState::Failed);
                tracing::error!("dispatch aborted at command {}: {e}", idx + 1);
                return Err(e.into());
            }
        }
        self.transition(DispatchState::Completed);

        let report = DispatchReport {
            commands_sent: sequence.len(),
            lines_skipped: sequence.skipped(),
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "DONE: {} commands in {:.3}s",
            report.commands_sent,
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }

    fn send_one<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        command: &Command,
    ) -> Result<(), ProtocolError> {
        transport.write_frame(&command.encode_for_wire())?;
        self.ack_owed = true;
        self.transition(DispatchState::AwaitingAck);
        self.ack.await_done(transport)?;
        self.ack_owed = false;
        self.transition(DispatchState::Idle);
        Ok(())
    }

    /// Read the `DONE` left over from an interrupted command.
    ///
    /// The debt survives a failed wait, so no frame is written until the device has finished.
    fn collect_owed_ack<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<(), ProtocolError> {
        if !self.ack_owed {
            return Ok(());
        }
        tracing::info!("waiting for the interrupted command to finish");
        self.transition(DispatchState::AwaitingAck);
        self.ack.await_done(transport)?;
        self.ack_owed = false;
        self.transition(DispatchState::Idle);
        Ok(())
    }
}
