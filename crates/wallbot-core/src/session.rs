//! Session management
//!
//! A session owns the single transport to the robot for the lifetime of the program, along
//! with the command store and the dispatcher state.

use std::path::PathBuf;

use crate::config::SessionConfig;
use crate::dispatch::{DispatchError, DispatchReport, DispatchState, Dispatcher};
use crate::input::Workspace;
use crate::protocol::{CancelToken, ProtocolError, SerialTransport, Transport};
use crate::sequence::{CommandSequence, CommandStore, SequenceError};

/// Connection to the robot plus the job files it replays
pub struct Session<T: Transport = SerialTransport> {
    transport: T,
    dispatcher: Dispatcher,
    store: CommandStore,
    cancel: CancelToken,
    config: SessionConfig,
}

impl Session<SerialTransport> {
    /// Open the configured serial port and wait for the board to come out of reset.
    ///
    /// The handshake is not performed; call [`Session::handshake`] next.
    pub fn open(config: SessionConfig, cancel: CancelToken) -> Result<Self, ProtocolError> {
        let transport =
            SerialTransport::open(&config.port, config.baud_rate, config.read_timeout())?;
        tracing::debug!("waiting {:?} for the board to reset", config.settle_delay());
        std::thread::sleep(config.settle_delay());
        Ok(Self::with_transport(transport, config, cancel))
    }
}

impl<T: Transport> Session<T> {
    /// Build a session around an already open transport
    pub fn with_transport(transport: T, config: SessionConfig, cancel: CancelToken) -> Self {
        let dispatcher = Dispatcher::new(
            config.ack_policy(),
            config.handshake_policy(),
            cancel.clone(),
        );
        Self {
            transport,
            dispatcher,
            store: CommandStore::new(config.commands_dir.clone()),
            cancel,
            config,
        }
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Command file store
    pub fn store(&self) -> &CommandStore {
        &self.store
    }

    /// Token interrupting the session's blocking waits
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// State of the most recent dispatch
    pub fn state(&self) -> DispatchState {
        self.dispatcher.state()
    }

    /// Wait for the device's setup message
    pub fn handshake(&mut self) -> Result<(), ProtocolError> {
        self.dispatcher.handshake(&mut self.transport)
    }

    /// Send a sequence
    pub fn dispatch(&mut self, sequence: &CommandSequence) -> Result<DispatchReport, DispatchError> {
        self.dispatcher.dispatch(&mut self.transport, sequence)
    }

    /// Load a command file from the store and send it
    pub fn send_file(&mut self, name: &str) -> Result<DispatchReport, DispatchError> {
        let sequence = self.store.load(name)?;
        tracing::info!("Sending {} ({} commands)", name, sequence.len());
        self.dispatch(&sequence)
    }

    /// Generate an alternating sequence between two points and save it as the next command
    /// file.
    pub fn write_alternating(
        &self,
        workspace: &Workspace,
        start: (i32, i32),
        target: (i32, i32),
        repetitions: u32,
    ) -> Result<PathBuf, SequenceError> {
        for (x, y) in [start, target] {
            if !workspace.contains(x, y) {
                return Err(SequenceError::OutOfWorkspace {
                    x,
                    y,
                    half_span: workspace.half_span(),
                });
            }
        }
        let sequence = CommandSequence::alternating(start, target, repetitions)?;
        self.store.save(&sequence)
    }

    /// Close the session, handing back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }
}
