//! Protocol errors

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the robot
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Failed to open serial port '{port}': {reason}")]
    ConnectionFailed { port: String, reason: String },

    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Connection closed by device")]
    Disconnected,

    #[error("Received non-ASCII line from device: {bytes:02x?}")]
    Decode { bytes: Vec<u8> },

    #[error("No acknowledgement within {0:?}")]
    Timeout(Duration),

    #[error("Cancelled by operator")]
    Cancelled,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether the connection to the device can still be used after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProtocolError::Decode { .. } | ProtocolError::Cancelled)
    }
}
