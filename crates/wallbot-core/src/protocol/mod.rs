//! Serial Protocol Communication
//!
//! Implements the line-oriented request/acknowledge protocol spoken by the wall robot firmware.
//!
//! Commands go out as ASCII text terminated by a single NUL byte. The device answers with
//! newline-terminated informational lines and finally a `DONE` line once the move finished.

mod ack;
mod cancel;
pub mod commands;
mod error;
pub mod serial;
mod transport;

pub use ack::{AckWaiter, WaitPolicy};
pub use cancel::CancelToken;
pub use commands::{Command, CommandKind};
pub use error::ProtocolError;
pub use serial::{list_ports, open_port, PortInfo};
pub use transport::{LineTransport, SerialTransport, Transport};

/// Default baud rate of the robot firmware
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default timeout for a single line read in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 2000;

/// Delay after opening the port while the board resets, in milliseconds
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

/// Byte terminating every command frame
pub const FRAME_TERMINATOR: u8 = 0;

/// Line the device sends once the last command has been carried out
pub const DONE_MARKER: &str = "DONE";

/// Substring of the line the device sends when its setup routine finished
pub const SETUP_DONE_MARKER: &str = "setup done";

/// Upper bound on a buffered line before it is discarded
pub const MAX_LINE_LENGTH: usize = 1024;
