//! # wallbot Core Library
//!
//! Core functionality for driving the cable-suspended wall robot.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Serial transport with line-oriented, timeout-bounded reads
//! - The `<MOVE, X, Y>` command codec shared with the firmware
//! - Acknowledge waiting and sequence dispatch with one command in flight
//! - Command file storage and alternating sequence generation
//! - Session configuration (JSON file + environment)
//!
//! ## Example
//!
//! ```rust,ignore
//! use wallbot_core::{config::SessionConfig, protocol::CancelToken, session::Session};
//!
//! let config = SessionConfig::load(None)?;
//! let mut session = Session::open(config, CancelToken::new())?;
//! session.handshake()?;
//!
//! let report = session.send_file("commands1.csv")?;
//! println!("sent {} commands in {:?}", report.commands_sent, report.elapsed);
//! ```

pub mod config;
pub mod dispatch;
pub mod input;
pub mod protocol;
pub mod sequence;
pub mod session;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::SessionConfig;
    pub use crate::dispatch::{DispatchError, DispatchReport, DispatchState, Dispatcher};
    pub use crate::input::{InputError, Workspace};
    pub use crate::protocol::{
        AckWaiter, CancelToken, Command, CommandKind, ProtocolError, SerialTransport, Transport,
        WaitPolicy,
    };
    pub use crate::sequence::{CommandSequence, CommandStore, SequenceError};
    pub use crate::session::Session;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
