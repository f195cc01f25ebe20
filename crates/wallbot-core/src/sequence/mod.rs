//! Command Sequences
//!
//! An ordered list of commands replayed as one job, and its on-disk form.
//!
//! ## File Format
//!
//! One command per line in wire text form:
//! ```text
//! <MOVE, 50, 0>
//! <MOVE, -50, 0>
//! ```
//! Files use the `.csv` extension for compatibility with existing job folders even though the
//! content is not comma-separated values. Lines that are not well-formed commands are skipped
//! on load.

mod store;

pub use store::{CommandStore, COMMAND_FILE_EXTENSION, COMMAND_FILE_PREFIX};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::protocol::Command;

/// Largest repetition count accepted when generating a sequence
pub const MAX_REPETITIONS: u32 = 100;

/// Errors around loading and validating sequences
#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Command file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Command sequence is empty")]
    Empty,

    #[error("Repetitions must be between 1 and {max}, got {0}", max = MAX_REPETITIONS)]
    InvalidRepetitions(u32),

    #[error("Point ({x}, {y}) is outside the workspace (±{half_span} mm)")]
    OutOfWorkspace { x: i32, y: i32, half_span: i32 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Ordered commands forming one replay job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSequence {
    commands: Vec<Command>,
    /// Lines dropped while parsing because they were not valid commands
    skipped: usize,
}

impl CommandSequence {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command; insertion order is execution order
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Commands in execution order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Iterate over the commands in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether there is nothing to send
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of lines skipped when this sequence was parsed
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Parse command-file text, skipping lines that are not commands.
    ///
    /// Blank lines are ignored silently; any other unparsable line is logged.
    pub fn parse(text: &str) -> Self {
        let mut seq = Self::new();
        for (idx, line) in text.lines().enumerate() {
            match Command::decode(line) {
                Some(cmd) => seq.push(cmd),
                None if line.trim().is_empty() => {}
                None => {
                    tracing::warn!("skipping line {}: {:?} is not a command", idx + 1, line);
                    seq.skipped += 1;
                }
            }
        }
        seq
    }

    /// File text, one encoded command per line
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(self.commands.len() * 16);
        for cmd in &self.commands {
            text.push_str(&cmd.encode());
            text.push('\n');
        }
        text
    }

    /// Load a sequence from a command file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SequenceError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SequenceError::NotFound(path.to_path_buf()),
            _ => SequenceError::Io(e),
        })?;
        let seq = Self::parse(&text);
        tracing::debug!(
            "loaded {} commands from {} ({} skipped)",
            seq.len(),
            path.display(),
            seq.skipped
        );
        Ok(seq)
    }

    /// Write the sequence to a command file, replacing any existing content
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SequenceError> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Sequence bouncing between two points.
    ///
    /// Each repetition moves to `target` first and then back to `start`.
    pub fn alternating(
        start: (i32, i32),
        target: (i32, i32),
        repetitions: u32,
    ) -> Result<Self, SequenceError> {
        if !(1..=MAX_REPETITIONS).contains(&repetitions) {
            return Err(SequenceError::InvalidRepetitions(repetitions));
        }

        let to_target = Command::move_to(target.0, target.1);
        let to_start = Command::move_to(start.0, start.1);
        let mut seq = Self::new();
        for _ in 0..repetitions {
            seq.push(to_target);
            seq.push(to_start);
        }
        Ok(seq)
    }
}

impl FromIterator<Command> for CommandSequence {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
            skipped: 0,
        }
    }
}

impl<'a> IntoIterator for &'a CommandSequence {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
