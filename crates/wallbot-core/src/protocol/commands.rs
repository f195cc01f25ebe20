//! Protocol commands
//!
//! Defines the commands understood by the robot firmware and their text form.
//!
//! A command is written as `<KIND, X, Y>` with exactly one comma-space between fields. The
//! firmware parses this literally, so [`Command::encode`] must never change its layout. On the
//! wire the text is followed by a single NUL byte ([`FRAME_TERMINATOR`]).

use std::fmt;

use super::FRAME_TERMINATOR;

/// Kind of instruction carried by a [`Command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Move the probe to an absolute position ("MOVE")
    Move,
}

impl CommandKind {
    /// Keyword used on the wire
    pub fn keyword(&self) -> &'static str {
        match self {
            CommandKind::Move => "MOVE",
        }
    }

    /// Look up a kind by its wire keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "MOVE" => Some(CommandKind::Move),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single instruction for the robot.
///
/// Coordinates are millimetre offsets from the centre point between the two motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    kind: CommandKind,
    x: i32,
    y: i32,
}

impl Command {
    /// Create a move to `(x, y)`
    pub fn move_to(x: i32, y: i32) -> Self {
        Self {
            kind: CommandKind::Move,
            x,
            y,
        }
    }

    /// Command kind
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// X offset in millimetres
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Y offset in millimetres
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Text form, e.g. `<MOVE, 5, -3>`
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Text form as ASCII bytes followed by the frame terminator
    pub fn encode_for_wire(&self) -> Vec<u8> {
        let mut bytes = self.encode().into_bytes();
        bytes.push(FRAME_TERMINATOR);
        bytes
    }

    /// Parse a line of a command file.
    ///
    /// Returns `None` for anything that is not a bracketed, well-formed command. Callers
    /// replaying files skip such lines instead of failing.
    pub fn decode(line: &str) -> Option<Self> {
        let body = line.trim().strip_prefix('<')?.strip_suffix('>')?;

        let mut fields = body.split(',').map(str::trim);
        let kind = CommandKind::from_keyword(fields.next()?)?;
        let x = fields.next()?.parse::<i32>().ok()?;
        let y = fields.next()?.parse::<i32>().ok()?;
        if fields.next().is_some() {
            return None;
        }

        Some(Self { kind, x, y })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.kind, self.x, self.y)
    }
}
