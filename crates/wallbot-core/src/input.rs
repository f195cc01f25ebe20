//! Operator input validation
//!
//! Coordinates are offsets from the midpoint between the two motors, so a robot whose motors
//! are `d` millimetres apart can reach `-d/2 ..= d/2` on each axis.

use thiserror::Error;

use crate::sequence::MAX_REPETITIONS;

/// Rejected operator input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Integers please! ({0:?} is not an integer)")]
    NotInteger(String),

    #[error("Value has to be between {min} and {max}, got {value}")]
    OutOfRange { value: i64, min: i64, max: i64 },
}

/// Parse `text` as an integer within `min..=max`
pub fn parse_bounded(text: &str, min: i64, max: i64) -> Result<i64, InputError> {
    let trimmed = text.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| InputError::NotInteger(trimmed.to_string()))?;
    if value < min || value > max {
        return Err(InputError::OutOfRange { value, min, max });
    }
    Ok(value)
}

/// Parse a repetition count for alternating sequences
pub fn parse_repetitions(text: &str) -> Result<u32, InputError> {
    let value = parse_bounded(text, 1, i64::from(MAX_REPETITIONS))?;
    Ok(value as u32)
}

/// Reachable area of the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workspace {
    motor_distance: u32,
}

impl Workspace {
    /// Workspace for motors `motor_distance` millimetres apart
    pub fn new(motor_distance: u32) -> Result<Self, InputError> {
        if motor_distance == 0 {
            return Err(InputError::OutOfRange {
                value: 0,
                min: 1,
                max: i64::from(i32::MAX),
            });
        }
        Ok(Self { motor_distance })
    }

    /// Parse the motor distance typed by the operator
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let value = parse_bounded(text, 1, i64::from(i32::MAX))?;
        Self::new(value as u32)
    }

    /// Distance between the motors in millimetres
    pub fn motor_distance(&self) -> u32 {
        self.motor_distance
    }

    /// Largest reachable offset on either axis. Odd distances round towards the centre.
    pub fn half_span(&self) -> i32 {
        (self.motor_distance / 2) as i32
    }

    /// Parse one coordinate and check it is reachable
    pub fn parse_coordinate(&self, text: &str) -> Result<i32, InputError> {
        let half = i64::from(self.half_span());
        let value = parse_bounded(text, -half, half)?;
        Ok(value as i32)
    }

    /// Whether `(x, y)` lies inside the workspace
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let half = self.half_span();
        (-half..=half).contains(&x) && (-half..=half).contains(&y)
    }
}
