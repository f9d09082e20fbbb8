//! Unified error types for the traffic-light firmware.
//!
//! One `Copy` enum per subsystem, each convertible into the crate-level
//! [`Error`]. Malformed input never halts the controller: parse and
//! dispatch errors are logged and the offending line or token is dropped.
//! Only hardware bring-up failures are fatal.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An output could not be brought up.
    Hardware(HwError),
    /// A command line was rejected.
    Parse(ParseError),
    /// A `HHMMSS` string was rejected.
    TimeParse(TimeParseError),
    /// A command could not be executed.
    Dispatch(DispatchError),
    /// Configuration failed validation.
    Config(&'static str),
    /// A task could not be started.
    Spawn(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::TimeParse(e) => write!(f, "time parse: {e}"),
            Self::Dispatch(e) => write!(f, "dispatch: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn(name) => write!(f, "spawn: task '{name}' could not be created"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Command line errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Token starts with something other than R, Y or G.
    UnknownColor(char),
    /// Text after the comma is not a non-negative integer.
    BadDuration,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownColor(c) => write!(f, "unknown color '{c}'"),
            Self::BadDuration => write!(f, "bad duration"),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Time-of-day errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeParseError {
    /// Input is not exactly six characters long.
    WrongLength,
    /// Input contains a character that is not an ASCII digit.
    NonDigit,
    /// Hours above 23, or minutes/seconds above 59.
    OutOfRange,
    /// `000000` resolves to zero seconds, which is rejected.
    Zero,
    /// No input at all.
    Null,
}

impl TimeParseError {
    /// Numeric result code written to the status channel in time-check
    /// mode. External test harnesses scrape these values.
    pub const fn code(self) -> i64 {
        match self {
            Self::WrongLength => -1,
            Self::OutOfRange => -3,
            Self::Zero => -4,
            Self::Null => -5,
            Self::NonDigit => -6,
        }
    }
}

impl fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength => write!(f, "expected exactly 6 characters"),
            Self::NonDigit => write!(f, "non-digit character"),
            Self::OutOfRange => write!(f, "field out of range"),
            Self::Zero => write!(f, "zero time"),
            Self::Null => write!(f, "no input"),
        }
    }
}

impl From<TimeParseError> for Error {
    fn from(e: TimeParseError) -> Self {
        Self::TimeParse(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwError {
    /// The peripheral reported it is not ready.
    NotReady,
    /// Configuring the pin as an output failed.
    ConfigureFailed,
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "device not ready"),
            Self::ConfigureFailed => write!(f, "output configuration failed"),
        }
    }
}

impl From<HwError> for Error {
    fn from(e: HwError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// A token addressed a color with no actuator. Skipped, not fatal.
    UnknownColorToken(char),
    /// Strict timing is enabled and the command asked for 0 ms.
    ZeroDuration,
    /// The actuator did not report completion in time.
    Timeout,
    /// Shutdown was requested while the command was pending.
    ShuttingDown,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownColorToken(c) => write!(f, "no actuator for color '{c}'"),
            Self::ZeroDuration => write!(f, "duration must be greater than zero"),
            Self::Timeout => write!(f, "actuator completion timed out"),
            Self::ShuttingDown => write!(f, "shutting down"),
        }
    }
}

impl From<DispatchError> for Error {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
