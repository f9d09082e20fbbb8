//! Serial command language.
//!
//! A command line is a whitespace-separated list of tokens, each
//! `<color>[,<duration_ms>]`:
//!
//! ```text
//!   R,1000 Y,500 G,2000
//!   │ │
//!   │ └── optional duration (ms), default 1000
//!   └──── first character, case-insensitive: R / Y / G
//! ```
//!
//! Characters between the color letter and the comma are ignored, so
//! `RED,500` is a red command.

pub mod time;

use crate::error::ParseError;

pub use time::{parse_time, parse_time_opt, time_result_code};

/// Duration applied to a token without a `,ms` suffix.
pub const DEFAULT_DURATION_MS: u32 = 1000;

/// One lamp color. Yellow has no lamp of its own; see
/// [`SignalHead`](crate::drivers::signal_head::SignalHead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Yellow,
    Green,
}

impl Color {
    pub const ALL: [Color; 3] = [Color::Red, Color::Yellow, Color::Green];

    /// Map a command letter to a color, ignoring case.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(Self::Red),
            'Y' => Some(Self::Yellow),
            'G' => Some(Self::Green),
            _ => None,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Yellow => 'Y',
            Self::Green => 'G',
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Yellow => "YELLOW",
            Self::Green => "GREEN",
        }
    }

    /// Stable slot index, used to address per-color state arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Yellow => 1,
            Self::Green => 2,
        }
    }
}

/// A parsed `(color, duration)` instruction. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub color: Color,
    pub duration_ms: u32,
}

impl Command {
    pub const fn new(color: Color, duration_ms: u32) -> Self {
        Self { color, duration_ms }
    }
}

/// Parse a full line. Any bad token rejects the whole line.
///
/// An empty or all-whitespace line yields an empty sequence.
pub fn parse_line(raw: &str) -> Result<Vec<Command>, ParseError> {
    parse_line_with(raw, DEFAULT_DURATION_MS)
}

/// [`parse_line`] with a caller-chosen default duration.
pub fn parse_line_with(raw: &str, default_ms: u32) -> Result<Vec<Command>, ParseError> {
    tokens(raw, default_ms).collect()
}

/// Lazily parse each token of `raw`, left to right.
///
/// Unlike [`parse_line`], errors are reported per token, so a caller can
/// skip a bad token and keep going.
pub fn tokens(
    raw: &str,
    default_ms: u32,
) -> impl Iterator<Item = Result<Command, ParseError>> + '_ {
    raw.split_whitespace()
        .map(move |token| parse_token(token, default_ms))
}

/// Parse a single `<color>[,<ms>]` token.
pub fn parse_token(token: &str, default_ms: u32) -> Result<Command, ParseError> {
    // split_whitespace never yields an empty token; ' ' is just a fallback.
    let first = token.chars().next().unwrap_or(' ');
    let color = Color::from_char(first).ok_or(ParseError::UnknownColor(first))?;

    let duration_ms = match token.split_once(',') {
        Some((_, ms)) => ms.parse::<u32>().map_err(|_| ParseError::BadDuration)?,
        None => default_ms,
    };

    Ok(Command::new(color, duration_ms))
}
