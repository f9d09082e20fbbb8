//! `HHMMSS` time-of-day parser used by the time-check mode.
//!
//! Checks run in a fixed order: presence, length, digits, field ranges,
//! then the zero check. `000000` is rejected with
//! [`TimeParseError::Zero`] even though midnight is a valid time of day.

use crate::error::TimeParseError;

const TIME_LEN: usize = 6;

/// Parse `HHMMSS` into seconds since midnight.
pub fn parse_time(s: &str) -> Result<i64, TimeParseError> {
    let bytes = s.as_bytes();
    if bytes.len() != TIME_LEN {
        return Err(TimeParseError::WrongLength);
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return Err(TimeParseError::NonDigit);
    }

    let field = |i: usize| i64::from(bytes[i] - b'0') * 10 + i64::from(bytes[i + 1] - b'0');
    let (hh, mm, ss) = (field(0), field(2), field(4));

    if hh > 23 || mm > 59 || ss > 59 {
        return Err(TimeParseError::OutOfRange);
    }

    let total = hh * 3600 + mm * 60 + ss;
    if total == 0 {
        return Err(TimeParseError::Zero);
    }
    Ok(total)
}

/// [`parse_time`] for input that may be absent.
pub fn parse_time_opt(s: Option<&str>) -> Result<i64, TimeParseError> {
    s.ok_or(TimeParseError::Null).and_then(parse_time)
}

/// Seconds on success, the negative legacy code on failure.
pub fn time_result_code(s: &str) -> i64 {
    match parse_time(s) {
        Ok(secs) => secs,
        Err(e) => e.code(),
    }
}
