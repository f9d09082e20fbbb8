//! Fuzz target: command line parser
//!
//! Feeds arbitrary UTF-8 to `parse_line` and checks:
//! - No panics under arbitrary input
//! - A successful parse yields one command per whitespace-separated token
//! - Per-token parsing agrees with whole-line parsing
//!
//! cargo fuzz run fuzz_parse_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use trafficlight::command::{DEFAULT_DURATION_MS, parse_line, tokens};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = core::str::from_utf8(data) else {
        return;
    };

    let whole = parse_line(raw);
    let per_token: Result<Vec<_>, _> = tokens(raw, DEFAULT_DURATION_MS).collect();
    assert_eq!(whole, per_token, "line and token parsers disagree");

    if let Ok(commands) = whole {
        assert_eq!(
            commands.len(),
            raw.split_whitespace().count(),
            "command count differs from token count"
        );
    }
});
