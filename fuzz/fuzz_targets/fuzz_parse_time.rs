//! Fuzz target: `HHMMSS` time parser
//!
//! Checks that arbitrary input never panics and that every accepted value
//! lies strictly inside one day.
//!
//! cargo fuzz run fuzz_parse_time

#![no_main]

use libfuzzer_sys::fuzz_target;
use trafficlight::command::{parse_time, time_result_code};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);

    match parse_time(&raw) {
        Ok(secs) => {
            assert!((1..86_400).contains(&secs), "out-of-day result {secs}");
            assert_eq!(raw.len(), 6);
        }
        Err(e) => assert_eq!(time_result_code(&raw), e.code()),
    }
});
