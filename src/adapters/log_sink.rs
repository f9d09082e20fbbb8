//! Log-based status sink adapter.
//!
//! Implements [`StatusSink`] by writing each status line to the ESP-IDF
//! logger, which goes to UART / USB-CDC in production.

use log::info;

use crate::app::ports::StatusSink;

/// Adapter that logs every status line to the serial console.
#[derive(Debug, Default)]
pub struct LogStatusSink;

impl LogStatusSink {
    pub fn new() -> Self {
        Self
    }
}

impl StatusSink for LogStatusSink {
    fn emit(&self, line: &str) {
        info!("{}", line);
    }
}
