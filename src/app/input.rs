//! Input reader: polls the serial console and assembles lines.
//!
//! Characters accumulate in a fixed buffer until `\r` or `\n`. A
//! completed, non-empty line goes to a [`LineConsumer`]; characters past
//! the buffer capacity are dropped. The reserved toggle character flips
//! the debug flag and never reaches the buffer.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::adapters::time::MonotonicClock;
use crate::command::time_result_code;
use crate::config::ControllerConfig;

use super::context::SharedContext;
use super::ports::{CharSource, StatusSink};
use super::queue::{CommandQueue, MAX_LINE_LEN, RawLine};

/// Upper bound on characters drained in one poll, so a flooding source
/// cannot starve the shutdown check.
pub const MAX_CHARS_PER_POLL: usize = 64;

/// Where completed lines go.
pub trait LineConsumer: Send {
    fn consume(&mut self, line: RawLine);
}

// ── Consumers ─────────────────────────────────────────────────

/// Hands lines to the dispatcher. Never blocks; a full queue drops the line.
pub struct QueueForwarder {
    queue: Arc<CommandQueue>,
    dropped: u32,
}

impl QueueForwarder {
    pub fn new(queue: Arc<CommandQueue>) -> Self {
        Self { queue, dropped: 0 }
    }

    /// Lines lost to a full queue.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl LineConsumer for QueueForwarder {
    fn consume(&mut self, line: RawLine) {
        if let Err(line) = self.queue.push(line) {
            self.dropped = self.dropped.saturating_add(1);
            warn!("Input: command queue full, dropping '{}'", line.as_str());
        }
    }
}

/// Answers each `HHMMSS` line with its result code on the status channel.
pub struct TimeCheckResponder<O: StatusSink> {
    output: Arc<O>,
}

impl<O: StatusSink> TimeCheckResponder<O> {
    pub fn new(output: Arc<O>) -> Self {
        Self { output }
    }
}

impl<O: StatusSink> LineConsumer for TimeCheckResponder<O> {
    fn consume(&mut self, line: RawLine) {
        let code = time_result_code(line.as_str());
        debug!("Time check: '{}' -> {}", line.as_str(), code);
        self.output.emit(&code.to_string());
    }
}

// ── Reader ────────────────────────────────────────────────────

pub struct InputReader<S: CharSource, C: LineConsumer> {
    source: S,
    consumer: C,
    ctx: Arc<SharedContext>,
    clock: MonotonicClock,
    buffer: heapless::String<MAX_LINE_LEN>,
    capacity: usize,
    toggle: Option<char>,
    poll_interval: Duration,
}

impl<S: CharSource, C: LineConsumer> InputReader<S, C> {
    /// `toggle` is the reserved debug character, or `None` to treat every
    /// character as line content.
    pub fn new(
        source: S,
        consumer: C,
        ctx: Arc<SharedContext>,
        clock: MonotonicClock,
        config: &ControllerConfig,
        toggle: Option<char>,
    ) -> Self {
        Self {
            source,
            consumer,
            ctx,
            clock,
            buffer: heapless::String::new(),
            capacity: config.line_capacity.min(MAX_LINE_LEN),
            toggle,
            poll_interval: Duration::from_millis(u64::from(config.poll_interval_ms)),
        }
    }

    /// Handle one character.
    pub fn feed(&mut self, c: char) {
        if self.toggle.is_some_and(|t| t.eq_ignore_ascii_case(&c)) {
            let enabled = self.ctx.debug.toggle();
            info!("Debug mode {}", if enabled { "enabled" } else { "disabled" });
            return;
        }

        if c == '\r' || c == '\n' {
            if !self.buffer.is_empty() {
                let line = RawLine::new(&self.buffer, self.clock.uptime_us());
                self.buffer.clear();
                self.consumer.consume(line);
            }
            return;
        }

        if self.buffer.len() + c.len_utf8() > self.capacity {
            return;
        }
        // Cannot fail: capacity never exceeds the buffer size.
        let _ = self.buffer.push(c);
    }

    /// Drain whatever the source has pending. Returns the number of
    /// characters read.
    pub fn poll(&mut self) -> usize {
        let mut read = 0;
        while read < MAX_CHARS_PER_POLL {
            let Some(c) = self.source.try_read_char() else {
                break;
            };
            self.feed(c);
            read += 1;
        }
        read
    }

    /// Poll at the configured cadence until shutdown.
    pub fn run(&mut self) {
        info!("Input reader polling every {:?}", self.poll_interval);
        while !self.ctx.shutdown.is_requested() {
            self.poll();
            std::thread::sleep(self.poll_interval);
        }
        debug!("Input reader stopped");
    }

    /// Characters buffered towards the next line.
    pub fn pending(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }
}
