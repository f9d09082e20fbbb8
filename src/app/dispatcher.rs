//! Dispatcher: turns queued lines into strictly sequential actuations.
//!
//! For every dequeued [`RawLine`] the dispatcher parses the text and walks
//! the commands left to right, waiting for each actuation to complete
//! before starting the next one. What happens to a bad token depends on
//! the [`InvalidTokenPolicy`]:
//!
//! - `DiscardLine`: the whole line is dropped before anything runs.
//! - `SkipToken`: the bad token is logged and skipped, the rest runs.
//!
//! A completion timeout abandons the rest of the line; the pipeline keeps
//! going with the next line.

use log::{debug, error, info, warn};

use crate::adapters::time::MonotonicClock;
use crate::command::{self, Command};
use crate::config::{ControllerConfig, InvalidTokenPolicy};
use crate::diagnostics::Diagnostics;
use crate::error::{DispatchError, ParseError};

use super::context::ShutdownSignal;
use super::ports::Actuation;
use super::queue::{CommandQueue, RawLine};

/// What became of one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineReport {
    /// Commands that ran to completion.
    pub executed: usize,
    /// Tokens or commands that were skipped.
    pub skipped: usize,
    /// The line was rejected before anything ran.
    pub discarded: bool,
    /// Execution stopped part-way through the line.
    pub aborted: bool,
}

pub struct Dispatcher<A: Actuation> {
    actuation: A,
    diagnostics: Diagnostics,
    clock: MonotonicClock,
    default_duration_ms: u32,
    strict_timing: bool,
    policy: InvalidTokenPolicy,
}

impl<A: Actuation> Dispatcher<A> {
    pub fn new(
        actuation: A,
        diagnostics: Diagnostics,
        clock: MonotonicClock,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            actuation,
            diagnostics,
            clock,
            default_duration_ms: config.default_duration_ms,
            strict_timing: config.strict_timing,
            policy: config.invalid_token_policy,
        }
    }

    /// Process lines until shutdown.
    pub fn run(&self, queue: &CommandQueue, shutdown: &ShutdownSignal) {
        info!("Dispatcher ready ({:?})", self.policy);
        while let Some(line) = queue.pop_blocking(shutdown) {
            let report = self.process_line(&line);
            debug!("Dispatcher: '{}' -> {:?}", line.as_str(), report);
        }
        debug!("Dispatcher stopped");
    }

    /// Parse and execute one line, blocking until its last command is done.
    pub fn process_line(&self, line: &RawLine) -> LineReport {
        match self.policy {
            InvalidTokenPolicy::DiscardLine => {
                match command::parse_line_with(line.as_str(), self.default_duration_ms) {
                    Ok(commands) => self.execute(commands.into_iter().map(Ok)),
                    Err(e) => {
                        warn!("Dispatcher: discarding '{}': {}", line.as_str(), e);
                        self.diagnostics
                            .report(format_args!("Parse error: {e}, line discarded"));
                        LineReport {
                            discarded: true,
                            ..LineReport::default()
                        }
                    }
                }
            }
            InvalidTokenPolicy::SkipToken => {
                self.execute(command::tokens(line.as_str(), self.default_duration_ms))
            }
        }
    }

    fn execute(
        &self,
        commands: impl Iterator<Item = Result<Command, ParseError>>,
    ) -> LineReport {
        let started = self.clock.uptime_us();
        let mut report = LineReport::default();

        for item in commands {
            let command = match item {
                Ok(command) => command,
                Err(ParseError::UnknownColor(c)) => {
                    self.skip(&mut report, DispatchError::UnknownColorToken(c));
                    continue;
                }
                Err(e) => {
                    warn!("Dispatcher: skipping token: {}", e);
                    self.diagnostics.report(format_args!("Parse error: {e}, token skipped"));
                    report.skipped += 1;
                    continue;
                }
            };

            if self.strict_timing && command.duration_ms == 0 {
                self.skip(&mut report, DispatchError::ZeroDuration);
                continue;
            }

            self.diagnostics.report(format_args!(
                "Dispatcher: Color {} for {} ms",
                command.color.letter(),
                command.duration_ms
            ));

            match self.actuation.actuate(command) {
                Ok(()) => report.executed += 1,
                Err(e @ DispatchError::ZeroDuration) => self.skip(&mut report, e),
                Err(e) => {
                    error!(
                        "Dispatcher: {} for {} ms failed: {}; abandoning line",
                        command.color.name(),
                        command.duration_ms,
                        e
                    );
                    report.aborted = true;
                    break;
                }
            }
        }

        if report.executed > 0 {
            self.diagnostics.report(format_args!(
                "Sequence total duration: {} us",
                self.clock.elapsed_us(started)
            ));
        }
        report
    }

    fn skip(&self, report: &mut LineReport, e: DispatchError) {
        warn!("Dispatcher: skipping command: {}", e);
        self.diagnostics.report(format_args!("Dispatch error: {e}"));
        report.skipped += 1;
    }
}
