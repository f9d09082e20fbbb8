//! Controller configuration parameters
//!
//! All tunable parameters for the traffic-light controller. The firmware
//! boots with [`ControllerConfig::default()`]; there is no persisted
//! configuration and no command-line surface.

use serde::{Deserialize, Serialize};

use crate::app::queue::MAX_LINE_LEN;

/// Which pipeline the controller runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    /// Serial command lines drive the lights.
    Sequencer,
    /// Serial lines are `HHMMSS` strings; each is answered with a result code.
    TimeCheck,
    /// No serial input; the lights cycle Red → Yellow → Green on their own.
    AutoCycle,
}

/// What the dispatcher does with a token it cannot execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidTokenPolicy {
    /// Drop the whole line; nothing from it executes.
    DiscardLine,
    /// Log the token, skip it, and run the rest of the line.
    SkipToken,
}

/// Core controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub mode: OperatingMode,

    // --- Input ---
    /// Character source poll interval (milliseconds)
    pub poll_interval_ms: u32,
    /// Line buffer capacity in bytes; extra characters are dropped
    pub line_capacity: usize,
    /// Reserved character that toggles diagnostics (case-insensitive)
    pub debug_toggle: char,

    // --- Dispatch ---
    /// Duration used when a token carries no `,ms` suffix
    pub default_duration_ms: u32,
    /// Reject 0 ms commands
    pub strict_timing: bool,
    /// Extra time beyond a command's duration before completion times out
    pub completion_grace_ms: u32,
    pub invalid_token_policy: InvalidTokenPolicy,

    // --- Diagnostics ---
    /// Diagnostics visible at boot
    pub debug_at_boot: bool,

    // --- Auto cycle ---
    /// Duration of each Red/Yellow/Green step (milliseconds)
    pub cycle_step_ms: u32,

    // --- Tasks ---
    pub actuation_priority: u8,
    /// Kept below actuation so logging never delays a light transition
    pub diagnostics_priority: u8,
    pub task_stack_kb: usize,
}

impl ControllerConfig {
    /// Configuration for the standalone `HHMMSS` checker.
    pub fn time_check() -> Self {
        Self {
            mode: OperatingMode::TimeCheck,
            line_capacity: 20,
            ..Self::default()
        }
    }

    /// Configuration for the autonomous light cycle.
    pub fn auto_cycle() -> Self {
        Self {
            mode: OperatingMode::AutoCycle,
            ..Self::default()
        }
    }

    /// Reject values the tasks cannot run with.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be > 0");
        }
        if self.line_capacity == 0 || self.line_capacity > MAX_LINE_LEN {
            return Err("line_capacity must be within 1..=80");
        }
        if self.default_duration_ms == 0 && self.strict_timing {
            return Err("default_duration_ms must be > 0 with strict timing");
        }
        if self.completion_grace_ms == 0 {
            return Err("completion_grace_ms must be > 0");
        }
        if self.mode == OperatingMode::AutoCycle && self.cycle_step_ms == 0 {
            return Err("cycle_step_ms must be > 0");
        }
        if self.diagnostics_priority >= self.actuation_priority {
            return Err("diagnostics must run below actuation priority");
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::Sequencer,

            // Input
            poll_interval_ms: 10,
            line_capacity: MAX_LINE_LEN,
            debug_toggle: 'D',

            // Dispatch
            default_duration_ms: 1000,
            strict_timing: true,
            completion_grace_ms: 1000,
            invalid_token_policy: InvalidTokenPolicy::DiscardLine,

            // Diagnostics
            debug_at_boot: true,

            // Auto cycle
            cycle_step_ms: 2000,

            // Tasks
            actuation_priority: 5,
            diagnostics_priority: 4,
            task_stack_kb: 4,
        }
    }
}
