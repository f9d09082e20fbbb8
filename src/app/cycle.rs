//! Autonomous Red → Yellow → Green cycle.
//!
//! Stands in for the serial console: once the command queue is empty and
//! no aspect is lit, it enqueues the next step as an ordinary command
//! line, so the lights still go through the dispatcher and the
//! single-flight handshake. While the pause input reads HIGH no new step
//! is enqueued; the step already running finishes normally.
//!
//! The dispatcher pops a step a moment before its actuator lights it. A
//! tick landing in that gap can enqueue one more step, so a pause holds
//! after the running step and at most one queued behind it.

use core::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::adapters::time::MonotonicClock;
use crate::command::Color;
use crate::config::ControllerConfig;
use crate::drivers::signal_head::SignalHead;
use crate::pins;

use super::context::SharedContext;
use super::ports::GpioPort;
use super::queue::{CommandQueue, RawLine};

/// Order of the cycle.
pub const CYCLE: [Color; 3] = [Color::Red, Color::Yellow, Color::Green];

pub struct CycleTask<G: GpioPort> {
    queue: Arc<CommandQueue>,
    head: Arc<SignalHead<G>>,
    ctx: Arc<SharedContext>,
    clock: MonotonicClock,
    step_ms: u32,
    poll_interval: Duration,
    next: usize,
    paused: bool,
}

impl<G: GpioPort> CycleTask<G> {
    pub fn new(
        queue: Arc<CommandQueue>,
        head: Arc<SignalHead<G>>,
        ctx: Arc<SharedContext>,
        clock: MonotonicClock,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            queue,
            head,
            ctx,
            clock,
            step_ms: config.cycle_step_ms,
            poll_interval: Duration::from_millis(u64::from(config.poll_interval_ms)),
            next: 0,
            paused: false,
        }
    }

    /// Enqueue the next step if the queue is empty, the head is dark and
    /// the cycle is not paused. Returns the color enqueued, if any.
    pub fn tick(&mut self) -> Option<Color> {
        let pause = self.head.read_input(pins::PAUSE_GPIO);
        if pause != self.paused {
            self.paused = pause;
            info!("Cycle {}", if pause { "paused" } else { "resumed" });
        }
        if pause || !self.queue.is_empty() || !self.head.is_idle() {
            return None;
        }

        let color = CYCLE[self.next];
        let mut text: heapless::String<16> = heapless::String::new();
        if write!(text, "{},{}", color.letter(), self.step_ms).is_err() {
            warn!("Cycle: step text overflow");
            return None;
        }
        if self
            .queue
            .push(RawLine::new(&text, self.clock.uptime_us()))
            .is_err()
        {
            return None;
        }
        self.next = (self.next + 1) % CYCLE.len();
        Some(color)
    }

    pub fn run(&mut self) {
        info!("Auto cycle: {} ms per step", self.step_ms);
        while !self.ctx.shutdown.is_requested() {
            self.tick();
            std::thread::sleep(self.poll_interval);
        }
        debug!("Cycle task stopped");
    }
}
