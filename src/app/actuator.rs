//! Per-color actuator tasks and the single-flight handshake.
//!
//! ```text
//!  Dispatcher                     Actuator (one per color)
//!  ──────────                     ────────────────────────
//!  wake.signal(Request) ───────▶  wake.wait()
//!                                 light aspect
//!                                 hold: timer | cancel | close
//!                                 lamp off
//!  take(ticket) ◀──────────────── done.signal(ticket)
//! ```
//!
//! Each [`ActuatorState`] carries only its own wake and cancel signals; the
//! [`Completion`] is shared by all three. The dispatcher never posts a
//! request while an earlier one is unaccounted for, so at most one
//! actuator is ever active.
//!
//! A completion wait that times out cancels the running actuator (or
//! withdraws a request nobody picked up yet). A cancelled request that has
//! still not reported back stays outstanding, and the next actuation
//! first waits for it instead of lighting anything.
//!
//! All waits are `embassy-sync` signals driven by `futures_lite::block_on`
//! on the task's own thread, raced against the bank's close signal and an
//! `embassy-time` timer.

use core::cell::Cell;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use futures_lite::future;
use log::{debug, info, warn};

use crate::adapters::time::MonotonicClock;
use crate::command::{Color, Command};
use crate::config::ControllerConfig;
use crate::diagnostics::Diagnostics;
use crate::drivers::signal_head::SignalHead;
use crate::error::DispatchError;

use super::context::ShutdownSignal;
use super::ports::{Actuation, GpioPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Request {
    ticket: u64,
    duration_ms: u32,
}

/// How a hold ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hold {
    Elapsed,
    Cancelled,
    Closed,
}

// ── ActuatorState ─────────────────────────────────────────────

/// Wake and cancel signals for one color.
pub struct ActuatorState {
    wake: Signal<CriticalSectionRawMutex, Request>,
    cancel: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorState {
    pub const fn new() -> Self {
        Self {
            wake: Signal::new(),
            cancel: Signal::new(),
        }
    }

    /// Post a request. A cancel left over from an earlier request is
    /// cleared first.
    fn signal(&self, request: Request) {
        self.cancel.reset();
        self.wake.signal(request);
    }

    /// Stop the current request. Returns `true` if the actuator had not
    /// picked it up yet, in which case it will never run or complete.
    fn cancel(&self) -> bool {
        if self.wake.try_take().is_some() {
            return true;
        }
        self.cancel.signal(());
        false
    }

    /// Block until a request arrives. `None` once `closed` fires.
    fn wait_request(&self, closed: &ShutdownSignal) -> Option<Request> {
        if closed.is_requested() {
            return None;
        }
        future::block_on(future::or(
            async { Some(self.wake.wait().await) },
            async {
                closed.wait().await;
                None
            },
        ))
    }

    /// Keep the aspect lit for `duration`, or until cancelled or closed.
    fn hold(&self, duration: Duration, closed: &ShutdownSignal) -> Hold {
        future::block_on(future::or(
            future::or(
                async {
                    Timer::after(duration).await;
                    Hold::Elapsed
                },
                async {
                    self.cancel.wait().await;
                    Hold::Cancelled
                },
            ),
            async {
                closed.wait().await;
                Hold::Closed
            },
        ))
    }
}

// ── Completion ────────────────────────────────────────────────

/// Completion signal shared by every actuator. Carries the ticket of the
/// request that finished.
pub struct Completion {
    done: Signal<CriticalSectionRawMutex, u64>,
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

impl Completion {
    pub const fn new() -> Self {
        Self {
            done: Signal::new(),
        }
    }

    /// Report that the request with `ticket` has finished.
    pub fn give(&self, ticket: u64) {
        self.done.signal(ticket);
    }

    /// Wait up to `timeout` for `ticket`. Completions for other tickets
    /// are consumed and ignored.
    pub fn take(
        &self,
        ticket: u64,
        timeout: Duration,
        closed: &ShutdownSignal,
    ) -> Result<(), DispatchError> {
        future::block_on(future::or(
            future::or(
                async {
                    while self.done.wait().await != ticket {}
                    Ok(())
                },
                async {
                    Timer::after(timeout).await;
                    Err(DispatchError::Timeout)
                },
            ),
            async {
                closed.wait().await;
                Err(DispatchError::ShuttingDown)
            },
        ))
    }
}

// ── ActuatorBank ──────────────────────────────────────────────

/// A request that was cancelled after a timeout but has not reported back.
#[derive(Debug, Clone, Copy)]
struct Outstanding {
    color: Color,
    ticket: u64,
}

/// The three actuator states and the shared completion, seen from the
/// dispatcher side.
pub struct ActuatorBank {
    states: [Arc<ActuatorState>; 3],
    completion: Arc<Completion>,
    closed: Arc<ShutdownSignal>,
    outstanding: BlockingMutex<CriticalSectionRawMutex, Cell<Option<Outstanding>>>,
    next_ticket: AtomicU64,
    grace: Duration,
    strict_timing: bool,
}

impl ActuatorBank {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            states: core::array::from_fn(|_| Arc::new(ActuatorState::new())),
            completion: Arc::new(Completion::new()),
            closed: Arc::new(ShutdownSignal::new()),
            outstanding: BlockingMutex::new(Cell::new(None)),
            next_ticket: AtomicU64::new(0),
            grace: Duration::from_millis(u64::from(config.completion_grace_ms)),
            strict_timing: config.strict_timing,
        }
    }

    /// Build the task body for `color`.
    pub fn actuator<G: GpioPort>(
        &self,
        color: Color,
        head: Arc<SignalHead<G>>,
        diagnostics: Diagnostics,
        clock: MonotonicClock,
    ) -> Actuator<G> {
        Actuator {
            color,
            state: self.states[color.index()].clone(),
            completion: self.completion.clone(),
            closed: self.closed.clone(),
            head,
            diagnostics,
            clock,
        }
    }

    /// Wake every actuator and any pending completion wait for shutdown.
    pub fn close(&self) {
        self.closed.trigger();
    }

    /// True while a cancelled request has not reported back.
    pub fn has_outstanding(&self) -> bool {
        self.outstanding.lock(|o| o.get().is_some())
    }

    /// Wait out a cancelled request before anything else may light.
    fn settle(&self) -> Result<(), DispatchError> {
        let Some(pending) = self.outstanding.lock(Cell::get) else {
            return Ok(());
        };
        self.completion
            .take(pending.ticket, self.grace, &self.closed)
            .inspect_err(|_| {
                warn!(
                    "Actuators: {} still finishing a cancelled request",
                    pending.color.name()
                );
            })?;
        self.outstanding.lock(|o| o.set(None));
        Ok(())
    }
}

impl Actuation for ActuatorBank {
    fn actuate(&self, command: Command) -> Result<(), DispatchError> {
        if self.strict_timing && command.duration_ms == 0 {
            return Err(DispatchError::ZeroDuration);
        }
        if self.closed.is_requested() {
            return Err(DispatchError::ShuttingDown);
        }
        self.settle()?;

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1;
        let state = &self.states[command.color.index()];
        state.signal(Request {
            ticket,
            duration_ms: command.duration_ms,
        });

        let timeout = Duration::from_millis(u64::from(command.duration_ms)) + self.grace;
        match self.completion.take(ticket, timeout, &self.closed) {
            Err(DispatchError::Timeout) => {
                if state.cancel() {
                    warn!("Actuators: {} never picked up its request", command.color.name());
                } else {
                    warn!("Actuators: cancelling overdue {}", command.color.name());
                    self.outstanding.lock(|o| {
                        o.set(Some(Outstanding {
                            color: command.color,
                            ticket,
                        }));
                    });
                    // Usually reports back at once; otherwise the next
                    // actuation waits for it.
                    let _ = self.settle();
                }
                Err(DispatchError::Timeout)
            }
            other => other,
        }
    }
}

// ── Actuator task ─────────────────────────────────────────────

/// Task name for `color`'s actuator, null-terminated for the RTOS.
pub const fn task_name(color: Color) -> &'static str {
    match color {
        Color::Red => "red\0",
        Color::Yellow => "yellow\0",
        Color::Green => "green\0",
    }
}

pub struct Actuator<G: GpioPort> {
    color: Color,
    state: Arc<ActuatorState>,
    completion: Arc<Completion>,
    closed: Arc<ShutdownSignal>,
    head: Arc<SignalHead<G>>,
    diagnostics: Diagnostics,
    clock: MonotonicClock,
}

impl<G: GpioPort> Actuator<G> {
    /// Idle → Active(duration) → Idle, until the bank is closed.
    pub fn run(self) {
        info!("{} actuator ready", self.color.name());
        while let Some(request) = self.state.wait_request(&self.closed) {
            let started = self.clock.uptime_us();
            self.head.activate(self.color);
            let hold = self.state.hold(
                Duration::from_millis(u64::from(request.duration_ms)),
                &self.closed,
            );
            self.head.deactivate(self.color);

            if hold == Hold::Cancelled {
                warn!("{} cut short after timeout", self.color.name());
            }
            self.diagnostics.report(format_args!(
                "{} task duration: {} us",
                self.color.name(),
                self.clock.elapsed_us(started)
            ));
            self.completion.give(request.ticket);
            if hold == Hold::Closed {
                break;
            }
        }
        debug!("{} actuator stopped", self.color.name());
    }
}
