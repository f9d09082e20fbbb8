//! Coordinator: wires the pipeline and owns every task.
//!
//! ```text
//!                 ┌──────────────┐  RawLine  ┌────────────┐  Command  ┌───────────┐
//!  CharSource ──▶ │ Input Reader │─────────▶ │ Dispatcher │─────────▶ │ Actuators │──▶ SignalHead
//!                 └──────────────┘  queue    └────────────┘ ◀─────────└───────────┘
//!                        │                        │        completion       │
//!                        ▼ debug flag             └──────┬──────────────────┘
//!                                                        ▼
//!                                          DiagnosticsSink ──▶ StatusSink
//! ```
//!
//! Bring-up of the signal head happens before any task starts; a failure
//! there is returned to the caller and nothing is spawned.

use std::sync::Arc;
use std::thread::JoinHandle;

use log::{error, info};

use crate::adapters::time::MonotonicClock;
use crate::command::Color;
use crate::config::{ControllerConfig, OperatingMode};
use crate::diagnostics::{Diagnostics, DiagnosticsQueue, DiagnosticsSink, DiagnosticsStats};
use crate::drivers::signal_head::SignalHead;
use crate::drivers::task_pin::{Core, TaskSpec, spawn_task};
use crate::error::{Error, Result};

use super::actuator::{ActuatorBank, task_name};
use super::context::{DebugFlag, SharedContext};
use super::cycle::CycleTask;
use super::dispatcher::Dispatcher;
use super::input::{InputReader, QueueForwarder, TimeCheckResponder};
use super::ports::{CharSource, GpioPort, StatusSink};
use super::queue::CommandQueue;

pub struct Controller<G: GpioPort + 'static> {
    mode: OperatingMode,
    ctx: Arc<SharedContext>,
    head: Arc<SignalHead<G>>,
    bank: Arc<ActuatorBank>,
    queue: Arc<CommandQueue>,
    stats: Arc<DiagnosticsStats>,
    tasks: Vec<JoinHandle<()>>,
}

impl<G: GpioPort + 'static> Controller<G> {
    /// Validate `config`, bring up the outputs, and start every task for
    /// the configured mode.
    pub fn start<S, O>(
        config: ControllerConfig,
        gpio: G,
        source: S,
        output: Arc<O>,
        clock: MonotonicClock,
    ) -> Result<Self>
    where
        S: CharSource + 'static,
        O: StatusSink + 'static,
    {
        let started = clock.uptime_us();
        config.validate().map_err(Error::Config)?;

        let head = Arc::new(SignalHead::new(gpio));
        head.bring_up()?;

        let mut controller = Self {
            mode: config.mode,
            ctx: Arc::new(SharedContext::new(config.debug_at_boot)),
            head,
            bank: Arc::new(ActuatorBank::new(&config)),
            queue: Arc::new(CommandQueue::new()),
            stats: Arc::new(DiagnosticsStats::default()),
            tasks: Vec::new(),
        };

        if let Err(e) = controller.spawn_tasks(&config, source, output, clock) {
            error!("Controller: start failed: {}", e);
            controller.shutdown();
            return Err(e);
        }

        match config.mode {
            OperatingMode::Sequencer => {
                info!("Traffic Light Controller Ready");
                info!(
                    "Send e.g.: R,1000 Y,500 G,2000 or {} to toggle debug",
                    config.debug_toggle
                );
            }
            OperatingMode::TimeCheck => info!("Time check ready: send HHMMSS"),
            OperatingMode::AutoCycle => info!("Traffic Light Controller Ready (auto cycle)"),
        }
        info!("Init time: {} us", clock.elapsed_us(started));
        Ok(controller)
    }

    fn spawn_tasks<S, O>(
        &mut self,
        config: &ControllerConfig,
        source: S,
        output: Arc<O>,
        clock: MonotonicClock,
    ) -> Result<()>
    where
        S: CharSource + 'static,
        O: StatusSink + 'static,
    {
        let stack = config.task_stack_kb;
        let prio = config.actuation_priority;

        let diag_queue = Arc::new(DiagnosticsQueue::new());
        let diagnostics = Diagnostics::new(diag_queue.clone(), self.stats.clone(), clock);
        let sink = DiagnosticsSink::new(
            diag_queue,
            self.stats.clone(),
            self.ctx.clone(),
            output.clone(),
            clock,
        );
        self.spawn(
            TaskSpec::new("diagnostics\0", Core::Pro, config.diagnostics_priority, stack),
            move || sink.run(),
        )?;

        if config.mode == OperatingMode::TimeCheck {
            let responder = TimeCheckResponder::new(output);
            let mut reader =
                InputReader::new(source, responder, self.ctx.clone(), clock, config, None);
            return self.spawn(TaskSpec::new("input\0", Core::Pro, prio, stack), move || {
                reader.run();
            });
        }

        for color in Color::ALL {
            let actuator = self
                .bank
                .actuator(color, self.head.clone(), diagnostics.clone(), clock);
            self.spawn(TaskSpec::new(task_name(color), Core::App, prio, stack), move || {
                actuator.run();
            })?;
        }

        let dispatcher = Dispatcher::new(self.bank.clone(), diagnostics, clock, config);
        let (queue, ctx) = (self.queue.clone(), self.ctx.clone());
        self.spawn(TaskSpec::new("dispatcher\0", Core::App, prio, stack), move || {
            dispatcher.run(&queue, &ctx.shutdown);
        })?;

        if config.mode == OperatingMode::AutoCycle {
            drop(source);
            let mut cycle = CycleTask::new(
                self.queue.clone(),
                self.head.clone(),
                self.ctx.clone(),
                clock,
                config,
            );
            return self.spawn(TaskSpec::new("cycle\0", Core::Pro, prio, stack), move || {
                cycle.run();
            });
        }

        let forwarder = QueueForwarder::new(self.queue.clone());
        let mut reader = InputReader::new(
            source,
            forwarder,
            self.ctx.clone(),
            clock,
            config,
            Some(config.debug_toggle),
        );
        self.spawn(TaskSpec::new("input\0", Core::Pro, prio, stack), move || {
            reader.run();
        })
    }

    fn spawn(&mut self, spec: TaskSpec, f: impl FnOnce() + Send + 'static) -> Result<()> {
        self.tasks.push(spawn_task(spec, f)?);
        Ok(())
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn debug(&self) -> &DebugFlag {
        &self.ctx.debug
    }

    pub fn head(&self) -> &SignalHead<G> {
        &self.head
    }

    pub fn diagnostics(&self) -> &DiagnosticsStats {
        &self.stats
    }

    /// Lines waiting for the dispatcher.
    pub fn pending_lines(&self) -> usize {
        self.queue.len()
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Stop every task and wait for it to exit. Idempotent.
    pub fn shutdown(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        info!("Controller: shutting down {} task(s)", self.tasks.len());
        self.ctx.shutdown.trigger();
        self.bank.close();
        for task in self.tasks.drain(..) {
            let name = task.thread().name().unwrap_or("?").to_string();
            if task.join().is_err() {
                error!("Controller: task '{}' panicked", name);
            }
        }
    }
}

impl<G: GpioPort + 'static> Drop for Controller<G> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
