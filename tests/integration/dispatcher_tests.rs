//! Dispatcher against the real actuator bank and a recording GPIO.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use trafficlight::adapters::time::MonotonicClock;
use trafficlight::app::actuator::ActuatorBank;
use trafficlight::app::dispatcher::Dispatcher;
use trafficlight::app::queue::RawLine;
use trafficlight::command::Color;
use trafficlight::config::ControllerConfig;
use trafficlight::diagnostics::{Diagnostics, DiagnosticsQueue, DiagnosticsStats};
use trafficlight::drivers::signal_head::SignalHead;
use trafficlight::pins::{GREEN_GPIO, RED_GPIO};

use crate::mock_hw::RecordingGpio;

struct Rig {
    gpio: RecordingGpio,
    head: Arc<SignalHead<RecordingGpio>>,
    bank: Arc<ActuatorBank>,
    dispatcher: Dispatcher<Arc<ActuatorBank>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Rig {
    /// `running` selects which actuators get a task.
    fn new(config: &ControllerConfig, running: &[Color]) -> Self {
        Self::with_gpio(RecordingGpio::new(), config, running)
    }

    fn with_gpio(gpio: RecordingGpio, config: &ControllerConfig, running: &[Color]) -> Self {
        let head = Arc::new(SignalHead::new(gpio.clone()));
        head.bring_up().unwrap();

        let clock = MonotonicClock::new();
        let diagnostics = Diagnostics::new(
            Arc::new(DiagnosticsQueue::new()),
            Arc::new(DiagnosticsStats::default()),
            clock,
        );
        let bank = Arc::new(ActuatorBank::new(config));
        let tasks = running
            .iter()
            .map(|&color| {
                let actuator = bank.actuator(color, head.clone(), diagnostics.clone(), clock);
                std::thread::spawn(move || actuator.run())
            })
            .collect();
        let dispatcher = Dispatcher::new(bank.clone(), diagnostics, clock, config);

        Self {
            gpio,
            head,
            bank,
            dispatcher,
            tasks,
        }
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        self.bank.close();
        for t in self.tasks.drain(..) {
            t.join().unwrap();
        }
    }
}

#[test]
fn each_command_held_for_its_duration() {
    let rig = Rig::new(&ControllerConfig::default(), &Color::ALL);
    let start = Instant::now();
    let report = rig
        .dispatcher
        .process_line(&RawLine::new("R,50 G,70", 0));

    assert_eq!(report.executed, 2);
    assert!(start.elapsed() >= Duration::from_millis(120));

    let red = rig.gpio.high_intervals(RED_GPIO);
    let green = rig.gpio.high_intervals(GREEN_GPIO);
    assert!(red[0].1 - red[0].0 >= Duration::from_millis(50));
    assert!(green[0].1 - green[0].0 >= Duration::from_millis(70));
    assert!(!rig.gpio.ever_overlapped(RED_GPIO, GREEN_GPIO));
    assert!(rig.head.is_idle());
}

#[test]
fn missing_actuator_times_out_and_abandons_line() {
    let config = ControllerConfig {
        completion_grace_ms: 20,
        ..ControllerConfig::default()
    };
    // No green task: the green command can never complete.
    let rig = Rig::new(&config, &[Color::Red, Color::Yellow]);

    let start = Instant::now();
    let report = rig
        .dispatcher
        .process_line(&RawLine::new("R,10 G,10 R,10", 0));
    assert!(report.aborted);
    assert_eq!(report.executed, 1);
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(rig.gpio.high_intervals(RED_GPIO).len(), 1);

    // The pipeline recovers for the next line.
    let report = rig.dispatcher.process_line(&RawLine::new("R,10", 0));
    assert_eq!(report.executed, 1);
}

#[test]
fn zero_duration_skipped_under_strict_timing() {
    let rig = Rig::new(&ControllerConfig::default(), &Color::ALL);
    let report = rig
        .dispatcher
        .process_line(&RawLine::new("R,0 G,10", 0));
    assert_eq!(report.skipped, 1);
    assert_eq!(report.executed, 1);
    assert!(rig.gpio.high_intervals(RED_GPIO).is_empty());
}

#[test]
fn overdue_actuator_is_stopped_before_the_next_lights() {
    // Each aspect change costs 5 ms, so every command overruns a 1 ms grace.
    let config = ControllerConfig {
        completion_grace_ms: 1,
        ..ControllerConfig::default()
    };
    let gpio = RecordingGpio::with_write_delay(Duration::from_millis(5));
    let rig = Rig::with_gpio(gpio, &config, &Color::ALL);

    let mut aborted = 0;
    for _ in 0..5 {
        for line in ["R,50", "G,50"] {
            let report = rig.dispatcher.process_line(&RawLine::new(line, 0));
            if report.aborted {
                aborted += 1;
            }
        }
    }

    assert!(aborted > 0);
    assert_eq!(rig.head.overlap_count(), 0);
    assert!(rig.head.peak_active() <= 1);
    assert!(!rig.gpio.ever_overlapped(RED_GPIO, GREEN_GPIO));
}

