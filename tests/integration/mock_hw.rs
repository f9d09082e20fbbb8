//! Mock adapters for integration tests.
//!
//! Records every GPIO write with a timestamp so tests can reconstruct when
//! each lamp was lit, scripts serial input, and captures the status channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use trafficlight::app::ports::{CharSource, GpioPort, StatusSink};
use trafficlight::error::HwError;

// ── GPIO ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    pub at: Instant,
    pub pin: i32,
    pub high: bool,
}

#[derive(Default)]
struct GpioLog {
    configured: Vec<i32>,
    events: Vec<PinEvent>,
    inputs: Vec<(i32, bool)>,
}

/// GPIO that records every write. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingGpio {
    log: Arc<Mutex<GpioLog>>,
    write_delay: Duration,
}

#[allow(dead_code)]
impl RecordingGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `set_level` takes `delay` before it lands, like a slow
    /// expander on a shared bus.
    pub fn with_write_delay(delay: Duration) -> Self {
        Self {
            write_delay: delay,
            ..Self::default()
        }
    }

    pub fn configured(&self) -> Vec<i32> {
        self.log.lock().unwrap().configured.clone()
    }

    pub fn events(&self) -> Vec<PinEvent> {
        self.log.lock().unwrap().events.clone()
    }

    /// Current level of an output.
    pub fn level(&self, pin: i32) -> bool {
        self.log
            .lock()
            .unwrap()
            .events
            .iter()
            .rev()
            .find(|e| e.pin == pin)
            .is_some_and(|e| e.high)
    }

    /// Set what an input pin reads.
    pub fn set_input(&self, pin: i32, high: bool) {
        let mut log = self.log.lock().unwrap();
        log.inputs.retain(|(p, _)| *p != pin);
        log.inputs.push((pin, high));
    }

    /// Closed intervals during which `pin` was HIGH. An interval still
    /// open is closed at `Instant::now()`.
    pub fn high_intervals(&self, pin: i32) -> Vec<(Instant, Instant)> {
        let mut intervals = Vec::new();
        let mut since: Option<Instant> = None;
        for e in self.events().into_iter().filter(|e| e.pin == pin) {
            match (e.high, since) {
                (true, None) => since = Some(e.at),
                (false, Some(start)) => {
                    intervals.push((start, e.at));
                    since = None;
                }
                _ => {}
            }
        }
        if let Some(start) = since {
            intervals.push((start, Instant::now()));
        }
        intervals
    }

    /// True if `a` and `b` were ever HIGH at the same time.
    pub fn ever_overlapped(&self, a: i32, b: i32) -> bool {
        let xs = self.high_intervals(a);
        let ys = self.high_intervals(b);
        xs.iter()
            .any(|&(s1, e1)| ys.iter().any(|&(s2, e2)| s1 < e2 && s2 < e1))
    }
}

impl GpioPort for RecordingGpio {
    fn configure_output(&mut self, pin: i32) -> Result<(), HwError> {
        self.log.lock().unwrap().configured.push(pin);
        Ok(())
    }

    fn set_level(&mut self, pin: i32, high: bool) {
        if !self.write_delay.is_zero() {
            std::thread::sleep(self.write_delay);
        }
        self.log.lock().unwrap().events.push(PinEvent {
            at: Instant::now(),
            pin,
            high,
        });
    }

    fn read_level(&mut self, pin: i32) -> bool {
        self.log
            .lock()
            .unwrap()
            .inputs
            .iter()
            .find(|(p, _)| *p == pin)
            .is_some_and(|(_, high)| *high)
    }
}

// ── Serial input ──────────────────────────────────────────────

/// Character source fed by the test. Clones share the buffer.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    pending: Arc<Mutex<VecDeque<char>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&self, text: &str) {
        self.pending.lock().unwrap().extend(text.chars());
    }
}

impl CharSource for ScriptedSource {
    fn try_read_char(&mut self) -> Option<char> {
        self.pending.lock().unwrap().pop_front()
    }
}

// ── Status channel ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.starts_with(prefix))
            .count()
    }
}

impl StatusSink for RecordingSink {
    fn emit(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Poll `cond` every few milliseconds until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
