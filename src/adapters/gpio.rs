//! GPIO adapters.
//!
//! [`HalGpio`] bridges any `embedded-hal` 1.0 pins (on ESP-IDF:
//! `PinDriver`s built in `main`) to the [`GpioPort`] trait, addressing
//! them by GPIO number. [`SimGpio`] is an in-memory stand-in for host
//! simulation and tests.

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::app::ports::GpioPort;
use crate::error::HwError;

const MAX_OUTPUTS: usize = 4;
const MAX_INPUTS: usize = 2;

/// Output/input pins keyed by GPIO number.
pub struct HalGpio<O, I> {
    outputs: heapless::Vec<(i32, O), MAX_OUTPUTS>,
    inputs: heapless::Vec<(i32, I), MAX_INPUTS>,
    /// Last level written per output, read back by `read_level`.
    shadow: u64,
}

impl<O: OutputPin, I: InputPin> Default for HalGpio<O, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: OutputPin, I: InputPin> HalGpio<O, I> {
    pub fn new() -> Self {
        Self {
            outputs: heapless::Vec::new(),
            inputs: heapless::Vec::new(),
            shadow: 0,
        }
    }

    /// Register an output pin under `gpio`. Hands the pin back if the
    /// table is full.
    pub fn with_output(mut self, gpio: i32, pin: O) -> Result<Self, O> {
        self.outputs.push((gpio, pin)).map_err(|(_, pin)| pin)?;
        Ok(self)
    }

    /// Register an input pin under `gpio`.
    pub fn with_input(mut self, gpio: i32, pin: I) -> Result<Self, I> {
        self.inputs.push((gpio, pin)).map_err(|(_, pin)| pin)?;
        Ok(self)
    }

    fn output(&mut self, gpio: i32) -> Option<&mut O> {
        self.outputs
            .iter_mut()
            .find(|(n, _)| *n == gpio)
            .map(|(_, p)| p)
    }

    fn remember(&mut self, gpio: i32, high: bool) {
        if let Some(bit) = shadow_bit(gpio) {
            if high {
                self.shadow |= bit;
            } else {
                self.shadow &= !bit;
            }
        }
    }
}

fn shadow_bit(gpio: i32) -> Option<u64> {
    u32::try_from(gpio).ok().filter(|&n| n < 64).map(|n| 1u64 << n)
}

impl<O, I> GpioPort for HalGpio<O, I>
where
    O: OutputPin + Send,
    I: InputPin + Send,
{
    fn configure_output(&mut self, pin: i32) -> Result<(), HwError> {
        let out = self.output(pin).ok_or(HwError::NotReady)?;
        out.set_low().map_err(|_| HwError::ConfigureFailed)?;
        self.remember(pin, false);
        Ok(())
    }

    fn set_level(&mut self, pin: i32, high: bool) {
        let Some(out) = self.output(pin) else {
            warn!("GPIO{}: not an output", pin);
            return;
        };
        let result = if high { out.set_high() } else { out.set_low() };
        if result.is_err() {
            warn!("GPIO{}: write failed", pin);
            return;
        }
        self.remember(pin, high);
    }

    fn read_level(&mut self, pin: i32) -> bool {
        if let Some((_, input)) = self.inputs.iter_mut().find(|(n, _)| *n == pin) {
            return input.is_high().unwrap_or(false);
        }
        shadow_bit(pin).is_some_and(|bit| self.shadow & bit != 0)
    }
}

// ── In-memory simulation ──────────────────────────────────────

/// Simulated GPIO bank. Clones share state, so a test can keep a handle
/// while the controller owns the other one.
#[derive(Debug, Clone, Default)]
pub struct SimGpio {
    levels: Arc<AtomicU64>,
    configured: Arc<AtomicU64>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, pin: i32) -> bool {
        shadow_bit(pin).is_some_and(|bit| self.levels.load(Ordering::Acquire) & bit != 0)
    }

    /// Drive a pin from outside, e.g. a pressed button.
    pub fn drive(&self, pin: i32, high: bool) {
        if let Some(bit) = shadow_bit(pin) {
            if high {
                self.levels.fetch_or(bit, Ordering::AcqRel);
            } else {
                self.levels.fetch_and(!bit, Ordering::AcqRel);
            }
        }
    }

    pub fn is_configured(&self, pin: i32) -> bool {
        shadow_bit(pin).is_some_and(|bit| self.configured.load(Ordering::Acquire) & bit != 0)
    }
}

impl GpioPort for SimGpio {
    fn configure_output(&mut self, pin: i32) -> Result<(), HwError> {
        let bit = shadow_bit(pin).ok_or(HwError::NotReady)?;
        self.configured.fetch_or(bit, Ordering::AcqRel);
        self.drive(pin, false);
        Ok(())
    }

    fn set_level(&mut self, pin: i32, high: bool) {
        self.drive(pin, high);
    }

    fn read_level(&mut self, pin: i32) -> bool {
        self.level(pin)
    }
}
