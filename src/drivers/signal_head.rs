//! Three-output signal head.
//!
//! Maps a [`Color`] to the outputs that show it:
//!
//! | Aspect | Red | Green | Blue |
//! |--------|-----|-------|------|
//! | Red    | on  | off   | off  |
//! | Yellow | on  | on    | off  |
//! | Green  | off | on    | off  |
//!
//! The head is shared by every actuator task. It also counts how many
//! aspects are lit at once; more than one means the single-flight protocol
//! was broken somewhere upstream, and is logged as an error.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use log::{error, info};

use crate::app::ports::GpioPort;
use crate::command::Color;
use crate::error::HwError;
use crate::pins;

/// Outputs lit for `color`.
pub const fn aspect_pins(color: Color) -> &'static [i32] {
    match color {
        Color::Red => &[pins::RED_GPIO],
        Color::Yellow => &[pins::RED_GPIO, pins::GREEN_GPIO],
        Color::Green => &[pins::GREEN_GPIO],
    }
}

pub struct SignalHead<G: GpioPort> {
    gpio: Mutex<G>,
    active: AtomicUsize,
    peak: AtomicUsize,
    overlaps: AtomicUsize,
}

impl<G: GpioPort> SignalHead<G> {
    pub fn new(gpio: G) -> Self {
        Self {
            gpio: Mutex::new(gpio),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            overlaps: AtomicUsize::new(0),
        }
    }

    /// Configure every output and drive it LOW. Any failure is fatal to
    /// the caller.
    pub fn bring_up(&self) -> Result<(), HwError> {
        let mut gpio = self.gpio.lock().unwrap_or_else(PoisonError::into_inner);
        for pin in pins::OUTPUTS {
            gpio.configure_output(pin).inspect_err(|e| {
                error!("Signal head: GPIO{} bring-up failed: {}", pin, e);
            })?;
        }
        for pin in pins::OUTPUTS {
            gpio.set_level(pin, false);
        }
        info!("Signal head: outputs {:?} ready", pins::OUTPUTS);
        Ok(())
    }

    /// Light `color`.
    pub fn activate(&self, color: Color) {
        let now = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        if now > 1 {
            self.overlaps.fetch_add(1, Ordering::Relaxed);
            error!("Signal head: {} lit while {} aspect(s) already on", color.name(), now - 1);
        }

        let mut gpio = self.gpio.lock().unwrap_or_else(PoisonError::into_inner);
        for &pin in aspect_pins(color) {
            gpio.set_level(pin, true);
        }
    }

    /// Turn `color` off again.
    pub fn deactivate(&self, color: Color) {
        {
            let mut gpio = self.gpio.lock().unwrap_or_else(PoisonError::into_inner);
            for &pin in aspect_pins(color) {
                gpio.set_level(pin, false);
            }
        }
        // Saturate: a stray deactivate must not wrap the counter.
        let _ = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// Sample an input pin through the same GPIO port.
    pub fn read_input(&self, pin: i32) -> bool {
        self.gpio
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_level(pin)
    }

    /// Highest number of aspects ever lit at the same time.
    pub fn peak_active(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Number of activations that found another aspect already lit.
    pub fn overlap_count(&self) -> usize {
        self.overlaps.load(Ordering::Relaxed)
    }

    pub fn is_idle(&self) -> bool {
        self.active.load(Ordering::Acquire) == 0
    }
}
