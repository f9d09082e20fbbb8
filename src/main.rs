//! Traffic Light Controller: Main Entry Point
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                   │
//! │                                                           │
//! │  HalGpio        UartConsole     LogStatusSink   Clock     │
//! │  (GpioPort)     (CharSource)    (StatusSink)              │
//! │                                                           │
//! │  ─────────────── Port Trait Boundary ───────────────      │
//! │                                                           │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │ Controller: Input · Dispatcher · Actuators · Diag   │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! │                                                           │
//! │  Idle loop: watchdog feed                                 │
//! └───────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use log::info;

use esp_idf_hal::gpio::{
    AnyIOPin, AnyInputPin, AnyOutputPin, Input, InputPin as _, Output, OutputPin as _, PinDriver,
};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;

use trafficlight::adapters::gpio::HalGpio;
use trafficlight::adapters::log_sink::LogStatusSink;
use trafficlight::adapters::time::MonotonicClock;
use trafficlight::adapters::uart_console::UartConsole;
use trafficlight::app::controller::Controller;
use trafficlight::config::ControllerConfig;
use trafficlight::drivers::watchdog::Watchdog;
use trafficlight::pins;

type OutPin = PinDriver<'static, AnyOutputPin, Output>;
type InPin = PinDriver<'static, AnyInputPin, Input>;

/// Idle loop period; well inside the watchdog timeout.
const IDLE_SLEEP: Duration = Duration::from_millis(1000);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    let clock = MonotonicClock::new();
    info!("Traffic Light Controller v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Board bring-up ─────────────────────────────────────
    let p = Peripherals::take()?;

    let red: OutPin = PinDriver::output(p.pins.gpio11.downgrade_output())?;
    let green: OutPin = PinDriver::output(p.pins.gpio12.downgrade_output())?;
    let blue: OutPin = PinDriver::output(p.pins.gpio13.downgrade_output())?;
    let pause: InPin = PinDriver::input(p.pins.gpio16.downgrade_input())?;

    let gpio = HalGpio::new()
        .with_output(pins::RED_GPIO, red)
        .and_then(|g| g.with_output(pins::GREEN_GPIO, green))
        .and_then(|g| g.with_output(pins::BLUE_GPIO, blue))
        .map_err(|_| anyhow!("output pin table full"))?
        .with_input(pins::PAUSE_GPIO, pause)
        .map_err(|_| anyhow!("input pin table full"))?;

    let uart = UartDriver::new(
        p.uart1,
        p.pins.gpio17,
        p.pins.gpio18,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(pins::UART_BAUD)),
    )?;

    // ── 3. Start the pipeline ─────────────────────────────────
    let config = ControllerConfig::default();
    let controller = Controller::start(
        config,
        gpio,
        UartConsole::new(uart),
        Arc::new(LogStatusSink::new()),
        clock,
    )?;
    info!("Controller running in {:?} mode", controller.mode());

    // ── 4. Idle ───────────────────────────────────────────────
    let watchdog = Watchdog::new();
    loop {
        watchdog.feed();
        std::thread::sleep(IDLE_SLEEP);
    }
}
