//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ tasks (domain)
//! ```
//!
//! Board bring-up, pin muxing and device readiness live behind these
//! traits. The tasks in [`crate::app`] consume them via generics, so the
//! domain core never touches hardware directly.

use crate::command::Command;
use crate::error::{DispatchError, HwError};

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Digital pins addressed by number (see [`crate::pins`]).
pub trait GpioPort: Send {
    /// Configure `pin` as an output, driven LOW. Must succeed for every
    /// lamp output before any task starts.
    fn configure_output(&mut self, pin: i32) -> Result<(), HwError>;

    /// Drive an output HIGH (`true`) or LOW.
    fn set_level(&mut self, pin: i32, high: bool);

    /// Sample a pin. Inputs are configured by board bring-up. Takes
    /// `&mut self` because embedded-hal input reads do.
    fn read_level(&mut self, pin: i32) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Character source (driving adapter: serial → domain)
// ───────────────────────────────────────────────────────────────

/// Non-blocking, polled character input.
pub trait CharSource: Send {
    /// Next pending character, or `None` if nothing has arrived.
    fn try_read_char(&mut self) -> Option<char>;
}

// ───────────────────────────────────────────────────────────────
// Status sink (driven adapter: domain → console)
// ───────────────────────────────────────────────────────────────

/// Line-oriented status output. Shared between tasks, so `&self`.
pub trait StatusSink: Send + Sync {
    fn emit(&self, line: &str);
}

// ───────────────────────────────────────────────────────────────
// Actuation port (dispatcher → actuator tasks)
// ───────────────────────────────────────────────────────────────

/// Runs one command to completion.
///
/// Returning means the addressed light has been on for the requested
/// duration and is off again; the dispatcher relies on this to keep at
/// most one light active.
pub trait Actuation {
    fn actuate(&self, command: Command) -> Result<(), DispatchError>;
}

impl<T: Actuation + ?Sized> Actuation for std::sync::Arc<T> {
    fn actuate(&self, command: Command) -> Result<(), DispatchError> {
        (**self).actuate(command)
    }
}
