//! Lamp driver, task spawning, and the task watchdog.

pub mod signal_head;
pub mod task_pin;
pub mod watchdog;
