//! Application core: the controller pipeline.
//!
//! Everything here reaches hardware only through the **port traits** in
//! [`ports`], so the whole pipeline runs on the host against simulated
//! adapters.

pub mod actuator;
pub mod context;
pub mod controller;
pub mod cycle;
pub mod dispatcher;
pub mod input;
pub mod ports;
pub mod queue;
