//! Traffic-light controller firmware library.
//!
//! Exposes the controller pipeline for integration testing and host
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod pins;
