//! Application-level orchestration.
//!
//! This module owns session lifecycle control (launch, cancel, single-flight)
//! and emits events for presentation layers. UI/CLI layers call into this
//! module to keep responsibilities separated.

mod controller;

pub use controller::{run_controller, ControllerDeps, UiCommand};
