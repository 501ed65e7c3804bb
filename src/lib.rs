//! Kiosk-style Forza launcher.
//!
//! Starts an edition through its store URI, waits (bounded) for the game
//! process to appear, suspends the desktop shell, monitors the game until it
//! exits, and restores the shell. The lifecycle state machine lives in
//! [`session`]; [`orchestrator`] enforces the one-session-at-a-time rule and
//! bridges the CLI over command/event channels.

pub mod cli;
pub mod launcher;
pub mod model;
pub mod orchestrator;
pub mod probe;
pub mod registry;
pub mod session;
pub mod shell;
