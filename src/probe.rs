//! Point-in-time check of whether an edition's process is alive.

use crate::registry::EditionDescriptor;
use sysinfo::System;

/// Opaque process-lookup capability. Probing never fails: the process table
/// is inherently racy, so the answer is best-effort by construction.
pub trait ProcessProbe: Send + Sync {
    fn is_running(&self, edition: &EditionDescriptor) -> bool;
}

/// Probe backed by the OS process table. Each call takes a fresh snapshot;
/// a match on ANY of the edition's known executable names counts as running.
#[derive(Debug, Default)]
pub struct SystemProbe;

impl SystemProbe {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessProbe for SystemProbe {
    fn is_running(&self, edition: &EditionDescriptor) -> bool {
        let mut system = System::new();
        system.refresh_processes();
        // Entries whose metadata could not be read are simply absent from
        // the snapshot; sysinfo skips them rather than erroring the refresh.
        system
            .processes()
            .values()
            .any(|process| edition.matches_process(process.name()))
    }
}
