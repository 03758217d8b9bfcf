//! Structured panic records and the sinks that receive them.
//!
//! The dispatch loop never formats or prints a failure itself. It builds a
//! [`VmPanic`] and hands it to the [`PanicSink`] the caller passed to `run`, so
//! tests, binaries, and log pipelines each decide how to present it.

use crate::virtual_machine::cell::Kind;
use crate::virtual_machine::errors::PanicKind;
use crate::virtual_machine::isa::Op;
use std::fmt;

/// Everything known about a failed dispatch cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct VmPanic {
    pub kind: PanicKind,
    /// Core-relative index of the failing cell. For a fetch past the core this is
    /// the out-of-range index itself.
    pub index: usize,
    /// Opcode of the failing cell; `None` when no cell could be fetched.
    pub op: Option<Op>,
    /// Kind of the failing cell; `None` when no cell could be fetched.
    pub cell_kind: Option<Kind>,
    /// Text payload carried by the failing cell, if any.
    pub message: Option<&'static str>,
    /// Tick at which the failure happened.
    pub tick: u64,
}

impl VmPanic {
    /// Opcode mnemonic, or `"-"` when nothing was fetched.
    pub fn op_name(&self) -> &'static str {
        self.op.map_or("-", |op| op.mnemonic())
    }

    /// Kind name, or `"-"` when nothing was fetched.
    pub fn kind_name(&self) -> &'static str {
        self.cell_kind.map_or("-", |kind| kind.as_str())
    }
}

impl fmt::Display for VmPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "panic at cell {} ({} {}) tick {}: {}",
            self.index,
            self.op_name(),
            self.kind_name(),
            self.tick,
            self.kind
        )?;
        if let Some(message) = self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for VmPanic {}

/// Receiver for panic records produced during `run`.
pub trait PanicSink {
    fn report(&mut self, panic: &VmPanic);
}

/// Discards every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl PanicSink for NullSink {
    fn report(&mut self, _panic: &VmPanic) {}
}

/// Collects records in arrival order.
impl PanicSink for Vec<VmPanic> {
    fn report(&mut self, panic: &VmPanic) {
        self.push(panic.clone());
    }
}

/// Writes records through the crate logger.
///
/// A watchdog expiry is logged as a warning, everything else as an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl PanicSink for LogSink {
    fn report(&mut self, panic: &VmPanic) {
        match panic.kind {
            PanicKind::WatchdogExpired => crate::warn!("{}", panic),
            _ => crate::error!("{}", panic),
        }
    }
}

impl<S: PanicSink + ?Sized> PanicSink for &mut S {
    fn report(&mut self, panic: &VmPanic) {
        (**self).report(panic);
    }
}
