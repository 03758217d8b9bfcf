//! Quoha virtual machine library.
//!
//! Provides a small stack-based bytecode interpreter over a single cell arena,
//! with bounds-checked control flow, a tick watchdog, and structured panic reports.

pub mod utils;
pub mod virtual_machine;

pub use virtual_machine::cell::{Cell, Kind, Value};
pub use virtual_machine::config::{HaltMode, VmConfig};
pub use virtual_machine::diagnostics::{LogSink, NullSink, PanicSink, VmPanic};
pub use virtual_machine::errors::{PanicKind, VmError};
pub use virtual_machine::isa::Op;
pub use virtual_machine::vm::{Flow, RunResult, RunStats, Vm};
