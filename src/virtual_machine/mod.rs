//! Stack-based bytecode virtual machine.
//!
//! # Architecture
//!
//! - **Arena**: one contiguous buffer of [`cell::Cell`]s laid out as
//!   `[core | data stack | return stack]`, sentinel-filled at construction
//! - **Cells**: a tagged [`cell::Value`] plus the [`isa::Op`] it performs when fetched
//! - **Execution model**: fetch at the program counter, advance, dispatch on the op;
//!   jumps are absolute core indices, calls save resume addresses on the return stack
//! - **Watchdog**: every run is capped at a configurable number of ticks
//! - **Failures**: reported as [`diagnostics::VmPanic`] records, never process exits
//!
//! # Modules
//!
//! - [`cell`]: Cell, value, and kind definitions
//! - [`config`]: Region sizes, tick budget, and halt behaviour
//! - [`diagnostics`]: Panic records and sinks
//! - [`errors`]: Panic kinds and construction errors
//! - [`isa`]: Opcode table and operand modes
//! - [`vm`]: The dispatch loop and stack discipline

pub mod cell;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod vm;
