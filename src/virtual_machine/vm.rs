//! Core virtual machine implementation.
//!
//! The VM executes cells from the core of a single arena, using a data stack for
//! operands and a return stack for `GOSUB`/`RTRN`. Every control transfer is bounds
//! checked and every run is capped by a tick watchdog. Failures never unwind or
//! exit: they come back as a [`VmPanic`] record, which is also handed to the
//! caller's [`PanicSink`].

mod arena;
mod stack;
mod ticks;


pub use ticks::{DEFAULT_TICK_BUDGET, TickProfile};

use crate::virtual_machine::cell::{Cell, Value};
use crate::virtual_machine::config::{HaltMode, VmConfig};
use crate::virtual_machine::diagnostics::{PanicSink, VmPanic};
use crate::virtual_machine::errors::{PanicKind, VmError};
use crate::virtual_machine::isa::{Mode, Op};
use arena::Arena;
use stack::Stack;
use std::ops::Range;
use ticks::Watchdog;

/// Summary of a run that ended with `HALT`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunStats {
    /// Dispatch cycles consumed, including the `HALT` itself.
    pub ticks: u64,
    /// Core-relative index of the `HALT` that ended the run.
    pub halted_at: usize,
    /// Per-opcode cycle counts.
    pub profile: TickProfile,
}

/// Outcome of [`Vm::run`].
pub type RunResult = Result<RunStats, VmPanic>;

/// What the dispatch loop does after a successful cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    /// Keep dispatching from the program counter.
    Continue,
    /// A `HALT` ended the run.
    Halt,
}

/// Stack-based bytecode virtual machine over a single cell arena.
pub struct Vm {
    /// Core, data stack, and return stack.
    arena: Arena,
    /// Arena index the next fetch reads.
    program_counter: usize,
    /// Arena index of the most recently fetched cell.
    instruction_pointer: usize,
    data: Stack,
    returns: Stack,
    watchdog: Watchdog,
    halt_mode: HaltMode,
    profile: TickProfile,
}

impl Vm {
    /// Allocates the arena described by `config` and sentinel-fills it.
    ///
    /// Both cursors start at the first core cell and the tick counter at zero.
    pub fn new(config: VmConfig) -> Result<Self, VmError> {
        let arena = Arena::new(
            config.core_capacity,
            config.data_capacity,
            config.return_capacity,
        )?;
        let core_start = arena.core().start;
        let data = Stack::data(arena.data());
        let returns = Stack::ret(arena.ret());

        Ok(Self {
            arena,
            program_counter: core_start,
            instruction_pointer: core_start,
            data,
            returns,
            watchdog: Watchdog::new(config.tick_budget),
            halt_mode: config.halt_mode,
            profile: TickProfile::new(),
        })
    }

    /// Shorthand for [`Vm::new`] with explicit cell capacities and default settings.
    pub fn with_capacities(core: usize, data: usize, ret: usize) -> Result<Self, VmError> {
        Self::new(VmConfig::new(core, data, ret))
    }

    // ==================== Layout ====================

    pub fn core_capacity(&self) -> usize {
        self.arena.core().len()
    }

    pub fn data_capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn return_capacity(&self) -> usize {
        self.returns.capacity()
    }

    /// Arena index ranges of the core, data stack, and return stack.
    pub fn regions(&self) -> (Range<usize>, Range<usize>, Range<usize>) {
        (self.arena.core(), self.arena.data(), self.arena.ret())
    }

    pub fn tick_budget(&self) -> u64 {
        self.watchdog.budget()
    }

    pub fn halt_mode(&self) -> HaltMode {
        self.halt_mode
    }

    // ==================== Core access ====================

    /// The program region.
    pub fn core(&self) -> &[Cell] {
        self.arena.core_cells()
    }

    /// The program region, for writing a program before `run`.
    pub fn core_mut(&mut self) -> &mut [Cell] {
        self.arena.core_cells_mut()
    }

    /// Writes `cell` at core index `index`.
    pub fn write_core(&mut self, index: usize, cell: Cell) -> Result<(), VmError> {
        let capacity = self.core_capacity();
        let slot = self
            .core_mut()
            .get_mut(index)
            .ok_or(VmError::OutOfRange { index, capacity })?;
        *slot = cell;
        Ok(())
    }

    /// Writes `program` starting at core index `origin`.
    ///
    /// Nothing is written if any cell would land outside the core.
    pub fn write_program(&mut self, origin: usize, program: &[Cell]) -> Result<(), VmError> {
        let capacity = self.core_capacity();
        let end = origin
            .checked_add(program.len())
            .filter(|end| *end <= capacity)
            .ok_or(VmError::OutOfRange {
                index: origin.saturating_add(program.len()).saturating_sub(1),
                capacity,
            })?;
        self.core_mut()[origin..end].copy_from_slice(program);
        Ok(())
    }

    // ==================== Cursors ====================

    /// Points the next fetch at core index `index`.
    pub fn set_program_counter(&mut self, index: usize) -> Result<(), VmError> {
        let core = self.arena.core();
        if index >= core.len() {
            return Err(VmError::OutOfRange {
                index,
                capacity: core.len(),
            });
        }
        self.program_counter = core.start + index;
        Ok(())
    }

    /// Core-relative index of the next fetch.
    pub fn program_counter(&self) -> usize {
        self.program_counter - self.arena.core().start
    }

    /// Core-relative index of the most recent fetch.
    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer - self.arena.core().start
    }

    /// Ticks consumed by the current or most recent run.
    pub fn tick(&self) -> u64 {
        self.watchdog.ticks()
    }

    /// Per-opcode counts for the current or most recent run.
    pub fn tick_profile(&self) -> &TickProfile {
        &self.profile
    }

    /// Arena index of the data stack's top cell, `None` when empty.
    pub fn data_top(&self) -> Option<usize> {
        self.data.top()
    }

    /// Arena index of the return stack's top cell, `None` when empty.
    pub fn return_top(&self) -> Option<usize> {
        self.returns.top()
    }

    pub fn data_depth(&self) -> usize {
        self.data.depth()
    }

    pub fn return_depth(&self) -> usize {
        self.returns.depth()
    }

    /// Live data stack cells, bottom first.
    pub fn data_stack(&self) -> &[Cell] {
        self.data.live(self.arena.cells())
    }

    /// Live return stack cells, bottom first.
    pub fn return_stack(&self) -> &[Cell] {
        self.returns.live(self.arena.cells())
    }

    // ==================== Stack discipline ====================

    /// Pushes `cell`, or a null operand when `None`.
    pub fn push_data(&mut self, cell: Option<Cell>) -> Result<(), VmError> {
        let cell = cell.unwrap_or_else(Cell::null);
        Ok(self.data.push(self.arena.cells_mut(), cell)?)
    }

    pub fn pop_data(&mut self) -> Result<Cell, VmError> {
        Ok(self.data.pop(self.arena.cells())?)
    }

    /// Saves `address` (an arena index) as a resume address.
    pub fn push_return(&mut self, address: usize) -> Result<(), VmError> {
        Ok(self
            .returns
            .push(self.arena.cells_mut(), Cell::address(address))?)
    }

    pub fn pop_return(&mut self) -> Result<Cell, VmError> {
        Ok(self.returns.pop(self.arena.cells())?)
    }

    /// Empties both stacks without touching their cells.
    pub fn clear_stacks(&mut self) {
        self.data.clear();
        self.returns.clear();
    }

    // ==================== Dispatch ====================

    /// Runs the dispatch loop until a halt or a panic.
    ///
    /// The tick counter and profile restart at zero on every call. On panic the
    /// record is reported to `sink` and returned.
    pub fn run<S: PanicSink>(&mut self, sink: &mut S) -> RunResult {
        self.watchdog.reset();
        self.profile = TickProfile::new();

        loop {
            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt) => {
                    return Ok(RunStats {
                        ticks: self.watchdog.ticks(),
                        halted_at: self.instruction_pointer(),
                        profile: self.profile.clone(),
                    });
                }
                Err(panic) => {
                    sink.report(&panic);
                    return Err(panic);
                }
            }
        }
    }

    /// Executes exactly one fetch-decode-execute cycle.
    pub fn step(&mut self) -> Result<Flow, VmPanic> {
        if !self.watchdog.tick() {
            return Err(self.fault_at(self.program_counter, PanicKind::WatchdogExpired));
        }

        self.instruction_pointer = self.program_counter;
        self.program_counter = self.program_counter.saturating_add(1);

        let Some(cell) = self.arena.fetch(self.instruction_pointer) else {
            return Err(self.fault_at(
                self.instruction_pointer,
                PanicKind::OutOfBoundsProgramCounter,
            ));
        };
        self.profile.record(cell.op);

        self.exec(cell).map_err(|kind| self.fault(cell, kind))
    }

    /// Executes a single decoded cell.
    fn exec(&mut self, cell: Cell) -> Result<Flow, PanicKind> {
        match cell.op.mode() {
            Mode::Never => return Err(PanicKind::InvalidInstructionContents),
            mode if !mode.accepts(cell.kind()) => return Err(PanicKind::InvalidOperandKind),
            _ => {}
        }

        match cell.op {
            Op::Data => Err(PanicKind::InvalidInstructionContents),
            Op::Noop | Op::Yield => Ok(Flow::Continue),
            Op::Halt => self.op_halt(),
            Op::Panic => Err(PanicKind::ExplicitPanic),
            Op::Jmp => self.op_jmp(cell.value),
            Op::Jnz => self.op_jnz(cell.value),
            Op::Gosub => self.op_gosub(cell.value),
            Op::Rtrn => self.op_rtrn(),
        }
    }

    fn op_halt(&mut self) -> Result<Flow, PanicKind> {
        Ok(match self.halt_mode {
            HaltMode::Stop => Flow::Halt,
            HaltMode::Advance => Flow::Continue,
        })
    }

    /// Targets past the core are caught by the next fetch.
    fn op_jmp(&mut self, target: Value) -> Result<Flow, PanicKind> {
        let Value::Offset(offset) = target else {
            return Err(PanicKind::InvalidOperandKind);
        };
        self.program_counter = self.arena.core().start.saturating_add(offset);
        Ok(Flow::Continue)
    }

    fn op_jnz(&mut self, target: Value) -> Result<Flow, PanicKind> {
        if !matches!(target, Value::Offset(_)) {
            return Err(PanicKind::InvalidOperandKind);
        }
        let condition = self.data.pop(self.arena.cells())?;
        if condition.value.is_truthy() {
            return self.op_jmp(target);
        }
        Ok(Flow::Continue)
    }

    fn op_gosub(&mut self, target: Value) -> Result<Flow, PanicKind> {
        let Value::Address(address) = target else {
            return Err(PanicKind::InvalidOperandKind);
        };
        let target = address
            .filter(|addr| self.arena.core().contains(addr))
            .ok_or(PanicKind::InvalidJumpTarget)?;
        let resume = Cell::address(self.program_counter);
        self.returns.push(self.arena.cells_mut(), resume)?;
        self.program_counter = target;
        Ok(Flow::Continue)
    }

    fn op_rtrn(&mut self) -> Result<Flow, PanicKind> {
        let saved = self.returns.pop(self.arena.cells())?;
        let resume = match saved.value {
            Value::Address(address) => address,
            _ => None,
        };
        self.program_counter = resume
            .filter(|addr| self.arena.core().contains(addr))
            .ok_or(PanicKind::InvalidJumpTarget)?;
        Ok(Flow::Continue)
    }

    /// Builds the record for a failure attributed to `cell` at the instruction pointer.
    fn fault(&self, cell: Cell, kind: PanicKind) -> VmPanic {
        VmPanic {
            kind,
            index: self.instruction_pointer(),
            op: Some(cell.op),
            cell_kind: Some(cell.kind()),
            message: cell.message(),
            tick: self.watchdog.ticks(),
        }
    }

    /// Builds the record for a failure at arena index `at`, decoding the cell there
    /// when it lies inside the core.
    fn fault_at(&self, at: usize, kind: PanicKind) -> VmPanic {
        let cell = self.arena.fetch(at);
        VmPanic {
            kind,
            index: at - self.arena.core().start,
            op: cell.map(|c| c.op),
            cell_kind: cell.map(|c| c.kind()),
            message: None,
            tick: self.watchdog.ticks(),
        }
    }
}
