use quoha_derive::Error;

/// Why a run stopped abnormally.
///
/// Every variant is reported through a [`VmPanic`](super::diagnostics::VmPanic) record;
/// none of them terminates the host process.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Error)]
pub enum PanicKind {
    /// Push past the end of the data stack region.
    #[error("data stack overflow")]
    DataStackOverflow,
    /// Pop from an empty data stack.
    #[error("data stack underflow")]
    DataStackUnderflow,
    /// Push past the end of the return stack region.
    #[error("return stack overflow")]
    ReturnStackOverflow,
    /// Pop from an empty return stack.
    #[error("return stack underflow")]
    ReturnStackUnderflow,
    /// Fetch at or past the end of the core.
    #[error("instruction pointer out of bounds")]
    OutOfBoundsProgramCounter,
    /// The fetched cell is a plain operand (`DATA`), not an instruction.
    #[error("invalid instruction contents: points to data")]
    InvalidInstructionContents,
    /// The instruction's own kind does not match its addressing mode.
    #[error("invalid operand kind for instruction")]
    InvalidOperandKind,
    /// A control transfer names a cell outside the core.
    #[error("invalid jump target")]
    InvalidJumpTarget,
    /// Opcode missing from the dispatch table. The exhaustive match on
    /// [`Op`](super::isa::Op) keeps this out of reach of the dispatch loop.
    #[error("unhandled opcode")]
    UnhandledOpcode,
    /// A `PANIC` instruction executed.
    #[error("explicit panic")]
    ExplicitPanic,
    /// The tick budget ran out.
    #[error("timer expired")]
    WatchdogExpired,
}

/// Errors returned by the host-facing API, outside of a run.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum VmError {
    /// A core index past the end of the core.
    #[error("core index {index} out of range for a core of {capacity} cells")]
    OutOfRange { index: usize, capacity: usize },
    /// The requested regions do not fit in the address space.
    #[error("arena of {core} + {data} + {ret} cells overflows usize")]
    CapacityOverflow { core: usize, data: usize, ret: usize },
    /// A stack operation requested directly by the host failed.
    #[error("stack operation failed: {0}")]
    Stack(PanicKind),
}

impl From<PanicKind> for VmError {
    fn from(kind: PanicKind) -> Self {
        VmError::Stack(kind)
    }
}
