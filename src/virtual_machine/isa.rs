//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_opcode!`](crate::for_each_opcode) macro holds the canonical opcode
//! table and hands it to a callback macro, so the opcode enum, its name table, and
//! the test-only ISA hash are all generated from one list.
//!
//! # Cell format
//!
//! There is no byte encoding: an instruction is a [`Cell`](super::cell::Cell) whose
//! `op` tag names the opcode and whose value is the operand. Each opcode declares
//! the addressing [`Mode`] its operand must have; the dispatch loop rejects a cell
//! whose kind does not match.

use crate::virtual_machine::cell::Kind;

/// Invokes a callback macro with the complete opcode list.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            /// Plain operand. Never a valid instruction.
            Data = 0x00, "DATA" => Never,
            /// GOSUB addr ; push the resume address, then PC = addr
            Gosub = 0x01, "GOSUB" => Address,
            /// HALT ; stop the dispatch loop (or advance, see `HaltMode`)
            Halt = 0x02, "HALT" => Any,
            /// JMP offset ; PC = core start + offset
            Jmp = 0x03, "JMP" => Offset,
            /// JNZ offset ; pop, branch as JMP when the popped value is truthy
            Jnz = 0x04, "JNZ" => Offset,
            /// NOOP ; advance only
            Noop = 0x05, "NOOP" => Any,
            /// PANIC [text] ; terminate, attaching the text payload as the message
            Panic = 0x06, "PANIC" => Any,
            /// RTRN ; PC = popped return address
            Rtrn = 0x07, "RTRN" => Any,
            /// YIELD ; advance only, reserved for a cooperative scheduler
            Yield = 0x08, "YIELD" => Any,
        }
    };
}

#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal => $mode:ident
        ),* $(,)?
    ) => {
        /// Opcode carried in every cell's `op` tag.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        #[repr(u8)]
        pub enum Op {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl Op {
            /// Number of opcodes.
            pub const COUNT: usize = [$( stringify!($name) ),*].len();

            /// Every opcode in discriminant order.
            pub const ALL: [Op; Self::COUNT] = [$( Op::$name ),*];

            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Op::$name => $mnemonic, )*
                }
            }

            /// Returns the addressing mode this opcode's operand must satisfy.
            pub const fn mode(&self) -> Mode {
                match self {
                    $( Op::$name => Mode::$mode, )*
                }
            }
        }
    };
}

/// Operand constraint an opcode places on the kind of its own cell.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Any kind; the payload is ignored or optional.
    Any,
    /// A direct arena index.
    Address,
    /// A core-relative cell index.
    Offset,
    /// The opcode is not executable.
    Never,
}

impl Mode {
    pub const fn accepts(&self, kind: Kind) -> bool {
        match self {
            Mode::Any => true,
            Mode::Address => matches!(kind, Kind::Address),
            Mode::Offset => matches!(kind, Kind::Offset),
            Mode::Never => false,
        }
    }
}

for_each_opcode!(define_opcodes);

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
