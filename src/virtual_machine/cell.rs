//! The uniform cell shared by program code, stack operands, and saved return addresses.
//!
//! Every cell carries two independent tags: the [`Kind`] of its value (derived from
//! the [`Value`] variant, so the two can never disagree) and the [`Op`] it represents
//! when fetched by the program counter. Stack operands conventionally carry
//! [`Op::Data`].

use crate::virtual_machine::isa::Op;
use std::fmt;

/// Message stored in every freshly constructed core cell.
pub const CORE_SENTINEL_MESSAGE: &str = "a blast from the past!";

/// Payload of a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    /// Arena index of a specific cell; `None` is the null address.
    Address(Option<usize>),
    /// Signed integer.
    Integer(i64),
    /// No value.
    Null,
    /// Floating-point number.
    Number(f64),
    /// Absolute cell index measured from the start of the core.
    Offset(usize),
    /// Externally-owned, immutable text; `None` is the null text reference.
    Text(Option<&'static str>),
}

/// Discriminator naming which [`Value`] variant a cell holds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Kind {
    Address,
    Integer,
    Null,
    Number,
    Offset,
    Text,
}

impl Kind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Kind::Address => "ADDRESS",
            Kind::Integer => "INTEGER",
            Kind::Null => "NULL",
            Kind::Number => "NUMBER",
            Kind::Offset => "OFFSET",
            Kind::Text => "TEXT",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub const fn kind(&self) -> Kind {
        match self {
            Value::Address(_) => Kind::Address,
            Value::Integer(_) => Kind::Integer,
            Value::Null => Kind::Null,
            Value::Number(_) => Kind::Number,
            Value::Offset(_) => Kind::Offset,
            Value::Text(_) => Kind::Text,
        }
    }

    /// Truth value as seen by `JNZ`: non-null references and non-zero numerics.
    pub fn is_truthy(&self) -> bool {
        match *self {
            Value::Address(addr) => addr.is_some(),
            Value::Integer(i) => i != 0,
            Value::Null => false,
            Value::Number(n) => n != 0.0,
            Value::Offset(o) => o != 0,
            Value::Text(t) => t.is_some(),
        }
    }
}

/// A tagged value that doubles as an instruction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub value: Value,
    pub op: Op,
}

impl Cell {
    /// Fill value for every core cell: traps with a fixed message if ever executed.
    pub const CORE_SENTINEL: Cell = Cell {
        value: Value::Text(Some(CORE_SENTINEL_MESSAGE)),
        op: Op::Panic,
    };

    /// Fill value for every data and return stack cell.
    pub const STACK_SENTINEL: Cell = Cell {
        value: Value::Address(None),
        op: Op::Data,
    };

    pub const fn address(index: usize) -> Self {
        Self::data(Value::Address(Some(index)))
    }

    pub const fn integer(i: i64) -> Self {
        Self::data(Value::Integer(i))
    }

    pub const fn null() -> Self {
        Self::data(Value::Null)
    }

    pub const fn number(n: f64) -> Self {
        Self::data(Value::Number(n))
    }

    pub const fn offset(index: usize) -> Self {
        Self::data(Value::Offset(index))
    }

    pub const fn text(text: &'static str) -> Self {
        Self::data(Value::Text(Some(text)))
    }

    /// A plain operand cell tagged [`Op::Data`].
    pub const fn data(value: Value) -> Self {
        Self {
            value,
            op: Op::Data,
        }
    }

    /// An instruction with a null payload, for opcodes that take no operand.
    pub const fn instruction(op: Op) -> Self {
        Self {
            value: Value::Null,
            op,
        }
    }

    /// Retags this cell with `op`, keeping its value.
    pub const fn with_op(self, op: Op) -> Self {
        Self {
            value: self.value,
            op,
        }
    }

    pub const fn kind(&self) -> Kind {
        self.value.kind()
    }

    /// Returns the `(kind, op)` pair the dispatch loop decodes.
    pub const fn classify(&self) -> (Kind, Op) {
        (self.kind(), self.op)
    }

    /// The text payload, if this cell carries a non-null one.
    pub const fn message(&self) -> Option<&'static str> {
        match self.value {
            Value::Text(text) => text,
            _ => None,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.op.mnemonic())?;
        match self.value {
            Value::Address(Some(addr)) => write!(f, "@{addr}"),
            Value::Address(None) => f.write_str("@null"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Null => f.write_str("null"),
            Value::Number(n) => write!(f, "{n:?}"),
            Value::Offset(o) => write!(f, "+{o}"),
            Value::Text(Some(text)) => write!(f, "{text:?}"),
            Value::Text(None) => f.write_str("\"\"@null"),
        }
    }
}
