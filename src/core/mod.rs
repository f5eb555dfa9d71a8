//! Core types for duplicate analysis.

mod error;
mod sequence;

pub use error::{Error, Result};
pub use sequence::{
    ControlFlowKind, Operand, OperandKind, SequenceKey, ShapeToken, SourceRange, Statement,
    StatementSequence,
};
