//! Statement sequence model.
//!
//! A source front-end turns method bodies into sliding windows of
//! consecutive statements. Each statement arrives pre-abstracted: a shape
//! token capturing its kind and structure (literals and local identifier
//! names already stripped), the display text, and the literal/identifier
//! sub-expression slots that may later become extraction parameters.
//!
//! Everything here is passive data. Sequences are constructed once by the
//! front-end and never mutated; later pipeline stages derive new values.

use serde::{Deserialize, Serialize};

/// Source location of a sequence (1-based lines and columns, inclusive).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SourceRange {
    /// First line of the range.
    pub start_line: u32,
    /// Column on the first line.
    pub start_col: u32,
    /// Last line of the range.
    pub end_line: u32,
    /// Column on the last line.
    pub end_col: u32,
}

impl SourceRange {
    /// Create a new source range.
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Number of source lines covered by the range.
    pub fn line_span(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Whether the line intervals of two ranges intersect.
    pub fn intersects_lines(&self, other: &SourceRange) -> bool {
        self.start_line <= other.end_line && other.start_line <= self.end_line
    }
}

/// Control-flow construct kinds distinguished by the detector.
///
/// Two aligned statements with different kinds here disqualify a pair from
/// safe extraction regardless of how similar the rest of the window is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlFlowKind {
    If,
    IfElse,
    For,
    While,
    DoWhile,
    Switch,
    Try,
    Loop,
}

/// Abstraction of one statement's kind and structure.
///
/// `kind` carries the statement kind and immediate shape (`"if-else"`,
/// `"for"`, `"call:save/2"`) while discarding literal values and local
/// identifier names, so structurally identical but textually different code
/// aligns. `structure` is a finer-grained signature that includes nested
/// block shape; it only participates in the structural score.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeToken {
    /// Coarse statement kind used for alignment.
    pub kind: String,
    /// Fine-grained structural signature, including nested blocks.
    pub structure: String,
    /// Set when the statement is a control-flow construct.
    pub control_flow: Option<ControlFlowKind>,
}

impl ShapeToken {
    /// Create a shape token for a non-control-flow statement.
    pub fn new(kind: impl Into<String>, structure: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            structure: structure.into(),
            control_flow: None,
        }
    }

    /// Mark the token as a control-flow construct.
    pub fn with_control_flow(mut self, kind: ControlFlowKind) -> Self {
        self.control_flow = Some(kind);
        self
    }
}

/// Kind of a sub-expression slot within a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandKind {
    /// A constant expression.
    Literal,
    /// A simple name or field access.
    Identifier,
    /// A type reference.
    TypeRef,
}

/// One literal/identifier/type sub-expression slot of a statement.
///
/// Slots are the positions where two aligned statements may legitimately
/// differ and still be consolidated behind a method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operand {
    pub kind: OperandKind,
    pub text: String,
}

impl Operand {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            kind: OperandKind::Literal,
            text: text.into(),
        }
    }

    pub fn identifier(text: impl Into<String>) -> Self {
        Self {
            kind: OperandKind::Identifier,
            text: text.into(),
        }
    }

    pub fn type_ref(text: impl Into<String>) -> Self {
        Self {
            kind: OperandKind::TypeRef,
            text: text.into(),
        }
    }
}

/// A single statement: shape token, display text, and sub-expression slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Shape abstraction used for alignment and structural scoring.
    pub shape: ShapeToken,
    /// Display text as it appears in the source.
    pub text: String,
    /// Literal/identifier/type slots, in source order.
    pub operands: Vec<Operand>,
}

impl Statement {
    /// Create a statement with no operand slots.
    pub fn new(shape: ShapeToken, text: impl Into<String>) -> Self {
        Self {
            shape,
            text: text.into(),
            operands: Vec::new(),
        }
    }

    /// Attach operand slots.
    pub fn with_operands(mut self, operands: Vec<Operand>) -> Self {
        self.operands = operands;
        self
    }
}

/// Identity of a sequence: file plus source range.
///
/// Clustering unions sequences by this key rather than by object
/// reference, which keeps component construction index-based and
/// deterministic.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SequenceKey {
    pub file: String,
    pub range: SourceRange,
}

/// An ordered window of statements extracted from one method body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSequence {
    /// Source file identifier.
    pub file: String,
    /// Source range covered by the window.
    pub range: SourceRange,
    /// Containing-method identifier, when known.
    pub method: Option<String>,
    /// Containing-class identifier, when the front-end can supply one.
    pub class_name: Option<String>,
    /// The statements, in source order.
    pub statements: Vec<Statement>,
}

impl StatementSequence {
    /// Create a new sequence.
    pub fn new(
        file: impl Into<String>,
        range: SourceRange,
        statements: Vec<Statement>,
    ) -> Self {
        Self {
            file: file.into(),
            range,
            method: None,
            class_name: None,
            statements,
        }
    }

    /// Attach the containing-method identifier.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Attach the containing-class identifier.
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Identity used for clustering and deduplication.
    pub fn key(&self) -> SequenceKey {
        SequenceKey {
            file: self.file.clone(),
            range: self.range,
        }
    }

    /// Number of statements in the window.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the window holds no statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Class scope used by the recommender: the explicit class when the
    /// front-end supplied one, otherwise the file identity.
    pub fn class_scope(&self) -> &str {
        self.class_name.as_deref().unwrap_or(&self.file)
    }

    /// Whether two windows cover intersecting lines of the same file.
    ///
    /// Windows produced by one sliding pass over a method overlap by
    /// construction and must never be compared against each other.
    pub fn overlaps(&self, other: &StatementSequence) -> bool {
        self.file == other.file && self.range.intersects_lines(&other.range)
    }

    /// Validate basic well-formedness. Malformed sequences are skipped by
    /// the engine, never a run-level failure.
    pub fn check_well_formed(&self) -> std::result::Result<(), String> {
        if self.statements.is_empty() {
            return Err("empty statement list".to_string());
        }
        if self.range.end_line < self.range.start_line {
            return Err(format!(
                "inverted source range: lines {}..{}",
                self.range.start_line, self.range.end_line
            ));
        }
        Ok(())
    }
}
