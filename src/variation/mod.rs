//! Variation extraction.
//!
//! Walks the alignment produced by the similarity engine and enumerates the
//! positional differences between two otherwise-similar sequences. Matched
//! statements are compared slot by slot; aligned-but-different statements
//! either surface a control-flow variation or flag a structural mismatch;
//! gaps LCS could not bridge always flag a structural mismatch, because an
//! inserted or deleted statement is not parameterizable.

pub mod type_compat;

use serde::{Deserialize, Serialize};

use crate::core::{OperandKind, StatementSequence};
use crate::similarity::align::{AlignOp, Alignment};

/// Kind of a positional difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationKind {
    /// Both sides are constant expressions.
    Literal,
    /// Both sides are simple names or field accesses (also the fallback
    /// when the two slots disagree on kind).
    Identifier,
    /// The aligned statements differ in control-construct kind.
    ControlFlow,
    /// Both sides are type references.
    Type,
}

/// A typed difference at aligned positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub kind: VariationKind,
    /// Statement index in the first sequence.
    pub index_a: usize,
    /// Statement index in the second sequence.
    pub index_b: usize,
    /// Differing fragment from the first sequence.
    pub text_a: String,
    /// Differing fragment from the second sequence.
    pub text_b: String,
    /// Lexically inferred type, when both sides agree on one.
    pub inferred_type: Option<String>,
}

/// All variations between one pair of sequences, in positional order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationAnalysis {
    pub variations: Vec<Variation>,
    /// True when positions could not be aligned at all (or aligned
    /// statements disagree beyond their slots). Not parameterizable;
    /// depresses scores and therefore confidence downstream.
    pub structural_mismatch: bool,
}

impl VariationAnalysis {
    /// Whether the pair differs at all.
    pub fn is_empty(&self) -> bool {
        self.variations.is_empty() && !self.structural_mismatch
    }

    /// Whether any variation is a control-flow difference.
    pub fn has_control_flow(&self) -> bool {
        self.variations
            .iter()
            .any(|v| v.kind == VariationKind::ControlFlow)
    }
}

/// Enumerate the variations between two sequences, reusing the alignment
/// computed by the similarity engine.
pub fn extract(
    a: &StatementSequence,
    b: &StatementSequence,
    alignment: &Alignment,
) -> VariationAnalysis {
    let mut analysis = VariationAnalysis::default();

    for op in &alignment.ops {
        match *op {
            AlignOp::Match(i, j) => {
                let sa = &a.statements[i];
                let sb = &b.statements[j];
                if sa.operands.len() != sb.operands.len() {
                    analysis.structural_mismatch = true;
                }
                for (oa, ob) in sa.operands.iter().zip(sb.operands.iter()) {
                    if oa.text == ob.text {
                        continue;
                    }
                    let kind = classify(oa.kind, ob.kind);
                    let inferred_type = if kind == VariationKind::Literal {
                        match (
                            type_compat::infer_literal(&oa.text),
                            type_compat::infer_literal(&ob.text),
                        ) {
                            (Some(ta), Some(tb)) if ta == tb => Some(ta.to_string()),
                            _ => None,
                        }
                    } else {
                        None
                    };
                    analysis.variations.push(Variation {
                        kind,
                        index_a: i,
                        index_b: j,
                        text_a: oa.text.clone(),
                        text_b: ob.text.clone(),
                        inferred_type,
                    });
                }
            }
            AlignOp::Pair(i, j) => {
                let sa = &a.statements[i];
                let sb = &b.statements[j];
                let ca = sa.shape.control_flow;
                let cb = sb.shape.control_flow;
                if (ca.is_some() || cb.is_some()) && ca != cb {
                    analysis.variations.push(Variation {
                        kind: VariationKind::ControlFlow,
                        index_a: i,
                        index_b: j,
                        text_a: sa.text.clone(),
                        text_b: sb.text.clone(),
                        inferred_type: None,
                    });
                } else {
                    // Same-length runs of differing non-control statements:
                    // a shape disagreement the slots cannot express.
                    analysis.structural_mismatch = true;
                }
            }
            AlignOp::GapA(_) | AlignOp::GapB(_) => {
                analysis.structural_mismatch = true;
            }
        }
    }

    analysis
}

fn classify(a: OperandKind, b: OperandKind) -> VariationKind {
    match (a, b) {
        (OperandKind::Literal, OperandKind::Literal) => VariationKind::Literal,
        (OperandKind::TypeRef, OperandKind::TypeRef) => VariationKind::Type,
        _ => VariationKind::Identifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ControlFlowKind, Operand, ShapeToken, SourceRange, Statement};
    use crate::similarity::align;

    fn window(start: u32, statements: Vec<Statement>) -> StatementSequence {
        let end = start + statements.len() as u32 - 1;
        StatementSequence::new("a.src", SourceRange::new(start, 1, end, 80), statements)
    }

    fn assign(target: &str, value: &str) -> Statement {
        Statement::new(
            ShapeToken::new("assign", "assign:expr"),
            format!("{target} = {value};"),
        )
        .with_operands(vec![Operand::identifier(target), Operand::literal(value)])
    }

    #[test]
    fn test_literal_variation() {
        let a = window(10, vec![assign("total", "10"), assign("total", "20")]);
        let b = window(50, vec![assign("total", "10"), assign("total", "30")]);
        let alignment = align(&a.statements, &b.statements);
        let analysis = extract(&a, &b, &alignment);
        assert_eq!(analysis.variations.len(), 1);
        let v = &analysis.variations[0];
        assert_eq!(v.kind, VariationKind::Literal);
        assert_eq!(v.index_a, 1);
        assert_eq!(v.text_a, "20");
        assert_eq!(v.text_b, "30");
        assert_eq!(v.inferred_type.as_deref(), Some("int"));
        assert!(!analysis.structural_mismatch);
    }

    #[test]
    fn test_identifier_variation() {
        let a = window(10, vec![assign("total", "0"), assign("count", "0")]);
        let b = window(50, vec![assign("total", "0"), assign("limit", "0")]);
        let alignment = align(&a.statements, &b.statements);
        let analysis = extract(&a, &b, &alignment);
        assert_eq!(analysis.variations.len(), 1);
        assert_eq!(analysis.variations[0].kind, VariationKind::Identifier);
    }

    #[test]
    fn test_mixed_slot_kinds_fall_back_to_identifier() {
        let a = window(
            10,
            vec![Statement::new(ShapeToken::new("call:max/1", "call:max/1"), "max(n);")
                .with_operands(vec![Operand::identifier("n")])],
        );
        let b = window(
            50,
            vec![Statement::new(ShapeToken::new("call:max/1", "call:max/1"), "max(10);")
                .with_operands(vec![Operand::literal("10")])],
        );
        let alignment = align(&a.statements, &b.statements);
        let analysis = extract(&a, &b, &alignment);
        assert_eq!(analysis.variations[0].kind, VariationKind::Identifier);
        assert!(analysis.variations[0].inferred_type.is_none());
    }

    #[test]
    fn test_type_variation() {
        let decl = |ty: &str| {
            Statement::new(ShapeToken::new("decl", "decl"), format!("{ty} item;"))
                .with_operands(vec![Operand::type_ref(ty)])
        };
        let a = window(10, vec![decl("Invoice"), assign("total", "0")]);
        let b = window(50, vec![decl("Receipt"), assign("total", "0")]);
        let alignment = align(&a.statements, &b.statements);
        let analysis = extract(&a, &b, &alignment);
        assert_eq!(analysis.variations[0].kind, VariationKind::Type);
    }

    #[test]
    fn test_control_flow_variation() {
        let branch = |kind: &str, cf: ControlFlowKind| {
            Statement::new(
                ShapeToken::new(kind, kind).with_control_flow(cf),
                format!("{kind} (ready) {{ ... }}"),
            )
        };
        let a = window(
            10,
            vec![assign("total", "0"), branch("if", ControlFlowKind::If)],
        );
        let b = window(
            50,
            vec![assign("total", "0"), branch("while", ControlFlowKind::While)],
        );
        let alignment = align(&a.statements, &b.statements);
        let analysis = extract(&a, &b, &alignment);
        assert!(analysis.has_control_flow());
        assert!(!analysis.structural_mismatch);
    }

    #[test]
    fn test_gaps_flag_structural_mismatch() {
        let a = window(
            10,
            vec![assign("total", "0"), assign("count", "0"), assign("sum", "0")],
        );
        let b = window(50, vec![assign("total", "0")]);
        let alignment = align(&a.statements, &b.statements);
        let analysis = extract(&a, &b, &alignment);
        assert!(analysis.structural_mismatch);
    }

    #[test]
    fn test_operand_arity_disagreement() {
        let a = window(
            10,
            vec![Statement::new(ShapeToken::new("call:put/2", "call:put/2"), "put(k, v);")
                .with_operands(vec![Operand::identifier("k"), Operand::identifier("v")])],
        );
        let b = window(
            50,
            vec![Statement::new(ShapeToken::new("call:put/2", "call:put/2"), "put(k);")
                .with_operands(vec![Operand::identifier("k")])],
        );
        let alignment = align(&a.statements, &b.statements);
        let analysis = extract(&a, &b, &alignment);
        assert!(analysis.structural_mismatch);
        assert!(analysis.variations.is_empty());
    }

    #[test]
    fn test_no_differences_is_empty() {
        let a = window(10, vec![assign("total", "0")]);
        let b = window(50, vec![assign("total", "0")]);
        let alignment = align(&a.statements, &b.statements);
        let analysis = extract(&a, &b, &alignment);
        assert!(analysis.is_empty());
    }
}
