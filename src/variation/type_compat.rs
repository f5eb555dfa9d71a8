//! Type compatibility analysis.
//!
//! Decides whether the variations between two aligned sequences can become
//! safe method parameters. Literal slots are typed from their lexical
//! shape; identifier and type slots resolve through caller-supplied hints.
//! Nothing here hard-fails: an unresolvable type degrades to the universal
//! type with a warning. The one categorical verdict is control flow — a
//! single control-flow variation makes the pair unsafe no matter how high
//! its similarity scores are.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{VariationAnalysis, VariationKind};

/// Fallback type when unification fails.
pub const UNIVERSAL_TYPE: &str = "object";

/// Caller-supplied mapping from identifier/type names to declared types.
#[derive(Debug, Clone, Default)]
pub struct TypeHints {
    declared: HashMap<String, String>,
}

impl TypeHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the declared type of a name.
    pub fn with(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.declared.insert(name.into(), ty.into());
        self
    }

    /// Look up the declared type of a name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.declared.get(name).map(String::as_str)
    }
}

/// Verdict on whether a pair's variations unify to safe parameter types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeCompatibility {
    /// True when every variation unified without a categorical conflict.
    pub all_type_safe: bool,
    /// Variation slot index → unified parameter type.
    pub parameter_types: BTreeMap<usize, String>,
    /// Non-fatal unification notes.
    pub warnings: Vec<String>,
    /// Conflicts that cannot be parameterized away.
    pub incompatibilities: Vec<String>,
}

/// Analyze one pair's variations. Operates pairwise; cluster-wide slot
/// agreement is a later stage's concern.
pub fn analyze(analysis: &VariationAnalysis, hints: &TypeHints) -> TypeCompatibility {
    let mut result = TypeCompatibility {
        all_type_safe: true,
        ..TypeCompatibility::default()
    };

    for (slot, variation) in analysis.variations.iter().enumerate() {
        match variation.kind {
            VariationKind::ControlFlow => {
                result.all_type_safe = false;
                result.warnings.push(format!(
                    "Control flow differs at statement {}: `{}` vs `{}`",
                    variation.index_a, variation.text_a, variation.text_b
                ));
                result.incompatibilities.push(format!(
                    "control-flow construct mismatch at statement {}",
                    variation.index_a
                ));
            }
            VariationKind::Literal => {
                let ta = infer_literal(&variation.text_a);
                let tb = infer_literal(&variation.text_b);
                let unified = match (ta, tb) {
                    (Some(ta), Some(tb)) if ta == tb => ta.to_string(),
                    _ => {
                        result.warnings.push(format!(
                            "literal types diverge for `{}` vs `{}`; widening to {}",
                            variation.text_a, variation.text_b, UNIVERSAL_TYPE
                        ));
                        UNIVERSAL_TYPE.to_string()
                    }
                };
                result.parameter_types.insert(slot, unified);
            }
            VariationKind::Identifier | VariationKind::Type => {
                let ta = hints.resolve(&variation.text_a);
                let tb = hints.resolve(&variation.text_b);
                let unified = match (ta, tb) {
                    (Some(ta), Some(tb)) if ta == tb => ta.to_string(),
                    _ => {
                        result.warnings.push(format!(
                            "unresolved type for `{}` vs `{}`; widening to {}",
                            variation.text_a, variation.text_b, UNIVERSAL_TYPE
                        ));
                        UNIVERSAL_TYPE.to_string()
                    }
                };
                result.parameter_types.insert(slot, unified);
            }
        }
    }

    result
}

/// Infer a primitive/string type from the lexical shape of a literal.
pub fn infer_literal(text: &str) -> Option<&'static str> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if (text.starts_with('"') && text.ends_with('"') && text.len() >= 2)
        || (text.starts_with('\'') && text.ends_with('\'') && text.len() >= 2)
    {
        return Some("string");
    }
    if text == "true" || text == "false" {
        return Some("boolean");
    }
    if text.parse::<i64>().is_ok() {
        return Some("int");
    }
    if text.parse::<f64>().is_ok() {
        return Some("float");
    }
    None
}
