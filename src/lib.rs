//! Doppel - near-duplicate code detection and consolidation analysis.
//!
//! Doppel scores pairs of pre-parsed statement windows with three
//! complementary similarity metrics (LCS, Levenshtein, and a structural
//! comparison that ignores identifiers and literals), extracts the
//! positional variations between similar windows, decides whether those
//! variations unify to safe method parameters, clusters connected
//! duplicates, and recommends a consolidation strategy with a confidence
//! level per cluster.
//!
//! Parsing is somebody else's job: a source front-end supplies
//! [`core::StatementSequence`] windows carrying shape tokens, display
//! text, and operand slots. Doppel's pipeline is pure and in-memory from
//! there on.
//!
//! # Example
//!
//! ```
//! use doppel::config::DetectionConfig;
//! use doppel::core::{Operand, ShapeToken, SourceRange, Statement, StatementSequence};
//! use doppel::recommend::Strategy;
//! use doppel::Detector;
//!
//! let window = |start: u32, amount: &str| {
//!     let statements = vec![
//!         Statement::new(ShapeToken::new("assign", "assign:int"), format!("total = {amount};"))
//!             .with_operands(vec![Operand::identifier("total"), Operand::literal(amount)]),
//!         Statement::new(ShapeToken::new("call:save/1", "call:save/1"), "save(total);")
//!             .with_operands(vec![Operand::identifier("total")]),
//!         Statement::new(ShapeToken::new("return", "return"), "return total;"),
//!     ];
//!     StatementSequence::new("billing.src", SourceRange::new(start, 1, start + 2, 40), statements)
//!         .with_method("applyDiscount")
//! };
//!
//! let config = DetectionConfig {
//!     min_lines: 3,
//!     ..DetectionConfig::default()
//! };
//! let detector = Detector::new(config).unwrap();
//! let analysis = detector.analyze(&[window(10, "100"), window(50, "250")]).unwrap();
//!
//! let report = &analysis.reports[0];
//! assert!(report.has_duplicates());
//! let recommendation = report.clusters[0].recommendation.as_ref().unwrap();
//! assert_eq!(recommendation.strategy, Strategy::ExtractMethod);
//! ```

pub mod cluster;
pub mod config;
pub mod core;
pub mod engine;
pub mod recommend;
pub mod report;
pub mod similarity;
pub mod variation;

pub use config::DetectionConfig;
pub use core::{Error, Result};
pub use engine::Detector;
pub use report::{Analysis, DuplicationReport};
