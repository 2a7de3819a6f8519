//! # linksheet-formula
//!
//! Formula evaluator for linksheet.
//!
//! Formulas have the shape `=FUNC(range)` where `FUNC` is one of the
//! aggregates `SUM`, `MIN`, `MAX` or `AVG`. They are stored as raw text and
//! re-evaluated against the [`CellStore`](linksheet_core::CellStore) on every
//! read; nothing is cached.
//!
//! This crate provides:
//! - Formula parsing (text → [`FormulaExpr`])
//! - Evaluation by walking the row chains covered by the range
//! - A registry of the built-in aggregate functions
//!
//! ## Example
//!
//! ```rust
//! use linksheet_core::{CellStore, CellValue};
//! use linksheet_formula::{evaluate, FormulaValue};
//!
//! let mut store = CellStore::new();
//! store.set_cell(1, 1, 1.0).unwrap();
//! store.set_cell(2, 1, 2.0).unwrap();
//! store.set_cell(1, 2, 3.0).unwrap();
//! store.set_cell(2, 2, "").unwrap();
//!
//! let sum = CellValue::formula("=SUM(A1:B2)");
//! assert_eq!(evaluate(Some(&sum), &store).unwrap(), FormulaValue::Number(6.0));
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::FormulaExpr;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_expr, evaluate_formula, FormulaValue};
pub use parser::parse_formula;
