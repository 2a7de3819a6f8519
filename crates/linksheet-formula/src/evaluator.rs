//! Formula evaluator
//!
//! Resolves raw cell values: literals pass through, formula text is parsed
//! and its aggregate computed against the store. Evaluation never mutates
//! the store.

use std::fmt;
use std::sync::OnceLock;

use linksheet_core::{format_number, CellError, CellStore, CellValue};
use log::debug;

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::parse_formula;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

pub(crate) fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// A resolved cell value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormulaValue {
    /// Absent cell or placeholder
    #[default]
    Empty,
    Number(f64),
    String(String),
    /// Formula that failed to resolve
    Error(CellError),
}

impl FormulaValue {
    /// Convert to number, if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::String(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
            _ => None,
        }
    }

    /// Convert to display string
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    /// Check if this is an empty value
    pub fn is_empty(&self) -> bool {
        matches!(self, FormulaValue::Empty)
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Empty => Ok(()),
            FormulaValue::Number(n) => write!(f, "{}", format_number(*n)),
            FormulaValue::String(s) => write!(f, "{}", s),
            FormulaValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<&CellValue> for FormulaValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => FormulaValue::Empty,
            CellValue::Number(n) => FormulaValue::Number(*n),
            CellValue::String(s) => FormulaValue::String(s.as_str().to_string()),
            // Unevaluated source text
            CellValue::Formula(text) => FormulaValue::String(text.clone()),
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<FormulaError> for FormulaValue {
    fn from(err: FormulaError) -> Self {
        FormulaValue::Error(err.to_cell_error())
    }
}

/// Resolve a raw cell value
///
/// Absent values resolve to [`FormulaValue::Empty`] and literals are
/// returned unchanged. Formula text, whether stored as a formula or as a
/// string starting with `=`, is evaluated against `store`.
pub fn evaluate(raw: Option<&CellValue>, store: &CellStore) -> FormulaResult<FormulaValue> {
    match raw {
        None => Ok(FormulaValue::Empty),
        Some(CellValue::Formula(text)) => evaluate_formula(text, store),
        Some(CellValue::String(s)) if s.as_str().starts_with('=') => {
            evaluate_formula(s.as_str(), store)
        }
        Some(value) => Ok(value.into()),
    }
}

/// Parse and evaluate formula text such as `=AVG(B2:D9)`
pub fn evaluate_formula(formula: &str, store: &CellStore) -> FormulaResult<FormulaValue> {
    let expr = parse_formula(formula)?;
    evaluate_expr(&expr, store)
}

/// Evaluate a parsed formula
pub fn evaluate_expr(expr: &FormulaExpr, store: &CellStore) -> FormulaResult<FormulaValue> {
    let def = get_function_registry()
        .get(&expr.function)
        .ok_or_else(|| FormulaError::UnknownFunction(expr.function.clone()))?;

    if expr.range.is_reversed() {
        debug!("{}: range {} is reversed and covers no cells", def.name, expr.range);
    }

    (def.implementation)(&expr.range, store)
}
