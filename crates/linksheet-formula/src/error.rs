//! Formula error types

use linksheet_core::CellError;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Function name outside the supported set
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Range text that does not resolve to grid coordinates
    #[error("Invalid reference: {0}")]
    InvalidReference(#[from] linksheet_core::Error),
}

impl FormulaError {
    /// The error token shown in place of the cell's value
    pub fn to_cell_error(&self) -> CellError {
        match self {
            FormulaError::Parse(_) => CellError::Value,
            FormulaError::UnknownFunction(_) => CellError::Name,
            FormulaError::InvalidReference(_) => CellError::Ref,
        }
    }
}
