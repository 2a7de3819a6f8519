//! Parsed formula representation

use std::fmt;

use linksheet_core::CellRange;

/// An aggregate applied to a rectangular range, e.g. `=SUM(A1:B4)`
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaExpr {
    /// Function name (uppercase)
    pub function: String,
    /// Range the function aggregates over, endpoints as written
    pub range: CellRange,
}

impl FormulaExpr {
    pub fn new<S: Into<String>>(function: S, range: CellRange) -> Self {
        Self {
            function: function.into().to_uppercase(),
            range,
        }
    }
}

impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "={}({})", self.function, self.range)
    }
}
