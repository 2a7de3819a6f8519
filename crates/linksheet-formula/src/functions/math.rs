//! Aggregate functions
//!
//! Each aggregate walks only the occupied cells of the range, one row chain
//! at a time. `SUM` treats anything non-numeric as 0; `MIN`, `MAX` and `AVG`
//! skip it, and return 0 when the range holds no numbers.

use linksheet_core::{CellRange, CellStore};

use crate::error::FormulaResult;
use crate::evaluator::FormulaValue;

/// Numeric values of the occupied cells in `range`, row by row
fn numeric_values<'a>(range: &CellRange, store: &'a CellStore) -> impl Iterator<Item = f64> + 'a {
    let columns = range.columns();
    range
        .rows()
        .flat_map(move |row| store.iter_row_span(row, columns.clone()))
        .filter_map(|node| node.value().as_number())
}

/// SUM function
pub fn fn_sum(range: &CellRange, store: &CellStore) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(numeric_values(range, store).sum()))
}

/// MIN function
pub fn fn_min(range: &CellRange, store: &CellStore) -> FormulaResult<FormulaValue> {
    let min = numeric_values(range, store).reduce(f64::min).unwrap_or(0.0);
    Ok(FormulaValue::Number(min))
}

/// MAX function
pub fn fn_max(range: &CellRange, store: &CellStore) -> FormulaResult<FormulaValue> {
    let max = numeric_values(range, store).reduce(f64::max).unwrap_or(0.0);
    Ok(FormulaValue::Number(max))
}

/// AVG function
pub fn fn_avg(range: &CellRange, store: &CellStore) -> FormulaResult<FormulaValue> {
    let (sum, count) = numeric_values(range, store)
        .fold((0.0, 0u64), |(sum, count), n| (sum + n, count + 1));
    if count == 0 {
        return Ok(FormulaValue::Number(0.0));
    }
    Ok(FormulaValue::Number(sum / count as f64))
}
