//! Formula parser
//!
//! Accepts `=NAME(range)`. The name is the leading alphabetic run of the
//! uppercased formula body and must be a registered function; the range is
//! the text between the parentheses.

use lazy_regex::regex;
use linksheet_core::CellRange;

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::get_function_registry;

/// Parse a formula string
///
/// # Example
/// ```rust
/// use linksheet_formula::parse_formula;
///
/// let expr = parse_formula("=sum(a1:b4)").unwrap();
/// assert_eq!(expr.function, "SUM");
/// assert_eq!(expr.range.bounds(), (1, 1, 4, 2));
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let body = formula
        .trim()
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("Formula must start with '='".into()))?
        .trim()
        .to_uppercase();

    let name_end = body
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(body.len());
    let (name, rest) = body.split_at(name_end);

    if name.is_empty() {
        return Err(FormulaError::Parse(format!(
            "Missing function name in '{}'",
            formula
        )));
    }
    if get_function_registry().get(name).is_none() {
        return Err(FormulaError::UnknownFunction(name.to_string()));
    }

    let args = regex!(r"^\s*\(([^()]*)\)\s*$")
        .captures(rest)
        .ok_or_else(|| {
            FormulaError::Parse(format!("{} expects a single parenthesized range", name))
        })?;
    let range_text = args.get(1).map_or("", |m| m.as_str()).trim();
    if range_text.is_empty() {
        return Err(FormulaError::Parse(format!("{} is missing its range", name)));
    }

    let range = CellRange::parse(range_text)?;
    Ok(FormulaExpr::new(name, range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linksheet_core::CellAddress;

    #[test]
    fn test_parse_range_formula() {
        let expr = parse_formula("=AVG(B2:D9)").unwrap();
        assert_eq!(expr.function, "AVG");
        assert_eq!(expr.range.start, CellAddress::new(2, 2));
        assert_eq!(expr.range.end, CellAddress::new(9, 4));
        assert_eq!(expr.to_string(), "=AVG(B2:D9)");
    }

    #[test]
    fn test_parse_single_cell_and_reversed() {
        let single = parse_formula("=MAX(C7)").unwrap();
        assert_eq!(single.range.bounds(), (7, 3, 7, 3));

        // Endpoints are not reordered
        let reversed = parse_formula("=MIN(B2:A1)").unwrap();
        assert!(reversed.range.is_reversed());
        assert_eq!(reversed.range.start, CellAddress::new(2, 2));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_formula("SUM(A1:A2)"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_formula("=(A1:A2)"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_formula("=SUM"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_formula("=SUM()"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_formula("=SUM(A1:A2)+1"), Err(FormulaError::Parse(_))));
        assert!(matches!(
            parse_formula("=COUNT(A1:A2)"),
            Err(FormulaError::UnknownFunction(name)) if name == "COUNT"
        ));
        assert!(matches!(
            parse_formula("=SUM(1A:B2)"),
            Err(FormulaError::InvalidReference(_))
        ));
        assert!(matches!(
            parse_formula("=SUM(A1:B2:C3)"),
            Err(FormulaError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_function_names_match_exactly() {
        assert!(matches!(
            parse_formula("=SUMX(A1:A2)"),
            Err(FormulaError::UnknownFunction(name)) if name == "SUMX"
        ));
        assert!(matches!(
            parse_formula("=MAXIMUM(A1:A2)"),
            Err(FormulaError::UnknownFunction(name)) if name == "MAXIMUM"
        ));
        assert_eq!(parse_formula("=avg(A1:A2)").unwrap().function, "AVG");
    }
}
