//! Tests for formula evaluation against the sheet

use linksheet::prelude::*;
use linksheet::{evaluate, parse_formula};

fn sample() -> Sheet {
    let mut sheet = Sheet::new();
    sheet.set_value_at("A1", 1.0).unwrap();
    sheet.set_value_at("A2", 2.0).unwrap();
    sheet.set_value_at("B1", 3.0).unwrap();
    sheet.set_value_at("B2", "").unwrap();
    sheet
}

/// SUM treats the empty string as 0, AVG skips it
#[test]
fn test_sum_and_avg_over_mixed_range() {
    let sheet = sample();
    assert_eq!(sheet.evaluate("=SUM(A1:B2)").unwrap(), FormulaValue::Number(6.0));
    assert_eq!(sheet.evaluate("=AVG(A1:B2)").unwrap(), FormulaValue::Number(2.0));
    assert_eq!(sheet.evaluate("=MIN(A1:B2)").unwrap(), FormulaValue::Number(1.0));
    assert_eq!(sheet.evaluate("=MAX(A1:B2)").unwrap(), FormulaValue::Number(3.0));
}

#[test]
fn test_formula_cells_resolve_on_read() {
    let mut sheet = sample();
    sheet.set_input(3, 3, "=sum(a1:b2)").unwrap();
    assert_eq!(sheet.get_value(3, 3), FormulaValue::Number(6.0));

    sheet.set_value_at("B2", 10.0).unwrap();
    assert_eq!(sheet.get_value(3, 3), FormulaValue::Number(16.0));
    assert_eq!(sheet.get_value_at("C3").unwrap().to_string(), "16");
}

#[test]
fn test_literals_pass_through() {
    let sheet = sample();
    let hello = CellValue::from("hello");
    assert_eq!(
        evaluate(Some(&hello), sheet.store()).unwrap(),
        FormulaValue::String("hello".into())
    );
    assert_eq!(evaluate(None, sheet.store()).unwrap(), FormulaValue::Empty);
    assert_eq!(sheet.get_value(50, 50), FormulaValue::Empty);
}

#[test]
fn test_string_numbers_are_coerced() {
    let mut sheet = Sheet::new();
    sheet.set_value(1, 1, " 2.5 ").unwrap();
    sheet.set_value(2, 1, "1e1").unwrap();
    sheet.set_value(3, 1, "n/a").unwrap();

    assert_eq!(sheet.evaluate("=SUM(A1:A3)").unwrap(), FormulaValue::Number(12.5));
    assert_eq!(sheet.evaluate("=AVG(A1:A3)").unwrap(), FormulaValue::Number(6.25));
}

#[test]
fn test_empty_ranges() {
    let sheet = sample();
    assert_eq!(sheet.evaluate("=MIN(D1:F9)").unwrap(), FormulaValue::Number(0.0));
    assert_eq!(sheet.evaluate("=MAX(D1:F9)").unwrap(), FormulaValue::Number(0.0));
    assert_eq!(sheet.evaluate("=AVG(D1:F9)").unwrap(), FormulaValue::Number(0.0));

    // Reversed endpoints are kept and cover nothing
    assert_eq!(sheet.evaluate("=SUM(B2:A1)").unwrap(), FormulaValue::Number(0.0));
}

#[test]
fn test_single_cell_range() {
    let sheet = sample();
    assert_eq!(sheet.evaluate("=SUM(B1)").unwrap(), FormulaValue::Number(3.0));
    let expr = parse_formula("=MAX(B1)").unwrap();
    assert_eq!(expr.range.cell_count(), 1);
}

#[test]
fn test_error_tokens() {
    let mut sheet = sample();
    sheet.set_input(5, 1, "=PRODUCT(A1:A2)").unwrap();
    sheet.set_input(5, 2, "=SUM(A1:)").unwrap();
    sheet.set_input(5, 3, "=AVG A1:A2").unwrap();

    assert_eq!(sheet.get_value(5, 1), FormulaValue::Error(CellError::Name));
    assert_eq!(sheet.get_value(5, 2), FormulaValue::Error(CellError::Ref));
    assert_eq!(sheet.get_value(5, 3), FormulaValue::Error(CellError::Value));
    assert_eq!(sheet.get_value(5, 1).to_string(), "#NAME?");

    assert!(matches!(
        sheet.evaluate("=PRODUCT(A1:A2)"),
        Err(FormulaError::UnknownFunction(_))
    ));
}
