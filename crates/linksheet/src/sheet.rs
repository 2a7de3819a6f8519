//! Sheet facade
//!
//! [`Sheet`] is what render, edit and import collaborators talk to. It owns
//! the [`CellStore`] and routes every read through the formula evaluator, so
//! a formula cell always reports its current result.

use linksheet_core::{
    CellAddress, CellData, CellNode, CellRange, CellStore, CellStyle, CellValue, Result,
};
use linksheet_formula::{evaluate, evaluate_formula, FormulaResult, FormulaValue};
use log::warn;

use crate::batch::{apply_updates, CellUpdate};

/// A single spreadsheet backed by a sparse cell store
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    store: CellStore,
}

impl Sheet {
    /// Create an empty sheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing store
    pub fn from_store(store: CellStore) -> Self {
        Self { store }
    }

    /// Borrow the underlying store
    pub fn store(&self) -> &CellStore {
        &self.store
    }

    /// Mutably borrow the underlying store
    pub fn store_mut(&mut self) -> &mut CellStore {
        &mut self.store
    }

    /// Take the underlying store
    pub fn into_store(self) -> CellStore {
        self.store
    }

    // === Reads ===

    /// Resolved value at a coordinate
    ///
    /// Formulas are evaluated on every call. A formula that fails resolves
    /// to its error token (`#REF!`, `#NAME?`, `#VALUE!`). Empty coordinates
    /// resolve to [`FormulaValue::Empty`].
    pub fn get_value(&self, row: u32, col: u32) -> FormulaValue {
        let raw = self.store.get_cell_value(row, col);
        match evaluate(raw, &self.store) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "formula at {} failed: {}",
                    CellAddress::new(row, col).to_a1_string(),
                    e
                );
                e.into()
            }
        }
    }

    /// Resolved value at an A1-style address
    pub fn get_value_at(&self, address: &str) -> Result<FormulaValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value(addr.row, addr.col))
    }

    /// Raw stored value (formula text is not evaluated)
    pub fn get_raw(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.store.get_cell_value(row, col)
    }

    /// Node at a coordinate
    pub fn get_cell(&self, row: u32, col: u32) -> Option<&CellNode> {
        self.store.get_cell(row, col)
    }

    /// Evaluate formula text against this sheet without storing it
    pub fn evaluate(&self, formula: &str) -> FormulaResult<FormulaValue> {
        evaluate_formula(formula, &self.store)
    }

    // === Point writes ===

    /// Store raw text typed by a user; `=` starts a formula
    pub fn set_input(&mut self, row: u32, col: u32, text: &str) -> Result<()> {
        self.store.set_cell(row, col, CellValue::from_input(text))
    }

    /// Store a value, replacing any existing one
    ///
    /// Text starting with `=` is stored as a formula.
    pub fn set_value<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) -> Result<()> {
        self.store.set_cell(row, col, value)
    }

    /// Store a value at an A1-style address
    pub fn set_value_at<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.store.set_cell(addr.row, addr.col, value)
    }

    /// Create a cell only if the coordinate is free
    pub fn create_cell<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) -> Result<bool> {
        self.store.create_cell(row, col, value)
    }

    /// Set presentation metadata for a cell
    pub fn set_style(&mut self, row: u32, col: u32, style: CellStyle) -> Result<()> {
        self.store.set_cell_style(row, col, style)
    }

    /// Remove a single cell without shifting
    pub fn remove_cell(&mut self, row: u32, col: u32) -> Option<CellData> {
        self.store.remove_cell(row, col)
    }

    /// Remove every cell in a range without shifting
    pub fn clear_range(&mut self, range: &CellRange) -> usize {
        let targets: Vec<(u32, u32)> = range
            .rows()
            .flat_map(|row| {
                self.store
                    .iter_row_span(row, range.columns())
                    .map(|node| (node.row(), node.col()))
                    .collect::<Vec<_>>()
            })
            .collect();
        for &(row, col) in &targets {
            self.store.remove_cell(row, col);
        }
        targets.len()
    }

    // === Structural edits ===

    /// Insert a value, pushing the rest of the row right
    pub fn insert_cell_shift_right<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u32,
        value: V,
    ) -> Result<()> {
        self.store.insert_cell_shift_right(row, col, value)
    }

    /// Insert a value, pushing the rest of the column down
    pub fn insert_cell_shift_down<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u32,
        value: V,
    ) -> Result<()> {
        self.store.insert_cell_shift_down(row, col, value)
    }

    /// Insert an empty row
    pub fn add_row_in_between(&mut self, row: u32) -> Result<usize> {
        self.store.add_row_in_between(row)
    }

    /// Insert an empty column
    pub fn add_column_in_between(&mut self, col: u32) -> Result<usize> {
        self.store.add_column_in_between(col)
    }

    /// Delete a row, moving later rows up
    pub fn delete_row(&mut self, row: u32) -> usize {
        self.store.delete_row(row)
    }

    /// Delete a column, moving later columns left
    pub fn delete_column(&mut self, col: u32) -> usize {
        self.store.delete_column(col)
    }

    // === Bulk ===

    /// Apply a list of updates in order
    pub fn apply_updates(&mut self, updates: &[CellUpdate]) -> Result<usize> {
        apply_updates(&mut self.store, updates)
    }

    /// Resolved values of one row, left to right, occupied cells only
    pub fn row_values(&self, row: u32) -> Vec<(u32, FormulaValue)> {
        self.store
            .iter_row(row)
            .map(|node| (node.col(), self.get_value(node.row(), node.col())))
            .collect()
    }

    /// Resolved values of one column, top to bottom, occupied cells only
    pub fn column_values(&self, col: u32) -> Vec<(u32, FormulaValue)> {
        self.store
            .iter_column(col)
            .map(|node| (node.row(), self.get_value(node.row(), node.col())))
            .collect()
    }
}

impl From<CellStore> for Sheet {
    fn from(store: CellStore) -> Self {
        Self::from_store(store)
    }
}
