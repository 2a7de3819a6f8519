//! # linksheet
//!
//! A sparse spreadsheet grid built from cross-linked cell nodes.
//!
//! Every occupied cell sits in two sorted chains, one for its row and one
//! for its column, so shifting cells or inserting and deleting whole rows
//! and columns only relinks the nodes that move.
//!
//! ## Features
//!
//! - Point reads and writes, shift-right / shift-down insertion
//! - Row and column insertion in the middle of the grid, and deletion
//! - `SUM`, `MIN`, `MAX` and `AVG` formulas over ranges, resolved on read
//! - Bulk paste and record import computed on worker threads
//! - Selection statistics (per-row and per-column sums and averages)
//!
//! ## Example
//!
//! ```rust
//! use linksheet::prelude::*;
//!
//! let mut sheet = Sheet::new();
//! sheet.set_input(2, 1, "H").unwrap();
//! sheet.set_input(3, 1, "I").unwrap();
//!
//! for _ in 0..4 {
//!     sheet.insert_cell_shift_right(3, 1, "X").unwrap();
//! }
//! assert_eq!(sheet.store().format_by_row(), "Row 2: H\nRow 3: X -> X -> X -> X -> I");
//!
//! sheet.set_input(1, 1, "=MAX(A1:E3)").unwrap();
//! assert_eq!(sheet.get_value(1, 1), FormulaValue::Number(0.0));
//! ```

pub mod batch;
pub mod calculation;
pub mod options;
pub mod prelude;
pub mod sheet;

pub use batch::{apply_updates, BatchApplier, BatchError, BatchResult, CellUpdate};
pub use calculation::{SelectionStats, SheetStatsExt};
pub use options::{BatchOptions, ImportOptions};
pub use sheet::Sheet;

// Re-export core types
pub use linksheet_core::{
    format_number, CellAddress, CellData, CellError, CellHandle, CellNode, CellRange, CellStore,
    CellStyle, CellValue, Color, Error, HorizontalAlignment, Result, VerticalAlignment, MAX_COLS,
    MAX_ROWS,
};

// Re-export formula types
pub use linksheet_formula::{
    evaluate, evaluate_formula, parse_formula, FormulaError, FormulaExpr, FormulaResult,
    FormulaValue,
};
