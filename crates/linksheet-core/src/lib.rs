//! # linksheet-core
//!
//! Core data structures for the linksheet spreadsheet library.
//!
//! This crate provides the fundamental types used throughout linksheet:
//! - [`CellStore`] - Sparse grid of cross-linked cell nodes
//! - [`CellValue`] - Raw cell contents (numbers, strings, formulas, placeholders)
//! - [`CellAddress`] and [`CellRange`] - `A1` / `A1:B4` references
//! - [`CellStyle`] - Opaque per-cell presentation metadata
//!
//! Coordinates are 1-based on both axes.
//!
//! ## Example
//!
//! ```rust
//! use linksheet_core::{CellStore, CellValue};
//!
//! let mut store = CellStore::new();
//! store.set_cell(2, 1, "H").unwrap();
//! store.set_cell(3, 1, "I").unwrap();
//!
//! // Push "I" one column to the right and write "X" in its place
//! store.insert_cell_shift_right(3, 1, "X").unwrap();
//!
//! assert_eq!(store.get_cell_value(3, 1), Some(&CellValue::from("X")));
//! assert_eq!(store.get_cell_value(3, 2), Some(&CellValue::from("I")));
//! ```

pub mod cell;
pub mod error;
pub mod style;

pub use cell::{
    format_number, CellAddress, CellData, CellError, CellHandle, CellNode, CellRange, CellStore,
    CellValue, ChainIter, SharedString,
};
pub use error::{Error, Result};
pub use style::{CellStyle, Color, HorizontalAlignment, VerticalAlignment};

/// Maximum number of rows in a sheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a sheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
