//! Cell-related types and the sparse store
//!
//! This module contains:
//! - [`CellValue`] - The raw value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A rectangular range of cells (e.g., "A1:B10")
//! - [`CellStore`] - The cross-linked sparse grid that owns every cell

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellRange};
pub use storage::{CellData, CellHandle, CellNode, CellStore, ChainIter};
pub use value::{format_number, CellError, CellValue, SharedString};
