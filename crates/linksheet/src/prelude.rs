//! Prelude module - common imports for linksheet users
//!
//! ```rust
//! use linksheet::prelude::*;
//! ```

pub use crate::{
    // Bulk application
    BatchApplier,
    BatchOptions,
    CellAddress,
    CellError,
    CellRange,
    CellStore,
    CellStyle,
    CellUpdate,
    // Cell types
    CellValue,
    // Error types
    Error,
    FormulaError,
    FormulaValue,
    ImportOptions,
    Result,
    SelectionStats,
    // Main types
    Sheet,
    // Extension traits
    SheetStatsExt,
};
