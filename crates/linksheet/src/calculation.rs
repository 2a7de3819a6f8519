//! Selection statistics
//!
//! Per-row and per-column sums and averages over a rectangular selection,
//! computed from resolved values the way a status bar shows them.
//!
//! # Example
//!
//! ```rust
//! use linksheet::prelude::*;
//!
//! let mut sheet = Sheet::new();
//! sheet.set_input(1, 1, "1").unwrap();
//! sheet.set_input(1, 2, "3").unwrap();
//! sheet.set_input(2, 1, "=SUM(A1:B1)").unwrap();
//!
//! let stats = sheet.selection_stats(&CellRange::parse("A1:B2").unwrap());
//! assert_eq!(stats.row_sums[&1], 4.0);
//! assert_eq!(stats.column_sums[&1], 5.0);
//! assert_eq!(stats.column_averages[&2], 1.5);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use linksheet_core::{format_number, CellAddress, CellRange};

use crate::Sheet;

/// Sums and averages over a selection
///
/// Every selected coordinate counts towards the averages; values that are
/// not numeric (including empty cells and error tokens) count as 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionStats {
    /// Row index → sum of the row's selected cells
    pub row_sums: BTreeMap<u32, f64>,
    /// Row index → average of the row's selected cells
    pub row_averages: BTreeMap<u32, f64>,
    /// Column index → sum of the column's selected cells
    pub column_sums: BTreeMap<u32, f64>,
    /// Column index → average of the column's selected cells
    pub column_averages: BTreeMap<u32, f64>,
    /// Sum over the whole selection
    pub total: f64,
    /// Number of selected cells
    pub cell_count: u64,
}

impl SelectionStats {
    /// Average over the whole selection, 0 for an empty selection
    pub fn average(&self) -> f64 {
        if self.cell_count == 0 {
            0.0
        } else {
            self.total / self.cell_count as f64
        }
    }
}

impl fmt::Display for SelectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, sum) in &self.row_sums {
            let avg = self.row_averages.get(row).copied().unwrap_or(0.0);
            writeln!(
                f,
                "Row {} Sum: {} Avg: {}",
                row,
                format_number(*sum),
                format_number(avg)
            )?;
        }
        for (col, sum) in &self.column_sums {
            let avg = self.column_averages.get(col).copied().unwrap_or(0.0);
            writeln!(
                f,
                "Column {} Sum: {} Avg: {}",
                CellAddress::column_to_letters(*col),
                format_number(*sum),
                format_number(avg)
            )?;
        }
        write!(
            f,
            "Total Sum: {} Avg: {}",
            format_number(self.total),
            format_number(self.average())
        )
    }
}

/// Extension trait for Sheet to add selection statistics
pub trait SheetStatsExt {
    /// Compute sums and averages over a selection
    fn selection_stats(&self, selection: &CellRange) -> SelectionStats;
}

impl SheetStatsExt for Sheet {
    fn selection_stats(&self, selection: &CellRange) -> SelectionStats {
        let mut stats = SelectionStats::default();
        if selection.is_reversed() {
            return stats;
        }

        let width = f64::from(selection.col_count());
        let height = f64::from(selection.row_count());

        for row in selection.rows() {
            stats.row_sums.insert(row, 0.0);
        }
        for col in selection.columns() {
            stats.column_sums.insert(col, 0.0);
        }

        // Only occupied cells can add anything; empty ones count as 0
        for row in selection.rows() {
            for node in self.store().iter_row_span(row, selection.columns()) {
                let value = self
                    .get_value(node.row(), node.col())
                    .as_number()
                    .unwrap_or(0.0);
                *stats.row_sums.entry(row).or_insert(0.0) += value;
                *stats.column_sums.entry(node.col()).or_insert(0.0) += value;
                stats.total += value;
            }
        }

        stats.row_averages = stats
            .row_sums
            .iter()
            .map(|(&row, &sum)| (row, sum / width))
            .collect();
        stats.column_averages = stats
            .column_sums
            .iter()
            .map(|(&col, &sum)| (col, sum / height))
            .collect();
        stats.cell_count = selection.cell_count();
        stats
    }
}
