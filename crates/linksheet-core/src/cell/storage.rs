//! Sparse cell storage
//!
//! Every occupied coordinate owns one [`CellNode`] that sits in two chains at
//! once: its row chain (ascending columns) and its column chain (ascending
//! rows). Nodes live in an arena and refer to each other through
//! [`CellHandle`]s, so relocating a cell is "unlink the handle from one
//! chain, splice it into another" without any shared ownership.
//!
//! Structure:
//! - `nodes`: arena slots, `None` for reclaimed slots (reused via `free`)
//! - `row_heads`: row index → first node of that row
//! - `col_heads`: column index → first node of that column
//!
//! An axis with no cells has no head entry.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use log::{debug, trace};

use super::{CellAddress, CellValue};
use crate::error::{Error, Result};
use crate::style::CellStyle;
use crate::{MAX_COLS, MAX_ROWS};

/// Stable index of a node in the store's arena
///
/// A handle stays valid while its cell exists, including across shifts and
/// renumbering. Slots of removed cells are reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellHandle(usize);

impl CellHandle {
    /// Arena slot index
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Value and presentation metadata of a single cell
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellData {
    /// The cell's raw value
    pub value: CellValue,
    /// Opaque presentation metadata
    pub style: CellStyle,
}

impl CellData {
    /// Create a new cell with a value and default style
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style: CellStyle::default(),
        }
    }

    /// Create a new cell with a value and style
    pub fn with_style(value: CellValue, style: CellStyle) -> Self {
        Self { value, style }
    }

    /// Create a placeholder cell (null value, default style)
    pub fn placeholder() -> Self {
        Self::default()
    }
}

/// A cell together with its links in both axis chains
#[derive(Debug, Clone)]
pub struct CellNode {
    row: u32,
    col: u32,
    data: CellData,
    next_in_row: Option<CellHandle>,
    prev_in_row: Option<CellHandle>,
    next_in_col: Option<CellHandle>,
    prev_in_col: Option<CellHandle>,
}

impl CellNode {
    fn new(row: u32, col: u32, data: CellData) -> Self {
        Self {
            row,
            col,
            data,
            next_in_row: None,
            prev_in_row: None,
            next_in_col: None,
            prev_in_col: None,
        }
    }

    /// Row index (1-based)
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Column index (1-based)
    pub fn col(&self) -> u32 {
        self.col
    }

    /// Coordinate as an address
    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col)
    }

    /// Value and style
    pub fn data(&self) -> &CellData {
        &self.data
    }

    /// Raw value
    pub fn value(&self) -> &CellValue {
        &self.data.value
    }

    /// Presentation metadata
    pub fn style(&self) -> &CellStyle {
        &self.data.style
    }

    /// Next cell to the right in the same row
    pub fn next_in_row(&self) -> Option<CellHandle> {
        self.next_in_row
    }

    /// Previous cell to the left in the same row
    pub fn prev_in_row(&self) -> Option<CellHandle> {
        self.prev_in_row
    }

    /// Next cell below in the same column
    pub fn next_in_col(&self) -> Option<CellHandle> {
        self.next_in_col
    }

    /// Previous cell above in the same column
    pub fn prev_in_col(&self) -> Option<CellHandle> {
        self.prev_in_col
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Row,
    Column,
}

/// Iterator along one axis chain
pub struct ChainIter<'a> {
    store: &'a CellStore,
    next: Option<CellHandle>,
    axis: Axis,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a CellNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.store.slot(self.next?);
        self.next = match self.axis {
            Axis::Row => node.next_in_row,
            Axis::Column => node.next_in_col,
        };
        Some(node)
    }
}

/// Sparse, cross-linked cell grid
///
/// Lookups walk the row chain from its head, so reads cost O(row length).
/// Structural edits (shift-insert, row/column insertion and deletion)
/// relink only the nodes they move.
#[derive(Debug, Clone, Default)]
pub struct CellStore {
    nodes: Vec<Option<CellNode>>,
    free: Vec<CellHandle>,
    row_heads: BTreeMap<u32, CellHandle>,
    col_heads: BTreeMap<u32, CellHandle>,
    len: usize,
}

impl CellStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Point access ====================

    /// Check whether a node exists at the coordinate
    pub fn exists(&self, row: u32, col: u32) -> bool {
        self.find(row, col).is_some()
    }

    /// Handle of the node at the coordinate
    pub fn cell_handle(&self, row: u32, col: u32) -> Option<CellHandle> {
        self.find(row, col)
    }

    /// Node behind a handle, or `None` if the cell has since been removed
    pub fn node(&self, handle: CellHandle) -> Option<&CellNode> {
        self.nodes.get(handle.0).and_then(Option::as_ref)
    }

    /// Get the node at the coordinate
    pub fn get_cell(&self, row: u32, col: u32) -> Option<&CellNode> {
        self.find(row, col).map(|h| self.slot(h))
    }

    /// Get the raw value at the coordinate
    ///
    /// Returns `None` both for unoccupied coordinates and for placeholders,
    /// whose value is null.
    pub fn get_cell_value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.get_cell(row, col)
            .map(CellNode::value)
            .filter(|v| !v.is_empty())
    }

    /// Look up a cell by A1-style address
    pub fn get_cell_at(&self, address: &str) -> Result<Option<&CellNode>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_cell(addr.row, addr.col))
    }

    // ==================== Point writes ====================

    /// Create a cell, failing if the coordinate is occupied
    pub fn try_create_cell<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u32,
        value: V,
    ) -> Result<CellHandle> {
        check_coords(row, col)?;
        if self.exists(row, col) {
            return Err(Error::DuplicateCell { row, col });
        }

        let handle = self.alloc(row, col, CellData::new(value.into()));
        self.link_into_row(handle);
        self.link_into_col(handle);
        Ok(handle)
    }

    /// Create a cell if the coordinate is free
    ///
    /// Returns `Ok(false)` without touching the store when a cell already
    /// exists there; use [`CellStore::set_cell`] to overwrite.
    pub fn create_cell<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) -> Result<bool> {
        match self.try_create_cell(row, col, value) {
            Ok(_) => Ok(true),
            Err(Error::DuplicateCell { row, col }) => {
                debug!("create_cell: ({}, {}) already occupied, ignoring", row, col);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Write a value, replacing an existing one in place
    pub fn set_cell<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) -> Result<()> {
        check_coords(row, col)?;
        let value = value.into();
        match self.find(row, col) {
            Some(handle) => self.slot_mut(handle).data.value = value,
            None => {
                let handle = self.alloc(row, col, CellData::new(value));
                self.link_into_row(handle);
                self.link_into_col(handle);
            }
        }
        Ok(())
    }

    /// Set a cell's style, creating a placeholder if the coordinate is empty
    pub fn set_cell_style(&mut self, row: u32, col: u32, style: CellStyle) -> Result<()> {
        check_coords(row, col)?;
        match self.find(row, col) {
            Some(handle) => self.slot_mut(handle).data.style = style,
            None => {
                let handle = self.alloc(row, col, CellData::with_style(CellValue::Empty, style));
                self.link_into_row(handle);
                self.link_into_col(handle);
            }
        }
        Ok(())
    }

    /// Remove a single cell without shifting its neighbours
    pub fn remove_cell(&mut self, row: u32, col: u32) -> Option<CellData> {
        let handle = self.find(row, col)?;
        self.unlink_from_row(handle);
        self.unlink_from_col(handle);
        Some(self.release(handle))
    }

    /// Remove all cells
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.row_heads.clear();
        self.col_heads.clear();
        self.len = 0;
    }

    // ==================== Shift-insert ====================

    /// Insert a value, first pushing every cell at or right of `col` in
    /// `row` one column to the right
    ///
    /// Fails without modifying the store if a pushed cell would leave the
    /// grid.
    pub fn insert_cell_shift_right<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u32,
        value: V,
    ) -> Result<()> {
        check_coords(row, col)?;

        let moving: Vec<CellHandle> = self
            .chain(self.row_heads.get(&row).copied(), Axis::Row)
            .skip_while(|node| node.col < col)
            .map(|node| self.handle_of(node))
            .collect();

        if let Some(&last) = moving.last() {
            let last_col = self.slot(last).col;
            if last_col >= MAX_COLS {
                return Err(Error::ColumnOutOfBounds(last_col + 1, MAX_COLS));
            }
        }

        // Rightmost first, so the target column chain never holds two
        // nodes for the same row
        for &handle in moving.iter().rev() {
            self.unlink_from_col(handle);
            let node = self.slot_mut(handle);
            node.col += 1;
            trace!("shift right: ({}, {}) -> ({}, {})", node.row, node.col - 1, node.row, node.col);
            self.link_into_col(handle);
        }

        self.create_cell(row, col, value)?;
        Ok(())
    }

    /// Insert a value, first pushing every cell at or below `row` in `col`
    /// one row down
    ///
    /// Fails without modifying the store if a pushed cell would leave the
    /// grid.
    pub fn insert_cell_shift_down<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u32,
        value: V,
    ) -> Result<()> {
        check_coords(row, col)?;

        let moving: Vec<CellHandle> = self
            .chain(self.col_heads.get(&col).copied(), Axis::Column)
            .skip_while(|node| node.row < row)
            .map(|node| self.handle_of(node))
            .collect();

        if let Some(&last) = moving.last() {
            let last_row = self.slot(last).row;
            if last_row >= MAX_ROWS {
                return Err(Error::RowOutOfBounds(last_row + 1, MAX_ROWS));
            }
        }

        for &handle in moving.iter().rev() {
            self.unlink_from_row(handle);
            let node = self.slot_mut(handle);
            node.row += 1;
            trace!("shift down: ({}, {}) -> ({}, {})", node.row - 1, node.col, node.row, node.col);
            self.link_into_row(handle);
        }

        self.create_cell(row, col, value)?;
        Ok(())
    }

    // ==================== Row / column insertion ====================

    /// Insert a row at `new_row`
    ///
    /// Every row at or below `new_row` is renumbered one down, then a
    /// placeholder is created in the new row for each occupied column.
    /// Returns the number of placeholders created. An index outside the
    /// grid is a no-op.
    pub fn add_row_in_between(&mut self, new_row: u32) -> Result<usize> {
        if new_row == 0 || new_row > MAX_ROWS {
            debug!("add_row_in_between: row {} outside the grid, ignoring", new_row);
            return Ok(0);
        }

        let moving: Vec<u32> = self.row_heads.range(new_row..).map(|(&r, _)| r).collect();
        if let Some(&max_row) = moving.last() {
            if max_row >= MAX_ROWS {
                return Err(Error::RowOutOfBounds(max_row + 1, MAX_ROWS));
            }
        }

        // Highest first so a renumbered row never lands on a live index
        for &row in moving.iter().rev() {
            self.renumber_row(row, row + 1);
        }

        let columns: Vec<u32> = self.col_heads.keys().copied().collect();
        let mut prev: Option<CellHandle> = None;
        for &col in &columns {
            let handle = self.alloc(new_row, col, CellData::placeholder());
            self.link_into_col(handle);
            // Columns arrive in ascending order, so the row chain is built by appending
            match prev {
                Some(p) => {
                    self.slot_mut(p).next_in_row = Some(handle);
                    self.slot_mut(handle).prev_in_row = Some(p);
                }
                None => {
                    self.row_heads.insert(new_row, handle);
                }
            }
            prev = Some(handle);
        }

        debug!(
            "add_row_in_between({}): renumbered {} rows, created {} placeholders",
            new_row,
            moving.len(),
            columns.len()
        );
        Ok(columns.len())
    }

    /// Insert a column at `new_col`
    ///
    /// Column counterpart of [`CellStore::add_row_in_between`].
    pub fn add_column_in_between(&mut self, new_col: u32) -> Result<usize> {
        if new_col == 0 || new_col > MAX_COLS {
            debug!("add_column_in_between: column {} outside the grid, ignoring", new_col);
            return Ok(0);
        }

        let moving: Vec<u32> = self.col_heads.range(new_col..).map(|(&c, _)| c).collect();
        if let Some(&max_col) = moving.last() {
            if max_col >= MAX_COLS {
                return Err(Error::ColumnOutOfBounds(max_col + 1, MAX_COLS));
            }
        }

        for &col in moving.iter().rev() {
            self.renumber_column(col, col + 1);
        }

        let rows: Vec<u32> = self.row_heads.keys().copied().collect();
        let mut prev: Option<CellHandle> = None;
        for &row in &rows {
            let handle = self.alloc(row, new_col, CellData::placeholder());
            self.link_into_row(handle);
            match prev {
                Some(p) => {
                    self.slot_mut(p).next_in_col = Some(handle);
                    self.slot_mut(handle).prev_in_col = Some(p);
                }
                None => {
                    self.col_heads.insert(new_col, handle);
                }
            }
            prev = Some(handle);
        }

        debug!(
            "add_column_in_between({}): renumbered {} columns, created {} placeholders",
            new_col,
            moving.len(),
            rows.len()
        );
        Ok(rows.len())
    }

    // ==================== Row / column deletion ====================

    /// Delete a row and move every row below it up by one
    ///
    /// Returns the number of cells removed. An index outside the grid is a
    /// no-op.
    pub fn delete_row(&mut self, row: u32) -> usize {
        if row == 0 || row > MAX_ROWS {
            debug!("delete_row: row {} outside the grid, ignoring", row);
            return 0;
        }

        let mut removed = 0;
        let mut current = self.row_heads.remove(&row);
        while let Some(handle) = current {
            current = self.slot(handle).next_in_row;
            self.unlink_from_col(handle);
            self.release(handle);
            removed += 1;
        }

        // Lowest first so each row moves into an index that is already free
        let higher: Vec<u32> = self.row_heads.range(row + 1..).map(|(&r, _)| r).collect();
        for &r in &higher {
            self.renumber_row(r, r - 1);
        }

        debug!(
            "delete_row({}): removed {} cells, renumbered {} rows",
            row,
            removed,
            higher.len()
        );
        removed
    }

    /// Delete a column and move every column to its right left by one
    ///
    /// Column counterpart of [`CellStore::delete_row`].
    pub fn delete_column(&mut self, col: u32) -> usize {
        if col == 0 || col > MAX_COLS {
            debug!("delete_column: column {} outside the grid, ignoring", col);
            return 0;
        }

        let mut removed = 0;
        let mut current = self.col_heads.remove(&col);
        while let Some(handle) = current {
            current = self.slot(handle).next_in_col;
            self.unlink_from_row(handle);
            self.release(handle);
            removed += 1;
        }

        let higher: Vec<u32> = self.col_heads.range(col + 1..).map(|(&c, _)| c).collect();
        for &c in &higher {
            self.renumber_column(c, c - 1);
        }

        debug!(
            "delete_column({}): removed {} cells, renumbered {} columns",
            col,
            removed,
            higher.len()
        );
        removed
    }

    // ==================== Iteration ====================

    /// Get the number of cells, placeholders included
    pub fn cell_count(&self) -> usize {
        self.len
    }

    /// Check if the store holds no cells
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over the cells of a row, left to right
    pub fn iter_row(&self, row: u32) -> ChainIter<'_> {
        self.chain(self.row_heads.get(&row).copied(), Axis::Row)
    }

    /// Iterate over the cells of a column, top to bottom
    pub fn iter_column(&self, col: u32) -> ChainIter<'_> {
        self.chain(self.col_heads.get(&col).copied(), Axis::Column)
    }

    /// Iterate over the cells of a row whose column lies in `cols`
    pub fn iter_row_span(
        &self,
        row: u32,
        cols: RangeInclusive<u32>,
    ) -> impl Iterator<Item = &CellNode> + '_ {
        let (start, end) = (*cols.start(), *cols.end());
        self.iter_row(row)
            .skip_while(move |node| node.col < start)
            .take_while(move |node| node.col <= end)
    }

    /// Iterate over all cells in row order
    pub fn iter(&self) -> impl Iterator<Item = &CellNode> + '_ {
        self.row_heads
            .values()
            .flat_map(move |&head| self.chain(Some(head), Axis::Row))
    }

    /// Iterate over row indices that have cells
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.row_heads.keys().copied()
    }

    /// Iterate over column indices that have cells
    pub fn column_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.col_heads.keys().copied()
    }

    /// Get the bounds of used cells
    ///
    /// Returns (min_row, min_col, max_row, max_col) or None if empty
    pub fn used_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let min_row = *self.row_heads.keys().next()?;
        let max_row = *self.row_heads.keys().next_back()?;
        let min_col = *self.col_heads.keys().next()?;
        let max_col = *self.col_heads.keys().next_back()?;
        Some((min_row, min_col, max_row, max_col))
    }

    /// Render every row as `Row r: v -> v -> ...`, `null` for placeholders
    pub fn format_by_row(&self) -> String {
        self.row_heads
            .keys()
            .map(|&row| format!("Row {}: {}", row, join_values(self.iter_row(row))))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render every column as `Column c: v -> v -> ...`, `null` for placeholders
    pub fn format_by_column(&self) -> String {
        self.col_heads
            .keys()
            .map(|&col| format!("Column {}: {}", col, join_values(self.iter_column(col))))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Verify chain ordering and cross-linking of the whole store
    ///
    /// Diagnostic for tests; no store operation calls it.
    #[doc(hidden)]
    pub fn check_links(&self) -> std::result::Result<(), String> {
        let mut seen_by_rows = 0;
        for (&row, &head) in &self.row_heads {
            if self.slot(head).prev_in_row.is_some() {
                return Err(format!("row {} head has a predecessor", row));
            }
            let mut prev: Option<CellHandle> = None;
            let mut current = Some(head);
            while let Some(handle) = current {
                let node = self.slot(handle);
                if node.row != row {
                    return Err(format!("node {:?} in row chain {} has row {}", handle, row, node.row));
                }
                if node.prev_in_row != prev {
                    return Err(format!("node {:?} has a stale prev_in_row", handle));
                }
                if let Some(p) = prev {
                    if self.slot(p).col >= node.col {
                        return Err(format!("row {} is not strictly ascending at {:?}", row, handle));
                    }
                }
                seen_by_rows += 1;
                prev = Some(handle);
                current = node.next_in_row;
            }
        }

        let mut seen_by_cols = 0;
        for (&col, &head) in &self.col_heads {
            if self.slot(head).prev_in_col.is_some() {
                return Err(format!("column {} head has a predecessor", col));
            }
            let mut prev: Option<CellHandle> = None;
            let mut current = Some(head);
            while let Some(handle) = current {
                let node = self.slot(handle);
                if node.col != col {
                    return Err(format!("node {:?} in column chain {} has col {}", handle, col, node.col));
                }
                if node.prev_in_col != prev {
                    return Err(format!("node {:?} has a stale prev_in_col", handle));
                }
                if let Some(p) = prev {
                    if self.slot(p).row >= node.row {
                        return Err(format!("column {} is not strictly ascending at {:?}", col, handle));
                    }
                }
                seen_by_cols += 1;
                prev = Some(handle);
                current = node.next_in_col;
            }
        }

        let live = self.nodes.iter().filter(|slot| slot.is_some()).count();
        if seen_by_rows != live || seen_by_cols != live || live != self.len {
            return Err(format!(
                "reachability mismatch: {} live, {} via rows, {} via columns, len {}",
                live, seen_by_rows, seen_by_cols, self.len
            ));
        }
        Ok(())
    }

    // ==================== Internals ====================

    fn slot(&self, handle: CellHandle) -> &CellNode {
        self.nodes[handle.0]
            .as_ref()
            .expect("cell handle points at a reclaimed slot")
    }

    fn slot_mut(&mut self, handle: CellHandle) -> &mut CellNode {
        self.nodes[handle.0]
            .as_mut()
            .expect("cell handle points at a reclaimed slot")
    }

    fn chain(&self, start: Option<CellHandle>, axis: Axis) -> ChainIter<'_> {
        ChainIter {
            store: self,
            next: start,
            axis,
        }
    }

    // Nodes carry no back-reference to their slot; recover it from a neighbour
    fn handle_of(&self, node: &CellNode) -> CellHandle {
        let neighbour = match node.prev_in_row {
            Some(prev) => self.slot(prev).next_in_row,
            None => self.row_heads.get(&node.row).copied(),
        };
        neighbour.expect("linked node is reachable from its row chain")
    }

    fn find(&self, row: u32, col: u32) -> Option<CellHandle> {
        let mut current = self.row_heads.get(&row).copied();
        while let Some(handle) = current {
            let node = self.slot(handle);
            if node.col == col {
                return Some(handle);
            }
            if node.col > col {
                return None;
            }
            current = node.next_in_row;
        }
        None
    }

    fn alloc(&mut self, row: u32, col: u32, data: CellData) -> CellHandle {
        let node = CellNode::new(row, col, data);
        self.len += 1;
        match self.free.pop() {
            Some(handle) => {
                self.nodes[handle.0] = Some(node);
                handle
            }
            None => {
                self.nodes.push(Some(node));
                CellHandle(self.nodes.len() - 1)
            }
        }
    }

    // Caller must have unlinked the node from both chains
    fn release(&mut self, handle: CellHandle) -> CellData {
        let node = self.nodes[handle.0]
            .take()
            .expect("cell handle points at a reclaimed slot");
        self.free.push(handle);
        self.len -= 1;
        node.data
    }

    fn link_into_row(&mut self, handle: CellHandle) {
        let (row, col) = {
            let node = self.slot(handle);
            (node.row, node.col)
        };

        let mut prev: Option<CellHandle> = None;
        let mut current = self.row_heads.get(&row).copied();
        while let Some(h) = current {
            let node = self.slot(h);
            if node.col >= col {
                break;
            }
            prev = Some(h);
            current = node.next_in_row;
        }

        {
            let node = self.slot_mut(handle);
            node.prev_in_row = prev;
            node.next_in_row = current;
        }
        match prev {
            Some(p) => self.slot_mut(p).next_in_row = Some(handle),
            None => {
                self.row_heads.insert(row, handle);
            }
        }
        if let Some(next) = current {
            self.slot_mut(next).prev_in_row = Some(handle);
        }
    }

    fn link_into_col(&mut self, handle: CellHandle) {
        let (row, col) = {
            let node = self.slot(handle);
            (node.row, node.col)
        };

        let mut prev: Option<CellHandle> = None;
        let mut current = self.col_heads.get(&col).copied();
        while let Some(h) = current {
            let node = self.slot(h);
            if node.row >= row {
                break;
            }
            prev = Some(h);
            current = node.next_in_col;
        }

        {
            let node = self.slot_mut(handle);
            node.prev_in_col = prev;
            node.next_in_col = current;
        }
        match prev {
            Some(p) => self.slot_mut(p).next_in_col = Some(handle),
            None => {
                self.col_heads.insert(col, handle);
            }
        }
        if let Some(next) = current {
            self.slot_mut(next).prev_in_col = Some(handle);
        }
    }

    fn unlink_from_row(&mut self, handle: CellHandle) {
        let (row, prev, next) = {
            let node = self.slot_mut(handle);
            let links = (node.row, node.prev_in_row, node.next_in_row);
            node.prev_in_row = None;
            node.next_in_row = None;
            links
        };

        match prev {
            Some(p) => self.slot_mut(p).next_in_row = next,
            None => match next {
                Some(n) => {
                    self.row_heads.insert(row, n);
                }
                None => {
                    self.row_heads.remove(&row);
                }
            },
        }
        if let Some(n) = next {
            self.slot_mut(n).prev_in_row = prev;
        }
    }

    fn unlink_from_col(&mut self, handle: CellHandle) {
        let (col, prev, next) = {
            let node = self.slot_mut(handle);
            let links = (node.col, node.prev_in_col, node.next_in_col);
            node.prev_in_col = None;
            node.next_in_col = None;
            links
        };

        match prev {
            Some(p) => self.slot_mut(p).next_in_col = next,
            None => match next {
                Some(n) => {
                    self.col_heads.insert(col, n);
                }
                None => {
                    self.col_heads.remove(&col);
                }
            },
        }
        if let Some(n) = next {
            self.slot_mut(n).prev_in_col = prev;
        }
    }

    // Moves a whole row chain to another index. Column chains stay ordered
    // as long as the caller renumbers in an order that never crosses a row.
    fn renumber_row(&mut self, from: u32, to: u32) {
        let Some(head) = self.row_heads.remove(&from) else {
            return;
        };
        let mut current = Some(head);
        while let Some(handle) = current {
            let node = self.slot_mut(handle);
            node.row = to;
            current = node.next_in_row;
        }
        self.row_heads.insert(to, head);
    }

    fn renumber_column(&mut self, from: u32, to: u32) {
        let Some(head) = self.col_heads.remove(&from) else {
            return;
        };
        let mut current = Some(head);
        while let Some(handle) = current {
            let node = self.slot_mut(handle);
            node.col = to;
            current = node.next_in_col;
        }
        self.col_heads.insert(to, head);
    }
}

fn check_coords(row: u32, col: u32) -> Result<()> {
    if row == 0 || row > MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS));
    }
    if col == 0 || col > MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col, MAX_COLS));
    }
    Ok(())
}

fn join_values<'a>(nodes: impl Iterator<Item = &'a CellNode>) -> String {
    nodes
        .map(|node| match node.value() {
            CellValue::Empty => "null".to_string(),
            value => value.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row_values(store: &CellStore, row: u32) -> Vec<(u32, String)> {
        store
            .iter_row(row)
            .map(|n| (n.col(), n.value().to_string()))
            .collect()
    }

    fn coords(store: &CellStore) -> Vec<(u32, u32, CellValue)> {
        store
            .iter()
            .map(|n| (n.row(), n.col(), n.value().clone()))
            .collect()
    }

    #[test]
    fn test_basic_operations() {
        let mut store = CellStore::new();

        assert!(store.create_cell(1, 1, 42.0).unwrap());
        assert_eq!(store.get_cell_value(1, 1), Some(&CellValue::Number(42.0)));

        // Empty coordinates read as absent
        assert!(store.get_cell(5, 5).is_none());
        assert!(store.get_cell_value(5, 5).is_none());
        assert!(store.get_cell_value(0, 0).is_none());
        store.check_links().unwrap();
    }

    #[test]
    fn test_create_on_occupied_is_noop() {
        let mut store = CellStore::new();
        store.create_cell(2, 3, "first").unwrap();

        assert!(!store.create_cell(2, 3, "second").unwrap());
        assert_eq!(store.get_cell_value(2, 3), Some(&CellValue::from("first")));
        assert_eq!(store.cell_count(), 1);

        assert_eq!(
            store.try_create_cell(2, 3, "third"),
            Err(Error::DuplicateCell { row: 2, col: 3 })
        );
    }

    #[test]
    fn test_set_cell_updates_in_place() {
        let mut store = CellStore::new();
        store.set_cell(4, 2, 1.0).unwrap();
        let handle = store.cell_handle(4, 2).unwrap();

        store.set_cell(4, 2, "replaced").unwrap();
        assert_eq!(store.cell_handle(4, 2), Some(handle));
        assert_eq!(store.get_cell_value(4, 2), Some(&CellValue::from("replaced")));
        assert_eq!(store.cell_count(), 1);
    }

    #[test]
    fn test_coordinates_out_of_bounds() {
        let mut store = CellStore::new();
        assert_eq!(store.set_cell(0, 1, 1.0), Err(Error::RowOutOfBounds(0, MAX_ROWS)));
        assert_eq!(store.set_cell(1, 0, 1.0), Err(Error::ColumnOutOfBounds(0, MAX_COLS)));
        assert!(store.create_cell(MAX_ROWS + 1, 1, 1.0).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_chains_are_sorted_regardless_of_insert_order() {
        let mut store = CellStore::new();
        for &(row, col) in &[(3, 5), (3, 1), (1, 5), (3, 3), (2, 5), (3, 4)] {
            store.set_cell(row, col, (row * 10 + col) as i32).unwrap();
        }

        let cols: Vec<u32> = store.iter_row(3).map(CellNode::col).collect();
        assert_eq!(cols, vec![1, 3, 4, 5]);

        let rows: Vec<u32> = store.iter_column(5).map(CellNode::row).collect();
        assert_eq!(rows, vec![1, 2, 3]);
        store.check_links().unwrap();
    }

    #[test]
    fn test_shift_right_worked_example() {
        let mut store = CellStore::new();
        store.create_cell(2, 1, "H").unwrap();
        store.create_cell(3, 1, "I").unwrap();

        for _ in 0..4 {
            store.insert_cell_shift_right(3, 1, "X").unwrap();
        }

        let expected: Vec<(u32, String)> = ["X", "X", "X", "X", "I"]
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u32 + 1, v.to_string()))
            .collect();
        assert_eq!(row_values(&store, 3), expected);

        // Row 2 untouched; "I" now heads column 5
        assert_eq!(row_values(&store, 2), vec![(1, "H".to_string())]);
        let column_5: Vec<u32> = store.iter_column(5).map(CellNode::row).collect();
        assert_eq!(column_5, vec![3]);
        store.check_links().unwrap();
    }

    #[test]
    fn test_shift_right_only_moves_cells_at_or_after_target() {
        let mut store = CellStore::new();
        store.set_cell(1, 1, "a").unwrap();
        store.set_cell(1, 3, "c").unwrap();
        store.set_cell(2, 4, "below").unwrap();

        store.insert_cell_shift_right(1, 2, "new").unwrap();

        assert_eq!(
            row_values(&store, 1),
            vec![(1, "a".into()), (2, "new".into()), (4, "c".into())]
        );
        let column_4: Vec<u32> = store.iter_column(4).map(CellNode::row).collect();
        assert_eq!(column_4, vec![1, 2]);
        assert!(store.iter_column(3).next().is_none());
        store.check_links().unwrap();
    }

    #[test]
    fn test_shift_down() {
        let mut store = CellStore::new();
        store.set_cell(1, 2, "top").unwrap();
        store.set_cell(2, 2, "mid").unwrap();
        store.set_cell(2, 1, "left").unwrap();

        store.insert_cell_shift_down(1, 2, "new").unwrap();

        let column: Vec<(u32, String)> = store
            .iter_column(2)
            .map(|n| (n.row(), n.value().to_string()))
            .collect();
        assert_eq!(
            column,
            vec![(1, "new".into()), (2, "top".into()), (3, "mid".into())]
        );
        assert_eq!(row_values(&store, 2), vec![(1, "left".into()), (2, "top".into())]);
        store.check_links().unwrap();
    }

    #[test]
    fn test_shift_past_grid_edge_fails_without_changes() {
        let mut store = CellStore::new();
        store.set_cell(1, MAX_COLS, "edge").unwrap();
        store.set_cell(1, 5, "inner").unwrap();
        let before = coords(&store);

        assert_eq!(
            store.insert_cell_shift_right(1, 1, "x"),
            Err(Error::ColumnOutOfBounds(MAX_COLS + 1, MAX_COLS))
        );
        assert_eq!(coords(&store), before);

        store.set_cell(MAX_ROWS, 7, "bottom").unwrap();
        assert!(store.insert_cell_shift_down(2, 7, "x").is_err());
        store.check_links().unwrap();
    }

    #[test]
    fn test_add_row_in_between_renumbers_and_fills_placeholders() {
        let mut store = CellStore::new();
        store.set_cell(1, 1, "r1").unwrap();
        store.set_cell(2, 2, "r2").unwrap();
        store.set_cell(3, 4, "r3").unwrap();

        let created = store.add_row_in_between(2).unwrap();
        assert_eq!(created, 3);

        assert_eq!(store.row_indices().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(store.get_cell_value(3, 2), Some(&CellValue::from("r2")));
        assert_eq!(store.get_cell_value(4, 4), Some(&CellValue::from("r3")));

        let new_row: Vec<(u32, bool)> = store
            .iter_row(2)
            .map(|n| (n.col(), n.value().is_empty()))
            .collect();
        assert_eq!(new_row, vec![(1, true), (2, true), (4, true)]);
        store.check_links().unwrap();
    }

    #[test]
    fn test_add_column_in_between() {
        let mut store = CellStore::new();
        store.set_cell(1, 1, "a").unwrap();
        store.set_cell(1, 2, "b").unwrap();
        store.set_cell(3, 2, "c").unwrap();

        assert_eq!(store.add_column_in_between(2).unwrap(), 2);

        assert_eq!(store.column_indices().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(store.get_cell_value(1, 3), Some(&CellValue::from("b")));
        assert_eq!(store.get_cell_value(3, 3), Some(&CellValue::from("c")));
        assert!(store.exists(1, 2));
        assert!(store.exists(3, 2));
        assert!(store.get_cell_value(1, 2).is_none());
        store.check_links().unwrap();
    }

    #[test]
    fn test_delete_row() {
        let mut store = CellStore::new();
        store.set_cell(1, 1, "keep").unwrap();
        store.set_cell(2, 1, "gone").unwrap();
        store.set_cell(2, 3, "gone too").unwrap();
        store.set_cell(4, 3, "moves up").unwrap();

        assert_eq!(store.delete_row(2), 2);

        assert_eq!(store.row_indices().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(store.get_cell_value(3, 3), Some(&CellValue::from("moves up")));
        let column_3: Vec<u32> = store.iter_column(3).map(CellNode::row).collect();
        assert_eq!(column_3, vec![3]);
        assert_eq!(store.cell_count(), 2);
        store.check_links().unwrap();
    }

    #[test]
    fn test_delete_empty_row_still_renumbers() {
        let mut store = CellStore::new();
        store.set_cell(1, 1, "a").unwrap();
        store.set_cell(3, 1, "b").unwrap();

        assert_eq!(store.delete_row(2), 0);
        assert_eq!(store.get_cell_value(2, 1), Some(&CellValue::from("b")));

        // Outside the grid: nothing happens
        assert_eq!(store.delete_row(0), 0);
        assert_eq!(store.delete_column(MAX_COLS + 1), 0);
        assert_eq!(store.cell_count(), 2);
        store.check_links().unwrap();
    }

    #[test]
    fn test_delete_column() {
        let mut store = CellStore::new();
        store.set_cell(1, 1, "a").unwrap();
        store.set_cell(1, 2, "b").unwrap();
        store.set_cell(1, 3, "c").unwrap();
        store.set_cell(2, 2, "d").unwrap();

        assert_eq!(store.delete_column(2), 2);
        assert_eq!(row_values(&store, 1), vec![(1, "a".into()), (2, "c".into())]);
        assert!(store.iter_row(2).next().is_none());
        assert_eq!(store.row_indices().collect::<Vec<_>>(), vec![1]);
        store.check_links().unwrap();
    }

    #[test]
    fn test_add_then_delete_row_restores_state() {
        let mut store = CellStore::new();
        store.set_cell(1, 1, 1.0).unwrap();
        store.set_cell(2, 3, 2.0).unwrap();
        store.set_cell(5, 2, "x").unwrap();
        let before = coords(&store);

        store.add_row_in_between(2).unwrap();
        store.delete_row(2);
        assert_eq!(coords(&store), before);

        store.add_column_in_between(1).unwrap();
        store.delete_column(1);
        assert_eq!(coords(&store), before);
        store.check_links().unwrap();
    }

    #[test]
    fn test_remove_cell_and_slot_reuse() {
        let mut store = CellStore::new();
        store.set_cell(1, 1, "a").unwrap();
        store.set_cell(1, 2, "b").unwrap();
        let handle = store.cell_handle(1, 1).unwrap();

        let removed = store.remove_cell(1, 1).unwrap();
        assert_eq!(removed.value, CellValue::from("a"));
        assert!(store.node(handle).is_none());
        assert!(store.remove_cell(1, 1).is_none());
        assert_eq!(store.iter_column(1).count(), 0);

        let reused = store.try_create_cell(7, 7, "c").unwrap();
        assert_eq!(reused, handle);
        assert_eq!(store.node(reused).map(CellNode::address), Some(CellAddress::new(7, 7)));
        store.check_links().unwrap();
    }

    #[test]
    fn test_style_is_carried_through_shifts() {
        let mut store = CellStore::new();
        let style = CellStyle::new().font_size(20.0);
        store.set_cell(1, 1, "styled").unwrap();
        store.set_cell_style(1, 1, style.clone()).unwrap();

        store.insert_cell_shift_right(1, 1, "new").unwrap();
        assert_eq!(store.get_cell(1, 2).map(CellNode::style), Some(&style));
        assert_eq!(store.get_cell(1, 1).map(CellNode::style), Some(&CellStyle::default()));

        // Styling an empty coordinate creates a placeholder
        store.set_cell_style(9, 9, style).unwrap();
        assert!(store.exists(9, 9));
        assert!(store.get_cell_value(9, 9).is_none());
    }

    #[test]
    fn test_format_dumps() {
        let mut store = CellStore::new();
        store.set_cell(1, 1, "a").unwrap();
        store.set_cell(1, 2, 2.0).unwrap();
        store.set_cell(2, 2, "b").unwrap();
        store.add_row_in_between(2).unwrap();

        assert_eq!(
            store.format_by_row(),
            "Row 1: a -> 2\nRow 2: null -> null\nRow 3: b"
        );
        assert_eq!(
            store.format_by_column(),
            "Column 1: a -> null\nColumn 2: 2 -> null -> b"
        );
    }

    #[test]
    fn test_iteration_and_bounds() {
        let mut store = CellStore::new();
        assert!(store.used_bounds().is_none());

        store.set_cell(5, 3, 1.0).unwrap();
        store.set_cell(10, 7, 2.0).unwrap();
        store.set_cell(2, 1, 3.0).unwrap();

        assert_eq!(store.used_bounds(), Some((2, 1, 10, 7)));

        let order: Vec<(u32, u32)> = store.iter().map(|n| (n.row(), n.col())).collect();
        assert_eq!(order, vec![(2, 1), (5, 3), (10, 7)]);

        let span: Vec<u32> = store.iter_row_span(5, 2..=3).map(CellNode::col).collect();
        assert_eq!(span, vec![3]);

        store.clear();
        assert!(store.is_empty());
        assert!(store.used_bounds().is_none());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;

        #[derive(Debug, Clone)]
        enum Op {
            Set(u32, u32, i32),
            Remove(u32, u32),
            ShiftRight(u32, u32, i32),
            ShiftDown(u32, u32, i32),
            AddRow(u32),
            AddColumn(u32),
            DeleteRow(u32),
            DeleteColumn(u32),
        }

        fn op() -> impl Strategy<Value = Op> {
            let idx = 1u32..8;
            prop_oneof![
                (idx.clone(), idx.clone(), any::<i32>()).prop_map(|(r, c, v)| Op::Set(r, c, v)),
                (idx.clone(), idx.clone()).prop_map(|(r, c)| Op::Remove(r, c)),
                (idx.clone(), idx.clone(), any::<i32>()).prop_map(|(r, c, v)| Op::ShiftRight(r, c, v)),
                (idx.clone(), idx.clone(), any::<i32>()).prop_map(|(r, c, v)| Op::ShiftDown(r, c, v)),
                idx.clone().prop_map(Op::AddRow),
                idx.clone().prop_map(Op::AddColumn),
                idx.clone().prop_map(Op::DeleteRow),
                idx.prop_map(Op::DeleteColumn),
            ]
        }

        type Model = BTreeMap<(u32, u32), CellValue>;

        fn apply_model(model: &mut Model, op: &Op) {
            match *op {
                Op::Set(r, c, v) => {
                    model.insert((r, c), CellValue::from(v));
                }
                Op::Remove(r, c) => {
                    model.remove(&(r, c));
                }
                Op::ShiftRight(r, c, v) => {
                    *model = std::mem::take(model)
                        .into_iter()
                        .map(|((row, col), value)| {
                            if row == r && col >= c {
                                ((row, col + 1), value)
                            } else {
                                ((row, col), value)
                            }
                        })
                        .collect();
                    model.insert((r, c), CellValue::from(v));
                }
                Op::ShiftDown(r, c, v) => {
                    *model = std::mem::take(model)
                        .into_iter()
                        .map(|((row, col), value)| {
                            if col == c && row >= r {
                                ((row + 1, col), value)
                            } else {
                                ((row, col), value)
                            }
                        })
                        .collect();
                    model.insert((r, c), CellValue::from(v));
                }
                Op::AddRow(n) => {
                    let columns: Vec<u32> = model.keys().map(|&(_, c)| c).collect();
                    *model = std::mem::take(model)
                        .into_iter()
                        .map(|((row, col), value)| {
                            let row = if row >= n { row + 1 } else { row };
                            ((row, col), value)
                        })
                        .collect();
                    for c in columns {
                        model.insert((n, c), CellValue::Empty);
                    }
                }
                Op::AddColumn(n) => {
                    let rows: Vec<u32> = model.keys().map(|&(r, _)| r).collect();
                    *model = std::mem::take(model)
                        .into_iter()
                        .map(|((row, col), value)| {
                            let col = if col >= n { col + 1 } else { col };
                            ((row, col), value)
                        })
                        .collect();
                    for r in rows {
                        model.insert((r, n), CellValue::Empty);
                    }
                }
                Op::DeleteRow(n) => {
                    *model = std::mem::take(model)
                        .into_iter()
                        .filter(|&((row, _), _)| row != n)
                        .map(|((row, col), value)| {
                            let row = if row > n { row - 1 } else { row };
                            ((row, col), value)
                        })
                        .collect();
                }
                Op::DeleteColumn(n) => {
                    *model = std::mem::take(model)
                        .into_iter()
                        .filter(|&((_, col), _)| col != n)
                        .map(|((row, col), value)| {
                            let col = if col > n { col - 1 } else { col };
                            ((row, col), value)
                        })
                        .collect();
                }
            }
        }

        fn apply_store(store: &mut CellStore, op: &Op) {
            match *op {
                Op::Set(r, c, v) => store.set_cell(r, c, v).unwrap(),
                Op::Remove(r, c) => {
                    store.remove_cell(r, c);
                }
                Op::ShiftRight(r, c, v) => store.insert_cell_shift_right(r, c, v).unwrap(),
                Op::ShiftDown(r, c, v) => store.insert_cell_shift_down(r, c, v).unwrap(),
                Op::AddRow(n) => {
                    store.add_row_in_between(n).unwrap();
                }
                Op::AddColumn(n) => {
                    store.add_column_in_between(n).unwrap();
                }
                Op::DeleteRow(n) => {
                    store.delete_row(n);
                }
                Op::DeleteColumn(n) => {
                    store.delete_column(n);
                }
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                failure_persistence: None,
                .. ProptestConfig::default()
            })]

            #[test]
            fn random_edits_match_model_and_keep_links_consistent(
                ops in proptest::collection::vec(op(), 0..40)
            ) {
                let mut store = CellStore::new();
                let mut model = Model::new();

                for op in &ops {
                    apply_store(&mut store, op);
                    apply_model(&mut model, op);
                    prop_assert_eq!(store.check_links(), Ok(()));
                }

                let actual: Vec<((u32, u32), CellValue)> = store
                    .iter()
                    .map(|n| ((n.row(), n.col()), n.value().clone()))
                    .collect();
                let expected: Vec<((u32, u32), CellValue)> = model.into_iter().collect();
                prop_assert_eq!(actual, expected);
            }

            #[test]
            fn add_then_delete_row_is_identity(
                ops in proptest::collection::vec(op(), 0..20),
                at in 1u32..10,
            ) {
                let mut store = CellStore::new();
                for op in &ops {
                    apply_store(&mut store, op);
                }
                let before: Vec<((u32, u32), CellValue)> = store
                    .iter()
                    .map(|n| ((n.row(), n.col()), n.value().clone()))
                    .collect();

                store.add_row_in_between(at).unwrap();
                store.delete_row(at);

                let after: Vec<((u32, u32), CellValue)> = store
                    .iter()
                    .map(|n| ((n.row(), n.col()), n.value().clone()))
                    .collect();
                prop_assert_eq!(after, before);
                prop_assert_eq!(store.check_links(), Ok(()));
            }
        }
    }
}
