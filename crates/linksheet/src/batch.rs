//! Bulk cell application
//!
//! Producers turn pasted blocks or imported records into [`CellUpdate`]
//! triples. They are pure and may run on worker threads; only the owning
//! thread applies their output, through [`CellStore::set_cell`], in the order
//! the batches arrive.
//!
//! # Example
//!
//! ```rust
//! use linksheet::batch::{paste_block, apply_updates};
//! use linksheet::{CellStore, CellValue};
//!
//! let grid = vec![
//!     vec!["1".to_string(), "2".to_string()],
//!     vec!["=SUM(A1:B1)".to_string()],
//! ];
//! let updates = paste_block(1, 1, &grid).unwrap();
//! assert_eq!(updates.len(), 4);
//!
//! let mut store = CellStore::new();
//! apply_updates(&mut store, &updates).unwrap();
//! assert_eq!(store.get_cell_value(2, 2), Some(&CellValue::from("")));
//! ```

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use linksheet_core::{CellStore, CellValue, MAX_COLS, MAX_ROWS};
use log::{debug, warn};
use thiserror::Error;

use crate::options::{BatchOptions, ImportOptions};

/// Errors raised while producing or applying batches
#[derive(Debug, Error)]
pub enum BatchError {
    /// Block with no rows or no columns
    #[error("Pasted block is empty")]
    EmptyBlock,

    /// A producer thread panicked before sending its updates
    #[error("Batch worker '{0}' panicked")]
    WorkerPanicked(String),

    /// The OS refused to start a worker thread
    #[error("Failed to spawn batch worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// Store rejected an update
    #[error(transparent)]
    Core(#[from] linksheet_core::Error),
}

/// Result type for batch operations
pub type BatchResult<T> = std::result::Result<T, BatchError>;

/// A single pending write
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
}

impl CellUpdate {
    pub fn new<V: Into<CellValue>>(row: u32, col: u32, value: V) -> Self {
        Self {
            row,
            col,
            value: value.into(),
        }
    }
}

/// Turn a 2-D block of raw text into row-major updates anchored at
/// (`start_row`, `start_col`)
///
/// Short rows are padded with empty strings up to the widest row. Text is
/// interpreted with [`CellValue::from_input`].
pub fn paste_block(
    start_row: u32,
    start_col: u32,
    grid: &[Vec<String>],
) -> BatchResult<Vec<CellUpdate>> {
    let width = block_width(grid);
    check_block(start_row, start_col, grid.len(), width)?;
    Ok(block_updates(start_row, start_col, width, grid))
}

/// Turn a header and its records into updates
///
/// The header occupies `options.first_row` when `options.has_header` is
/// set, and the records follow it.
pub fn import_records(
    header: &[String],
    records: &[Vec<String>],
    options: &ImportOptions,
) -> BatchResult<Vec<CellUpdate>> {
    let rows: Vec<&[String]> = options
        .has_header
        .then_some(header)
        .into_iter()
        .chain(records.iter().map(Vec::as_slice))
        .collect();

    let width = block_width(&rows);
    check_block(options.first_row, options.first_col, rows.len(), width)?;
    Ok(block_updates(options.first_row, options.first_col, width, &rows))
}

/// Apply updates in order through `set_cell`
///
/// Stops at the first rejected update; earlier updates stay applied.
pub fn apply_updates(store: &mut CellStore, updates: &[CellUpdate]) -> linksheet_core::Result<usize> {
    for update in updates {
        store.set_cell(update.row, update.col, update.value.clone())?;
    }
    debug!("applied {} cell updates", updates.len());
    Ok(updates.len())
}

fn apply_batch(store: &mut CellStore, batch: Vec<CellUpdate>) -> linksheet_core::Result<usize> {
    let count = batch.len();
    for update in batch {
        store.set_cell(update.row, update.col, update.value)?;
    }
    Ok(count)
}

fn block_width<R: AsRef<[String]>>(rows: &[R]) -> usize {
    rows.iter().map(|row| row.as_ref().len()).max().unwrap_or(0)
}

fn check_block(start_row: u32, start_col: u32, rows: usize, width: usize) -> BatchResult<()> {
    if rows == 0 || width == 0 {
        return Err(BatchError::EmptyBlock);
    }

    let last_row = u64::from(start_row) + rows as u64 - 1;
    if start_row == 0 || last_row > u64::from(MAX_ROWS) {
        let row = if start_row == 0 { 0 } else { u32::try_from(last_row).unwrap_or(u32::MAX) };
        return Err(linksheet_core::Error::RowOutOfBounds(row, MAX_ROWS).into());
    }

    let last_col = u64::from(start_col) + width as u64 - 1;
    if start_col == 0 || last_col > u64::from(MAX_COLS) {
        let col = if start_col == 0 { 0 } else { u32::try_from(last_col).unwrap_or(u32::MAX) };
        return Err(linksheet_core::Error::ColumnOutOfBounds(col, MAX_COLS).into());
    }
    Ok(())
}

// Caller has validated the block against the grid
fn block_updates<R: AsRef<[String]>>(
    start_row: u32,
    start_col: u32,
    width: usize,
    rows: &[R],
) -> Vec<CellUpdate> {
    let mut updates = Vec::with_capacity(rows.len() * width);
    for (i, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        for j in 0..width {
            let value = match row.get(j) {
                Some(text) => CellValue::from_input(text),
                None => CellValue::string(""),
            };
            updates.push(CellUpdate::new(start_row + i as u32, start_col + j as u32, value));
        }
    }
    updates
}

/// Collects batches from worker threads and applies them on the owning
/// thread
///
/// Workers never see the store. [`BatchApplier::drain`] applies whatever
/// has arrived so far; [`BatchApplier::finish`] waits for every worker.
#[derive(Debug)]
pub struct BatchApplier {
    options: BatchOptions,
    sender: Sender<Vec<CellUpdate>>,
    receiver: Receiver<Vec<CellUpdate>>,
    workers: Vec<JoinHandle<()>>,
    spawned: usize,
}

impl BatchApplier {
    /// Create an applier with default options
    pub fn new() -> Self {
        Self::with_options(BatchOptions::default())
    }

    /// Create an applier with custom options
    pub fn with_options(options: BatchOptions) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            options,
            sender,
            receiver,
            workers: Vec::new(),
            spawned: 0,
        }
    }

    /// Get the options
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Run a producer on its own worker thread
    pub fn submit<F>(&mut self, producer: F) -> BatchResult<()>
    where
        F: FnOnce() -> Vec<CellUpdate> + Send + 'static,
    {
        let sender = self.sender.clone();
        let name = format!("linksheet-batch-{}", self.spawned);
        let thread_name = name.clone();

        let handle = thread::Builder::new().name(thread_name).spawn(move || {
            let updates = producer();
            let count = updates.len();
            if sender.send(updates).is_err() {
                debug!("{}: applier dropped, discarding {} updates", name, count);
            }
        })?;

        self.spawned += 1;
        self.workers.push(handle);
        Ok(())
    }

    /// Queue updates that were computed on the owning thread
    pub fn enqueue(&self, updates: Vec<CellUpdate>) {
        // The receiver lives in `self`, so the channel is open
        let _ = self.sender.send(updates);
    }

    /// Paste a block of raw text at (`start_row`, `start_col`)
    ///
    /// Blocks above the background threshold are split into chunks of
    /// `chunk_rows` rows, each computed on a worker. Smaller blocks are
    /// computed inline and queued. Returns the number of workers started.
    pub fn submit_paste(
        &mut self,
        start_row: u32,
        start_col: u32,
        grid: Vec<Vec<String>>,
    ) -> BatchResult<usize> {
        let width = block_width(&grid);
        check_block(start_row, start_col, grid.len(), width)?;

        let cells = grid.len() * width;
        if cells <= self.options.background_threshold {
            self.enqueue(block_updates(start_row, start_col, width, &grid));
            return Ok(0);
        }

        let chunk_rows = self.options.chunk_rows.max(1);
        let mut rest = grid;
        let mut chunk_start = start_row;
        let mut chunks = 0;
        while !rest.is_empty() {
            let tail = rest.split_off(chunk_rows.min(rest.len()));
            let chunk = std::mem::replace(&mut rest, tail);
            let first_row = chunk_start;
            chunk_start += chunk.len() as u32;

            self.submit(move || block_updates(first_row, start_col, width, &chunk))?;
            chunks += 1;
        }

        debug!(
            "paste of {} cells at ({}, {}) split into {} background chunks",
            cells, start_row, start_col, chunks
        );
        Ok(chunks)
    }

    /// Import a header and its records, splitting large imports over
    /// workers like [`BatchApplier::submit_paste`]
    pub fn submit_import(
        &mut self,
        header: Vec<String>,
        records: Vec<Vec<String>>,
        options: &ImportOptions,
    ) -> BatchResult<usize> {
        let mut grid = Vec::with_capacity(records.len() + 1);
        if options.has_header {
            grid.push(header);
        }
        grid.extend(records);
        self.submit_paste(options.first_row, options.first_col, grid)
    }

    /// Apply every batch that has already arrived, without blocking
    ///
    /// Returns the number of cells written.
    pub fn drain(&mut self, store: &mut CellStore) -> BatchResult<usize> {
        let mut applied = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(batch) => applied += apply_batch(store, batch)?,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if applied > 0 {
            debug!("drained {} cell updates", applied);
        }
        Ok(applied)
    }

    /// Wait for every worker, then apply everything they produced
    ///
    /// Output of workers that finished is applied even when another worker
    /// panicked; the panic is reported afterwards.
    pub fn finish(mut self, store: &mut CellStore) -> BatchResult<usize> {
        let mut panicked: Option<String> = None;
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("linksheet-batch").to_string();
            if handle.join().is_err() {
                warn!("batch worker {} panicked", name);
                panicked.get_or_insert(name);
            }
        }

        let applied = self.drain(store)?;
        match panicked {
            Some(name) => Err(BatchError::WorkerPanicked(name)),
            None => Ok(applied),
        }
    }

}

impl Default for BatchApplier {
    fn default() -> Self {
        Self::new()
    }
}
