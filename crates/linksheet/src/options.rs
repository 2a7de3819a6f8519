//! Options for bulk cell producers

/// Options for pasting and applying large blocks
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Rows per worker chunk when a block is computed in the background
    pub chunk_rows: usize,
    /// Blocks with more cells than this are split across worker threads
    pub background_threshold: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            chunk_rows: 1000,
            background_threshold: 10_000,
        }
    }
}

impl BatchOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rows per chunk
    pub fn chunk_rows(mut self, rows: usize) -> Self {
        self.chunk_rows = rows.max(1);
        self
    }

    /// Set the background threshold in cells
    pub fn background_threshold(mut self, cells: usize) -> Self {
        self.background_threshold = cells;
        self
    }
}

/// Options for importing header + records
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Row the import starts at (1-based)
    pub first_row: u32,
    /// Column the import starts at (1-based)
    pub first_col: u32,
    /// Write the header as the first imported row
    pub has_header: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            first_row: 1,
            first_col: 1,
            has_header: true,
        }
    }
}

impl ImportOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting row
    pub fn first_row(mut self, row: u32) -> Self {
        self.first_row = row;
        self
    }

    /// Set the starting column
    pub fn first_col(mut self, col: u32) -> Self {
        self.first_col = col;
        self
    }

    /// Set whether the header row is written
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}
