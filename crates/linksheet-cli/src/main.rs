//! linksheet CLI - load CSV data into a sparse grid and query it

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use linksheet::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "linksheet")]
#[command(author, version, about = "Load CSV data into a sparse grid and evaluate formulas")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ImportArgs {
    /// Input CSV file
    input: PathBuf,

    /// The first CSV line is data, not a header
    #[arg(long)]
    no_header: bool,

    /// Leave the header line out of the grid
    #[arg(long, conflicts_with = "no_header")]
    skip_header: bool,

    /// Top-left cell the data is written to
    #[arg(long, default_value = "A1")]
    at: String,

    /// Rows per background chunk for large files
    #[arg(long, default_value_t = BatchOptions::default().chunk_rows)]
    chunk_rows: usize,

    /// Cell count above which the import runs on worker threads
    #[arg(long, default_value_t = BatchOptions::default().background_threshold)]
    threshold: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the grid row by row with formulas resolved
    Show {
        #[command(flatten)]
        import: ImportArgs,

        /// Walk columns instead of rows
        #[arg(long)]
        by_column: bool,

        /// Print raw stored values instead of resolved ones
        #[arg(long)]
        raw: bool,
    },

    /// Evaluate a formula such as "=SUM(A1:B4)" against the data
    Eval {
        #[command(flatten)]
        import: ImportArgs,

        /// Formula text
        formula: String,
    },

    /// Print per-row and per-column sums and averages over a range
    Stats {
        #[command(flatten)]
        import: ImportArgs,

        /// Selection, e.g. "B2:D10"
        range: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Show {
            import,
            by_column,
            raw,
        } => show(&import, by_column, raw),
        Commands::Eval { import, formula } => eval(&import, &formula),
        Commands::Stats { import, range } => stats(&import, &range),
    }
}

/// Initialize logging; `log` records from the libraries are forwarded too
fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

fn show(import: &ImportArgs, by_column: bool, raw: bool) -> Result<()> {
    let sheet = load_sheet(import)?;
    let store = sheet.store();

    if raw {
        let dump = if by_column {
            store.format_by_column()
        } else {
            store.format_by_row()
        };
        if !dump.is_empty() {
            println!("{}", dump);
        }
        return Ok(());
    }

    if by_column {
        for col in store.column_indices() {
            let values = join_resolved(sheet.column_values(col));
            println!("Column {}: {}", CellAddress::column_to_letters(col), values);
        }
    } else {
        for row in store.row_indices() {
            println!("Row {}: {}", row, join_resolved(sheet.row_values(row)));
        }
    }
    Ok(())
}

fn eval(import: &ImportArgs, formula: &str) -> Result<()> {
    let sheet = load_sheet(import)?;

    let value = match sheet.evaluate(formula) {
        Ok(value) => value,
        Err(e) => {
            warn!("{}: {}", formula, e);
            FormulaValue::from(e)
        }
    };
    println!("{}", value);
    Ok(())
}

fn stats(import: &ImportArgs, range: &str) -> Result<()> {
    let selection =
        CellRange::parse(range).with_context(|| format!("Invalid range '{}'", range))?;
    let sheet = load_sheet(import)?;

    let stats = sheet.selection_stats(&selection);
    println!("{}", stats);
    Ok(())
}

fn load_sheet(import: &ImportArgs) -> Result<Sheet> {
    let anchor = CellAddress::parse(&import.at)
        .with_context(|| format!("Invalid anchor cell '{}'", import.at))?;
    let (header, records) = read_csv(&import.input, !import.no_header)?;

    let options = ImportOptions::new()
        .first_row(anchor.row)
        .first_col(anchor.col)
        .has_header(!import.no_header && !import.skip_header);

    let mut sheet = Sheet::new();
    let header_cells = if options.has_header { header.len() } else { 0 };
    if header_cells == 0 && records.iter().all(Vec::is_empty) {
        warn!("{} contains no data", import.input.display());
        return Ok(sheet);
    }

    let batch_options = BatchOptions::new()
        .chunk_rows(import.chunk_rows)
        .background_threshold(import.threshold);
    let mut applier = BatchApplier::with_options(batch_options);

    let workers = applier
        .submit_import(header, records, &options)
        .context("Failed to prepare import")?;
    let applied = applier
        .finish(sheet.store_mut())
        .context("Failed to apply import")?;

    info!(
        "loaded {} cells from {} ({} worker threads)",
        applied,
        import.input.display(),
        workers
    );
    Ok(sheet)
}

/// Read the header line (when present) and every record as raw text
fn read_csv(path: &Path, has_header: bool) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;

    let header: Vec<String> = if has_header {
        reader
            .headers()
            .with_context(|| format!("Failed to read header of '{}'", path.display()))?
            .iter()
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    let mut records = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", i + 1))?;
        records.push(record.iter().map(str::to_string).collect());
    }

    debug!(
        "read {} CSV records from {} (header: {})",
        records.len(),
        path.display(),
        has_header
    );
    Ok((header, records))
}

fn join_resolved(values: Vec<(u32, FormulaValue)>) -> String {
    values
        .into_iter()
        .map(|(_, value)| match value {
            FormulaValue::Empty => "null".to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}
