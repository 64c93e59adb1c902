//! Roster ingestion for time-to-event derivation.
//!
//! Loads roster CSV files into Polars DataFrames and writes result tables
//! back out. Every column is read as text, so identifiers such as `001`
//! keep their leading zeros and dates are parsed later by the engine.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use tte_ingest::{read_csv_table, write_csv};
//!
//! let mut df = read_csv_table(Path::new("roster.csv"))?;
//! write_csv(&mut df, Path::new("copy.csv"))?;
//! ```

mod csv;
mod error;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV ===
pub use csv::{
    MAX_CSV_FILE_SIZE, check_file_size, check_file_size_with_limit, read_csv_table,
    validate_dataframe_shape, validate_encoding, write_csv,
};
