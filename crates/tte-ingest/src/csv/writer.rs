//! CSV output of result tables.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::{IngestError, Result};

/// Writes `df` to `path` as comma-separated UTF-8 with a header row.
///
/// Missing values are written as empty cells.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| IngestError::FileCreate {
        path: path.to_path_buf(),
        source: e,
    })?;

    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .map_err(|e| IngestError::CsvWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    tracing::debug!(path = %path.display(), rows = df.height(), "table written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_csv_with_missing_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("result.csv");
        let mut df = DataFrame::new(vec![
            Series::new("id".into(), vec!["S1", "S2"]).into(),
            Series::new("time".into(), vec![Some(9.0), None]).into(),
        ])
        .unwrap();

        write_csv(&mut df, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("id,time\nS1,9"));
        assert!(written.ends_with("S2,\n"));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("result.csv");
        let mut df = DataFrame::new(vec![Series::new("id".into(), vec!["S1"]).into()]).unwrap();

        assert!(matches!(
            write_csv(&mut df, &path),
            Err(IngestError::FileCreate { .. })
        ));
    }
}
