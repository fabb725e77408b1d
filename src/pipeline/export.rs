//! Writing the merged forecast table to disk and reading it back.
//!
//! The file extension picks the format: `.xlsx` goes through the workbook
//! writer, `.csv` through the delimited writer. Both keep the `ds`,
//! `<name>_forecast`, `<name>_lower`, `<name>_upper` column layout.

use crate::error::{PipelineError, PipelineResult};
use crate::io::{read_table, write_table};
use crate::pipeline::merge::ForecastTable;
use std::path::Path;

/// Write `table` to `destination`; the extension picks `.xlsx` or `.csv`.
///
/// An existing file is replaced. Missing values are written as empty cells.
pub fn export(table: &ForecastTable, destination: &Path) -> PipelineResult<()> {
    if let Some(dir) = destination.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.is_dir() {
            return Err(PipelineError::write(
                destination,
                format!("directory {} does not exist", dir.display()),
            ));
        }
    }

    write_table(&table.to_table(), destination)?;
    tracing::info!(
        path = %destination.display(),
        rows = table.len(),
        variables = table.variables().len(),
        "forecast exported"
    );
    Ok(())
}

/// Read back a file written by [`export`].
pub fn read_export(source: &Path) -> PipelineResult<ForecastTable> {
    ForecastTable::from_table(&read_table(source, None)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::merge::combine;
    use crate::pipeline::series::{ForecastRow, ForecastSeries};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn table() -> ForecastTable {
        let series = |name: &str, start: u32, scale: f64| ForecastSeries {
            variable: name.into(),
            rows: (start..start + 4)
                .map(|m| ForecastRow {
                    timestamp: NaiveDate::from_ymd_opt(2023, m, 1).unwrap(),
                    forecast: scale * m as f64 / 3.0,
                    lower: 0.0,
                    upper: scale * m as f64,
                })
                .collect(),
        };
        combine(
            &ForecastTable::from(&series("ET", 1, 1.5)),
            &ForecastTable::from(&series("Precip", 3, 0.1)),
        )
        .unwrap()
    }

    fn assert_same(a: &ForecastTable, b: &ForecastTable) {
        assert_eq!(a.variables(), b.variables());
        assert_eq!(a.timestamps(), b.timestamps());
        for variable in a.variables() {
            let (left, right) = (a.column(variable).unwrap(), b.column(variable).unwrap());
            for (l, r) in left.iter().zip(&right) {
                for (x, y) in l.iter().zip(r) {
                    match (x, y) {
                        (Some(x), Some(y)) => assert_relative_eq!(*x, *y, max_relative = 1e-12),
                        (None, None) => {}
                        _ => panic!("presence differs: {x:?} vs {y:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn xlsx_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.xlsx");
        let original = table();
        export(&original, &path).unwrap();
        assert_same(&original, &read_export(&path).unwrap());
    }

    #[test]
    fn csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        let original = table();
        export(&original, &path).unwrap();
        assert_same(&original, &read_export(&path).unwrap());
    }

    #[test]
    fn existing_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        std::fs::write(&path, "stale").unwrap();
        export(&table(), &path).unwrap();
        assert_eq!(read_export(&path).unwrap().len(), 6);
    }

    #[test]
    fn missing_directory_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("forecast.xlsx");
        let err = export(&table(), &path).unwrap_err();
        assert_eq!(err.stage(), "write");
        assert!(!path.exists());
    }
}
