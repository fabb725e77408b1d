//! Spreadsheet input and output.
//!
//! The file extension picks the format: `.xlsx`, `.xlsm`, `.xls`, `.xlsb` and
//! `.ods` are workbooks, `.csv` is comma-separated text.

pub mod dates;
pub mod delimited;
pub mod table;
pub mod workbook;

pub use dates::{normalize_dates, parse_date};
pub use table::{Cell, Table};

use crate::error::{PipelineError, PipelineResult};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Workbook,
    Csv,
}

fn file_kind(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(FileKind::Workbook),
        "csv" => Some(FileKind::Csv),
        _ => None,
    }
}

/// Read a sheet from `path`. `sheet` is ignored for CSV input.
pub fn read_table(path: &Path, sheet: Option<&str>) -> PipelineResult<Table> {
    match file_kind(path) {
        Some(FileKind::Workbook) => workbook::read_workbook(path, sheet),
        Some(FileKind::Csv) => delimited::read_csv(path),
        None => Err(PipelineError::read(path, "unsupported input format")),
    }
}

/// Write `table` to `path`, overwriting any existing file.
///
/// Workbook output is always written as `.xlsx`; macro-enabled and legacy
/// formats are rejected.
pub fn write_table(table: &Table, path: &Path) -> PipelineResult<()> {
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));

    match file_kind(path) {
        Some(FileKind::Workbook) if is_xlsx => workbook::write_workbook(table, path),
        Some(FileKind::Csv) => delimited::write_csv(table, path),
        _ => Err(PipelineError::write(
            path,
            "unsupported output format (use .xlsx or .csv)",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_follows_extension() {
        assert_eq!(file_kind(Path::new("a.XLSM")), Some(FileKind::Workbook));
        assert_eq!(file_kind(Path::new("a.csv")), Some(FileKind::Csv));
        assert_eq!(file_kind(Path::new("a.json")), None);
        assert_eq!(file_kind(Path::new("noext")), None);
    }

    #[test]
    fn unsupported_output_is_a_write_error() {
        let table = Table::new(vec!["ds".into()]);
        let err = write_table(&table, Path::new("out.xlsm")).unwrap_err();
        assert_eq!(err.stage(), "write");
        let err = write_table(&table, Path::new("out.parquet")).unwrap_err();
        assert!(err.to_string().contains("unsupported output format"));
    }

    #[test]
    fn unsupported_input_is_a_read_error() {
        let err = read_table(Path::new("in.txt"), None).unwrap_err();
        assert_eq!(err.stage(), "read");
    }
}
