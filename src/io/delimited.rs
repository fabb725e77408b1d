//! Comma-separated tables.

use crate::error::{PipelineError, PipelineResult};
use crate::io::table::{Cell, Table};
use std::path::Path;

/// Read a CSV file; the first record holds the headers.
///
/// Fields that parse as numbers become number cells, everything else text.
/// Blank lines become empty rows so row `i` stays on line `header + 1 + i`.
pub fn read_csv(path: &Path) -> PipelineResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::read(path, e))?;

    let mut records = reader.records();
    let Some(headers) = records.next() else {
        return Ok(Table::new(Vec::new()));
    };
    let headers = headers.map_err(|e| PipelineError::read(path, e))?;
    let header_line = line_of(&headers).unwrap_or(1);

    let mut table = Table::new(headers.iter().map(str::to_string).collect());
    for record in records {
        let record = record.map_err(|e| PipelineError::read(path, e))?;
        if let Some(line) = line_of(&record) {
            while header_line + 1 + (table.len() as u64) < line {
                table.push_row(Vec::new());
            }
        }
        table.push_row(record.iter().map(parse_field).collect());
    }

    Ok(table)
}

fn line_of(record: &csv::StringRecord) -> Option<u64> {
    record.position().map(csv::Position::line)
}

fn parse_field(field: &str) -> Cell {
    if field.is_empty() {
        return Cell::Empty;
    }
    match field.parse::<f64>() {
        Ok(v) => Cell::Number(v),
        Err(_) => Cell::Text(field.to_string()),
    }
}

/// Write `table` as CSV, replacing any existing file.
///
/// Dates are written as `YYYY-MM-DD`; numbers use the shortest
/// representation that reads back to the same value.
pub fn write_csv(table: &Table, path: &Path) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::write(path, e))?;

    writer
        .write_record(table.headers())
        .map_err(|e| PipelineError::write(path, e))?;
    for row in table.rows() {
        let fields = row.iter().map(|cell| match cell {
            Cell::Number(v) if !v.is_finite() => String::new(),
            other => other.display(),
        });
        writer
            .write_record(fields)
            .map_err(|e| PipelineError::write(path, e))?;
    }

    writer.flush().map_err(|e| PipelineError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn csv_round_trips_numbers_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut table = Table::new(vec!["ds".into(), "Snowmelt_forecast".into()]);
        table.push_row(vec![
            Cell::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            Cell::Number(0.1 + 0.2),
        ]);
        table.push_row(vec![
            Cell::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            Cell::Number(f64::NAN),
        ]);
        write_csv(&table, &path).unwrap();

        let back = read_csv(&path).unwrap();
        assert_eq!(back.headers(), table.headers());
        assert_eq!(back.rows()[0][0], Cell::Text("2024-01-01".into()));
        assert_eq!(back.rows()[0][1], Cell::Number(0.1 + 0.2));
        assert_eq!(back.rows()[1][1], Cell::Empty);
    }

    #[test]
    fn csv_reader_keeps_blank_rows_and_pads_short_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, "Month-Year,ET\nJan-2020, 4.5\n,\n\n\nFeb-2020\n").unwrap();

        let table = read_csv(&path).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.rows()[0][1], Cell::Number(4.5));
        assert!(table.rows()[1..4].iter().flatten().all(Cell::is_empty));
        assert_eq!(table.rows()[4][0], Cell::Text("Feb-2020".into()));
        assert_eq!(table.rows()[4][1], Cell::Empty);
    }

    #[test]
    fn empty_csv_has_no_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        let table = read_csv(&path).unwrap();
        assert!(table.headers().is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn missing_csv_is_a_read_error() {
        let err = read_csv(Path::new("/nonexistent/in.csv")).unwrap_err();
        assert_eq!(err.stage(), "read");
    }
}
