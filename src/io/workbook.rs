//! Excel/ODS workbooks: read with calamine, write with rust_xlsxwriter.

use crate::error::{PipelineError, PipelineResult};
use crate::io::dates::{date_to_excel_serial, excel_serial_to_date};
use crate::io::table::{Cell, Table};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

/// Name of the single worksheet written by [`write_workbook`].
pub const OUTPUT_SHEET: &str = "Forecast";

/// Read one sheet; the first row holds the headers.
///
/// Blank rows are kept so row positions match the sheet.
///
/// With `sheet = None` the first sheet of the workbook is used.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> PipelineResult<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|e| PipelineError::read(path, e))?;
    let names = workbook.sheet_names();

    let name = match sheet {
        Some(name) if names.iter().any(|n| n == name) => name.to_string(),
        Some(name) => {
            return Err(PipelineError::read(
                path,
                format!("sheet '{name}' not found (available: {})", names.join(", ")),
            ))
        }
        None => names
            .first()
            .cloned()
            .ok_or_else(|| PipelineError::read(path, "workbook has no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| PipelineError::read(path, e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|c| to_cell(c).display()).collect())
        .unwrap_or_default();

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(to_cell).collect());
    }

    tracing::debug!(sheet = %name, rows = table.len(), "worksheet read");
    Ok(table)
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("{e:?}")),
    }
}

/// Write `table` to a new `.xlsx` file, replacing any existing file.
///
/// Dates are stored as Excel dates; empty cells are left blank.
pub fn write_workbook(table: &Table, path: &Path) -> PipelineResult<()> {
    build_workbook(table, path).map_err(|e| PipelineError::write(path, e))
}

fn build_workbook(table: &Table, path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    for (col, header) in table.headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }
    worksheet.set_column_width(0, 12)?;

    for (r, row) in table.rows().iter().enumerate() {
        let r = r as u32 + 1;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Empty => {}
                Cell::Number(v) if !v.is_finite() => {}
                Cell::Number(v) => {
                    worksheet.write_number(r, c, *v)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                Cell::Date(d) => {
                    let serial = date_to_excel_serial(*d);
                    worksheet.write_number_with_format(r, c, serial, &date_format)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
            }
        }
    }

    workbook.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Table {
        let mut table = Table::new(vec!["ds".into(), "ET_forecast".into(), "note".into()]);
        table.push_row(vec![
            Cell::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            Cell::Number(12.25),
            Cell::Text("first".into()),
        ]);
        table.push_row(vec![
            Cell::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            Cell::Empty,
            Cell::Bool(true),
        ]);
        table
    }

    #[test]
    fn workbook_round_trips_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        write_workbook(&sample(), &path).unwrap();
        let back = read_workbook(&path, Some(OUTPUT_SHEET)).unwrap();

        assert_eq!(back.headers(), sample().headers());
        assert_eq!(back, sample());
    }

    #[test]
    fn first_sheet_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        write_workbook(&sample(), &path).unwrap();

        let back = read_workbook(&path, None).unwrap();
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn unknown_sheet_lists_available_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        write_workbook(&sample(), &path).unwrap();

        let err = read_workbook(&path, Some("Snowmelt")).unwrap_err();
        assert!(err.to_string().contains("sheet 'Snowmelt' not found (available: Forecast)"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = read_workbook(Path::new("/nonexistent/input.xlsm"), None).unwrap_err();
        assert_eq!(err.stage(), "read");
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.xlsx");
        let err = write_workbook(&sample(), &path).unwrap_err();
        assert_eq!(err.stage(), "write");
    }
}
