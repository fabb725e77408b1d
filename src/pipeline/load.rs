//! Turn an input sheet into one history series per configured variable.

use crate::core::TimeSeries;
use crate::error::{PipelineError, PipelineResult};
use crate::io::{normalize_dates, Cell, Table};
use crate::pipeline::config::VariableSpec;
use std::collections::HashMap;

/// Sheet row of the first data row (row 1 holds the headers).
const FIRST_DATA_ROW: usize = 2;

/// Resolve the date column and each variable column of `table`.
///
/// Rows whose date and variable cells are all empty are skipped. Empty value
/// cells become NaN: the engine leaves them out of the fit but still predicts
/// at their dates. Every column is resolved before any value is read, so a
/// missing header is reported ahead of cell-level problems.
pub fn load_histories(
    table: &Table,
    date_column: &str,
    variables: &[VariableSpec],
) -> PipelineResult<Vec<TimeSeries>> {
    let date_idx = table.column_index(date_column)?;
    let value_idx = variables
        .iter()
        .map(|v| table.column_index(&v.column))
        .collect::<PipelineResult<Vec<_>>>()?;

    let date_cells: Vec<&Cell> = table.rows().iter().map(|row| &row[date_idx]).collect();
    let dates = normalize_dates(&date_cells, FIRST_DATA_ROW)?;

    let mut seen = HashMap::new();
    let mut stamps = Vec::with_capacity(dates.len());
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(dates.len()); variables.len()];
    let mut skipped = 0usize;

    for (i, (row, date)) in table.rows().iter().zip(dates).enumerate() {
        let sheet_row = FIRST_DATA_ROW + i;
        let cells: Vec<&Cell> = value_idx.iter().map(|&c| &row[c]).collect();

        let Some(date) = date else {
            if cells.iter().all(|c| c.is_empty()) {
                skipped += 1;
                continue;
            }
            return Err(PipelineError::DateParse {
                row: sheet_row,
                value: String::new(),
            });
        };

        if let Some(first_row) = seen.insert(date, sheet_row) {
            return Err(PipelineError::DuplicateDate {
                row: sheet_row,
                first_row,
                date,
            });
        }

        stamps.push(date);
        for ((cell, spec), column) in cells.iter().zip(variables).zip(&mut columns) {
            column.push(numeric(cell, &spec.column, sheet_row)?);
        }
    }

    if skipped > 0 {
        tracing::warn!(rows = skipped, "skipped rows without a date or values");
    }

    let mut order: Vec<usize> = (0..stamps.len()).collect();
    order.sort_by_key(|&i| stamps[i]);
    let sorted_stamps: Vec<_> = order.iter().map(|&i| stamps[i]).collect();

    variables
        .iter()
        .zip(columns)
        .map(|(spec, values)| {
            let values = order.iter().map(|&i| values[i]).collect();
            let series = TimeSeries::new(sorted_stamps.clone(), values)
                .map_err(|source| PipelineError::ModelFit {
                    variable: spec.name.clone(),
                    source,
                })?
                .with_label(spec.name.clone());

            let missing = series.values().iter().filter(|v| v.is_nan()).count();
            tracing::info!(
                variable = %spec.name,
                rows = series.len(),
                missing,
                "history loaded"
            );
            Ok(series)
        })
        .collect()
}

fn numeric(cell: &Cell, column: &str, row: usize) -> PipelineResult<f64> {
    let invalid = || PipelineError::InvalidValue {
        column: column.to_string(),
        row,
        value: cell.display(),
    };

    match cell {
        Cell::Empty => Ok(f64::NAN),
        Cell::Number(v) if v.is_finite() => Ok(*v),
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}
