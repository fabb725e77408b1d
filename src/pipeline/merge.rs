//! Merged forecast table: several variables joined on timestamp.

use crate::error::{PipelineError, PipelineResult};
use crate::io::{normalize_dates, Cell, Table};
use crate::pipeline::series::ForecastSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Header of the timestamp column.
pub const DATE_HEADER: &str = "ds";

/// Point, lower and upper values of one variable on one row.
pub type Triple = [Option<f64>; 3];

/// Column suffixes in output order.
const SUFFIXES: [&str; 3] = ["_forecast", "_lower", "_upper"];

/// Forecasts of one or more variables on a shared, ascending timestamp axis.
///
/// A variable missing at a timestamp holds `None` in its three columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastTable {
    variables: Vec<String>,
    timestamps: Vec<NaiveDate>,
    /// `values[row][variable]`
    values: Vec<Vec<Triple>>,
}

impl ForecastTable {
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Values of `variable` on every row.
    pub fn column(&self, variable: &str) -> Option<Vec<Triple>> {
        let idx = self.variables.iter().position(|v| v == variable)?;
        Some(self.values.iter().map(|row| row[idx]).collect())
    }

    /// Column headers: `ds`, then three per variable.
    pub fn headers(&self) -> Vec<String> {
        std::iter::once(DATE_HEADER.to_string())
            .chain(
                self.variables
                    .iter()
                    .flat_map(|v| SUFFIXES.iter().map(move |s| format!("{v}{s}"))),
            )
            .collect()
    }

    /// Convert to a sheet for export.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(self.headers());
        for (date, row) in self.timestamps.iter().zip(&self.values) {
            let mut cells = vec![Cell::Date(*date)];
            cells.extend(row.iter().flatten().map(|v| Cell::from_option(*v)));
            table.push_row(cells);
        }
        table
    }

    /// Rebuild from a previously exported sheet.
    pub fn from_table(table: &Table) -> PipelineResult<Self> {
        let variables: Vec<String> = table
            .headers()
            .iter()
            .filter_map(|h| h.strip_suffix(SUFFIXES[0]).map(str::to_string))
            .collect();

        let dates = normalize_dates(&table.column(DATE_HEADER)?, 2)?;
        let mut columns = Vec::with_capacity(variables.len());
        for variable in &variables {
            let mut triple_columns = Vec::with_capacity(3);
            for suffix in SUFFIXES {
                let name = format!("{variable}{suffix}");
                let cells = table.column(&name)?;
                let values = cells
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| match cell {
                        Cell::Empty => Ok(None),
                        Cell::Number(v) => Ok(Some(*v)),
                        other => Err(PipelineError::InvalidValue {
                            column: name.clone(),
                            row: i + 2,
                            value: other.display(),
                        }),
                    })
                    .collect::<PipelineResult<Vec<_>>>()?;
                triple_columns.push(values);
            }
            columns.push(triple_columns);
        }

        let mut timestamps = Vec::with_capacity(dates.len());
        let mut values = Vec::with_capacity(dates.len());
        for (i, date) in dates.into_iter().enumerate() {
            let Some(date) = date else {
                let blank = columns.iter().flatten().all(|column| column[i].is_none());
                if blank {
                    continue;
                }
                return Err(PipelineError::DateParse {
                    row: i + 2,
                    value: String::new(),
                });
            };
            timestamps.push(date);
            values.push(
                columns
                    .iter()
                    .map(|c| [c[0][i], c[1][i], c[2][i]])
                    .collect(),
            );
        }

        Ok(Self {
            variables,
            timestamps,
            values,
        })
    }
}

impl From<&ForecastSeries> for ForecastTable {
    fn from(series: &ForecastSeries) -> Self {
        let mut rows: Vec<_> = series.rows.iter().collect();
        rows.sort_by_key(|r| r.timestamp);

        Self {
            variables: vec![series.variable.clone()],
            timestamps: rows.iter().map(|r| r.timestamp).collect(),
            values: rows
                .iter()
                .map(|r| vec![[Some(r.forecast), Some(r.lower), Some(r.upper)]])
                .collect(),
        }
    }
}

/// Outer join of two tables on timestamp, ascending.
///
/// Columns of `a` come first. Timestamps present on one side only carry
/// `None` for the other side's columns. Fails if a variable appears on both
/// sides.
pub fn combine(a: &ForecastTable, b: &ForecastTable) -> PipelineResult<ForecastTable> {
    if let Some(dup) = a.variables.iter().find(|v| b.variables.contains(v)) {
        return Err(PipelineError::Combine(format!(
            "variable '{dup}' appears in both tables"
        )));
    }

    let width_a = a.variables.len();
    let width_b = b.variables.len();
    let mut merged: BTreeMap<NaiveDate, Vec<Triple>> = BTreeMap::new();

    for (date, row) in a.timestamps.iter().zip(&a.values) {
        let entry = merged
            .entry(*date)
            .or_insert_with(|| vec![[None; 3]; width_a + width_b]);
        entry[..width_a].copy_from_slice(row);
    }
    for (date, row) in b.timestamps.iter().zip(&b.values) {
        let entry = merged
            .entry(*date)
            .or_insert_with(|| vec![[None; 3]; width_a + width_b]);
        entry[width_a..].copy_from_slice(row);
    }

    let mut variables = a.variables.clone();
    variables.extend(b.variables.iter().cloned());
    let (timestamps, values) = merged.into_iter().unzip();

    Ok(ForecastTable {
        variables,
        timestamps,
        values,
    })
}
