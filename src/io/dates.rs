//! Date column normalization.
//!
//! Text cells are first tried against the two structured layouts used by the
//! input workbooks, `YYYY-MM` and `MMM-YYYY`, for the whole column. When
//! neither covers every cell, each cell falls back to autodetection over a
//! list of common layouts. Native spreadsheet dates pass through unchanged
//! and bare numbers are read as Excel serial dates.

use crate::error::{PipelineError, PipelineResult};
use crate::io::table::Cell;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// Layouts tried for the whole column before per-cell autodetection.
const STRUCTURED: [DateLayout; 2] = [
    DateLayout::Month("%Y-%m"),
    DateLayout::Month("%b-%Y"),
];

/// Layouts tried per cell, in order.
const AUTODETECT: [DateLayout; 16] = [
    DateLayout::Month("%Y-%m"),
    DateLayout::Month("%b-%Y"),
    DateLayout::Day("%Y-%m-%d"),
    DateLayout::DateTime("%Y-%m-%d %H:%M:%S"),
    DateLayout::DateTime("%Y-%m-%dT%H:%M:%S"),
    DateLayout::DateTime("%Y-%m-%d %H:%M"),
    DateLayout::Day("%m/%d/%Y"),
    DateLayout::Day("%Y/%m/%d"),
    DateLayout::Day("%d-%b-%Y"),
    DateLayout::Day("%B %d, %Y"),
    DateLayout::Month("%Y/%m"),
    DateLayout::Month("%m/%Y"),
    DateLayout::Month("%m-%Y"),
    DateLayout::Month("%B %Y"),
    DateLayout::Month("%b %Y"),
    DateLayout::Month("%B-%Y"),
];

/// Excel's day zero for serial dates (1900 date system).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

#[derive(Debug, Clone, Copy)]
enum DateLayout {
    /// Month precision; normalizes to the first day of the month.
    Month(&'static str),
    Day(&'static str),
    DateTime(&'static str),
}

impl DateLayout {
    fn parse(&self, text: &str) -> Option<NaiveDate> {
        match self {
            DateLayout::Month(fmt) => {
                NaiveDate::parse_from_str(&format!("01|{text}"), &format!("%d|{fmt}")).ok()
            }
            DateLayout::Day(fmt) => NaiveDate::parse_from_str(text, fmt).ok(),
            DateLayout::DateTime(fmt) => NaiveDateTime::parse_from_str(text, fmt)
                .ok()
                .map(|dt| dt.date()),
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            DateLayout::Month(fmt) | DateLayout::Day(fmt) | DateLayout::DateTime(fmt) => fmt,
        }
    }
}

/// Parse one piece of text with autodetection.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    AUTODETECT
        .iter()
        .find_map(|layout| layout.parse(text))
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Convert an Excel serial day number to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Convert a date to an Excel serial day number.
pub fn date_to_excel_serial(date: NaiveDate) -> f64 {
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)
        .map(|epoch| (date - epoch).num_days() as f64)
        .unwrap_or(f64::NAN)
}

/// Normalize a date column.
///
/// Empty cells map to `None`. `first_row` is the 1-based sheet row of the
/// first cell, used in error messages.
pub fn normalize_dates(
    cells: &[&Cell],
    first_row: usize,
) -> PipelineResult<Vec<Option<NaiveDate>>> {
    let texts: Vec<&str> = cells
        .iter()
        .filter_map(|cell| match cell {
            Cell::Text(s) => Some(s.trim()),
            _ => None,
        })
        .collect();

    let structured = STRUCTURED
        .iter()
        .find(|layout| !texts.is_empty() && texts.iter().all(|t| layout.parse(t).is_some()));
    match structured {
        Some(layout) => tracing::debug!(format = layout.pattern(), "date column matched"),
        None if !texts.is_empty() => {
            tracing::debug!("date column has mixed layouts, autodetecting per cell")
        }
        None => {}
    }

    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let parsed = match cell {
                Cell::Empty => return Ok(None),
                Cell::Date(d) => Some(*d),
                Cell::Number(serial) => excel_serial_to_date(*serial),
                Cell::Text(s) => match structured {
                    Some(layout) => layout.parse(s.trim()),
                    None => parse_date(s),
                },
                Cell::Bool(_) => None,
            };
            parsed.map(Some).ok_or_else(|| PipelineError::DateParse {
                row: first_row + i,
                value: cell.display(),
            })
        })
        .collect()
}
