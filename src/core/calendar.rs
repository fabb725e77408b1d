//! Month arithmetic for building the future forecast grid.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Where a monthly timestamp sits within its month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthAnchor {
    /// First day of the month.
    #[default]
    Start,
    /// Last day of the month.
    End,
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Shift `date` by whole months, keeping it anchored.
pub fn add_months(date: NaiveDate, months: u32, anchor: MonthAnchor) -> Option<NaiveDate> {
    let shifted = month_start(date).checked_add_months(Months::new(months))?;
    Some(match anchor {
        MonthAnchor::Start => shifted,
        MonthAnchor::End => month_end(shifted),
    })
}

/// `horizon` monthly timestamps strictly after `last`.
///
/// With [`MonthAnchor::End`] the grid is the sequence of month ends that
/// follow `last`, so the first entry can fall in the same month as `last`
/// when `last` is not itself a month end.
pub fn future_months(last: NaiveDate, horizon: usize, anchor: MonthAnchor) -> Vec<NaiveDate> {
    let first_offset = match anchor {
        MonthAnchor::Start => 1,
        MonthAnchor::End if month_end(last) > last => 0,
        MonthAnchor::End => 1,
    };

    (0..horizon)
        .map_while(|i| add_months(last, first_offset + i as u32, anchor))
        .collect()
}

/// Fractional calendar year, used as the chart x coordinate.
pub fn decimal_year(date: NaiveDate) -> f64 {
    let days_in_year = if NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some() {
        366.0
    } else {
        365.0
    };
    date.year() as f64 + date.ordinal0() as f64 / days_in_year
}
