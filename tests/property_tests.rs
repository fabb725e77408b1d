//! Property-based tests for the forecast pipeline.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated monthly histories.

use chrono::NaiveDate;
use hydro_forecast::core::{MonthAnchor, TimeSeries};
use hydro_forecast::models::{AdditiveConfig, AdditiveSeasonal};
use hydro_forecast::pipeline::{
    combine, forecast_series, ForecastRow, ForecastSeries, ForecastTable,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn month(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2000 + (offset / 12) as i32, (offset % 12) as u32 + 1, 1).unwrap()
}

/// Create a monthly TimeSeries starting Jan-2000.
fn make_ts(values: &[f64]) -> TimeSeries {
    let timestamps = (0..values.len()).map(month).collect();
    TimeSeries::new(timestamps, values.to_vec()).unwrap()
}

/// Strategy for generating valid monthly values.
/// Adds small variation to avoid all-constant series.
fn valid_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(0.0..500.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.001;
            }
            v
        })
    })
}

/// Strategy for seasonal series that may dip below zero.
fn seasonal_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        (-20.0..60.0_f64, 5.0..80.0_f64, -1.0..1.0_f64).prop_map(move |(base, amplitude, slope)| {
            (0..len)
                .map(|i| {
                    let phase = 2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0;
                    base + amplitude * phase.sin() + slope * i as f64
                })
                .collect()
        })
    })
}

/// Rows at a random subset of the first 30 months.
fn sparse_series_strategy(name: &'static str) -> impl Strategy<Value = ForecastSeries> {
    prop::collection::btree_set(0usize..30, 1..20).prop_map(move |months| ForecastSeries {
        variable: name.to_string(),
        rows: months
            .into_iter()
            .map(|m| ForecastRow {
                timestamp: month(m),
                forecast: m as f64,
                lower: m as f64 - 1.0,
                upper: m as f64 + 1.0,
            })
            .collect(),
    })
}

fn fast_engine() -> AdditiveSeasonal {
    AdditiveSeasonal::new(AdditiveConfig {
        n_changepoints: 5,
        ..Default::default()
    })
}

fn run(name: &str, values: &[f64], horizon: usize, anchor: MonthAnchor) -> ForecastSeries {
    forecast_series(name, &make_ts(values), horizon, anchor, &mut fast_engine()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn row_count_is_history_plus_horizon(
        values in valid_values_strategy(6, 60),
        horizon in 0usize..48,
    ) {
        let series = run("ET", &values, horizon, MonthAnchor::Start);
        prop_assert_eq!(series.len(), values.len() + horizon);
    }

    #[test]
    fn blank_months_keep_their_rows(
        values in valid_values_strategy(12, 48),
        blanks in prop::collection::btree_set(0usize..48, 0..6),
        horizon in 0usize..24,
    ) {
        let mut values = values;
        let len = values.len();
        for &i in blanks.iter().filter(|&&i| i < len) {
            values[i] = f64::NAN;
        }
        let series = run("Precip", &values, horizon, MonthAnchor::Start);
        prop_assert_eq!(series.len(), values.len() + horizon);
        prop_assert!(series.rows.iter().all(|r| r.forecast.is_finite()));
    }

    #[test]
    fn forecast_and_lower_are_never_negative(
        values in seasonal_values_strategy(12, 60),
        horizon in 1usize..120,
    ) {
        let series = run("Precip", &values, horizon, MonthAnchor::Start);
        for row in &series.rows {
            prop_assert!(row.forecast >= 0.0, "forecast {} at {}", row.forecast, row.timestamp);
            prop_assert!(row.lower >= 0.0, "lower {} at {}", row.lower, row.timestamp);
            prop_assert!(row.upper.is_finite());
        }
    }

    #[test]
    fn timestamps_are_strictly_increasing(
        values in valid_values_strategy(6, 40),
        horizon in 0usize..24,
        end in any::<bool>(),
    ) {
        let anchor = if end { MonthAnchor::End } else { MonthAnchor::Start };
        let series = run("Snowmelt", &values, horizon, anchor);
        for pair in series.rows.windows(2) {
            prop_assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn combine_content_does_not_depend_on_order(
        a in sparse_series_strategy("ET"),
        b in sparse_series_strategy("Precip"),
    ) {
        let (ta, tb) = (ForecastTable::from(&a), ForecastTable::from(&b));
        let ab = combine(&ta, &tb).unwrap();
        let ba = combine(&tb, &ta).unwrap();

        prop_assert_eq!(ab.timestamps(), ba.timestamps());
        prop_assert_eq!(ab.column("ET"), ba.column("ET"));
        prop_assert_eq!(ab.column("Precip"), ba.column("Precip"));

        let union: BTreeSet<_> = a.rows.iter().chain(&b.rows).map(|r| r.timestamp).collect();
        prop_assert_eq!(ab.len(), union.len());
    }
}
