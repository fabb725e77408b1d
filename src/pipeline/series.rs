//! Per-variable forecasting with the non-negativity post-processing.

use crate::core::{Forecast, MonthAnchor, TimeSeries};
use crate::error::{ForecastError, PipelineError, PipelineResult};
use crate::models::Forecaster;
use chrono::NaiveDate;

/// One predicted timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRow {
    pub timestamp: NaiveDate,
    pub forecast: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Forecast rows for one named variable, ordered by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    pub variable: String,
    pub rows: Vec<ForecastRow>,
}

impl ForecastSeries {
    /// Pair a model forecast with its variable name.
    ///
    /// A forecast without intervals gets a zero-width band.
    pub fn from_forecast(variable: impl Into<String>, forecast: Forecast) -> Self {
        let (timestamps, point, lower, upper) = forecast.into_parts();
        let lower = lower.unwrap_or_else(|| point.clone());
        let upper = upper.unwrap_or_else(|| point.clone());

        let rows = timestamps
            .into_iter()
            .zip(point)
            .zip(lower.into_iter().zip(upper))
            .map(|((timestamp, forecast), (lower, upper))| ForecastRow {
                timestamp,
                forecast,
                lower,
                upper,
            })
            .collect();

        Self {
            variable: variable.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replace negative point and lower values with zero.
    ///
    /// ET, precipitation and snowmelt cannot be negative. The upper bound is
    /// left as the model produced it, so on pathological fits it may end up
    /// below the clamped lower bound.
    pub fn clamp_non_negative(&mut self) {
        for row in &mut self.rows {
            row.forecast = row.forecast.max(0.0);
            row.lower = row.lower.max(0.0);
        }
    }
}

/// Fit `engine` on `history` and forecast `horizon_months` past its end.
///
/// Returns one row per dated history row, observed or blank, plus one per
/// future month, sorted by timestamp with point and lower bounds clamped at
/// zero. An engine that repeats a timestamp fails with `TimestampError`.
pub fn forecast_series(
    variable: &str,
    history: &TimeSeries,
    horizon_months: usize,
    anchor: MonthAnchor,
    engine: &mut dyn Forecaster,
) -> PipelineResult<ForecastSeries> {
    let fit_error = |source: ForecastError| PipelineError::ModelFit {
        variable: variable.to_string(),
        source,
    };

    let forecast = engine
        .fit_and_predict(history, horizon_months, anchor)
        .map_err(fit_error)?;

    let mut series = ForecastSeries::from_forecast(variable, forecast);
    series.rows.sort_by_key(|r| r.timestamp);
    if let Some(pair) = series
        .rows
        .windows(2)
        .find(|pair| pair[0].timestamp == pair[1].timestamp)
    {
        return Err(fit_error(ForecastError::TimestampError(format!(
            "duplicate timestamp {} from {}",
            pair[0].timestamp,
            engine.name()
        ))));
    }

    let negative = series
        .rows
        .iter()
        .filter(|r| r.forecast < 0.0 || r.lower < 0.0)
        .count();
    series.clamp_non_negative();

    tracing::info!(
        variable,
        model = engine.name(),
        rows = series.len(),
        clamped = negative,
        "forecast complete"
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::AdditiveSeasonal;

    /// Answers every request with the first timestamp repeated.
    struct StuckClock;

    impl Forecaster for StuckClock {
        fn fit(&mut self, _series: &TimeSeries) -> Result<()> {
            Ok(())
        }

        fn predict_at(&self, timestamps: &[NaiveDate]) -> Result<Forecast> {
            let first = timestamps.first().copied().ok_or(ForecastError::EmptyData)?;
            Forecast::from_values(vec![first; timestamps.len()], vec![1.0; timestamps.len()])
        }

        fn name(&self) -> &str {
            "StuckClock"
        }
    }

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn history(values: &[f64]) -> TimeSeries {
        let stamps = (0..values.len())
            .map(|i| ymd(2020 + (i / 12) as i32, (i % 12) as u32 + 1))
            .collect();
        TimeSeries::new(stamps, values.to_vec()).unwrap()
    }

    #[test]
    fn clamp_leaves_upper_untouched() {
        let forecast = Forecast::from_values_with_intervals(
            vec![ymd(2024, 1), ymd(2024, 2)],
            vec![-2.0, 3.0],
            vec![-5.0, 1.0],
            vec![-1.0, 6.0],
        )
        .unwrap();
        let mut series = ForecastSeries::from_forecast("ET", forecast);
        series.clamp_non_negative();

        assert_eq!(
            series.rows[0],
            ForecastRow {
                timestamp: ymd(2024, 1),
                forecast: 0.0,
                lower: 0.0,
                upper: -1.0,
            }
        );
        assert_eq!(series.rows[1].forecast, 3.0);
        assert_eq!(series.rows[1].lower, 1.0);
    }

    #[test]
    fn forecast_without_intervals_gets_flat_band() {
        let forecast = Forecast::from_values(vec![ymd(2024, 1)], vec![4.0]).unwrap();
        let series = ForecastSeries::from_forecast("Precip", forecast);
        assert_eq!(series.rows[0].lower, 4.0);
        assert_eq!(series.rows[0].upper, 4.0);
    }

    #[test]
    fn forecast_series_covers_history_and_horizon() {
        let values: Vec<f64> = (0..24)
            .map(|i| 50.0 + 30.0 * (i as f64 * std::f64::consts::PI / 6.0).cos() + (i % 5) as f64)
            .collect();
        let mut engine = AdditiveSeasonal::default();
        let series =
            forecast_series("ET", &history(&values), 6, MonthAnchor::Start, &mut engine).unwrap();

        assert_eq!(series.variable, "ET");
        assert_eq!(series.len(), 30);
        assert_eq!(series.rows.last().unwrap().timestamp, ymd(2022, 6));
        assert!(series.rows.iter().all(|r| r.forecast >= 0.0 && r.lower >= 0.0));
    }

    #[test]
    fn model_failure_names_the_variable() {
        let mut engine = AdditiveSeasonal::default();
        let err = forecast_series(
            "Snowmelt",
            &history(&[3.0, 3.0, 3.0]),
            12,
            MonthAnchor::Start,
            &mut engine,
        )
        .unwrap_err();

        assert_eq!(err.variable(), Some("Snowmelt"));
        assert!(matches!(
            err,
            PipelineError::ModelFit {
                source: ForecastError::DegenerateSeries,
                ..
            }
        ));
    }

    #[test]
    fn repeated_engine_timestamps_are_rejected() {
        let err = forecast_series(
            "ET",
            &history(&[1.0, 2.0, 3.0]),
            2,
            MonthAnchor::Start,
            &mut StuckClock,
        )
        .unwrap_err();

        assert_eq!(err.variable(), Some("ET"));
        match err {
            PipelineError::ModelFit {
                source: ForecastError::TimestampError(msg),
                ..
            } => assert!(msg.contains("duplicate timestamp 2020-01-01"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rows_come_back_sorted() {
        let values = [5.0, 7.0, 6.0, 8.0, 9.0, 7.5];
        let mut engine = AdditiveSeasonal::default();
        let series =
            forecast_series("ET", &history(&values), 3, MonthAnchor::Start, &mut engine).unwrap();
        assert!(series.rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
