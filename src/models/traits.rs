//! Forecaster trait defining the interface between the pipeline and a model.

use crate::core::{future_months, Forecast, MissingValuePolicy, MonthAnchor, TimeSeries};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

/// Common interface for forecasting engines.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Predict point values and interval bounds at arbitrary dates.
    fn predict_at(&self, timestamps: &[NaiveDate]) -> Result<Forecast>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Fit on the observed values and predict at every dated row of
    /// `series`, extended by `horizon` monthly periods.
    ///
    /// Rows with a missing value are left out of the fit but still receive a
    /// prediction, and the horizon counts from the last dated row.
    fn fit_and_predict(
        &mut self,
        series: &TimeSeries,
        horizon: usize,
        anchor: MonthAnchor,
    ) -> Result<Forecast> {
        let last = series.last_timestamp().ok_or(ForecastError::EmptyData)?;
        let observed = series.sanitized(MissingValuePolicy::Drop)?;
        self.fit(&observed)?;

        let mut timestamps = series.timestamps().to_vec();
        timestamps.extend(future_months(last, horizon, anchor));

        self.predict_at(&timestamps)
    }
}

/// Type alias for boxed forecaster trait objects.
pub type BoxedForecaster = Box<dyn Forecaster>;

/// Builds a fresh, unfitted engine for each variable.
pub type ForecasterFactory = Box<dyn Fn() -> BoxedForecaster>;
