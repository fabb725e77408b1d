//! Forecast result structure for holding predictions.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

/// Dated point predictions with optional prediction intervals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    timestamps: Vec<NaiveDate>,
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(timestamps: Vec<NaiveDate>, point: Vec<f64>) -> Result<Self> {
        check_len(timestamps.len(), point.len())?;
        Ok(Self {
            timestamps,
            point,
            lower: None,
            upper: None,
        })
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(
        timestamps: Vec<NaiveDate>,
        point: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        check_len(timestamps.len(), point.len())?;
        check_len(timestamps.len(), lower.len())?;
        check_len(timestamps.len(), upper.len())?;
        Ok(Self {
            timestamps,
            point,
            lower: Some(lower),
            upper: Some(upper),
        })
    }

    /// Number of predicted timestamps.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Split into `(timestamps, point, lower, upper)`.
    pub fn into_parts(self) -> (Vec<NaiveDate>, Vec<f64>, Option<Vec<f64>>, Option<Vec<f64>>) {
        (self.timestamps, self.point, self.lower, self.upper)
    }
}

fn check_len(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(ForecastError::DimensionMismatch { expected, got });
    }
    Ok(())
}
