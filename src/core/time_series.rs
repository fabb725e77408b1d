//! Univariate monthly time series.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

/// Policy for handling missing values (NaN/Inf).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValuePolicy {
    /// Drop observations with missing values.
    Drop,
    /// Return error if missing values found.
    Error,
}

/// A single-variable series of dated observations.
///
/// Timestamps are strictly increasing; values may contain NaN until the
/// series is [`sanitized`](TimeSeries::sanitized).
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDate>,
    values: Vec<f64>,
    label: Option<String>,
}

impl TimeSeries {
    /// Create a series from already-ordered timestamps.
    pub fn new(timestamps: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if values.len() != timestamps.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        for pair in timestamps.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ForecastError::TimestampError(format!(
                    "timestamps must be strictly increasing ({} follows {})",
                    pair[1], pair[0]
                )));
            }
        }

        Ok(Self {
            timestamps,
            values,
            label: None,
        })
    }

    /// Attach a variable name.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Variable name, if one was attached.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Last observed timestamp.
    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.last().copied()
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Return a sanitized copy with missing values handled.
    pub fn sanitized(&self, policy: MissingValuePolicy) -> Result<TimeSeries> {
        match policy {
            MissingValuePolicy::Error => {
                if self.has_missing_values() {
                    return Err(ForecastError::MissingValues);
                }
                Ok(self.clone())
            }
            MissingValuePolicy::Drop => {
                let (timestamps, values) = self
                    .timestamps
                    .iter()
                    .zip(&self.values)
                    .filter(|(_, v)| v.is_finite())
                    .map(|(t, v)| (*t, *v))
                    .unzip();

                Ok(TimeSeries {
                    timestamps,
                    values,
                    label: self.label.clone(),
                })
            }
        }
    }
}
