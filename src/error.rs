//! Error types for the hydro-forecast library.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Result type alias for pipeline stages.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Errors raised by time series containers and forecasting models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Every observation has the same value.
    #[error("degenerate series: history has no variance")]
    DegenerateSeries,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

/// Errors raised by the forecast pipeline, tagged with the failing stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration could not be loaded or is invalid.
    #[error("config: {0}")]
    Config(String),

    /// Input file is missing, unreadable, or lacks the requested sheet.
    #[error("read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    /// A date cell matched none of the accepted formats.
    #[error("date parse: row {row}: unrecognized date '{value}'")]
    DateParse { row: usize, value: String },

    /// An expected column header is absent from the sheet.
    #[error("load: missing column '{column}' (available: {})", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// A numeric cell holds something other than a number.
    #[error("load: column '{column}' row {row}: expected a number, got '{value}'")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    /// Two rows of the input carry the same month.
    #[error("load: row {row}: duplicate date {date} (first seen on row {first_row})")]
    DuplicateDate {
        row: usize,
        first_row: usize,
        date: NaiveDate,
    },

    /// Model fitting or prediction failed for one variable.
    #[error("forecast {variable}: {source}")]
    ModelFit {
        variable: String,
        #[source]
        source: ForecastError,
    },

    /// Two forecast tables could not be joined.
    #[error("combine: {0}")]
    Combine(String),

    /// Output file could not be written.
    #[error("write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    /// Chart could not be rendered.
    #[error("chart {variable}: {reason}")]
    Chart { variable: String, reason: String },
}

impl PipelineError {
    /// Name of the pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "config",
            PipelineError::Read { .. } => "read",
            PipelineError::DateParse { .. } => "date-parse",
            PipelineError::MissingColumn { .. }
            | PipelineError::InvalidValue { .. }
            | PipelineError::DuplicateDate { .. } => "load",
            PipelineError::ModelFit { .. } => "forecast",
            PipelineError::Combine(_) => "combine",
            PipelineError::Write { .. } => "write",
            PipelineError::Chart { .. } => "chart",
        }
    }

    /// Variable the failure belongs to, when the stage is per-variable.
    pub fn variable(&self) -> Option<&str> {
        match self {
            PipelineError::ModelFit { variable, .. } | PipelineError::Chart { variable, .. } => {
                Some(variable)
            }
            _ => None,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::Read {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 2, got: 1 };
        assert_eq!(err.to_string(), "insufficient data: need at least 2, got 1");

        let err = ForecastError::DegenerateSeries;
        assert_eq!(
            err.to_string(),
            "degenerate series: history has no variance"
        );

        let err = ForecastError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");
    }

    #[test]
    fn model_fit_error_names_the_variable() {
        let err = PipelineError::ModelFit {
            variable: "Precip".to_string(),
            source: ForecastError::DegenerateSeries,
        };
        assert_eq!(
            err.to_string(),
            "forecast Precip: degenerate series: history has no variance"
        );
        assert_eq!(err.stage(), "forecast");
        assert_eq!(err.variable(), Some("Precip"));
    }

    #[test]
    fn missing_column_lists_available_headers() {
        let err = PipelineError::MissingColumn {
            column: "Month-Year".to_string(),
            available: vec!["Date".to_string(), "ET".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "load: missing column 'Month-Year' (available: Date, ET)"
        );
        assert_eq!(err.stage(), "load");
        assert_eq!(err.variable(), None);
    }

    #[test]
    fn io_errors_carry_the_path() {
        let err = PipelineError::write("out/forecast.xlsx", "permission denied");
        assert_eq!(
            err.to_string(),
            "write out/forecast.xlsx: permission denied"
        );
        assert_eq!(err.stage(), "write");
    }

    #[test]
    fn forecast_errors_are_clonable_and_comparable() {
        let err1 = ForecastError::EmptyData;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
