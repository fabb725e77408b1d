//! Core data structures for time series forecasting.

pub mod calendar;
mod forecast;
mod time_series;

pub use calendar::{future_months, MonthAnchor};
pub use forecast::Forecast;
pub use time_series::{MissingValuePolicy, TimeSeries};
