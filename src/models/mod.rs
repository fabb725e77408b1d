//! Forecasting models.
//!
//! The pipeline only talks to [`Forecaster`]; [`AdditiveSeasonal`] is the
//! engine it builds by default.

pub mod additive;
mod traits;

pub use additive::{AdditiveConfig, AdditiveSeasonal};
pub use traits::{BoxedForecaster, Forecaster, ForecasterFactory};
