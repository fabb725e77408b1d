//! Numerical helpers shared by the forecasting models.

pub mod ols;
pub mod stats;

pub use ols::{ridge_fit, RidgeFit};
pub use stats::{interval_z, quantile_normal};
