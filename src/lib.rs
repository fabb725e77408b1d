//! # hydro-forecast
//!
//! Long-horizon monthly forecasts for hydrological water-budget inputs:
//! evapotranspiration, precipitation and snowmelt.
//!
//! A run reads a workbook sheet, fits an additive trend + yearly seasonality
//! model per variable, clamps the physically non-negative outputs, joins the
//! variables on timestamp and writes one `.xlsx` or `.csv` file, plus an
//! optional diagnostic chart per variable.

#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod chart;
pub mod core;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use error::{ForecastError, PipelineError, PipelineResult, Result};

pub mod prelude {
    pub use crate::core::{Forecast, MonthAnchor, TimeSeries};
    pub use crate::error::{ForecastError, PipelineError, PipelineResult, Result};
    pub use crate::models::{AdditiveConfig, AdditiveSeasonal, Forecaster};
    pub use crate::pipeline::{
        combine, forecast_series, ForecastSeries, ForecastTable, Pipeline, PipelineConfig, Preset,
    };
}
