//! End-to-end forecast pipeline.
//!
//! A run reads one sheet, forecasts every configured variable, joins the
//! results on timestamp and writes a single output file. Charts are rendered
//! last and never fail the run.
//!
//! # Example
//!
//! ```no_run
//! use hydro_forecast::pipeline::{Pipeline, Preset};
//!
//! let report = Pipeline::new(Preset::Snowmelt.config()).run()?;
//! println!("Forecasts saved to {}", report.output.display());
//! # Ok::<(), hydro_forecast::error::PipelineError>(())
//! ```

pub mod config;
mod export;
mod load;
mod merge;
mod series;

pub use config::{ChartConfig, ChartFormat, PipelineConfig, Preset, VariableSpec};
pub use export::{export, read_export};
pub use load::load_histories;
pub use merge::{combine, ForecastTable, Triple, DATE_HEADER};
pub use series::{forecast_series, ForecastRow, ForecastSeries};

use crate::chart::{render_chart, ChartStyle};
use crate::error::{PipelineError, PipelineResult};
use crate::io::read_table;
use crate::models::{AdditiveSeasonal, BoxedForecaster, ForecasterFactory};
use std::path::PathBuf;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub output: PathBuf,
    /// Rows in the merged output.
    pub rows: usize,
    pub variables: Vec<String>,
    /// Charts that were written; failed charts are only logged.
    pub charts: Vec<PathBuf>,
}

/// A configured pipeline with its forecasting engine.
pub struct Pipeline {
    config: PipelineConfig,
    factory: ForecasterFactory,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline using [`AdditiveSeasonal`] with the configured model settings.
    pub fn new(config: PipelineConfig) -> Self {
        let model = config.model.clone();
        Self {
            config,
            factory: Box::new(move || -> BoxedForecaster {
                Box::new(AdditiveSeasonal::new(model.clone()))
            }),
        }
    }

    /// Replace the engine; `factory` is called once per variable.
    pub fn with_engine(mut self, factory: ForecasterFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Forecast every variable of the input sheet.
    ///
    /// Runs load, forecast and combine without writing anything.
    pub fn forecast(&self) -> PipelineResult<(Vec<ForecastSeries>, ForecastTable)> {
        let config = &self.config;
        config.validate()?;

        tracing::info!(
            input = %config.input.display(),
            sheet = config.sheet.as_deref().unwrap_or("<first>"),
            "reading input"
        );
        let table = read_table(&config.input, config.sheet.as_deref())?;
        let histories = load_histories(&table, &config.date_column, &config.variables)?;

        let mut forecasts = Vec::with_capacity(histories.len());
        for (spec, history) in config.variables.iter().zip(&histories) {
            let mut engine = (self.factory)();
            forecasts.push(forecast_series(
                &spec.name,
                history,
                config.horizon_months,
                config.month_anchor,
                engine.as_mut(),
            )?);
        }

        let merged = forecasts
            .iter()
            .map(ForecastTable::from)
            .try_fold(ForecastTable::default(), |acc, next| combine(&acc, &next))?;

        Ok((forecasts, merged))
    }

    /// Run every stage and write the output file.
    ///
    /// Nothing is written unless every variable forecasts successfully.
    pub fn run(&self) -> PipelineResult<RunReport> {
        let (forecasts, merged) = self.forecast()?;
        export(&merged, &self.config.output)?;

        let charts = if self.config.chart.enabled {
            self.render_charts(&forecasts)
        } else {
            Vec::new()
        };

        Ok(RunReport {
            output: self.config.output.clone(),
            rows: merged.len(),
            variables: merged.variables().to_vec(),
            charts,
        })
    }

    fn render_charts(&self, forecasts: &[ForecastSeries]) -> Vec<PathBuf> {
        let config = &self.config;
        config
            .variables
            .iter()
            .zip(forecasts)
            .filter_map(|(spec, series)| {
                let path = config.chart_path(&spec.name);
                let style = ChartStyle::for_variable(spec, &config.chart);
                match render_chart(series, &style, &path) {
                    Ok(()) => Some(path),
                    Err(err) => {
                        warn_chart(&err);
                        None
                    }
                }
            })
            .collect()
    }
}

fn warn_chart(err: &PipelineError) {
    tracing::warn!(
        variable = err.variable().unwrap_or_default(),
        error = %err,
        "chart skipped"
    );
}
