//! Additive trend + yearly seasonality model.
//!
//! Decomposes a series as `y(t) = trend(t) + seasonal(t) + ε`:
//! - piecewise-linear trend with hinge changepoints spread over the early
//!   part of the history
//! - Fourier terms with a 365.25-day period for yearly seasonality
//!
//! Coefficients are the MAP estimate under Gaussian priors, which reduces to a
//! ridge regression with per-term penalties `σ² / scale²`. The noise variance
//! is estimated by a first, lightly penalized pass without changepoints.
//!
//! Prediction intervals combine observation noise with trend uncertainty past
//! the end of the history: future changepoints arrive at the historical rate
//! with Laplace-distributed magnitudes, whose variance contribution at scaled
//! distance `Δ` is `r · 2b² · Δ³ / 3`.

use crate::core::{Forecast, MissingValuePolicy, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::stats::{interval_z, mean_abs, std_dev};
use crate::utils::{ridge_fit, RidgeFit};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Length of the yearly seasonal cycle in days.
const YEAR_DAYS: f64 = 365.25;

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Prior scale on the base offset and slope.
const TREND_PRIOR_SCALE: f64 = 5.0;

/// Ridge penalty on seasonal terms during the noise-estimation pass.
const PILOT_SEASONAL_PENALTY: f64 = 1e-3;

/// Floor on the scaled noise variance used to derive penalties.
const MIN_NOISE_VARIANCE: f64 = 1e-6;

/// Settings for [`AdditiveSeasonal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdditiveConfig {
    /// Include Fourier terms with a yearly period.
    pub yearly_seasonality: bool,
    /// Number of sine/cosine pairs for the yearly cycle.
    pub fourier_order: usize,
    /// Potential trend changepoints.
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints may sit.
    pub changepoint_range: f64,
    /// Prior scale of changepoint slope adjustments; larger is more flexible.
    pub changepoint_prior_scale: f64,
    /// Prior scale of the seasonal coefficients.
    pub seasonality_prior_scale: f64,
    /// Coverage of the prediction interval.
    pub interval_width: f64,
}

impl Default for AdditiveConfig {
    fn default() -> Self {
        Self {
            yearly_seasonality: true,
            fourier_order: 10,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            interval_width: 0.8,
        }
    }
}

impl AdditiveConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.changepoint_prior_scale > 0.0) || !(self.seasonality_prior_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "prior scales must be positive".into(),
            ));
        }
        if self.yearly_seasonality && self.fourier_order == 0 {
            return Err(ForecastError::InvalidParameter(
                "fourier_order must be at least 1 with yearly seasonality".into(),
            ));
        }
        Ok(())
    }

    fn seasonal_order(&self) -> usize {
        if self.yearly_seasonality {
            self.fourier_order
        } else {
            0
        }
    }
}

/// State learned by [`AdditiveSeasonal::fit`].
#[derive(Debug, Clone)]
struct FittedState {
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    fourier_order: usize,
    coefficients: RidgeFit,
    /// Noise standard deviation in scaled units.
    sigma: f64,
    /// Mean absolute changepoint slope adjustment (Laplace scale).
    delta_scale: f64,
}

/// Additive piecewise-linear trend plus yearly Fourier seasonality.
#[derive(Debug, Clone, Default)]
pub struct AdditiveSeasonal {
    config: AdditiveConfig,
    state: Option<FittedState>,
}

impl AdditiveSeasonal {
    pub fn new(config: AdditiveConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn config(&self) -> &AdditiveConfig {
        &self.config
    }

    /// Changepoint locations as dates.
    pub fn changepoints(&self) -> Option<Vec<NaiveDate>> {
        self.state.as_ref().map(|s| {
            s.changepoints
                .iter()
                .map(|&t| s.start + chrono::Duration::days((t * s.span_days).round() as i64))
                .collect()
        })
    }

    /// Noise standard deviation in the units of the series.
    pub fn sigma(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sigma * s.y_scale)
    }

    /// Fourier order actually used, after the sampling-rate cap.
    pub fn effective_fourier_order(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.fourier_order)
    }
}

/// Design matrix, column-major: offset, slope, hinges, then Fourier pairs.
fn design(
    start: NaiveDate,
    span_days: f64,
    changepoints: &[f64],
    fourier_order: usize,
    dates: &[NaiveDate],
) -> Vec<Vec<f64>> {
    let t: Vec<f64> = dates
        .iter()
        .map(|d| (*d - start).num_days() as f64 / span_days)
        .collect();

    let hinges: Vec<Vec<f64>> = changepoints
        .iter()
        .map(|&cp| t.iter().map(|&ti| (ti - cp).max(0.0)).collect())
        .collect();

    let mut columns = Vec::with_capacity(2 + changepoints.len() + 2 * fourier_order);
    columns.push(vec![1.0; t.len()]);
    columns.push(t);
    columns.extend(hinges);
    columns.extend(fourier_columns(dates, fourier_order));
    columns
}

/// Highest Fourier order the sampling rate can resolve.
///
/// With `p` samples per year, orders above `(p - 1) / 2` alias onto lower
/// ones and only fit noise.
fn max_fourier_order(dates: &[NaiveDate]) -> usize {
    let mut gaps: Vec<i64> = dates.windows(2).map(|w| (w[1] - w[0]).num_days()).collect();
    if gaps.is_empty() {
        return 0;
    }
    gaps.sort_unstable();
    let median_gap = gaps[gaps.len() / 2].max(1) as f64;
    let per_year = YEAR_DAYS / median_gap;
    ((per_year - 1.0) / 2.0).floor().max(1.0) as usize
}

/// Sine/cosine pairs of the yearly cycle on absolute day numbers.
fn fourier_columns(dates: &[NaiveDate], order: usize) -> Vec<Vec<f64>> {
    let days: Vec<f64> = dates
        .iter()
        .map(|d| (d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE) as f64)
        .collect();

    let mut columns = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let omega = 2.0 * PI * k as f64 / YEAR_DAYS;
        columns.push(days.iter().map(|d| (omega * d).sin()).collect());
        columns.push(days.iter().map(|d| (omega * d).cos()).collect());
    }
    columns
}

/// Changepoints at evenly spaced observation indices in the first
/// `range` fraction of the history, excluding the first observation.
fn place_changepoints(t: &[f64], requested: usize, range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * range).floor() as usize;
    let count = requested.min(hist_size.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }

    let last = (hist_size - 1) as f64;
    (1..=count)
        .map(|i| {
            let idx = (last * i as f64 / count as f64).round() as usize;
            t[idx.min(t.len() - 1)]
        })
        .collect()
}

fn residual_variance(y: &[f64], fitted: &[f64]) -> f64 {
    let n = y.len().max(1) as f64;
    y.iter().zip(fitted).map(|(a, b)| (a - b).powi(2)).sum::<f64>() / n
}

impl Forecaster for AdditiveSeasonal {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.config.validate()?;
        let series = series.sanitized(MissingValuePolicy::Error)?;
        let values = series.values();
        let dates = series.timestamps();

        if values.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }
        let spread = std_dev(values);
        if !(spread > 0.0) {
            return Err(ForecastError::DegenerateSeries);
        }

        let start = dates[0];
        let span_days = (dates[dates.len() - 1] - start).num_days() as f64;
        let y_scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();
        let t: Vec<f64> = dates
            .iter()
            .map(|d| (*d - start).num_days() as f64 / span_days)
            .collect();

        let order = self.config.seasonal_order().min(max_fourier_order(dates));

        // Pass 1: base trend and seasonality, for the noise level.
        let pilot_columns = design(start, span_days, &[], order, dates);
        let mut pilot_penalties = vec![0.0, 0.0];
        pilot_penalties.extend(std::iter::repeat(PILOT_SEASONAL_PENALTY).take(2 * order));
        let pilot = ridge_fit(&y, &pilot_columns, &pilot_penalties)?;
        let noise =
            residual_variance(&y, &pilot.predict(&pilot_columns)?).max(MIN_NOISE_VARIANCE);

        // Pass 2: full model with prior-derived penalties.
        let changepoints = place_changepoints(
            &t,
            self.config.n_changepoints,
            self.config.changepoint_range,
        );
        let columns = design(start, span_days, &changepoints, order, dates);
        let mut penalties = vec![noise / TREND_PRIOR_SCALE.powi(2); 2];
        penalties.extend(
            std::iter::repeat(noise / self.config.changepoint_prior_scale.powi(2))
                .take(changepoints.len()),
        );
        penalties.extend(
            std::iter::repeat(noise / self.config.seasonality_prior_scale.powi(2)).take(2 * order),
        );
        let coefficients = ridge_fit(&y, &columns, &penalties)?;

        let fitted_scaled = coefficients.predict(&columns)?;
        let sigma = residual_variance(&y, &fitted_scaled).sqrt();
        let deltas = &coefficients.coefficients[2..2 + changepoints.len()];
        let delta_scale = if deltas.is_empty() { 0.0 } else { mean_abs(deltas) };

        tracing::debug!(
            observations = values.len(),
            changepoints = changepoints.len(),
            fourier_order = order,
            sigma = sigma * y_scale,
            "additive model fitted"
        );

        self.state = Some(FittedState {
            start,
            span_days,
            y_scale,
            changepoints,
            fourier_order: order,
            coefficients,
            sigma,
            delta_scale,
        });

        Ok(())
    }

    fn predict_at(&self, timestamps: &[NaiveDate]) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;

        if timestamps.is_empty() {
            return Ok(Forecast::new());
        }

        let columns = design(
            state.start,
            state.span_days,
            &state.changepoints,
            state.fourier_order,
            timestamps,
        );
        let point_scaled = state.coefficients.predict(&columns)?;

        let z = interval_z(self.config.interval_width);
        let change_rate = state.changepoints.len() as f64;
        let laplace_var = 2.0 * state.delta_scale.powi(2);

        let mut point = Vec::with_capacity(timestamps.len());
        let mut lower = Vec::with_capacity(timestamps.len());
        let mut upper = Vec::with_capacity(timestamps.len());

        for (date, yhat) in timestamps.iter().zip(&point_scaled) {
            let t = (*date - state.start).num_days() as f64 / state.span_days;
            let beyond = (t - 1.0).max(0.0);
            let variance = state.sigma.powi(2) + change_rate * laplace_var * beyond.powi(3) / 3.0;
            let half_width = z * variance.sqrt();

            point.push(yhat * state.y_scale);
            lower.push((yhat - half_width) * state.y_scale);
            upper.push((yhat + half_width) * state.y_scale);
        }

        Forecast::from_values_with_intervals(timestamps.to_vec(), point, lower, upper)
    }

    fn name(&self) -> &str {
        "AdditiveSeasonal"
    }
}
