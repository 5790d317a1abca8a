//! Conditional-sum-of-squares estimation for a seasonal ARIMA model.
//!
//! Given a monthly series `y` and an order, we:
//! - difference `y` into `w` (losing `d + D·s` observations)
//! - scale `w` by its standard deviation so the objective is well conditioned
//! - minimise the sum of squared one-step residuals with a bounded simplex
//!   search, starting from a lag regression and from a fixed small guess
//! - keep the better optimum, then recompute residuals on the unscaled `w`
//!
//! The innovation variance is `σ² = CSS / m` on the `m` differenced points and
//! the Gaussian log-likelihood is evaluated at that variance.

use std::f64::consts::PI;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::MonthlySeries;
use crate::error::AppError;
use crate::math::{SimplexConfig, SimplexResult, lag_regression, nelder_mead};
use crate::models::{SarimaModel, SarimaOrder, SarimaParams};

/// Coefficients are kept strictly inside the unit interval.
pub const COEFFICIENT_BOUND: f64 = 0.99;

/// Bound on the regression seed so the simplex does not start on a face of the box.
const SEED_BOUND: f64 = 0.9;

/// Fixed fallback start for every coefficient.
const DEFAULT_START: f64 = 0.1;

/// Estimation options.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub order: SarimaOrder,
    pub simplex: SimplexConfig,
}

impl FitOptions {
    pub fn new(order: SarimaOrder) -> Self {
        Self {
            order,
            simplex: SimplexConfig {
                tolerance: 1e-9,
                ..SimplexConfig::default()
            },
        }
    }
}

/// A fitted seasonal model together with the data it was fitted on.
#[derive(Debug, Clone)]
pub struct SarimaFit {
    pub model: SarimaModel,
    pub sigma2: f64,
    pub css: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub iterations: usize,
    pub converged: bool,
    values: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
}

/// Serializable description of a fit, for reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitSummary {
    pub model: String,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub n_obs: usize,
    pub n_effective: usize,
    pub iterations: usize,
    pub converged: bool,
}

impl SarimaFit {
    pub fn order(&self) -> &SarimaOrder {
        &self.model.order
    }

    pub fn params(&self) -> &SarimaParams {
        &self.model.params
    }

    /// Number of observations in the fitted series.
    pub fn n_obs(&self) -> usize {
        self.values.len()
    }

    /// Number of differenced points the objective was computed on.
    pub fn n_effective(&self) -> usize {
        self.differenced.len()
    }

    /// The fitted series in its original units.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn differenced(&self) -> &[f64] {
        &self.differenced
    }

    /// One-step residuals on the differenced series.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn summary(&self) -> FitSummary {
        let params = self.params();
        FitSummary {
            model: self.order().label(),
            ar: params.ar.clone(),
            ma: params.ma.clone(),
            seasonal_ar: params.seasonal_ar.clone(),
            seasonal_ma: params.seasonal_ma.clone(),
            sigma2: self.sigma2,
            log_likelihood: self.log_likelihood,
            aic: self.aic,
            bic: self.bic,
            n_obs: self.n_obs(),
            n_effective: self.n_effective(),
            iterations: self.iterations,
            converged: self.converged,
        }
    }
}

/// Fit a seasonal ARIMA model to a monthly series.
pub fn fit_sarima(series: &MonthlySeries, opts: &FitOptions) -> Result<SarimaFit, AppError> {
    fit_values(&series.values(), opts)
}

/// Fit a seasonal ARIMA model to raw values.
pub fn fit_values(values: &[f64], opts: &FitOptions) -> Result<SarimaFit, AppError> {
    let order = opts.order;
    let needed = order.min_observations();
    if values.len() < needed {
        return Err(AppError::insufficient_history(needed, values.len()));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AppError::model_fit(
            "The monthly series contains non-finite values.",
        ));
    }

    let w = order.difference(values);
    let m = w.len();
    let scale = match std_dev(&w) {
        s if s.is_finite() && s > 0.0 => s,
        s if s.is_finite() => 1.0,
        _ => {
            return Err(AppError::model_fit(
                "The differenced series has a non-finite spread.",
            ));
        }
    };
    let z: Vec<f64> = w.iter().map(|v| v / scale).collect();

    let k = order.n_coefficients();
    let bounds = vec![(-COEFFICIENT_BOUND, COEFFICIENT_BOUND); k];
    let objective = |v: &[f64]| {
        SarimaModel::new(order, SarimaParams::from_slice(&order, v)).css(&z)
    };

    let mut starts = vec![vec![DEFAULT_START; k]];
    if let Some(seed) = regression_start(&z, &order) {
        starts.insert(0, seed);
    }

    let mut best: Option<SimplexResult> = None;
    for start in &starts {
        let result = nelder_mead(&objective, start, &bounds, &opts.simplex);
        debug!(
            start = ?start,
            value = result.value,
            iterations = result.iterations,
            converged = result.converged,
            "simplex run finished"
        );
        let better = match &best {
            None => true,
            Some(b) => result.value < b.value,
        };
        if better {
            best = Some(result);
        }
    }

    let Some(best) = best else {
        return Err(AppError::internal("No optimiser starting points."));
    };
    if !best.converged {
        warn!(iterations = best.iterations, "simplex search hit its iteration limit");
        return Err(AppError::model_fit(format!(
            "The model did not converge after {} iterations.",
            best.iterations
        )));
    }
    if !best.value.is_finite() || best.point.iter().any(|v| !v.is_finite()) {
        return Err(AppError::model_fit(
            "The model produced non-finite coefficients.",
        ));
    }

    let model = SarimaModel::new(order, SarimaParams::from_slice(&order, &best.point));
    let residuals = model.residuals(&w);
    let css: f64 = residuals.iter().map(|e| e * e).sum();
    let sigma2 = css / m as f64;
    if !sigma2.is_finite() {
        return Err(AppError::model_fit(
            "The model produced a non-finite innovation variance.",
        ));
    }

    let log_likelihood = gaussian_log_likelihood(sigma2, m);
    let n_params = (k + 1) as f64;
    let aic = -2.0 * log_likelihood + 2.0 * n_params;
    let bic = -2.0 * log_likelihood + n_params * (m as f64).ln();

    debug!(
        model = %order.label(),
        coefficients = ?best.point,
        sigma2,
        aic,
        "model fitted"
    );

    Ok(SarimaFit {
        model,
        sigma2,
        css,
        log_likelihood,
        aic,
        bic,
        iterations: best.iterations,
        converged: best.converged,
        values: values.to_vec(),
        differenced: w,
        residuals,
    })
}

/// Seed AR terms from a regression on the AR lags; MA terms start at zero.
fn regression_start(z: &[f64], order: &SarimaOrder) -> Option<Vec<f64>> {
    let lags: Vec<usize> = (1..=order.p)
        .chain((1..=order.seasonal_p).map(|i| i * order.period))
        .collect();
    if lags.is_empty() {
        return None;
    }
    let beta = lag_regression(z, &lags)?;
    let clamp = |v: f64| v.clamp(-SEED_BOUND, SEED_BOUND);

    let mut start = Vec::with_capacity(order.n_coefficients());
    start.extend(beta[..order.p].iter().map(|&v| clamp(v)));
    start.extend(std::iter::repeat_n(0.0, order.q));
    start.extend(beta[order.p..].iter().map(|&v| clamp(v)));
    start.extend(std::iter::repeat_n(0.0, order.seasonal_q));
    Some(start)
}

fn std_dev(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let n = v.len() as f64;
    let mean = v.iter().sum::<f64>() / n;
    (v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt()
}

fn gaussian_log_likelihood(sigma2: f64, m: usize) -> f64 {
    if sigma2 == 0.0 {
        return f64::INFINITY;
    }
    -0.5 * m as f64 * ((2.0 * PI * sigma2).ln() + 1.0)
}
