//! Multi-step forecasts with normal-approximation bounds.
//!
//! Point forecasts extend the differenced series with future innovations set
//! to zero and integrate back to levels. The `h`-step variance is
//! `σ² · Σ_{j<h} ψ_j²`, where `ψ` are the MA(∞) weights of the integrated
//! model, so the band widens with the horizon.

use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::domain::{ForecastResult, ForecastStep, MonthlySeries, add_months};
use crate::error::AppError;

use super::SarimaFit;

impl SarimaFit {
    /// Forecast `horizon` months after the last month of `history`.
    ///
    /// `history` must be the series the model was fitted on; only its dates
    /// are read here.
    pub fn forecast(
        &self,
        history: &MonthlySeries,
        horizon: usize,
        level: f64,
    ) -> Result<ForecastResult, AppError> {
        if history.len() != self.n_obs() {
            return Err(AppError::internal(format!(
                "Forecast history has {} months but the model was fitted on {}.",
                history.len(),
                self.n_obs()
            )));
        }
        let Some(last) = history.last_month() else {
            return Err(AppError::internal("Cannot forecast from an empty history."));
        };

        let z = normal_quantile(level)?;
        let w_future = self
            .model
            .forecast_differenced(self.differenced(), self.residuals(), horizon);
        let predicted = self.model.integrate(self.values(), &w_future);
        let psi = self.model.psi_weights(horizon);

        let mut steps = Vec::with_capacity(horizon);
        let mut cumulative = 0.0;
        for (h, (&mean, &weight)) in predicted.iter().zip(&psi).enumerate() {
            cumulative += weight * weight;
            let half_width = z * (self.sigma2 * cumulative).sqrt();
            if !mean.is_finite() || !half_width.is_finite() {
                return Err(AppError::model_fit(format!(
                    "The forecast for step {} is not finite.",
                    h + 1
                )));
            }

            let Some(month) = add_months(last, (h + 1) as u32) else {
                return Err(AppError::internal(format!(
                    "Forecast month {} after {last} is out of range.",
                    h + 1
                )));
            };
            steps.push(ForecastStep {
                month,
                predicted: mean,
                lower: mean - half_width,
                upper: mean + half_width,
            });
        }

        debug!(horizon, level, last = %last, "forecast produced");
        Ok(ForecastResult {
            steps,
            confidence_level: level,
        })
    }
}

/// Two-sided standard normal quantile for a confidence level in `(0, 1)`.
pub fn normal_quantile(level: f64) -> Result<f64, AppError> {
    if !(level > 0.0 && level < 1.0) {
        return Err(AppError::internal(format!(
            "Confidence level must be in (0, 1), got {level}."
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::internal(format!("Standard normal: {e}")))?;
    Ok(normal.inverse_cdf(0.5 + level / 2.0))
}
