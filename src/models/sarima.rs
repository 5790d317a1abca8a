//! Seasonal ARIMA model evaluation.
//!
//! The fitter relies on three primitive operations:
//! - difference a series by the model's integration operators
//! - run the ARMA recursion to get one-step residuals (for the objective)
//! - extend the differenced series forward and integrate it back (for forecasts)
//!
//! Sign conventions follow the usual textbook / statsmodels form:
//!
//! ```text
//! φ(B) Φ(B^s) (1 - B)^d (1 - B^s)^D y_t = θ(B) Θ(B^s) e_t
//! φ(B) = 1 - φ1·B - ...      θ(B) = 1 + θ1·B + ...
//! ```
//!
//! Values before the start of the differenced series, and innovations before
//! the first residual, are taken as zero.

use serde::{Deserialize, Serialize};

use crate::math::poly;

/// Model order `(p, d, q) × (P, D, Q, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl SarimaOrder {
    /// The airline-style `(1,1,1)×(1,1,1,period)` model.
    pub fn seasonal_111(period: usize) -> Self {
        Self {
            p: 1,
            d: 1,
            q: 1,
            seasonal_p: 1,
            seasonal_d: 1,
            seasonal_q: 1,
            period,
        }
    }

    /// Number of estimated ARMA coefficients.
    pub fn n_coefficients(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Observations consumed by differencing.
    pub fn differencing_loss(&self) -> usize {
        self.d + self.seasonal_d * self.period
    }

    /// Shortest series we attempt to fit: two full seasonal cycles, and always
    /// more differenced points than coefficients.
    pub fn min_observations(&self) -> usize {
        let identifiable = self.differencing_loss() + self.n_coefficients() + 1;
        (2 * self.period).max(identifiable)
    }

    /// `(1 - B)^d (1 - B^s)^D`.
    pub fn difference_polynomial(&self) -> Vec<f64> {
        poly::mul(
            &poly::difference_operator(1, self.d),
            &poly::difference_operator(self.period, self.seasonal_d),
        )
    }

    /// Apply both differencing operators.
    pub fn difference(&self, series: &[f64]) -> Vec<f64> {
        let mut w = series.to_vec();
        for _ in 0..self.d {
            w = poly::difference(&w, 1);
        }
        for _ in 0..self.seasonal_d {
            w = poly::difference(&w, self.period);
        }
        w
    }

    pub fn label(&self) -> String {
        format!(
            "SARIMA({},{},{})({},{},{},{})",
            self.p, self.d, self.q, self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
        )
    }
}

/// ARMA coefficients of a seasonal model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarimaParams {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl SarimaParams {
    /// Unpack an optimiser vector laid out as `[ar.., ma.., seasonal_ar.., seasonal_ma..]`.
    ///
    /// # Panics
    /// Panics if `v.len() != order.n_coefficients()`.
    pub fn from_slice(order: &SarimaOrder, v: &[f64]) -> Self {
        assert_eq!(v.len(), order.n_coefficients(), "coefficient vector length");
        let (ar, rest) = v.split_at(order.p);
        let (ma, rest) = rest.split_at(order.q);
        let (seasonal_ar, seasonal_ma) = rest.split_at(order.seasonal_p);
        Self {
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            seasonal_ar: seasonal_ar.to_vec(),
            seasonal_ma: seasonal_ma.to_vec(),
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.ar
            .iter()
            .chain(&self.ma)
            .chain(&self.seasonal_ar)
            .chain(&self.seasonal_ma)
            .copied()
            .collect()
    }

    /// `φ(B) Φ(B^s)`.
    pub fn ar_polynomial(&self, period: usize) -> Vec<f64> {
        poly::mul(
            &factor(&self.ar, 1, -1.0),
            &factor(&self.seasonal_ar, period, -1.0),
        )
    }

    /// `θ(B) Θ(B^s)`.
    pub fn ma_polynomial(&self, period: usize) -> Vec<f64> {
        poly::mul(
            &factor(&self.ma, 1, 1.0),
            &factor(&self.seasonal_ma, period, 1.0),
        )
    }
}

/// `1 + sign·(c1·B^step + c2·B^2step + ...)`.
fn factor(coefs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut p = vec![0.0; coefs.len() * step + 1];
    p[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        p[(i + 1) * step] = sign * c;
    }
    p
}

/// A seasonal ARIMA model with known coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct SarimaModel {
    pub order: SarimaOrder,
    pub params: SarimaParams,
    ar_poly: Vec<f64>,
    ma_poly: Vec<f64>,
}

impl SarimaModel {
    pub fn new(order: SarimaOrder, params: SarimaParams) -> Self {
        let ar_poly = params.ar_polynomial(order.period);
        let ma_poly = params.ma_polynomial(order.period);
        Self {
            order,
            params,
            ar_poly,
            ma_poly,
        }
    }

    /// One-step residuals of the ARMA recursion on a differenced series.
    pub fn residuals(&self, w: &[f64]) -> Vec<f64> {
        let mut e = vec![0.0; w.len()];
        for t in 0..w.len() {
            let mut v = w[t];
            for (k, a) in self.ar_poly.iter().enumerate().skip(1) {
                if k > t {
                    break;
                }
                v += a * w[t - k];
            }
            for (k, m) in self.ma_poly.iter().enumerate().skip(1) {
                if k > t {
                    break;
                }
                v -= m * e[t - k];
            }
            e[t] = v;
        }
        e
    }

    /// Conditional sum of squares of a differenced series.
    pub fn css(&self, w: &[f64]) -> f64 {
        self.residuals(w).iter().map(|e| e * e).sum()
    }

    /// Extend the differenced series `horizon` steps with future innovations set to zero.
    pub fn forecast_differenced(&self, w: &[f64], residuals: &[f64], horizon: usize) -> Vec<f64> {
        let n = w.len();
        let mut ext = w.to_vec();
        let mut e = residuals.to_vec();
        e.resize(n + horizon, 0.0);

        for t in n..n + horizon {
            let mut v = 0.0;
            for (k, a) in self.ar_poly.iter().enumerate().skip(1) {
                if k > t {
                    break;
                }
                v -= a * ext[t - k];
            }
            for (k, m) in self.ma_poly.iter().enumerate().skip(1) {
                if k > t {
                    break;
                }
                v += m * e[t - k];
            }
            ext.push(v);
        }

        ext.split_off(n)
    }

    /// Undo differencing: turn forecast `w` values into levels following `history`.
    pub fn integrate(&self, history: &[f64], w_future: &[f64]) -> Vec<f64> {
        let diff = self.order.difference_polynomial();
        let mut y = history.to_vec();
        for &wt in w_future {
            let t = y.len();
            let mut v = wt;
            for (k, c) in diff.iter().enumerate().skip(1) {
                if k > t {
                    break;
                }
                v -= c * y[t - k];
            }
            y.push(v);
        }
        y.split_off(history.len())
    }

    /// MA(∞) weights of the integrated model, `ψ_0 .. ψ_{n-1}`.
    pub fn psi_weights(&self, n: usize) -> Vec<f64> {
        let full_ar = poly::mul(&self.ar_poly, &self.order.difference_polynomial());
        poly::psi_weights(&full_ar, &self.ma_poly, n)
    }
}
