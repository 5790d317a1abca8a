//! Least squares solver.
//!
//! The forecast engine seeds its optimiser from a small regression of the
//! differenced series on its own lags:
//!
//! ```text
//! minimize Σ (w_t - x_t^T β)^2,   x_t = (w_{t-1}, w_{t-s})
//! ```
//!
//! Implementation choices:
//! - We use SVD so the tall design matrix (more rows than columns) is handled
//!   without forming normal equations.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Short or flat series make the lag columns nearly collinear, so the solve
//!   retries with looser singular-value cutoffs before giving up.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() == 0 || x.nrows() != y.len() {
        return None;
    }

    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Regress `w_t` on the given lags of itself, without intercept.
///
/// Rows start at the largest lag so every regressor is observed. Returns
/// `None` when there are fewer rows than lags.
pub fn lag_regression(w: &[f64], lags: &[usize]) -> Option<Vec<f64>> {
    let max_lag = lags.iter().copied().max()?;
    if w.len() <= max_lag {
        return None;
    }
    let rows = w.len() - max_lag;
    if rows < lags.len() {
        return None;
    }

    let x = DMatrix::from_fn(rows, lags.len(), |r, c| w[max_lag + r - lags[c]]);
    let y = DVector::from_iterator(rows, w[max_lag..].iter().copied());

    solve_least_squares(&x, &y).map(|beta| beta.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn lag_regression_recovers_ar1_coefficient() {
        // Deterministic AR(1) driven by LCG noise uniform on [-0.5, 0.5).
        let mut state: u64 = 42;
        let mut w = vec![1.0];
        for t in 1..2000 {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let shock = (state >> 33) as f64 / (1u64 << 31) as f64 - 0.5;
            w.push(0.6 * w[t - 1] + shock);
        }
        let beta = lag_regression(&w, &[1]).unwrap();
        assert!((beta[0] - 0.6).abs() < 0.05, "got {}", beta[0]);
    }

    #[test]
    fn lag_regression_needs_enough_rows() {
        assert!(lag_regression(&[1.0, 2.0, 3.0], &[1, 12]).is_none());
        assert!(lag_regression(&[1.0, 2.0], &[]).is_none());
    }
}
