//! Lag-polynomial arithmetic.
//!
//! A polynomial in the backshift operator `B` is stored as its coefficient
//! vector `[c0, c1, ..., ck]`, meaning `c0 + c1·B + ... + ck·B^k`.

/// Multiply two lag polynomials.
pub fn mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        if *x == 0.0 {
            continue;
        }
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + c·B^lag`.
pub fn binomial(c: f64, lag: usize) -> Vec<f64> {
    let mut p = vec![0.0; lag + 1];
    p[0] = 1.0;
    p[lag] += c;
    p
}

/// `(1 - B^lag)^order`.
pub fn difference_operator(lag: usize, order: usize) -> Vec<f64> {
    (0..order).fold(vec![1.0], |acc, _| mul(&acc, &binomial(-1.0, lag)))
}

/// First `n` weights of `ma(B) / ar(B)` (the MA(∞) representation).
///
/// Both polynomials must have a leading coefficient of 1.
pub fn psi_weights(ar: &[f64], ma: &[f64], n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        let mut v = ma.get(j).copied().unwrap_or(0.0);
        for k in 1..=j.min(ar.len().saturating_sub(1)) {
            v -= ar[k] * psi[j - k];
        }
        psi.push(v);
    }
    psi
}

/// Apply `(1 - B^lag)` once, dropping the first `lag` values.
pub fn difference(series: &[f64], lag: usize) -> Vec<f64> {
    if series.len() <= lag {
        return vec![];
    }
    series[lag..]
        .iter()
        .zip(series)
        .map(|(x, prev)| x - prev)
        .collect()
}
