//! Bounded Nelder–Mead simplex minimisation.
//!
//! The seasonal model has four coefficients and a non-smooth-at-the-bounds
//! objective, so a derivative-free simplex search is sufficient. Points are
//! clamped into their box after every move.

/// Result of a minimisation.
#[derive(Debug, Clone)]
pub struct SimplexResult {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Configuration for Nelder–Mead.
#[derive(Debug, Clone)]
pub struct SimplexConfig {
    pub max_iter: usize,
    /// Relative spread of objective values across the simplex that counts as converged.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Offset of the initial simplex vertices from the starting point.
    pub initial_step: f64,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            tolerance: 1e-10,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

/// Minimise `objective` starting from `initial`, keeping each coordinate in `bounds`.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: &[(f64, f64)],
    config: &SimplexConfig,
) -> SimplexResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let eval = |p: &[f64]| {
        let v = objective(p);
        if v.is_nan() { f64::INFINITY } else { v }
    };

    if n == 0 {
        return SimplexResult {
            point: vec![],
            value: eval(&[]),
            iterations: 0,
            converged: true,
        };
    }

    let start = clamp(initial, bounds);
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for i in 0..n {
        let mut vertex = start.clone();
        vertex[i] += config.initial_step;
        // Step inwards when the outward step would be clamped back onto the start.
        if let Some(&(_, hi)) = bounds.get(i) {
            if vertex[i] > hi {
                vertex[i] = start[i] - config.initial_step;
            }
        }
        simplex.push(clamp(&vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        let spread = values[worst] - values[best];
        if spread.is_finite() && spread <= config.tolerance * (1.0 + values[best].abs()) {
            converged = true;
            break;
        }

        let centroid = centroid_excluding(&simplex, worst);
        let diameter = simplex
            .iter()
            .map(|v| distance(v, &centroid))
            .fold(0.0, f64::max);
        if diameter < config.tolerance {
            converged = true;
            break;
        }

        let reflected = clamp(&towards(&centroid, &simplex[worst], -config.alpha), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < values[best] {
            let expanded = clamp(&towards(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        // Outside contraction when the reflection helped at all, inside otherwise.
        let target = if reflected_value < values[worst] {
            &reflected
        } else {
            &simplex[worst]
        };
        let contracted = clamp(&towards(&centroid, target, config.rho), bounds);
        let contracted_value = eval(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(&simplex[i])
                .map(|(a, x)| a + config.sigma * (x - a))
                .collect();
            simplex[i] = clamp(&shrunk, bounds);
            values[i] = eval(&simplex[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    SimplexResult {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

fn clamp(point: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    point
        .iter()
        .enumerate()
        .map(|(i, &x)| match bounds.get(i) {
            Some(&(lo, hi)) => x.clamp(lo, hi),
            None => x,
        })
        .collect()
}

fn centroid_excluding(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut c = vec![0.0; n];
    for (i, vertex) in simplex.iter().enumerate() {
        if i == exclude {
            continue;
        }
        for (acc, x) in c.iter_mut().zip(vertex) {
            *acc += x;
        }
    }
    c.iter_mut().for_each(|x| *x /= count);
    c
}

/// `centroid + coef * (point - centroid)`.
fn towards(centroid: &[f64], point: &[f64], coef: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + coef * (p - c))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn minimises_shifted_quadratic() {
        let result = nelder_mead(
            |x| (x[0] - 0.3).powi(2) + (x[1] + 0.4).powi(2),
            &[0.0, 0.0],
            &[(-1.0, 1.0), (-1.0, 1.0)],
            &SimplexConfig::default(),
        );
        assert!(result.converged);
        assert_abs_diff_eq!(result.point[0], 0.3, epsilon = 1e-3);
        assert_abs_diff_eq!(result.point[1], -0.4, epsilon = 1e-3);
    }

    #[test]
    fn respects_bounds_when_optimum_is_outside() {
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[0.0],
            &[(-0.99, 0.99)],
            &SimplexConfig::default(),
        );
        assert!(result.point[0] <= 0.99);
        assert_abs_diff_eq!(result.point[0], 0.99, epsilon = 1e-6);
    }

    #[test]
    fn nan_objective_is_treated_as_worst() {
        let result = nelder_mead(
            |x| if x[0] > 0.5 { f64::NAN } else { (x[0] - 0.2).powi(2) },
            &[0.0],
            &[(-1.0, 1.0)],
            &SimplexConfig::default(),
        );
        assert!(result.value.is_finite());
        assert_abs_diff_eq!(result.point[0], 0.2, epsilon = 1e-3);
    }

    #[test]
    fn coupled_quadratic_in_four_dimensions() {
        let target = [0.5, -0.2, 0.1, -0.6];
        let f = |x: &[f64]| {
            let d: Vec<f64> = x.iter().zip(&target).map(|(a, b)| a - b).collect();
            d.iter().map(|v| v * v).sum::<f64>() + 0.5 * d[0] * d[1] + 0.3 * d[2] * d[3]
        };
        let result = nelder_mead(f, &[0.1; 4], &[(-0.99, 0.99); 4], &SimplexConfig::default());
        assert!(result.converged);
        for (got, want) in result.point.iter().zip(&target) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-3);
        }
    }
}
