//! L2-regularised logistic regression fitted with L-BFGS.
//!
//! Minimises `0.5 * ||w||^2 + C * sum_i logloss(y_i, x_i . w + b)`; the
//! intercept `b` is not penalised. The fit is deterministic: same data and
//! settings give bit-identical coefficients.

use std::collections::VecDeque;

use genorank_common::{GenorankError, LogRegSettings, Result};
use ndarray::{s, Array1, ArrayView1, ArrayView2};
use tracing::{debug, warn};

const ARMIJO_C1: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;
const CURVATURE_EPS: f64 = 1e-10;

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow.
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

/// A fitted binary classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    pub coef: Array1<f64>,
    pub intercept: f64,
    pub iterations: usize,
    pub converged: bool,
}

struct Objective<'x, 'y> {
    x: ArrayView2<'x, f64>,
    y: ArrayView1<'y, f64>,
    c: f64,
}

impl Objective<'_, '_> {
    /// Value and gradient at `theta = [w..., b]`.
    fn eval(&self, theta: &Array1<f64>) -> (f64, Array1<f64>) {
        let d = self.x.ncols();
        let w = theta.slice(s![..d]);
        let b = theta[d];
        let z = self.x.dot(&w) + b;

        let mut loss = 0.0;
        let mut resid = Array1::<f64>::zeros(z.len());
        for (i, (&zi, &yi)) in z.iter().zip(self.y.iter()).enumerate() {
            loss += softplus(zi) - yi * zi;
            resid[i] = sigmoid(zi) - yi;
        }

        let value = 0.5 * w.dot(&w) + self.c * loss;
        let mut grad = Array1::<f64>::zeros(d + 1);
        grad.slice_mut(s![..d]).assign(&(&w + &(self.x.t().dot(&resid) * self.c)));
        grad[d] = self.c * resid.sum();
        (value, grad)
    }
}

/// `H * g` from the stored correction pairs (two-loop recursion).
fn two_loop(g: &Array1<f64>, pairs: &VecDeque<(Array1<f64>, Array1<f64>)>) -> Array1<f64> {
    let mut q = g.clone();
    let mut alphas = vec![0.0; pairs.len()];
    for (i, (s, y)) in pairs.iter().enumerate().rev() {
        let alpha = s.dot(&q) / y.dot(s);
        q.scaled_add(-alpha, y);
        alphas[i] = alpha;
    }
    let gamma = match pairs.back() {
        Some((s, y)) => s.dot(y) / y.dot(y),
        None => 1.0,
    };
    let mut r = q * gamma;
    for (i, (s, y)) in pairs.iter().enumerate() {
        let beta = y.dot(&r) / y.dot(s);
        r.scaled_add(alphas[i] - beta, s);
    }
    r
}

fn max_abs(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}

impl LogisticModel {
    /// Fit on rows of `x` with 0/1 labels `y`.
    pub fn fit(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, settings: &LogRegSettings) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(GenorankError::NumericDegeneracy(format!(
                "{} training rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        let n_pos = y.iter().filter(|&&v| v > 0.5).count();
        if n_pos == 0 || n_pos == y.len() {
            return Err(GenorankError::NumericDegeneracy(format!(
                "logistic regression needs both classes, got {} positives of {} rows",
                n_pos,
                y.len()
            )));
        }

        let objective = Objective { x, y, c: settings.c };
        let d = x.ncols();
        let mut theta = Array1::<f64>::zeros(d + 1);
        let (mut value, mut grad) = objective.eval(&theta);
        let mut pairs: VecDeque<(Array1<f64>, Array1<f64>)> = VecDeque::with_capacity(settings.history);
        let mut converged = false;
        let mut iterations = 0;

        while iterations < settings.max_iter {
            if max_abs(&grad) <= settings.tol {
                converged = true;
                break;
            }
            iterations += 1;

            let mut direction = -two_loop(&grad, &pairs);
            let mut slope = grad.dot(&direction);
            if slope.is_nan() || slope >= 0.0 {
                // Not a descent direction: restart from steepest descent.
                pairs.clear();
                direction = -grad.clone();
                slope = grad.dot(&direction);
            }

            let mut step = if pairs.is_empty() { (1.0 / max_abs(&grad)).min(1.0) } else { 1.0 };
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let candidate = &theta + &(&direction * step);
                let (v, g) = objective.eval(&candidate);
                if v.is_finite() && v <= value + ARMIJO_C1 * step * slope {
                    accepted = Some((candidate, v, g));
                    break;
                }
                step *= 0.5;
            }
            let Some((next, next_value, next_grad)) = accepted else {
                // No decrease along the search direction: at the floating point floor.
                converged = max_abs(&grad) <= settings.tol * 10.0;
                break;
            };

            let s_k = &next - &theta;
            let y_k = &next_grad - &grad;
            if s_k.dot(&y_k) > CURVATURE_EPS {
                if pairs.len() == settings.history {
                    pairs.pop_front();
                }
                pairs.push_back((s_k, y_k));
            }

            let decrease = value - next_value;
            theta = next;
            value = next_value;
            grad = next_grad;

            if decrease.abs() <= f64::EPSILON * value.abs().max(1.0) && max_abs(&grad) <= settings.tol * 10.0 {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(iterations, grad = max_abs(&grad), "Logistic regression hit the iteration cap");
        }
        debug!(iterations, objective = value, "Logistic regression fitted");

        if theta.iter().any(|v| !v.is_finite()) {
            return Err(GenorankError::NumericDegeneracy(
                "logistic regression produced non-finite coefficients".into(),
            ));
        }

        Ok(Self {
            coef: theta.slice(s![..d]).to_owned(),
            intercept: theta[d],
            iterations,
            converged,
        })
    }

    pub fn decision_function(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.dot(&self.coef) + self.intercept
    }

    /// Probability of the positive class for every row.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Array1<f64> {
        self.decision_function(x).mapv(sigmoid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(softplus(800.0).is_finite());
        assert!((softplus(0.0) - 2f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn test_symmetric_problem_optimum() {
        // Stationarity for x = [-1, 1], y = [0, 1], C = 1: w = 2 * sigmoid(-w), b = 0.
        let x = array![[-1.0], [1.0]];
        let y = array![0.0, 1.0];
        let m = LogisticModel::fit(x.view(), y.view(), &LogRegSettings::default()).unwrap();
        let w = m.coef[0];
        assert!(m.converged);
        assert!((w - 2.0 * sigmoid(-w)).abs() < 1e-3);
        assert!(m.intercept.abs() < 1e-3);
    }

    #[test]
    fn test_separable_data_ranks_positives_first() {
        let x = array![[2.0, 0.1], [1.5, -0.2], [1.8, 0.0], [-1.0, 0.3], [-1.5, 0.1], [-0.8, -0.4]];
        let y = array![1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let m = LogisticModel::fit(x.view(), y.view(), &LogRegSettings::default()).unwrap();
        let p = m.predict_proba(x.view());
        assert!(p.iter().take(3).all(|&v| v > 0.5));
        assert!(p.iter().skip(3).all(|&v| v < 0.5));
        assert!(m.coef[0] > 0.0);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x = array![[0.3, 1.0], [1.2, -0.5], [-0.7, 0.2], [0.1, 0.1], [2.0, 1.5]];
        let y = array![1.0, 0.0, 0.0, 1.0, 1.0];
        let a = LogisticModel::fit(x.view(), y.view(), &LogRegSettings::default()).unwrap();
        let b = LogisticModel::fit(x.view(), y.view(), &LogRegSettings::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 1.0];
        let err = LogisticModel::fit(x.view(), y.view(), &LogRegSettings::default()).unwrap_err();
        assert!(matches!(err, GenorankError::NumericDegeneracy(_)));
    }

    fn fit_against_own_labels(x: ArrayView2<'_, f64>) -> LogisticModel {
        let y: Array1<f64> = x.column(0).mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        LogisticModel::fit(x, y.view(), &LogRegSettings::default()).unwrap()
    }

    #[test]
    fn test_fit_accepts_views_with_distinct_owners() {
        let x = array![[1.0, 0.2], [0.8, -0.1], [-0.9, 0.3], [-1.1, 0.0]];
        let m = fit_against_own_labels(x.view());
        assert!(m.converged);
        assert!(m.coef[0] > 0.0);
    }
}
