//! Derivative-free Nelder–Mead minimiser used to refine model coefficients

use crate::error::FitError;
use std::time::{Duration, Instant};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;
const INITIAL_STEP: f64 = 0.1;
const TINY: f64 = 1e-20;

/// Best point found by the simplex search
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
}

/// Nelder–Mead simplex search.
///
/// The objective may return `f64::INFINITY` (or NaN, treated the same) to
/// mark points outside the admissible region. The search is deterministic:
/// the same objective and start always yield the same minimum.
#[derive(Debug, Clone)]
pub struct NelderMead {
    max_iterations: usize,
    xtol: f64,
    ftol: f64,
    time_budget: Option<Duration>,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 5_000,
            xtol: 1e-8,
            ftol: 1e-10,
            time_budget: None,
        }
    }
}

impl NelderMead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Abort with [`FitError::TimedOut`] once the search runs longer than `budget`
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn minimize<F>(&self, objective: F, start: &[f64]) -> Result<Minimum, FitError>
    where
        F: Fn(&[f64]) -> f64,
    {
        let started = Instant::now();
        let eval = |x: &[f64]| {
            let value = objective(x);
            if value.is_finite() {
                value
            } else {
                f64::INFINITY
            }
        };

        let start_value = eval(start);
        if !start_value.is_finite() {
            return Err(FitError::NonFiniteObjective);
        }

        let n = start.len();
        if n == 0 {
            return Ok(Minimum {
                point: Vec::new(),
                value: start_value,
                iterations: 0,
            });
        }

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((start.to_vec(), start_value));
        for i in 0..n {
            let mut vertex = start.to_vec();
            vertex[i] += INITIAL_STEP;
            let mut value = eval(&vertex);
            if !value.is_finite() {
                vertex[i] = start[i] - INITIAL_STEP;
                value = eval(&vertex);
            }
            simplex.push((vertex, value));
        }

        for iteration in 0..self.max_iterations {
            if let Some(budget) = self.time_budget {
                if started.elapsed() > budget {
                    return Err(FitError::TimedOut {
                        limit_ms: budget.as_millis(),
                    });
                }
            }

            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

            let best_value = simplex[0].1;
            let worst_value = simplex[n].1;
            if self.has_converged(&simplex, best_value, worst_value) {
                let (point, value) = simplex.swap_remove(0);
                return Ok(Minimum {
                    point,
                    value,
                    iterations: iteration,
                });
            }

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|(x, _)| x[j]).sum::<f64>() / n as f64)
                .collect();
            let toward = |from: &[f64], scale: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(from)
                    .map(|(c, x)| c + scale * (x - c))
                    .collect()
            };

            let reflected = toward(&simplex[n].0, -REFLECTION);
            let reflected_value = eval(&reflected);

            if reflected_value < best_value {
                let expanded = toward(&reflected, EXPANSION);
                let expanded_value = eval(&expanded);
                simplex[n] = if expanded_value < reflected_value {
                    (expanded, expanded_value)
                } else {
                    (reflected, reflected_value)
                };
                continue;
            }

            if reflected_value < simplex[n - 1].1 {
                simplex[n] = (reflected, reflected_value);
                continue;
            }

            let outside = reflected_value < worst_value;
            let contracted = if outside {
                toward(&reflected, CONTRACTION)
            } else {
                toward(&simplex[n].0, CONTRACTION)
            };
            let contracted_value = eval(&contracted);
            let accepted = if outside {
                contracted_value <= reflected_value
            } else {
                contracted_value < worst_value
            };
            if accepted {
                simplex[n] = (contracted, contracted_value);
                continue;
            }

            let anchor = simplex[0].0.clone();
            for (vertex, value) in simplex.iter_mut().skip(1) {
                for (x, a) in vertex.iter_mut().zip(&anchor) {
                    *x = a + SHRINK * (*x - a);
                }
                *value = eval(vertex);
            }
        }

        Err(FitError::NotConverged {
            iterations: self.max_iterations,
        })
    }

    fn has_converged(&self, simplex: &[(Vec<f64>, f64)], best: f64, worst: f64) -> bool {
        let best_point = &simplex[0].0;
        let diameter = simplex
            .iter()
            .skip(1)
            .flat_map(|(x, _)| x.iter().zip(best_point).map(|(a, b)| (a - b).abs()))
            .fold(0.0_f64, f64::max);
        if diameter <= self.xtol {
            return true;
        }

        worst.is_finite() && 2.0 * (worst - best) <= self.ftol * (worst.abs() + best.abs()) + TINY
    }
}
