//! ARIMA models for daily demand forecasting

use crate::error::{FitError, ForecastError, Result};
use crate::models::simplex::NelderMead;
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::utils::{difference, integrate, least_squares};
use log::debug;
use statrs::statistics::Statistics;
use std::time::Duration;

/// Largest AR or MA order accepted by [`ArimaModel::new`]
pub const MAX_ORDER: usize = 10;
/// Largest differencing order accepted by [`ArimaModel::new`]
pub const MAX_DIFFERENCING: usize = 2;

/// ARIMA model (AutoRegressive Integrated Moving Average).
///
/// Coefficients are estimated by conditional sum of squares on the
/// differenced series, without a constant term. Hannan–Rissanen regressions
/// supply the starting point and a Nelder–Mead search refines it inside the
/// stationary and invertible region.
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// MA order (q)
    q: usize,
    /// Wall-clock budget for one fit
    time_budget: Option<Duration>,
    /// Iteration cap for the coefficient search
    max_iterations: usize,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    /// Name of the model
    name: String,
    /// Fitted AR coefficients
    ar_coefficients: Vec<f64>,
    /// Fitted MA coefficients
    ma_coefficients: Vec<f64>,
    /// Last observed value at each differencing level, original scale first
    levels: Vec<f64>,
    /// Differenced training series
    differenced: Vec<f64>,
    /// In-sample one-step residuals of the differenced series
    residuals: Vec<f64>,
    /// Residual variance
    sigma2: f64,
    /// Akaike information criterion of the conditional fit
    aic: f64,
    /// Simplex iterations used
    iterations: usize,
}

impl ArimaModel {
    /// Create a new ARIMA model
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        if p > MAX_ORDER || q > MAX_ORDER {
            return Err(ForecastError::InvalidParameter(format!(
                "AR and MA orders must not exceed {}, got p={} q={}",
                MAX_ORDER, p, q
            )));
        }
        if d > MAX_DIFFERENCING {
            return Err(ForecastError::InvalidParameter(format!(
                "Differencing order must not exceed {}, got d={}",
                MAX_DIFFERENCING, d
            )));
        }

        Ok(Self {
            name: format!("ARIMA({},{},{})", p, d, q),
            p,
            d,
            q,
            time_budget: None,
            max_iterations: 5_000,
        })
    }

    /// Limit how long a single fit may run
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    /// Shortest series this model will attempt to fit
    pub fn min_observations(&self) -> usize {
        self.p + self.d + self.q + 1
    }

    /// Starting coefficients from the Hannan–Rissanen regressions, falling
    /// back to zeros when the regressions are singular or inadmissible.
    fn initial_parameters(&self, differenced: &[f64]) -> Vec<f64> {
        let zeros = vec![0.0; self.p + self.q];
        if zeros.is_empty() {
            return zeros;
        }

        match self.hannan_rissanen(differenced) {
            Ok(params) => shrink_into_region(params, self.p).unwrap_or(zeros),
            Err(err) => {
                debug!("{}: starting from zero coefficients ({})", self.name, err);
                zeros
            }
        }
    }

    fn hannan_rissanen(&self, w: &[f64]) -> std::result::Result<Vec<f64>, FitError> {
        let m = w.len();

        // Long autoregression for innovation estimates
        let (innovations, offset) = if self.q == 0 {
            (vec![0.0; m], 0)
        } else {
            let long_order = (self.p + self.q).max((m as f64).ln().ceil() as usize);
            if m <= 2 * long_order {
                return Err(FitError::InsufficientObservations {
                    required: 2 * long_order + 1,
                    actual: m,
                });
            }
            let design: Vec<Vec<f64>> = (long_order..m)
                .map(|t| (1..=long_order).map(|i| w[t - i]).collect())
                .collect();
            let beta = least_squares(&design, &w[long_order..])?;

            let mut innovations = vec![0.0; m];
            for t in long_order..m {
                let predicted: f64 = beta.iter().enumerate().map(|(i, b)| b * w[t - 1 - i]).sum();
                innovations[t] = w[t] - predicted;
            }
            (innovations, long_order)
        };

        let first = offset + self.p.max(self.q);
        if m <= first {
            return Err(FitError::InsufficientObservations {
                required: first + 1,
                actual: m,
            });
        }
        let design: Vec<Vec<f64>> = (first..m)
            .map(|t| {
                (1..=self.p)
                    .map(|i| w[t - i])
                    .chain((1..=self.q).map(|j| innovations[t - j]))
                    .collect()
            })
            .collect();

        least_squares(&design, &w[first..])
    }
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn train(&self, data: &[f64]) -> Result<TrainedArimaModel> {
        let required = self.min_observations();
        if data.len() < required {
            return Err(FitError::InsufficientObservations {
                required,
                actual: data.len(),
            }
            .into());
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(
                "Series contains non-finite values".to_string(),
            ));
        }

        let levels: Vec<f64> = (0..self.d)
            .map(|k| difference(data, k).last().copied().unwrap_or(0.0))
            .collect();
        let differenced = difference(data, self.d);
        let start = self.initial_parameters(&differenced);

        let mut optimizer = NelderMead::new().with_max_iterations(self.max_iterations);
        if let Some(budget) = self.time_budget {
            optimizer = optimizer.with_time_budget(budget);
        }
        let p = self.p;
        let minimum = optimizer.minimize(
            |params| conditional_sum_of_squares(&differenced, p, params),
            &start,
        )?;

        let (ar, ma) = minimum.point.split_at(p);
        let residuals = conditional_residuals(&differenced, ar, ma);
        let effective = (differenced.len() - p) as f64;
        let sigma2 = minimum.value / effective;
        let aic = effective * sigma2.ln() + 2.0 * (self.p + self.q + 1) as f64;

        let in_sample = &residuals[p..];
        debug!(
            "{} fitted in {} iterations: ar={:?} ma={:?} sigma2={:.4} residual mean={:.4} sd={:.4}",
            self.name,
            minimum.iterations,
            ar,
            ma,
            sigma2,
            in_sample.iter().mean(),
            in_sample.iter().std_dev()
        );

        Ok(TrainedArimaModel {
            name: self.name.clone(),
            ar_coefficients: ar.to_vec(),
            ma_coefficients: ma.to_vec(),
            levels,
            differenced,
            residuals,
            sigma2,
            aic,
            iterations: minimum.iterations,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let mut history = self.differenced.clone();
        let mut shocks = self.residuals.clone();
        let mut forecasts = Vec::with_capacity(horizons);

        for _ in 0..horizons {
            let ar_part: f64 = self
                .ar_coefficients
                .iter()
                .zip(history.iter().rev())
                .map(|(phi, w)| phi * w)
                .sum();
            let ma_part: f64 = self
                .ma_coefficients
                .iter()
                .zip(shocks.iter().rev())
                .map(|(theta, e)| theta * e)
                .sum();
            let next = ar_part + ma_part;

            history.push(next);
            // Future shocks have zero expectation
            shocks.push(0.0);
            forecasts.push(next);
        }

        for &level in self.levels.iter().rev() {
            forecasts = integrate(&forecasts, level);
        }

        ForecastResult::new(forecasts, horizons)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArimaModel {
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Residuals of the differenced series, conditioning on the first `p`
/// observations and zero pre-sample shocks.
fn conditional_residuals(w: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut residuals = vec![0.0; w.len()];
    for t in p..w.len() {
        let ar_part: f64 = ar.iter().enumerate().map(|(i, phi)| phi * w[t - 1 - i]).sum();
        let ma_part: f64 = ma
            .iter()
            .enumerate()
            .take(t)
            .map(|(j, theta)| theta * residuals[t - 1 - j])
            .sum();
        residuals[t] = w[t] - ar_part - ma_part;
    }
    residuals
}

/// Objective for the coefficient search; infinite outside the admissible region
fn conditional_sum_of_squares(w: &[f64], p: usize, params: &[f64]) -> f64 {
    if !is_admissible(params, p) {
        return f64::INFINITY;
    }
    let (ar, ma) = params.split_at(p);
    conditional_residuals(w, ar, ma)[p..]
        .iter()
        .map(|e| e * e)
        .sum()
}

fn is_admissible(params: &[f64], p: usize) -> bool {
    let (ar, ma) = params.split_at(p);
    let negated_ma: Vec<f64> = ma.iter().map(|theta| -theta).collect();
    is_stationary(ar) && is_stationary(&negated_ma)
}

/// Whether `x_t = sum(phi_i * x_{t-i})` is stationary, i.e. every partial
/// autocorrelation obtained by the step-down recursion lies inside (-1, 1).
pub(crate) fn is_stationary(coefficients: &[f64]) -> bool {
    let mut current = coefficients.to_vec();
    while let Some(&last) = current.last() {
        if !last.is_finite() || last.abs() >= 1.0 {
            return false;
        }
        let k = current.len();
        let denom = 1.0 - last * last;
        current = (0..k - 1)
            .map(|i| (current[i] + last * current[k - 2 - i]) / denom)
            .collect();
    }
    true
}

fn shrink_into_region(mut params: Vec<f64>, p: usize) -> Option<Vec<f64>> {
    for _ in 0..20 {
        if is_admissible(&params, p) {
            return Some(params);
        }
        params.iter_mut().for_each(|v| *v *= 0.5);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    /// Simulate an ARMA(1,1) difference process and integrate it once
    fn simulated_arima_111(phi: f64, theta: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut level = 100.0;
        let mut prev_w = 0.0;
        let mut prev_e = 0.0;
        let mut series = Vec::with_capacity(n);
        for _ in 0..n {
            let e = noise.sample(&mut rng);
            let w = phi * prev_w + e + theta * prev_e;
            level += w;
            series.push(level);
            prev_w = w;
            prev_e = e;
        }
        series
    }

    #[test]
    fn test_stationarity_region() {
        assert!(is_stationary(&[]));
        assert!(is_stationary(&[0.5]));
        assert!(!is_stationary(&[1.0]));
        assert!(is_stationary(&[0.5, 0.3]));
        assert!(!is_stationary(&[0.7, 0.4]));
        assert!(!is_stationary(&[-0.2, -1.0]));
        assert!(is_stationary(&[1.2, -0.5]));
    }

    #[test]
    fn test_invalid_orders_are_rejected() {
        assert!(ArimaModel::new(11, 1, 0).is_err());
        assert!(ArimaModel::new(1, 3, 1).is_err());
        assert_eq!(ArimaModel::new(2, 1, 2).unwrap().name(), "ARIMA(2,1,2)");
    }

    #[test]
    fn test_short_series_is_insufficient() {
        let model = ArimaModel::new(2, 1, 2).unwrap();
        let err = model.train(&[1.0, 2.0, 3.0, 1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::Fit(FitError::InsufficientObservations { required: 6, actual: 5 })
        ));
    }

    #[test]
    fn test_recovers_simulated_coefficients() {
        let series = simulated_arima_111(0.6, 0.3, 800, 7);
        let trained = ArimaModel::new(1, 1, 1).unwrap().train(&series).unwrap();

        assert_abs_diff_eq!(trained.ar_coefficients()[0], 0.6, epsilon = 0.15);
        assert_abs_diff_eq!(trained.ma_coefficients()[0], 0.3, epsilon = 0.15);
        assert!(trained.sigma2() > 0.7 && trained.sigma2() < 1.3);
    }

    #[test]
    fn test_forecast_is_deterministic_and_sized() {
        let series = simulated_arima_111(0.4, -0.2, 300, 11);
        let model = ArimaModel::new(2, 1, 2).unwrap();

        let first = model.train(&series).unwrap().forecast(365).unwrap();
        let second = model.train(&series).unwrap().forecast(365).unwrap();

        assert_eq!(first.horizons(), 365);
        assert!(first.is_finite());
        assert_eq!(first.values(), second.values());
    }

    #[test]
    fn test_forecast_integrates_from_last_level() {
        // Pure AR(1) on differences: forecasts decay toward the last level.
        let model = TrainedArimaModel {
            name: "ARIMA(1,1,0)".to_string(),
            ar_coefficients: vec![0.5],
            ma_coefficients: vec![],
            levels: vec![10.0],
            differenced: vec![1.0, 2.0, 4.0],
            residuals: vec![0.0, 0.0, 0.0],
            sigma2: 1.0,
            aic: 0.0,
            iterations: 0,
        };
        let forecast = model.forecast(3).unwrap();
        assert_eq!(forecast.values(), &[12.0, 13.0, 13.5]);
    }

    #[test]
    fn test_time_budget_exhaustion_is_a_fit_error() {
        let series = simulated_arima_111(0.4, -0.2, 300, 3);
        let model = ArimaModel::new(2, 1, 2)
            .unwrap()
            .with_time_budget(Duration::ZERO);
        let err = model.train(&series).unwrap_err();
        assert!(matches!(err, ForecastError::Fit(FitError::TimedOut { limit_ms: 0 })));
    }
}
