use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use sales_forecast::models::arima::ArimaModel;
use sales_forecast::models::{ForecastModel, TrainedForecastModel};
use sales_forecast::{FitError, ForecastError};

fn random_walk(seed: u64, n: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 2.0).unwrap();
    let mut level = 50.0;
    (0..n)
        .map(|_| {
            level += noise.sample(&mut rng);
            level
        })
        .collect()
}

#[test]
fn test_arima_forecast_has_requested_horizon() {
    let model = ArimaModel::new(2, 1, 2).unwrap();
    assert_eq!(model.name(), "ARIMA(2,1,2)");

    let trained = model.train(&random_walk(1, 150)).unwrap();
    let forecast = trained.forecast(365).unwrap();

    assert_eq!(forecast.horizons(), 365);
    assert_eq!(forecast.values().len(), 365);
    assert!(forecast.is_finite());
    assert_relative_eq!(forecast.total(), forecast.values().iter().sum::<f64>());
}

#[test]
fn test_arima_fit_is_deterministic() {
    let data = random_walk(9, 120);
    let model = ArimaModel::new(2, 1, 2).unwrap();

    let first = model.train(&data).unwrap().forecast(30).unwrap();
    let second = model.train(&data).unwrap().forecast(30).unwrap();
    assert_eq!(first.values(), second.values());
}

#[test]
fn test_arima_rejects_short_and_non_finite_input() {
    let model = ArimaModel::new(2, 1, 2).unwrap();

    assert!(matches!(
        model.train(&[1.0, 2.0, 3.0]),
        Err(ForecastError::Fit(FitError::InsufficientObservations {
            required: 6,
            actual: 3
        }))
    ));

    let mut data = random_walk(2, 40);
    data[10] = f64::NAN;
    assert!(model.train(&data).is_err());
}

#[test]
fn test_pure_autoregressive_order() {
    let model = ArimaModel::new(1, 1, 0).unwrap();
    let trained = model.train(&random_walk(5, 80)).unwrap();
    assert_eq!(trained.ar_coefficients().len(), 1);
    assert!(trained.ma_coefficients().is_empty());
    assert!(trained.sigma2() > 0.0);
}
