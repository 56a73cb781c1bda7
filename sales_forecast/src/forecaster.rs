//! Per-product demand forecasting with failure isolation

use crate::data::SalesDataset;
use crate::error::{FitError, ForecastError, Result};
use crate::models::arima::ArimaModel;
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::series::{build_series, ProductSeries};
use log::{debug, warn};
use std::fmt;

/// Days ahead forecast for every product
pub const DEFAULT_HORIZON: usize = 365;

/// ARIMA order applied to every product
pub const DEFAULT_ORDER: (usize, usize, usize) = (2, 1, 2);

/// Why a product received no forecast
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The product has no rows at all
    NoObservations,
    /// Every day holds the same value, so there is nothing to fit
    Degenerate { distinct_values: usize },
    /// Fitting or forecasting failed
    FitFailed(FitError),
    /// Any other per-product failure
    Other(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoObservations => write!(f, "no observations"),
            SkipReason::Degenerate { distinct_values } => {
                write!(f, "degenerate series ({} distinct values)", distinct_values)
            }
            SkipReason::FitFailed(err) => write!(f, "fit failed: {}", err),
            SkipReason::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// Result of forecasting one product
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { predicted_total: f64 },
    Skipped(SkipReason),
}

/// Outcome for one product, tagged with its display name
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutcome {
    pub product_name: String,
    pub outcome: Outcome,
}

impl ForecastOutcome {
    pub fn success(product_name: impl Into<String>, predicted_total: f64) -> Self {
        Self {
            product_name: product_name.into(),
            outcome: Outcome::Success { predicted_total },
        }
    }

    pub fn skipped(product_name: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            product_name: product_name.into(),
            outcome: Outcome::Skipped(reason),
        }
    }

    /// Forecast total, or `None` when the product was skipped
    pub fn predicted_total(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Success { predicted_total } => Some(predicted_total),
            Outcome::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Skipped(reason) => Some(reason),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped(_))
    }
}

/// Fits one model per product series and sums its forecast over the horizon.
///
/// Every failure is converted into [`Outcome::Skipped`]; nothing a single
/// product does can fail the caller.
#[derive(Debug, Clone)]
pub struct ProductForecaster<M: ForecastModel = ArimaModel> {
    model: M,
    horizon: usize,
}

impl ProductForecaster<ArimaModel> {
    /// ARIMA(2,1,2) over a 365 day horizon
    pub fn arima() -> Result<Self> {
        let (p, d, q) = DEFAULT_ORDER;
        Ok(Self::new(ArimaModel::new(p, d, q)?, DEFAULT_HORIZON))
    }
}

impl<M: ForecastModel> ProductForecaster<M> {
    pub fn new(model: M, horizon: usize) -> Self {
        Self { model, horizon }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Build the product's series from the dataset, then forecast it
    pub fn forecast_product(&self, dataset: &SalesDataset, product_name: &str) -> ForecastOutcome {
        match build_series(dataset, product_name) {
            Ok(series) => self.forecast(&series),
            Err(ForecastError::InsufficientData(_)) => {
                ForecastOutcome::skipped(product_name, SkipReason::NoObservations)
            }
            Err(err) => ForecastOutcome::skipped(product_name, SkipReason::Other(err.to_string())),
        }
    }

    /// Forecast one series
    pub fn forecast(&self, series: &ProductSeries) -> ForecastOutcome {
        let name = series.product_name();

        if series.is_empty() {
            return ForecastOutcome::skipped(name, SkipReason::NoObservations);
        }
        if series.is_degenerate() {
            let reason = SkipReason::Degenerate {
                distinct_values: series.distinct_values(),
            };
            debug!("Skipping '{}': {}", name, reason);
            return ForecastOutcome::skipped(name, reason);
        }

        match self.predict_total(series) {
            Ok(predicted_total) => {
                debug!(
                    "'{}': {} predicts {:.2} units over {} days",
                    name,
                    self.model.name(),
                    predicted_total,
                    self.horizon
                );
                ForecastOutcome::success(name, predicted_total)
            }
            Err(err) => {
                let reason = match err {
                    ForecastError::Fit(fit) => SkipReason::FitFailed(fit),
                    other => SkipReason::Other(other.to_string()),
                };
                warn!("Skipping '{}': {}", name, reason);
                ForecastOutcome::skipped(name, reason)
            }
        }
    }

    fn predict_total(&self, series: &ProductSeries) -> Result<f64> {
        let trained = self.model.train(&series.values())?;
        let forecast = trained.forecast(self.horizon)?;
        if !forecast.is_finite() {
            return Err(FitError::NonFiniteForecast.into());
        }
        Ok(forecast.total())
    }
}
