//! End-to-end run: dataset in, both rankings and their artifacts out

use crate::data::SalesDataset;
use crate::error::{ForecastError, Result};
use crate::forecaster::{ForecastOutcome, ProductForecaster, DEFAULT_HORIZON, DEFAULT_ORDER};
use crate::models::arima::ArimaModel;
use crate::output::{
    best_seller_rows, predicted_seller_rows, write_best_sellers, write_file,
    write_predicted_sellers, OutcomeReport, BEST_SELLERS_FILE, PREDICTED_SELLERS_FILE,
};
use crate::ranking::{ForecastAggregator, HistoricalRanker, RankedEntry, DEFAULT_TOP_N};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default wall-clock budget for fitting one product
pub const DEFAULT_FIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Entries kept in each ranking
    pub top_n: usize,
    /// Days forecast per product
    pub horizon: usize,
    /// ARIMA (p, d, q)
    pub order: (usize, usize, usize),
    /// Per-product fitting budget; `None` disables the limit
    pub fit_timeout: Option<Duration>,
    /// Forecast products on the rayon pool instead of one at a time
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            horizon: DEFAULT_HORIZON,
            order: DEFAULT_ORDER,
            fit_timeout: Some(DEFAULT_FIT_TIMEOUT),
            parallel: true,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(ForecastError::InvalidParameter(
                "top_n must be positive".to_string(),
            ));
        }
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn model(&self) -> Result<ArimaModel> {
        let (p, d, q) = self.order;
        let model = ArimaModel::new(p, d, q)?;
        Ok(match self.fit_timeout {
            Some(budget) => model.with_time_budget(budget),
            None => model,
        })
    }
}

/// Both rankings plus the outcome of every forecast attempt
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub best_sellers: Vec<RankedEntry<u64>>,
    pub predicted_sellers: Vec<RankedEntry<f64>>,
    pub outcomes: Vec<ForecastOutcome>,
}

impl PipelineOutput {
    pub fn report(&self) -> OutcomeReport {
        OutcomeReport::new(&self.outcomes)
    }
}

/// Paths of the files written by [`write_artifacts`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub best_sellers: PathBuf,
    pub predicted_sellers: PathBuf,
}

/// Compute the historical and forecast rankings for `dataset`
pub fn run(dataset: &SalesDataset, config: &PipelineConfig) -> Result<PipelineOutput> {
    config.validate()?;

    info!(
        "Ranking {} records; forecasting {} days with ARIMA{:?}",
        dataset.len(),
        config.horizon,
        config.order
    );

    let best_sellers = HistoricalRanker::new(config.top_n).rank(dataset);

    let forecaster = ProductForecaster::new(config.model()?, config.horizon);
    let mut aggregator = ForecastAggregator::new(forecaster, config.top_n);
    if !config.parallel {
        aggregator = aggregator.sequential();
    }
    let ranking = aggregator.rank(dataset);

    Ok(PipelineOutput {
        best_sellers,
        predicted_sellers: ranking.top,
        outcomes: ranking.outcomes,
    })
}

/// Write both ranking tables into `out_dir`, overwriting earlier runs
pub fn write_artifacts<P: AsRef<Path>>(output: &PipelineOutput, out_dir: P) -> Result<Artifacts> {
    let out_dir = out_dir.as_ref();
    let artifacts = Artifacts {
        best_sellers: out_dir.join(BEST_SELLERS_FILE),
        predicted_sellers: out_dir.join(PREDICTED_SELLERS_FILE),
    };

    let best = best_seller_rows(&output.best_sellers);
    write_file(&artifacts.best_sellers, |w| write_best_sellers(w, &best))?;
    info!("Wrote {} rows to {}", best.len(), artifacts.best_sellers.display());

    let predicted = predicted_seller_rows(&output.predicted_sellers);
    write_file(&artifacts.predicted_sellers, |w| write_predicted_sellers(w, &predicted))?;
    info!(
        "Wrote {} rows to {}",
        predicted.len(),
        artifacts.predicted_sellers.display()
    );

    Ok(artifacts)
}

/// Write the per-product outcome report as JSON
pub fn write_report<P: AsRef<Path>>(output: &PipelineOutput, path: P) -> Result<()> {
    let path = path.as_ref();
    write_file(path, |w| output.report().write_json(w))?;
    info!("Wrote outcome report to {}", path.display());
    Ok(())
}
