//! Top-N rankings by historical and forecasted units sold

use crate::data::{ProductRows, SalesDataset};
use crate::forecaster::{ForecastOutcome, ProductForecaster, SkipReason};
use crate::models::ForecastModel;
use crate::series::ProductSeries;
use log::info;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Number of products kept in each ranking
pub const DEFAULT_TOP_N: usize = 10;

/// One product and the metric it was ranked by
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry<M> {
    pub product_name: String,
    pub metric: M,
}

impl<M> RankedEntry<M> {
    pub fn new(product_name: impl Into<String>, metric: M) -> Self {
        Self {
            product_name: product_name.into(),
            metric,
        }
    }
}

/// Keep the `n` entries with the largest metric, largest first.
///
/// The sort is stable, so entries with equal metrics keep their input order.
pub fn rank_top_n<M: PartialOrd>(mut entries: Vec<RankedEntry<M>>, n: usize) -> Vec<RankedEntry<M>> {
    entries.sort_by(|a, b| b.metric.partial_cmp(&a.metric).unwrap_or(Ordering::Equal));
    entries.truncate(n);
    entries
}

/// Ranks products by total units sold
#[derive(Debug, Clone)]
pub struct HistoricalRanker {
    top_n: usize,
}

impl Default for HistoricalRanker {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl HistoricalRanker {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Sum units per product and keep the best sellers
    pub fn rank(&self, dataset: &SalesDataset) -> Vec<RankedEntry<u64>> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut totals: Vec<RankedEntry<u64>> = Vec::new();

        for record in dataset.records() {
            let name = record.product_name.as_str();
            let slot = *index.entry(name).or_insert_with(|| {
                totals.push(RankedEntry::new(name, 0));
                totals.len() - 1
            });
            totals[slot].metric = totals[slot].metric.saturating_add(record.units_sold);
        }

        rank_top_n(totals, self.top_n)
    }
}

/// Forecast ranking together with every per-product outcome
#[derive(Debug, Clone, Default)]
pub struct ForecastRanking {
    /// Best forecast sellers, largest total first
    pub top: Vec<RankedEntry<f64>>,
    /// One outcome per distinct product, in first-seen order
    pub outcomes: Vec<ForecastOutcome>,
}

impl ForecastRanking {
    pub fn skipped(&self) -> impl Iterator<Item = &ForecastOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }
}

/// Runs the forecaster over every product and ranks the successes
#[derive(Debug, Clone)]
pub struct ForecastAggregator<M: ForecastModel> {
    forecaster: ProductForecaster<M>,
    top_n: usize,
    parallel: bool,
}

impl<M> ForecastAggregator<M>
where
    M: ForecastModel + Sync,
{
    pub fn new(forecaster: ProductForecaster<M>, top_n: usize) -> Self {
        Self {
            forecaster,
            top_n,
            parallel: true,
        }
    }

    /// Process products one at a time on the calling thread
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn forecaster(&self) -> &ProductForecaster<M> {
        &self.forecaster
    }

    /// Forecast every product and keep the top totals.
    ///
    /// Outcomes are collected in first-seen product order whether or not the
    /// work ran in parallel, so the ranking never depends on completion order.
    pub fn rank(&self, dataset: &SalesDataset) -> ForecastRanking {
        let groups = dataset.group_by_product();

        let forecast_group = |group: &ProductRows<'_>| {
            match ProductSeries::from_records(group.product_name, group.records.iter().copied()) {
                Ok(series) => self.forecaster.forecast(&series),
                Err(_) => ForecastOutcome::skipped(group.product_name, SkipReason::NoObservations),
            }
        };

        let outcomes: Vec<ForecastOutcome> = if self.parallel {
            groups.par_iter().map(forecast_group).collect()
        } else {
            groups.iter().map(forecast_group).collect()
        };

        let successes: Vec<RankedEntry<f64>> = outcomes
            .iter()
            .filter_map(|outcome| {
                outcome
                    .predicted_total()
                    .map(|total| RankedEntry::new(outcome.product_name.clone(), total))
            })
            .collect();

        info!(
            "Forecast {} of {} products ({} skipped)",
            successes.len(),
            outcomes.len(),
            outcomes.len() - successes.len()
        );

        ForecastRanking {
            top: rank_top_n(successes, self.top_n),
            outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SalesRecord;
    use chrono::{Days, NaiveDate};
    use pretty_assertions::assert_eq;

    fn records(name: &str, units: &[u64]) -> Vec<SalesRecord> {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        units
            .iter()
            .enumerate()
            .map(|(i, &u)| SalesRecord::new(start + Days::new(i as u64), name, u))
            .collect()
    }

    #[test]
    fn test_rank_top_n_is_stable_and_truncates() {
        let entries = vec![
            RankedEntry::new("a", 3.0),
            RankedEntry::new("b", -1.0),
            RankedEntry::new("c", 7.0),
            RankedEntry::new("d", 3.0),
        ];
        let ranked = rank_top_n(entries, 3);
        let names: Vec<&str> = ranked.iter().map(|e| e.product_name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "d"]);
    }

    #[test]
    fn test_negative_metrics_rank_below_positive() {
        let ranked = rank_top_n(
            vec![RankedEntry::new("x", -50.0), RankedEntry::new("y", -5.0)],
            10,
        );
        assert_eq!(ranked[0].product_name, "y");
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_historical_ranker_sums_and_limits() {
        let mut rows = Vec::new();
        for i in 0..12u64 {
            rows.extend(records(&format!("p{}", i), &[i, i]));
        }
        let dataset = SalesDataset::new(rows);
        let ranked = HistoricalRanker::default().rank(&dataset);

        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0], RankedEntry::new("p11", 22));
        assert_eq!(ranked[9], RankedEntry::new("p2", 4));
    }

    #[test]
    fn test_historical_ties_keep_first_seen_product() {
        let mut rows = records("late", &[5]);
        rows.extend(records("early", &[2, 3]));
        let ranked = HistoricalRanker::new(10).rank(&SalesDataset::new(rows));
        assert_eq!(ranked[0].product_name, "late");
        assert_eq!(ranked[1].product_name, "early");
    }

    #[test]
    fn test_empty_dataset_yields_empty_rankings() {
        let dataset = SalesDataset::default();
        assert!(HistoricalRanker::default().rank(&dataset).is_empty());

        let aggregator = ForecastAggregator::new(ProductForecaster::arima().unwrap(), 10);
        let ranking = aggregator.rank(&dataset);
        assert!(ranking.top.is_empty());
        assert!(ranking.outcomes.is_empty());
    }

    #[test]
    fn test_single_row_product_is_not_forecast() {
        let dataset = SalesDataset::new(records("solo", &[9]));
        assert_eq!(HistoricalRanker::default().rank(&dataset).len(), 1);

        let ranking = ForecastAggregator::new(ProductForecaster::arima().unwrap(), 10).rank(&dataset);
        assert!(ranking.top.is_empty());
        assert_eq!(ranking.skipped().count(), 1);
    }
}
