//! Contiguous daily demand series for a single product

use crate::data::{SalesDataset, SalesRecord};
use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Daily units sold for one product, one entry per calendar day.
///
/// The series spans the product's first to last observed date. Days without
/// any rows hold zero demand, so consecutive entries are always exactly one
/// day apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSeries {
    product_name: String,
    start: NaiveDate,
    units: Vec<u64>,
}

impl ProductSeries {
    /// Build the series for `product_name` from rows of the dataset.
    ///
    /// Rows for other products are ignored and same-day rows are summed.
    /// Fails with [`ForecastError::InsufficientData`] when no row matches,
    /// which is distinct from a series that is all zeros.
    pub fn from_records<'a, I>(product_name: &str, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a SalesRecord>,
    {
        let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for record in records
            .into_iter()
            .filter(|record| record.product_name == product_name)
        {
            let total = daily.entry(record.date).or_insert(0);
            *total = total.saturating_add(record.units_sold);
        }

        let (start, end) = match (daily.keys().next(), daily.keys().next_back()) {
            (Some(&start), Some(&end)) => (start, end),
            _ => return Err(ForecastError::InsufficientData(product_name.to_string())),
        };

        let span = (end - start).num_days() as usize + 1;
        let mut units = vec![0; span];
        for (date, total) in daily {
            units[(date - start).num_days() as usize] = total;
        }

        Ok(Self {
            product_name: product_name.to_string(),
            start,
            units,
        })
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    pub fn end_date(&self) -> NaiveDate {
        self.date_at(self.units.len().saturating_sub(1))
    }

    /// Number of calendar days covered
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units sold per day, oldest first
    pub fn units(&self) -> &[u64] {
        &self.units
    }

    /// Units sold per day as model input
    pub fn values(&self) -> Vec<f64> {
        self.units.iter().map(|&u| u as f64).collect()
    }

    /// (date, units) pairs in calendar order
    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, u64)> + '_ {
        self.units
            .iter()
            .enumerate()
            .map(move |(offset, &units)| (self.date_at(offset), units))
    }

    pub fn total_units(&self) -> u64 {
        self.units.iter().fold(0u64, |acc, &u| acc.saturating_add(u))
    }

    /// Number of distinct daily values, zero-filled days included
    pub fn distinct_values(&self) -> usize {
        self.units.iter().collect::<BTreeSet<_>>().len()
    }

    /// A series with at most one distinct value carries nothing to fit
    pub fn is_degenerate(&self) -> bool {
        self.distinct_values() <= 1
    }

    fn date_at(&self, offset: usize) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(offset as u64))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Build the daily series of one product straight from the dataset
pub fn build_series(dataset: &SalesDataset, product_name: &str) -> Result<ProductSeries> {
    ProductSeries::from_records(product_name, dataset.rows_for(product_name))
}
