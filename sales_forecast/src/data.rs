//! Sales record ingestion and per-product grouping

use crate::error::{ForecastError, Result};
use crate::utils::parse_date;
use chrono::NaiveDate;
use log::{info, warn};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

pub const DATE_COLUMN: &str = "date";
pub const PRODUCT_ID_COLUMN: &str = "product_id";
pub const PRODUCT_NAME_COLUMN: &str = "product_name";
pub const UNITS_SOLD_COLUMN: &str = "units_sold";
pub const TOTAL_AMOUNT_COLUMN: &str = "total_amount";

/// Columns without which no ranking can be computed
pub const REQUIRED_COLUMNS: [&str; 3] = [DATE_COLUMN, PRODUCT_NAME_COLUMN, UNITS_SOLD_COLUMN];

/// One row of daily sales for one product
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    /// Calendar day of the sale
    pub date: NaiveDate,
    /// Upstream product identifier, if the export carried one
    pub product_id: Option<String>,
    /// Display name; also the grouping key
    pub product_name: String,
    /// Units sold that day
    pub units_sold: u64,
    /// Revenue for the row, if the export carried one
    pub total_amount: Option<f64>,
}

impl SalesRecord {
    /// Create a record carrying only the fields the rankings consume
    pub fn new(date: NaiveDate, product_name: impl Into<String>, units_sold: u64) -> Self {
        Self {
            date,
            product_id: None,
            product_name: product_name.into(),
            units_sold,
            total_amount: None,
        }
    }
}

/// Validated, in-memory sales table
#[derive(Debug, Clone, Default)]
pub struct SalesDataset {
    records: Vec<SalesRecord>,
}

/// All rows belonging to one product, in input order
#[derive(Debug, Clone)]
pub struct ProductRows<'a> {
    pub product_name: &'a str,
    pub records: Vec<&'a SalesRecord>,
}

impl SalesDataset {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct product names in order of first appearance
    pub fn product_names(&self) -> Vec<&str> {
        self.group_by_product()
            .into_iter()
            .map(|group| group.product_name)
            .collect()
    }

    /// Rows for one product, matched on the exact name
    pub fn rows_for<'a>(&'a self, product_name: &'a str) -> impl Iterator<Item = &'a SalesRecord> + 'a {
        self.records
            .iter()
            .filter(move |record| record.product_name == product_name)
    }

    /// Partition the rows by product in a single pass.
    ///
    /// Groups come back in order of each product's first row, which is the
    /// tie-break order used by the rankers.
    pub fn group_by_product(&self) -> Vec<ProductRows<'_>> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<ProductRows<'_>> = Vec::new();

        for record in &self.records {
            let name = record.product_name.as_str();
            let slot = *index.entry(name).or_insert_with(|| {
                groups.push(ProductRows {
                    product_name: name,
                    records: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].records.push(record);
        }

        groups
    }
}

impl From<Vec<SalesRecord>> for SalesDataset {
    fn from(records: Vec<SalesRecord>) -> Self {
        Self::new(records)
    }
}

/// Data loader for sales exports
#[derive(Debug)]
pub struct DataLoader;

#[derive(Debug, Default)]
struct DroppedRows {
    bad_date: usize,
    missing_name: usize,
    bad_units: usize,
}

impl DroppedRows {
    fn total(&self) -> usize {
        self.bad_date + self.missing_name + self.bad_units
    }
}

impl DataLoader {
    /// Load sales records from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<SalesDataset> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        info!("Read {} rows from {}", df.height(), path.display());
        Self::from_dataframe(df)
    }

    /// Build a dataset from an existing DataFrame.
    ///
    /// Column names are trimmed and lowercased before the required columns
    /// are checked. Rows with an unparseable date, an empty product name, or
    /// a missing/negative unit count are dropped.
    pub fn from_dataframe(mut df: DataFrame) -> Result<SalesDataset> {
        Self::normalize_column_names(&mut df)?;
        Self::check_required_columns(&df)?;

        let dates = Self::utf8_column(&df, DATE_COLUMN)?;
        let names = Self::utf8_column(&df, PRODUCT_NAME_COLUMN)?;
        let units = Self::f64_column(&df, UNITS_SOLD_COLUMN)?;
        let ids = Self::optional_column(&df, PRODUCT_ID_COLUMN, Self::utf8_column)?;
        let amounts = Self::optional_column(&df, TOTAL_AMOUNT_COLUMN, Self::f64_column)?;

        let mut dropped = DroppedRows::default();
        let mut records = Vec::with_capacity(df.height());

        for row in 0..df.height() {
            let Some(date) = dates[row].as_deref().and_then(parse_date) else {
                dropped.bad_date += 1;
                continue;
            };
            let product_name = match names[row].as_deref() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    dropped.missing_name += 1;
                    continue;
                }
            };
            let units_sold = match units[row] {
                Some(value) if value.is_finite() && value >= 0.0 => value.trunc() as u64,
                _ => {
                    dropped.bad_units += 1;
                    continue;
                }
            };

            records.push(SalesRecord {
                date,
                product_id: ids
                    .as_ref()
                    .and_then(|col| col[row].clone())
                    .filter(|id| !id.is_empty()),
                product_name,
                units_sold,
                total_amount: amounts.as_ref().and_then(|col| col[row]),
            });
        }

        if dropped.total() > 0 {
            warn!(
                "Dropped {} rows ({} unparseable dates, {} missing product names, {} invalid unit counts)",
                dropped.total(),
                dropped.bad_date,
                dropped.missing_name,
                dropped.bad_units
            );
        }
        info!("Loaded {} sales records", records.len());

        Ok(SalesDataset::new(records))
    }

    fn normalize_column_names(df: &mut DataFrame) -> Result<()> {
        let normalized: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.trim().to_lowercase())
            .collect();
        df.set_column_names(&normalized)?;
        Ok(())
    }

    fn check_required_columns(df: &DataFrame) -> Result<()> {
        let present = df.get_column_names();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !present.contains(*required))
            .map(|required| required.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ForecastError::MissingColumns(missing))
        }
    }

    fn optional_column<T>(
        df: &DataFrame,
        name: &str,
        read: fn(&DataFrame, &str) -> Result<Vec<Option<T>>>,
    ) -> Result<Option<Vec<Option<T>>>> {
        if df.get_column_names().contains(&name) {
            read(df, name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read a column as trimmed strings, whatever dtype polars inferred
    fn utf8_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let series = df.column(name)?.cast(&DataType::Utf8)?;
        let values = series
            .utf8()?
            .into_iter()
            .map(|value| value.map(|s| s.trim().to_string()))
            .collect();
        Ok(values)
    }

    /// Read a column as floats; values that do not parse become `None`
    fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let series = df.column(name)?.cast(&DataType::Float64)?;
        let values = series.f64()?.into_iter().collect();
        Ok(values)
    }
}
