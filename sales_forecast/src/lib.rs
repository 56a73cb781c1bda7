//! # Sales Forecast
//!
//! A Rust library for ranking products by historical and forecasted sales.
//!
//! ## Features
//!
//! - Daily sales ingestion from CSV (date, product_id, product_name, units_sold, total_amount)
//! - Historical top-N ranking by total units sold
//! - Per-product ARIMA forecasting with failure isolation
//! - Forecast top-N ranking and CSV output tables
//! - A JSON report describing which products were forecast or skipped
//!
//! ## Quick Start
//!
//! ```no_run
//! use sales_forecast::data::DataLoader;
//! use sales_forecast::pipeline::{self, PipelineConfig};
//!
//! # fn main() -> sales_forecast::error::Result<()> {
//! // Load data
//! let dataset = DataLoader::from_csv("sales_data.csv")?;
//!
//! // Rank historical sellers and forecast the next year
//! let output = pipeline::run(&dataset, &PipelineConfig::default())?;
//!
//! // Write top_10_best_sellers.csv and next_top_10_sellers.csv
//! pipeline::write_artifacts(&output, ".")?;
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod forecaster;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod ranking;
pub mod series;
pub mod utils;

// Re-export commonly used types
pub use crate::data::{DataLoader, SalesDataset, SalesRecord};
pub use crate::error::{FitError, ForecastError};
pub use crate::forecaster::{ForecastOutcome, Outcome, ProductForecaster, SkipReason};
pub use crate::models::arima::ArimaModel;
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::pipeline::{PipelineConfig, PipelineOutput};
pub use crate::ranking::{ForecastAggregator, HistoricalRanker, RankedEntry};
pub use crate::series::ProductSeries;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
