//! Output tables for the two rankings and the per-product outcome report

use crate::error::Result;
use crate::forecaster::{ForecastOutcome, Outcome};
use crate::ranking::RankedEntry;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// File name of the historical ranking
pub const BEST_SELLERS_FILE: &str = "top_10_best_sellers.csv";
/// File name of the forecast ranking
pub const PREDICTED_SELLERS_FILE: &str = "next_top_10_sellers.csv";

/// Row of the historical top sellers table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestSellerRow {
    pub product_name: String,
    pub units_sold: u64,
}

/// Row of the forecast top sellers table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedSellerRow {
    pub product_name: String,
    pub predicted_annual_sales: f64,
}

impl From<&RankedEntry<u64>> for BestSellerRow {
    fn from(entry: &RankedEntry<u64>) -> Self {
        Self {
            product_name: entry.product_name.clone(),
            units_sold: entry.metric,
        }
    }
}

impl From<&RankedEntry<f64>> for PredictedSellerRow {
    fn from(entry: &RankedEntry<f64>) -> Self {
        Self {
            product_name: entry.product_name.clone(),
            predicted_annual_sales: entry.metric,
        }
    }
}

pub fn best_seller_rows(ranking: &[RankedEntry<u64>]) -> Vec<BestSellerRow> {
    ranking.iter().map(BestSellerRow::from).collect()
}

pub fn predicted_seller_rows(ranking: &[RankedEntry<f64>]) -> Vec<PredictedSellerRow> {
    ranking.iter().map(PredictedSellerRow::from).collect()
}

/// Write the historical table, replacing any previous file
pub fn write_best_sellers<W: Write>(writer: W, rows: &[BestSellerRow]) -> Result<()> {
    write_table(writer, &["product_name", "units_sold"], rows)
}

/// Write the forecast table, replacing any previous file
pub fn write_predicted_sellers<W: Write>(writer: W, rows: &[PredictedSellerRow]) -> Result<()> {
    write_table(writer, &["product_name", "predicted_annual_sales"], rows)
}

/// The header is written explicitly so an empty ranking still yields a
/// valid table.
fn write_table<W: Write, T: Serialize>(writer: W, header: &[&str], rows: &[T]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(header)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and hand a buffered writer to `write`
pub fn write_file<P, F>(path: P, write: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(BufWriter<File>) -> Result<()>,
{
    let file = File::create(path)?;
    write(BufWriter::new(file))
}

/// Per-product line of the outcome report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeLine {
    pub product_name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&ForecastOutcome> for OutcomeLine {
    fn from(outcome: &ForecastOutcome) -> Self {
        match &outcome.outcome {
            Outcome::Success { predicted_total } => Self {
                product_name: outcome.product_name.clone(),
                status: "forecast",
                predicted_total: Some(*predicted_total),
                reason: None,
            },
            Outcome::Skipped(reason) => Self {
                product_name: outcome.product_name.clone(),
                status: "skipped",
                predicted_total: None,
                reason: Some(reason.to_string()),
            },
        }
    }
}

/// Which products were forecast and why the others were skipped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeReport {
    pub products: usize,
    pub forecast: usize,
    pub skipped: usize,
    pub outcomes: Vec<OutcomeLine>,
}

impl OutcomeReport {
    pub fn new(outcomes: &[ForecastOutcome]) -> Self {
        let lines: Vec<OutcomeLine> = outcomes.iter().map(OutcomeLine::from).collect();
        let skipped = outcomes.iter().filter(|o| o.is_skipped()).count();
        Self {
            products: lines.len(),
            forecast: lines.len() - skipped,
            skipped,
            outcomes: lines,
        }
    }

    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitError;
    use crate::forecaster::SkipReason;
    use pretty_assertions::assert_eq;

    fn render<F: FnOnce(&mut Vec<u8>) -> Result<()>>(write: F) -> String {
        let mut buffer = Vec::new();
        write(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_best_sellers_table() {
        let rows = best_seller_rows(&[RankedEntry::new("B", 820), RankedEntry::new("A", 15)]);
        let text = render(|buf| write_best_sellers(buf, &rows));
        assert_eq!(text, "product_name,units_sold\nB,820\nA,15\n");
    }

    #[test]
    fn test_empty_rankings_still_have_headers() {
        assert_eq!(
            render(|buf| write_best_sellers(buf, &[])),
            "product_name,units_sold\n"
        );
        assert_eq!(
            render(|buf| write_predicted_sellers(buf, &[])),
            "product_name,predicted_annual_sales\n"
        );
    }

    #[test]
    fn test_predicted_table_keeps_negative_totals_and_quotes_names() {
        let rows = predicted_seller_rows(&[
            RankedEntry::new("Tea, green", 12.5),
            RankedEntry::new("Gum", -3.25),
        ]);
        let text = render(|buf| write_predicted_sellers(buf, &rows));
        assert_eq!(
            text,
            "product_name,predicted_annual_sales\n\"Tea, green\",12.5\nGum,-3.25\n"
        );
    }

    #[test]
    fn test_outcome_report_counts_and_reasons() {
        let outcomes = vec![
            ForecastOutcome::success("B", 100.0),
            ForecastOutcome::skipped("A", SkipReason::Degenerate { distinct_values: 1 }),
            ForecastOutcome::skipped(
                "C",
                SkipReason::FitFailed(FitError::NotConverged { iterations: 5000 }),
            ),
        ];
        let report = OutcomeReport::new(&outcomes);
        assert_eq!(report.products, 3);
        assert_eq!(report.forecast, 1);
        assert_eq!(report.skipped, 2);

        let json: serde_json::Value =
            serde_json::from_str(&render(|buf| report.write_json(buf))).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "forecast");
        assert_eq!(json["outcomes"][1]["reason"], "degenerate series (1 distinct values)");
        assert!(json["outcomes"][0].get("reason").is_none());
    }
}
