use clap::Parser;
use sales_forecast::PipelineConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Sales CSV with date, product_id, product_name, units_sold and total_amount columns.
    pub input: PathBuf,

    /// Directory receiving top_10_best_sellers.csv and next_top_10_sellers.csv.
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Number of products kept in each ranking.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub top_n: u64,

    /// Days forecast per product.
    #[arg(long, default_value_t = 365, value_parser = clap::value_parser!(u64).range(1..))]
    pub horizon: u64,

    /// Time budget for fitting one product, in milliseconds. 0 disables the limit.
    #[arg(long, default_value_t = 10_000)]
    pub fit_timeout_ms: u64,

    /// Forecast products one at a time instead of in parallel.
    #[arg(long)]
    pub sequential: bool,

    /// Also write a JSON report of forecast and skipped products.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            top_n: self.top_n as usize,
            horizon: self.horizon as usize,
            fit_timeout: match self.fit_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            parallel: !self.sequential,
            ..PipelineConfig::default()
        }
    }
}
