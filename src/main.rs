use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use sales_forecast::{pipeline, DataLoader, PipelineOutput};

mod cli;

fn preprocess() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

fn main() -> Result<()> {
    preprocess();

    let cli = cli::Cli::parse();
    log::debug!("Command line input recorded: {cli:#?}");

    let dataset = DataLoader::from_csv(&cli.input)
        .with_context(|| format!("failed to load sales data from {}", cli.input.display()))?;

    let output = pipeline::run(&dataset, &cli.pipeline_config()).context("pipeline failed")?;

    let artifacts = pipeline::write_artifacts(&output, &cli.out_dir)
        .with_context(|| format!("failed to write rankings to {}", cli.out_dir.display()))?;

    if let Some(report) = &cli.report {
        pipeline::write_report(&output, report)
            .with_context(|| format!("failed to write report to {}", report.display()))?;
    }

    print_summary(&output);
    println!(
        "\nResults saved to {} and {}",
        artifacts.best_sellers.display(),
        artifacts.predicted_sellers.display()
    );

    Ok(())
}

fn print_summary(output: &PipelineOutput) {
    println!("Top best-selling products:");
    for (rank, entry) in output.best_sellers.iter().enumerate() {
        println!("{:>3}. {:<40} {:>12}", rank + 1, entry.product_name, entry.metric);
    }

    println!("\nPredicted top sellers for the next period:");
    for (rank, entry) in output.predicted_sellers.iter().enumerate() {
        println!(
            "{:>3}. {:<40} {:>12.2}",
            rank + 1,
            entry.product_name,
            entry.metric
        );
    }

    let skipped = output.outcomes.iter().filter(|o| o.is_skipped()).count();
    if skipped > 0 {
        println!("\n{} of {} products were not forecast", skipped, output.outcomes.len());
    }
}
