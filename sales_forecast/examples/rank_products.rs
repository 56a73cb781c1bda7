use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sales_forecast::pipeline::{self, PipelineConfig};
use sales_forecast::{DataLoader, SalesDataset, SalesRecord};
use std::path::PathBuf;

// A year of synthetic daily sales for a handful of products
fn synthetic_dataset() -> SalesDataset {
    let mut rng = StdRng::seed_from_u64(2024);
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let products = [
        ("Espresso Beans", 40.0),
        ("Oat Milk", 25.0),
        ("Paper Filters", 12.0),
        ("Ceramic Mug", 6.0),
        ("Gift Card", 0.0),
    ];

    let mut records = Vec::new();
    for (name, base) in products {
        let mut level: f64 = base;
        for day in 0..365u64 {
            if base > 0.0 {
                level = (level + rng.gen_range(-2.0..2.0)).max(0.0);
            }
            records.push(SalesRecord::new(start + Days::new(day), name, level.round() as u64));
        }
    }
    SalesDataset::new(records)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use a CSV from the command line, or generate data
    let dataset = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading data from: {}", path);
            DataLoader::from_csv(PathBuf::from(path))?
        }
        None => synthetic_dataset(),
    };
    println!("Loaded {} sales records", dataset.len());

    let output = pipeline::run(&dataset, &PipelineConfig::default())?;

    println!("\nTop sellers so far:");
    for entry in &output.best_sellers {
        println!("  {:<20} {:>8}", entry.product_name, entry.metric);
    }

    println!("\nPredicted sellers for the next 365 days:");
    for entry in &output.predicted_sellers {
        println!("  {:<20} {:>12.1}", entry.product_name, entry.metric);
    }

    for outcome in &output.outcomes {
        if let Some(reason) = outcome.skip_reason() {
            println!("Skipped {}: {}", outcome.product_name, reason);
        }
    }

    let out_dir = std::env::temp_dir();
    let artifacts = pipeline::write_artifacts(&output, &out_dir)?;
    println!(
        "\nWrote {} and {}",
        artifacts.best_sellers.display(),
        artifacts.predicted_sellers.display()
    );

    Ok(())
}
