use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::info;

use listing_insights::config::{DashboardOptions, Selection};
use listing_insights::dashboard::{Dashboard, Page};
use listing_insights::execution::{ExecutionEngine, ExecutionOptions, LogExecutionObserver};
use listing_insights::ingestion::{IngestionOptions, LogObserver};
use listing_insights::listing::ListingDataset;

/// Query a listings file and print a dashboard page as JSON.
#[derive(Debug, Parser)]
#[command(name = "listing-insights", version, about)]
struct Cli {
    /// Listings file (.csv, .json, .ndjson). Overrides `data_path` from the config.
    #[arg(long)]
    data: Option<PathBuf>,

    /// JSON options file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Page::Overview)]
    page: Page,

    /// Allowed country; repeat for several. Omit to allow all.
    #[arg(long = "country")]
    countries: Vec<String>,

    /// Allowed property type; repeat for several. Omit to allow all.
    #[arg(long = "property-type")]
    property_types: Vec<String>,

    /// Allowed room type; repeat for several. Omit to allow all.
    #[arg(long = "room-type")]
    room_types: Vec<String>,

    #[arg(long)]
    price_min: Option<f64>,

    #[arg(long)]
    price_max: Option<f64>,

    /// Bars in the "top N" charts.
    #[arg(long)]
    top_n: Option<usize>,

    /// Include the filtered rows in the Overview report.
    #[arg(long)]
    raw: bool,

    /// Run queries on the parallel engine.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for --parallel (defaults to available parallelism).
    #[arg(long)]
    threads: Option<usize>,
}

impl Cli {
    fn selection(&self) -> Selection {
        let set = |values: &[String]| (!values.is_empty()).then(|| values.iter().cloned().collect());
        Selection {
            countries: set(&self.countries),
            property_types: set(&self.property_types),
            room_types: set(&self.room_types),
            price_min: self.price_min,
            price_max: self.price_max,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut opts = match &cli.config {
        Some(path) => DashboardOptions::from_path(path)?,
        None => DashboardOptions::default(),
    };
    if let Some(data) = &cli.data {
        opts.data_path = data.clone();
    }
    if let Some(top_n) = cli.top_n {
        opts.top_n = top_n;
    }
    ensure!(opts.chunk_size > 0, "chunk_size must be > 0");
    ensure!(cli.threads != Some(0), "--threads must be > 0");

    let ingest = IngestionOptions {
        format: opts.format,
        observer: Some(Arc::new(LogObserver)),
        ..Default::default()
    };
    let listings = ListingDataset::load(&opts.data_path, &ingest)
        .with_context(|| format!("loading listings from {}", opts.data_path.display()))?;

    let engine = if cli.parallel {
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: cli.threads,
            chunk_size: opts.chunk_size,
        })?;
        Some(engine.with_observer(Arc::new(LogExecutionObserver)))
    } else {
        None
    };

    let mut dashboard = Dashboard::new(listings).with_top_n(opts.top_n);
    if let Some(engine) = &engine {
        dashboard = dashboard.with_engine(engine);
    }

    let selection = opts.selection.clone().merge(cli.selection());
    let criteria = selection.apply_to(dashboard.default_criteria()?);
    info!("rendering {:?} page", cli.page);
    let report = dashboard.render(cli.page, &criteria, cli.raw)?;

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;
    Ok(())
}
