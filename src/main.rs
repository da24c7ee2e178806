//! # ctscrape CLI
//!
//! Queries the ClinicalTrials.gov full-studies API for the built-in
//! substance list and saves every matching study as one CSV row.
//!
//! ## Usage
//!
//! ```bash
//! ctscrape <BEGIN> <END> [--dir DIR] [--filename NAME]
//! ```
//!
//! Dates are `mm/dd/yyyy`. The output directory must already exist; the
//! file is written as `<NAME>_<epoch-ms>.csv` so earlier runs are never
//! overwritten.
//!
//! ## Examples
//!
//! ```bash
//! # Default location ./data/ctscrape_<ts>.csv
//! ctscrape 01/01/2020 12/31/2020
//!
//! # Custom location, one column per full JSON path
//! ctscrape 01/01/2020 12/31/2020 --dir ./out --filename trials_2020 --full-path-columns
//!
//! # Verbose logging
//! RUST_LOG=ctscrape=debug ctscrape 01/01/2020 12/31/2020
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ctscrape::config;
use ctscrape::fetch::HttpFetcher;
use ctscrape::progress::ProgressMode;
use ctscrape::scrape::{run_scrape, ScrapeRequest};

const DEFAULT_CONFIG: &str = "./ctscrape.toml";

/// Query the ClinicalTrials.gov API.
#[derive(Parser)]
#[command(
    name = "ctscrape",
    about = "Query the ClinicalTrials.gov API and save matching studies to CSV",
    version
)]
struct Cli {
    /// First day of the range, mm/dd/yyyy.
    begin: String,

    /// Last day of the range (inclusive), mm/dd/yyyy.
    end: String,

    /// Existing directory to write the CSV into.
    #[arg(long, default_value = "./data")]
    dir: PathBuf,

    /// Base file name: letters, digits and underscores. A timestamp and
    /// `.csv` are appended.
    #[arg(long, default_value = "ctscrape")]
    filename: String,

    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./ctscrape.toml` when present; built-in defaults are
    /// used otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name columns by full JSON path instead of the leaf key.
    #[arg(long)]
    full_path_columns: bool,

    /// Progress output on stderr. Defaults to `human` on a TTY, `off` otherwise.
    #[arg(long, value_enum)]
    progress: Option<ProgressMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ctscrape=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config_or_default(path, true)?,
        None => config::load_config_or_default(Path::new(DEFAULT_CONFIG), false)?,
    };

    let request = ScrapeRequest {
        begin: cli.begin,
        end: cli.end,
        dir: cli.dir,
        filename: cli.filename,
        full_path_columns: cli.full_path_columns,
    };

    let fetcher = HttpFetcher::new(&cfg.api).context("Failed to build HTTP client")?;
    let reporter = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    let summary = run_scrape(&cfg, &request, &fetcher, &*reporter).await?;

    println!("scrape");
    println!("  studies found: {}", summary.total_found);
    println!("  windows fetched: {}", summary.windows_fetched);
    println!("  rows: {}", summary.rows);
    println!("  columns: {}", summary.columns);
    if summary.drift_warnings > 0 {
        println!("  inconsistent totals: {}", summary.drift_warnings);
    }
    println!("  output: {}", summary.path.display());
    println!("ok");

    Ok(())
}
