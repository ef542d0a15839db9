//! carprice CLI
//!
//! Trains the per-manufacturer price models from a listings CSV and answers
//! queries against them.

use anyhow::{Context, Result};
use carprice::{charts, Corpus, PriceEstimator, PricingConfig, NOT_LISTED};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "carprice")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Used-vehicle resale price estimation", long_about = None)]
struct Args {
    /// Listings CSV (Year, Name, Miles, Price)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the per-manufacturer accuracy report
    Report,
    /// List manufacturers
    Makes,
    /// List model names for a manufacturer
    Models { make: String },
    /// Estimate the resale price of one vehicle
    Estimate {
        #[arg(long)]
        year: String,
        #[arg(long)]
        make: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        mileage: String,
    },
    /// Print chart data as JSON
    Chart {
        #[arg(value_enum)]
        kind: ChartKind,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChartKind {
    /// Average price per model year
    Year,
    /// Average price per manufacturer
    Make,
    /// Mileage against price
    Scatter,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = PricingConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(data) = &args.data {
        config.data_path = data.clone();
    }

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        config.logging.level.parse().unwrap_or(Level::INFO)
    };

    // Logs go to stderr so stdout stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("carprice v{}", env!("CARGO_PKG_VERSION"));
    info!("Loading listings from: {}", config.data_path.display());
    let corpus = Corpus::from_csv(&config.data_path).context("Failed to load listings")?;

    match args.command {
        Command::Makes => {
            for make in corpus.manufacturers() {
                println!("{make}");
            }
        }
        Command::Models { make } => {
            for model in corpus.models(&make) {
                println!("{model}");
            }
            println!("{NOT_LISTED}");
        }
        Command::Chart { kind } => {
            let json = match kind {
                ChartKind::Year => serde_json::to_string_pretty(&charts::average_price_by_year(&corpus)),
                ChartKind::Make => {
                    serde_json::to_string_pretty(&charts::average_price_by_manufacturer(&corpus))
                }
                ChartKind::Scatter => serde_json::to_string_pretty(&charts::mileage_price_scatter(&corpus)),
            }
            .context("Failed to serialize chart data")?;
            println!("{json}");
        }
        Command::Report => {
            let estimator = train_estimator(corpus, &config);
            for line in estimator.accuracy_report_lines() {
                println!("{line}");
            }
        }
        Command::Estimate {
            year,
            make,
            model,
            mileage,
        } => {
            let estimator = train_estimator(corpus, &config);
            println!("{}", estimator.estimate_price(&year, &make, &model, &mileage));
        }
    }

    Ok(())
}

fn train_estimator(corpus: Corpus, config: &PricingConfig) -> PriceEstimator {
    info!(
        "Training models (seed {}, {} trees, depth {})",
        config.training.seed, config.training.num_trees, config.training.max_depth
    );
    PriceEstimator::train(corpus, config)
}
