//! geoharvest CLI
//!
//! Local execution entry point for the harvesting jobs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use geoharvest::{
    config::load_config,
    error::Result,
    models::Config,
    pipeline,
    storage::LocalStorage,
};

/// geoharvest - public data geocoding and harvesting
#[derive(Parser, Debug)]
#[command(
    name = "geoharvest",
    version,
    about = "Geocode addresses and harvest public listings into CSV"
)]
struct Cli {
    /// Config file (default: {data_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding credential files, inputs and outputs
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an address column to coordinates
    Geocode {
        /// Input CSV file name
        #[arg(long)]
        input: Option<String>,

        /// Output CSV file name
        #[arg(long)]
        output: Option<String>,

        /// Name of the address column
        #[arg(long)]
        column: Option<String>,

        /// Output coordinate reference system, e.g. EPSG:5179
        #[arg(long)]
        crs: Option<String>,

        /// Keep every input column instead of the configured selection
        #[arg(long)]
        all_columns: bool,
    },

    /// Search places for every configured keyword
    Search {
        /// Output CSV file name
        #[arg(long)]
        output: Option<String>,
    },

    /// Download the Seoul kiosk open-data table
    Kiosks {
        /// Output CSV file name
        #[arg(long)]
        output: Option<String>,
    },

    /// Crawl the FTC franchise listing
    Listing {
        /// First page to fetch
        #[arg(long)]
        start: Option<u32>,

        /// Last page to fetch (inclusive)
        #[arg(long)]
        end: Option<u32>,

        /// Number of concurrent fetches
        #[arg(long)]
        workers: Option<usize>,

        /// Output CSV file name
        #[arg(long)]
        output: Option<String>,
    },

    /// Run kiosks then geocode
    Pipeline,

    /// Validate configuration and check credentials
    Validate,
}

impl Command {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply_overrides(&self, config: &mut Config) {
        match self {
            Command::Geocode {
                input,
                output,
                column,
                crs,
                all_columns,
            } => {
                override_with(&mut config.geocode.input, input);
                override_with(&mut config.geocode.output, output);
                override_with(&mut config.geocode.address_column, column);
                override_with(&mut config.geocode.crs, crs);
                if *all_columns {
                    config.geocode.output_columns.clear();
                }
            }
            Command::Search { output } => override_with(&mut config.search.output, output),
            Command::Kiosks { output } => override_with(&mut config.open_data.output, output),
            Command::Listing {
                start,
                end,
                workers,
                output,
            } => {
                override_with(&mut config.listing.start_page, start);
                override_with(&mut config.listing.end_page, end);
                override_with(&mut config.listing.workers, workers);
                override_with(&mut config.listing.output, output);
            }
            Command::Pipeline | Command::Validate => {}
        }
    }
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("config.toml"));
    let mut config = load_config(&config_path);
    cli.command.apply_overrides(&mut config);

    let storage = LocalStorage::new(&cli.data_dir);
    log::info!("Data directory: {}", storage.root().display());

    if let Command::Validate = cli.command {
        return pipeline::run_validate(&config, &storage).await;
    }

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    match cli.command {
        Command::Geocode { .. } => {
            pipeline::run_geocode(&config, &storage).await?;
        }
        Command::Search { .. } => {
            pipeline::run_search(&config, &storage).await?;
        }
        Command::Kiosks { .. } => {
            pipeline::run_open_data(&config, &storage).await?;
        }
        Command::Listing { .. } => {
            pipeline::run_listing(&config, &storage).await?;
        }
        Command::Pipeline => {
            pipeline::run_pipeline(&config, &storage).await?;
        }
        Command::Validate => {}
    }

    log::info!("Done!");

    Ok(())
}
