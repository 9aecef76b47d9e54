//! imgsample CLI - downsample, orientation-correct and re-encode a photo.
//!
//! Stands in for the UI layer that would normally hand a camera capture or
//! gallery pick to the sampler: it submits one request, listens for the
//! result and prints the path of the written file.
//!
//! # Usage
//!
//! ```bash
//! # Sample a photo into the configured output directory
//! imgsample sample IMG_0042.jpg
//!
//! # Custom bound and destination
//! imgsample sample photo.png --size 800 --out-dir ./sampled
//!
//! # View configuration
//! imgsample config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// imgsample - downsample, orientation-correct and re-encode a photo.
#[derive(Parser, Debug)]
#[command(name = "imgsample")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Produce a downsampled, upright JPEG copy of a photo
    Sample(cli::sample::SampleArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match imgsample_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `imgsample config path`."
            );
            imgsample_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("imgsample v{}", imgsample_core::VERSION);

    match cli.command {
        Commands::Sample(args) => cli::sample::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config).await,
    }
}
