// Entry point for the californias bot.
// Parses flags, sets up logging and configuration, and runs once.

mod app;
mod cache;
mod config;
mod counties;
mod error;
mod http;
mod mastodon;
mod region;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::RunOptions;
use crate::config::BotConfig;

#[derive(Parser)]
#[command(
    name = "californias",
    about = "Split California's counties into random contiguous regions and post the map",
    long_about = "Run with no arguments to post a status. Pass --dry-run or -d to create a map, \
                  but not post it.",
    after_help = "The environment variables MASTODON_SERVER, MASTODON_USERNAME, and \
                  MASTODON_PASSWORD must be set with account credentials to post a status."
)]
struct Cli {
    /// Create the map and print the post, but do not publish it
    #[arg(short, long)]
    dry_run: bool,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Number of regions (defaults to a random count)
    #[arg(long)]
    regions: Option<usize>,

    /// Where --dry-run saves the map
    #[arg(short, long, default_value = "image.png")]
    output: PathBuf,
}

async fn run(options: RunOptions) -> error::Result<()> {
    let config = BotConfig::load(&std::env::current_dir()?)?;
    app::run(&config, &options).await
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = RunOptions {
        dry_run: cli.dry_run,
        seed: cli.seed,
        regions: cli.regions,
        output: cli.output,
    };

    match run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_precondition() => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
