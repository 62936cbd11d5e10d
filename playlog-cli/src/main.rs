//! Playlog CLI tool

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "playlog")]
#[command(author, version, about = "Batch ETL pipeline for the play-event warehouse", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the staging, fact and dimension tables
    Init,

    /// Compile the pipeline graph and print the execution order
    Validate,

    /// Print the pipeline's tasks, edges and schedule
    Show,

    /// Execute one pipeline run
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = config::Settings::from_env()?;

    match cli.command {
        Commands::Init => commands::init::execute(&settings).await,
        Commands::Validate => commands::validate::execute(&settings),
        Commands::Show => commands::show::execute(&settings),
        Commands::Run => commands::run::execute(&settings).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
