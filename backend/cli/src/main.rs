mod config;
mod config_cmd;
mod fetch_models_cmd;
mod inspect_cmd;
mod run_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use docsift_logging::{init_logger, redact_sensitive_data};
use tracing::error;

use config::Settings;

#[derive(Parser)]
#[command(name = "docsift")]
#[command(about = "docsift: persona-driven section ranking for PDF collections")]
#[command(version)]
struct Cli {
    /// Config file (default: $DOCSIFT_CONFIG, ./docsift.yaml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, overriding the config (e.g. `debug`, `docsift_pipeline=trace`)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank sections for the persona and task in the input descriptor
    Run {
        /// Input directory holding the descriptor and the PDFs subdirectory
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output directory for the result JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the title, headers and chunks recovered from one PDF
    Inspect {
        pdf: PathBuf,
        /// Include every chunk instead of a count
        #[arg(long)]
        chunks: bool,
    },
    /// Print the effective config (secrets masked) and validate it
    Config {
        /// Write the effective config to the config path instead
        #[arg(long)]
        init: bool,
    },
    /// Download and cache the local embedding model
    FetchModels,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = redact_sensitive_data(&format!("{e:#}"));
            error!(error = %message, "docsift failed");
            terminal_output::note_error(&message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref()).await?;
    init_logger(&settings.logging_options(cli.log_level.as_deref()))?;

    match cli.command {
        Commands::Run { input, output } => run_cmd::run(&settings, input, output).await,
        Commands::Inspect { pdf, chunks } => inspect_cmd::run(&settings, pdf, chunks).await,
        Commands::Config { init: true } => config_cmd::init(&settings).await,
        Commands::Config { init: false } => config_cmd::run(&settings),
        Commands::FetchModels => fetch_models_cmd::run(&settings).await,
    }
}
