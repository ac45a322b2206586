// clipfit-cli/src/main.rs
//
// Entry point for the clipfit binary.
//
// Responsibilities:
// - Parsing command-line arguments.
// - Setting up console and file logging.
// - Dispatching to the command implementations.
// - Mapping the result to a process exit code:
//   0 on success, 1 on error, 130 when the user interrupted a compression.

use std::process::ExitCode;

use clap::Parser;
use clipfit_cli::logging::setup_logging;
use clipfit_cli::{Cli, Commands, CompressStatus, run_compress, run_probe, run_thumbnail};
use log::{error, info, warn};

/// Conventional exit code for a process stopped by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let show_progress = console::Term::stderr().is_term() && !cli.verbose;
    match setup_logging(cli.verbose, show_progress, cli.log_dir.as_deref()) {
        Ok(Some(log_path)) => info!("Logging to {}", log_path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    }

    let result = match cli.command {
        Commands::Compress(args) => run_compress(args, show_progress).await.map(Some),
        Commands::Probe(args) => run_probe(&args).map(|()| None),
        Commands::Thumbnail(args) => run_thumbnail(&args).map(|()| None),
    };

    match result {
        Ok(Some(CompressStatus::Cancelled)) => ExitCode::from(EXIT_INTERRUPTED),
        Ok(Some(CompressStatus::Completed { within_budget: false })) => {
            warn!("Finished without reaching the size limit");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
