//! Arteria Runfolder command line
//!
//! Thin front end over `RunfolderService`: every subcommand maps to one
//! service operation and prints its result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use runfolder::{RunfolderConfig, RunfolderError, RunfolderService, StateFilter};
use runfolder_logging::LogConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

mod cli;

use cli::output::{print_json, print_runfolder_table};

#[derive(Parser, Debug)]
#[command(name = "runfolder", version, about = "Monitor sequencing runfolders")]
struct Cli {
    /// Configuration file (YAML or TOML)
    #[arg(
        short,
        long,
        global = true,
        env = "RUNFOLDER_CONFIG",
        default_value = "config/app.config"
    )]
    config: PathBuf,

    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List monitored runfolders
    List {
        /// Only runfolders in this state; `*` lists every runfolder
        #[arg(short, long, default_value = "READY")]
        state: StateFilter,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one runfolder
    Get {
        /// Runfolder path (must be directly under a monitored directory)
        path: PathBuf,
    },

    /// Show the next runfolder that is ready for processing
    Next,

    /// Override the state of a runfolder
    SetState {
        path: PathBuf,

        /// NONE, READY, STARTED, DONE, ERROR or PENDING
        state: String,
    },

    /// Create an empty runfolder (test provisioning)
    Create { path: PathBuf },

    /// Write the completion marker into a runfolder (test provisioning)
    MarkReady { path: PathBuf },

    /// Show the effective configuration
    Settings,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = runfolder_logging::init_logging(LogConfig {
        app_name: "runfolder",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let client_error = err
                .downcast_ref::<RunfolderError>()
                .is_some_and(RunfolderError::is_client_error);
            ExitCode::from(if client_error { 2 } else { 1 })
        }
    }
}

fn run_command(cli: Cli) -> Result<()> {
    let config = RunfolderConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let service = RunfolderService::new(config)?;

    match cli.command {
        Commands::List { state, json } => {
            let mut records = Vec::new();
            for item in service.runfolders(state) {
                match item {
                    Ok(record) => records.push(record),
                    Err(err) => warn!(error = %err, "Skipping unreadable entry"),
                }
            }
            if json {
                print_json(&records)
            } else {
                print_runfolder_table(&records);
                Ok(())
            }
        }
        Commands::Get { path } => print_json(&service.get_runfolder_by_path(&path)?),
        Commands::Next => print_json(&service.next_runfolder()?),
        Commands::SetState { path, state } => {
            let state = service.set_state(&path, &state)?;
            print_json(&serde_json::json!({ "path": path, "state": state }))
        }
        Commands::Create { path } => print_json(&service.create_runfolder(&path)?),
        Commands::MarkReady { path } => {
            let marker = service.add_completion_marker(&path)?;
            print_json(&serde_json::json!({ "path": path, "marker": marker }))
        }
        Commands::Settings => print_json(&service.settings()),
    }
}
