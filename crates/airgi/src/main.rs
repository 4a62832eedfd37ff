// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AIRGI - AI-assisted incident report intake.
//!
//! This is the binary entry point for the command-line front end.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod identity;
mod manage;
mod shell;

use std::path::PathBuf;

use airgi_agent::{IncidentFilter, Listing};
use airgi_config::AirgiConfig;
use airgi_core::{AirgiError, IncidentId, IncidentStatus};
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::app::App;
use crate::shell::IntakeMode;

/// AIRGI - AI-assisted incident report intake.
#[derive(Parser, Debug)]
#[command(name = "airgi", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Report a new incident through a guided conversation.
    Report {
        /// Initial description. Prompted for when omitted.
        description: Option<String>,
    },
    /// Re-open an incident to add or change information.
    Edit { id: String },
    /// List incidents you reported, or that are assigned to you.
    List {
        /// Show incidents assigned to you.
        #[arg(long)]
        received: bool,
        /// Only incidents in this status (new, in_progress, resolved, closed, pending_info).
        #[arg(long)]
        status: Option<IncidentStatus>,
        /// Case-insensitive search over id, title, description, and people.
        #[arg(long)]
        search: Option<String>,
    },
    /// Change the status of an incident.
    Status { id: String, status: IncidentStatus },
    /// Delete an incident.
    Delete { id: String },
    /// Print the team chat digest of an incident.
    Share { id: String },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate the configuration and report every problem.
    Validate,
    /// Print the effective configuration, secrets redacted.
    Show,
}

fn load_config(path: Option<&PathBuf>) -> AirgiConfig {
    let loaded = match path {
        Some(path) => airgi_config::load_and_validate_path(path),
        None => airgi_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            airgi_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("airgi={log_level},airgi_agent={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Renders the effective config with the API key masked.
fn redacted_toml(config: &AirgiConfig) -> Result<String, AirgiError> {
    let mut shown = config.clone();
    if shown.assistant.api_key.is_some() {
        shown.assistant.api_key = Some("********".into());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| AirgiError::Config(format!("failed to render config: {e}")))
}

async fn run(cli: Cli, config: AirgiConfig) -> Result<(), AirgiError> {
    let Some(command) = cli.command else {
        println!("airgi: use --help for available commands");
        return Ok(());
    };
    match command {
        Commands::Config { action } => match action {
            ConfigAction::Validate => {
                println!("{}", "configuration is valid".green());
                Ok(())
            }
            ConfigAction::Show => {
                println!("{}", redacted_toml(&config)?);
                Ok(())
            }
        },
        Commands::Report { description } => {
            let app = App::open(&config).await?;
            shell::run_intake(&app, IntakeMode::New(description)).await
        }
        Commands::Edit { id } => {
            let app = App::open(&config).await?;
            shell::run_intake(&app, IntakeMode::Edit(IncidentId(id))).await
        }
        Commands::List {
            received,
            status,
            search,
        } => {
            let app = App::open(&config).await?;
            let listing = if received {
                Listing::Received
            } else {
                Listing::Reported
            };
            manage::list(&app, listing, IncidentFilter { status, term: search }).await
        }
        Commands::Status { id, status } => {
            let app = App::open(&config).await?;
            manage::set_status(&app, &IncidentId(id), status).await
        }
        Commands::Delete { id } => {
            let app = App::open(&config).await?;
            manage::delete(&app, &IncidentId(id)).await
        }
        Commands::Share { id } => {
            let app = App::open(&config).await?;
            manage::share(&app, &IncidentId(id)).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.app.log_level);

    if let Err(e) = run(cli, config).await {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}
