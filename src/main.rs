//! Rehearse a regional cutover against a seeded scenario.

use clap::{Parser, Subcommand};
use dr_orchestrator::config::Settings;
use dr_orchestrator::core::{Error, FailoverAction, Result};
use dr_orchestrator::runbook::Runbook;
use dr_orchestrator::scenario::Scenario;
use dr_orchestrator::telemetry;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "dr-orchestrator", version, about = "Regional failover orchestrator")]
struct Cli {
    /// Scenario file seeding the config store, control plane and database
    #[arg(long)]
    scenario: PathBuf,

    /// Fixed seed for the endpoint trial order
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a routing-control-update event
    RoutingUpdate {
        /// Event JSON file
        #[arg(long)]
        event: PathBuf,
    },
    /// Run an rds-failover event
    RdsFailover {
        /// Event JSON file
        #[arg(long)]
        event: PathBuf,
    },
    /// Drain, promote and enable in sequence
    Cutover {
        /// fail_over or fail_back
        #[arg(long)]
        action: FailoverAction,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            return ExitCode::from(2);
        }
    };
    telemetry::init(settings.log_format);

    match run(cli, settings).await {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %err, "Rehearsal could not run");
            ExitCode::from(2)
        }
    }
}

/// Returns the error flag of the invocation.
async fn run(cli: Cli, settings: Settings) -> Result<bool> {
    let scenario = Scenario::from_path(&cli.scenario)?;
    let mut rehearsal = scenario.build(settings)?;
    if let Some(seed) = cli.seed {
        rehearsal.orchestrator = rehearsal.orchestrator.with_endpoint_seed(seed);
    }
    let orchestrator = &rehearsal.orchestrator;

    match cli.command {
        Command::RoutingUpdate { event } => {
            let result = orchestrator.handle_routing_update(read_event(&event)?).await;
            print(&result)?;
            Ok(result.error)
        }
        Command::RdsFailover { event } => {
            let result = orchestrator.handle_rds_failover(read_event(&event)?).await;
            print(&result)?;
            Ok(result.error)
        }
        Command::Cutover { action } => {
            let config = scenario
                .runbook
                .clone()
                .ok_or_else(|| Error::MissingField("runbook".to_string()))?;
            let report = Runbook::new(orchestrator, config).cutover(action).await;
            print(&report)?;
            Ok(report.error)
        }
    }
}

fn read_event(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
