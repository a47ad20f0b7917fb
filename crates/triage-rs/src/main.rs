//! `triage` command-line entry point.

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use triage_rs::config::{LayeredConfigOptions, TriageConfig};
use triage_rs::core::{TriageAgent, builtin_skill_registry};
use triage_rs::server::{AppState, serve};

/// Command-line options for the triage agent.
#[derive(Parser)]
#[command(name = "triage", version, about = "Clinical triage agent")]
struct Cli {
    /// Extra triage.json5 applied on top of the discovered layers
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Model override for AI-backed commands
    #[arg(long, global = true)]
    model: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Listen address; defaults to agent.bind_addr
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Print the normalized context for a patient
    Normalize { patient_id: String },
    /// Normalize and store a patient's context
    Store { patient_id: String },
    /// Print the stored context for a patient
    Context { patient_id: String },
    /// Store context and ask the model for a decision
    Evaluate { patient_id: String },
    /// Run the full triage workflow
    Triage { patient_id: String },
    /// Print the decision history for a patient
    History { patient_id: String },
    /// List registered skills and reasoners
    Skills,
}

fn load_config(cli: &Cli) -> anyhow::Result<TriageConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        options = options.with_runtime_path(path);
    }
    let layered = TriageConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    let mut config = layered.config;
    if let Some(model) = cli.model.as_ref() {
        config.ai.model = model.clone();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, agent: TriageAgent, config: &TriageConfig) -> anyhow::Result<()> {
    match command {
        Command::Serve { addr } => {
            let addr = match addr {
                Some(addr) => addr,
                None => config
                    .agent
                    .bind_addr
                    .parse()
                    .context("invalid agent.bind_addr")?,
            };
            let state = AppState::new(agent, builtin_skill_registry());
            serve(addr, state).await.context("server failed")?;
        }
        Command::Normalize { patient_id } => print_json(&agent.normalize_patient(&patient_id)?)?,
        Command::Store { patient_id } => {
            print_json(&agent.store_patient_context(&patient_id).await?)?
        }
        Command::Context { patient_id } => {
            print_json(&agent.get_patient_context(&patient_id).await?)?
        }
        Command::Evaluate { patient_id } => {
            agent.store_patient_context(&patient_id).await?;
            print_json(&agent.evaluate_risk(&patient_id).await?)?
        }
        Command::Triage { patient_id } => print_json(&agent.triage_patient(&patient_id).await?)?,
        Command::History { patient_id } => {
            print_json(&agent.get_decision_history(&patient_id).await?)?
        }
        Command::Skills => print_json(&builtin_skill_registry().specs())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    triage_rs::init_logging();

    let cli = Cli::parse();
    info!(
        "starting triage (config_set={}, model_set={})",
        cli.config.is_some(),
        cli.model.is_some()
    );
    let mut config = load_config(&cli)?;
    if !matches!(cli.command, Command::Serve { .. }) {
        let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
        triage_rs::persist_cli_memory(&mut config, triage_rs::default_memory_path(&cwd));
    }
    let agent = triage_rs::agent_from_config(&config).context("failed to build agent")?;
    run(cli.command, agent, &config).await
}
