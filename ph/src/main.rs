//! PartyHat - conversational smart contract planner
//!
//! CLI entry point.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::info;

use partyhat::cli::{Cli, Command};
use partyhat::config::Config;
use partyhat::domain::{PlanDocument, PlanStatus, lookup_standard};
use partyhat::llm::create_client;
use partyhat::memory::MemoryManager;
use partyhat::repl::ReplSession;
use partyhat::session::Orchestrator;

/// Level precedence: CLI flag, then config file, then INFO
fn setup_logging(cli_level: Option<&str>, config_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("partyhat")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = match cli_level.or(config_level) {
        Some(level) => tracing::Level::from_str(level).map_err(|_| eyre::eyre!("Invalid log level: {}", level))?,
        None => tracing::Level::INFO,
    };
    let log_file = fs::File::create(log_dir.join("partyhat.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(store_dir) = cli.store_dir.clone() {
        config.storage.store_dir = store_dir;
    }

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    info!(
        "PartyHat loaded config: provider={}, model={}, store={}",
        config.llm.provider,
        config.llm.model,
        config.storage.store_dir.display()
    );

    match cli.command {
        Some(Command::Chat) => cmd_chat(&config, false).await,
        Some(Command::Resume) => cmd_chat(&config, true).await,
        Some(Command::Show { label, json }) => cmd_show(&config, label, json).await,
        Some(Command::Approve { label }) => cmd_approve(&config, label).await,
        Some(Command::Mark { status, label }) => cmd_mark(&config, status, label).await,
        Some(Command::Lookup { template }) => cmd_lookup(&template),
        Some(Command::Validate { file }) => cmd_validate(&file),
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn open_memory(config: &Config) -> Result<MemoryManager> {
    MemoryManager::open(
        &config.storage.store_dir,
        config.storage.busy_timeout_ms,
        &config.storage.global_label,
    )
    .with_context(|| format!("Failed to open memory store at {}", config.storage.store_dir.display()))
}

/// Interactive planning conversation
async fn cmd_chat(config: &Config, resume: bool) -> Result<()> {
    config.validate()?;

    let llm = create_client(&config.llm).map_err(|e| eyre::eyre!("Failed to create LLM client: {}", e))?;
    let memory = open_memory(config)?;
    let orchestrator = Arc::new(Orchestrator::new(llm, memory.clone(), config.session.clone())?);

    let mut repl = ReplSession::new(orchestrator);
    let result = repl.run(resume).await;

    memory.shutdown().await?;
    result
}

async fn cmd_show(config: &Config, label: Option<String>, json: bool) -> Result<()> {
    let memory = open_memory(config)?;
    let label = label.unwrap_or_else(|| config.storage.global_label.clone());

    match memory.read_global(&label).await? {
        Some(plan) if json => println!("{}", plan.to_json_pretty()?),
        Some(plan) => println!("{}", plan.summary()),
        None => println!("{} No plan stored under '{}'", "∅".yellow(), label),
    }

    memory.shutdown().await?;
    Ok(())
}

async fn cmd_approve(config: &Config, label: Option<String>) -> Result<()> {
    let memory = open_memory(config)?;
    let label = label.unwrap_or_else(|| config.storage.global_label.clone());

    let result = memory.approve(&label).await;
    memory.shutdown().await?;

    let plan = result.with_context(|| format!("Failed to approve '{}'", label))?;
    println!("{} Plan '{}' is {}", "✓".green(), plan.project_name, plan.status);
    Ok(())
}

async fn cmd_mark(config: &Config, status: PlanStatus, label: Option<String>) -> Result<()> {
    let memory = open_memory(config)?;
    let label = label.unwrap_or_else(|| config.storage.global_label.clone());

    let result = memory.set_status(&label, status).await;
    memory.shutdown().await?;

    let plan = result.with_context(|| format!("Failed to mark '{}' as {}", label, status))?;
    println!("{} Plan '{}' is {}", "✓".green(), plan.project_name, plan.status);
    Ok(())
}

fn cmd_lookup(template: &str) -> Result<()> {
    let standard = lookup_standard(template).map_err(|e| eyre::eyre!(e))?;
    println!("{}", serde_json::to_string_pretty(standard)?);
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let content = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let plan = PlanDocument::from_json_str(&content).with_context(|| format!("{} is not a valid plan", file.display()))?;

    println!("{} {} is valid", "✓".green(), file.display());
    println!("{}", plan.summary());
    match plan.check_ready() {
        Ok(()) => println!("{}", "Ready to publish.".green()),
        Err(e) => println!("{} {}", "Not yet publishable:".yellow(), e),
    }
    Ok(())
}
