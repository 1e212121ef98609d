use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use memorystore::cli::{Cli, Command};
use memorystore::config::Config;
use memorystore::{BlockRead, BlockStore, Scope};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_dir = cli.store_dir.unwrap_or(config.store_dir);

    info!("memorystore starting: {}", store_dir.display());
    let store = BlockStore::open_with_timeout(&store_dir, config.busy_timeout_ms)
        .with_context(|| format!("Failed to open block store at {}", store_dir.display()))?;

    match cli.command {
        Command::List { scope, json } => {
            let scope = scope.map(|s| s.parse::<Scope>()).transpose()?;
            let blocks = store.list(scope.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            } else if blocks.is_empty() {
                println!("No blocks found");
            } else {
                for block in blocks {
                    let state = if block.is_placeholder() {
                        "placeholder".dimmed()
                    } else {
                        format!("v{}", block.version).normal()
                    };
                    println!(
                        "{} {} {} {}",
                        block.scope.to_string().cyan(),
                        block.label.yellow(),
                        state,
                        block.id.dimmed()
                    );
                }
            }
        }
        Command::Read { label, session } => {
            let scope = session.map(Scope::session).unwrap_or(Scope::Global);
            match store.read(&label, &scope)? {
                BlockRead::Value(value) => println!("{}", value),
                BlockRead::Placeholder => {
                    println!("{} {} in {} has not been written yet", "∅".yellow(), label, scope)
                }
                BlockRead::Missing => {
                    eprintln!("{} No block '{}' in {}", "✗".red(), label, scope);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
