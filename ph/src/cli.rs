//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::PlanStatus;

/// PartyHat - conversational smart contract planner
#[derive(Parser, Debug)]
#[command(
    name = "ph",
    about = "Plan smart contracts through conversation",
    version,
    after_help = "Logs are written to: ~/.local/share/partyhat/logs/partyhat.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override the memory store directory
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a planning conversation for a new plan
    Chat,

    /// Start a conversation that edits the stored plan
    Resume,

    /// Print the stored plan
    Show {
        /// Plan label (defaults to the configured global label)
        #[arg(long)]
        label: Option<String>,

        /// Print the full JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Mark the stored plan ready for code generation
    Approve {
        /// Plan label (defaults to the configured global label)
        #[arg(long)]
        label: Option<String>,
    },

    /// Advance the stored plan's status (used by downstream stages)
    Mark {
        /// New status: draft, ready, generating, testing, deployed
        status: PlanStatus,

        /// Plan label (defaults to the configured global label)
        #[arg(long)]
        label: Option<String>,
    },

    /// Show what an ERC standard provides
    Lookup {
        /// Template id, e.g. ERC-20 or erc721
        template: String,
    },

    /// Check a plan file against the schema
    Validate {
        /// Path to a plan JSON file
        file: PathBuf,
    },
}
