//! CLI argument parsing for memorystore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ms")]
#[command(author, version, about = "Inspect tiered memory blocks", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the store directory
    #[arg(short, long)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List blocks
    List {
        /// Only show blocks in this scope ("global" or "session:<id>")
        #[arg(long)]
        scope: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one block's value
    Read {
        /// Block label
        #[arg(required = true)]
        label: String,

        /// Read the session-scoped block instead of the global one
        #[arg(long)]
        session: Option<String>,
    },
}
