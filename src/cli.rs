//! Command-line interface definitions.
//!
//! Defines the argument parser and subcommands using clap's derive API.
//! Every subcommand reads the same configuration file: `run` migrates,
//! `check` only scans for attention terms, `targets` lists what would be
//! processed and `restore` puts backups back.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Apply ordered text rewrite rules to a source tree with create-once backups.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Print debug logging to stderr. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply the configured rules to every target and report the outcome.
    Run {
        /// Migration configuration (TOML, or JSON with a `.json` extension).
        #[arg(short, long, default_value = "migrate.toml")]
        config: PathBuf,

        /// Directory that target paths are relative to. Defaults to current directory.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Show what would change without modifying any file.
        #[arg(long)]
        dry_run: bool,

        /// Skip creating backup files.
        #[arg(long)]
        no_backup: bool,

        /// Only process the named categories. Repeatable.
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Confirm each file's changes before writing it.
        #[arg(short, long)]
        interactive: bool,

        /// Emit JSON instead of human-readable output.
        #[arg(long)]
        json: bool,
    },

    /// Report targets containing attention terms without changing anything.
    Check {
        /// Migration configuration (TOML, or JSON with a `.json` extension).
        #[arg(short, long, default_value = "migrate.toml")]
        config: PathBuf,

        /// Directory that target paths are relative to. Defaults to current directory.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Only scan the named categories. Repeatable.
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Emit JSON instead of human-readable output.
        #[arg(long)]
        json: bool,
    },

    /// List resolved targets and whether they exist.
    Targets {
        /// Migration configuration (TOML, or JSON with a `.json` extension).
        #[arg(short, long, default_value = "migrate.toml")]
        config: PathBuf,

        /// Directory that target paths are relative to. Defaults to current directory.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Only list the named categories. Repeatable.
        #[arg(long = "category")]
        categories: Vec<String>,
    },

    /// Copy backups back over their targets.
    Restore {
        /// Migration configuration (TOML, or JSON with a `.json` extension).
        #[arg(short, long, default_value = "migrate.toml")]
        config: PathBuf,

        /// Directory that target paths are relative to. Defaults to current directory.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Show what would be restored without touching any file.
        #[arg(long)]
        dry_run: bool,

        /// Delete each backup after restoring it.
        #[arg(long)]
        remove: bool,

        /// Also restore backups found under the root for unlisted files.
        #[arg(long)]
        all: bool,

        /// Only restore the named categories. Repeatable.
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Emit JSON instead of human-readable output.
        #[arg(long)]
        json: bool,
    },
}
