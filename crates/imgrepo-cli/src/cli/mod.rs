//! CLI for the imgrepo cloud image repository.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use imgrepo_core::config;
use imgrepo_core::ImageRepository;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use commands::{
    run_checksum, run_completions, run_list, run_path, run_pull, run_status, run_verify,
};

/// Top-level CLI for the image repository.
#[derive(Debug, Parser)]
#[command(name = "imgrepo")]
#[command(about = "imgrepo: fetch and verify VM cloud images into a local store", long_about = None)]
pub struct Cli {
    /// Storage root to use instead of the configured one.
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List catalog images.
    List {
        /// Only images of this OS family (case-insensitive).
        #[arg(long, value_name = "FAMILY")]
        family: Option<String>,
        /// Print the entries as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Download and verify an image into the store.
    Pull {
        /// Catalog identifier, e.g. ubuntu-24.04.
        id: String,
        /// Accept the download without checking its manifest.
        #[arg(long)]
        no_verify: bool,
    },

    /// Print the local path of a materialized image.
    Path {
        /// Catalog identifier.
        id: String,
    },

    /// Show catalog metadata and local state for one image.
    Status {
        /// Catalog identifier.
        id: String,
    },

    /// Re-hash a stored image and check it against its manifest.
    Verify {
        /// Catalog identifier.
        id: String,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: String,
    },

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Load config (creating it on first run), apply `--root`, build the repository.
fn open_repository(root: Option<PathBuf>) -> Result<ImageRepository> {
    let mut cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    if let Some(root) = root {
        cfg.storage_root = Some(root);
    }
    ImageRepository::from_config(&cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let root = cli.root;

        match cli.command {
            CliCommand::List { family, json } => {
                run_list(&open_repository(root)?, family.as_deref(), json).await?
            }
            CliCommand::Pull { id, no_verify } => {
                run_pull(Arc::new(open_repository(root)?), &id, no_verify).await?
            }
            CliCommand::Path { id } => run_path(&open_repository(root)?, &id).await?,
            CliCommand::Status { id } => run_status(&open_repository(root)?, &id).await?,
            CliCommand::Verify { id } => run_verify(Arc::new(open_repository(root)?), &id).await?,
            CliCommand::Checksum { path } => run_checksum(Path::new(&path)).await?,
            CliCommand::Completions { shell } => run_completions(shell)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
