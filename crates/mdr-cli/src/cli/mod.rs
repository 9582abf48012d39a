//! CLI for the MDR mirror-domain redirector.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mdr_core::storage::FileStorage;

use commands::{
    run_add, run_backup, run_check, run_list, run_remove, run_restore, run_set,
};

/// Top-level CLI for the MDR mirror-domain redirector.
#[derive(Debug, Parser)]
#[command(name = "mdr")]
#[command(about = "MDR: grace-period failover between mirror domains", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Add a mirror pair.
    Add {
        /// One domain of the pair (e.g. example.org).
        domain_a: String,
        /// The paired domain (e.g. example.net).
        domain_b: String,
        /// Back up the page's local storage when a redirect lands on this pair.
        #[arg(long)]
        backup_local_storage: bool,
    },

    /// Remove every mirror pair containing a domain.
    Remove {
        /// Either domain of the pair.
        domain: String,
    },

    /// Show settings and configured pairs.
    List,

    /// Update the grace period and check-page visibility.
    Set {
        /// Grace period in seconds. Values above 10 clamp to 10; zero,
        /// negative, or non-numeric input falls back to 3.
        #[arg(long, value_name = "SECONDS")]
        grace_seconds: Option<String>,
        /// Show (true) or suppress (false) the interstitial check page.
        #[arg(long, value_name = "BOOL")]
        show_check_page: Option<bool>,
    },

    /// Print the redirect decision for a URL.
    Check {
        /// Fully-qualified http(s) URL.
        url: String,
    },

    /// Save a page-storage snapshot for a paired host.
    Backup {
        /// Host the snapshot belongs to.
        host: String,
        /// Path to a JSON object of string keys and values.
        data: PathBuf,
    },

    /// Restore the saved page-storage snapshot for a paired host.
    Restore {
        /// Host to restore.
        host: String,
        /// Queue the restore for the pair's next page load instead of
        /// printing the snapshot now.
        #[arg(long)]
        on_next_load: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let store = FileStorage::open_default()?;
        tracing::debug!(path = %store.path().display(), "using settings store");

        match cli.command {
            CliCommand::Add {
                domain_a,
                domain_b,
                backup_local_storage,
            } => run_add(&store, &domain_a, &domain_b, backup_local_storage).await?,
            CliCommand::Remove { domain } => run_remove(&store, &domain).await?,
            CliCommand::List => run_list(&store).await?,
            CliCommand::Set {
                grace_seconds,
                show_check_page,
            } => run_set(&store, grace_seconds.as_deref(), show_check_page).await?,
            CliCommand::Check { url } => run_check(&store, &url).await?,
            CliCommand::Backup { host, data } => run_backup(&store, &host, &data).await?,
            CliCommand::Restore { host, on_next_load } => {
                run_restore(&store, &host, on_next_load).await?
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
