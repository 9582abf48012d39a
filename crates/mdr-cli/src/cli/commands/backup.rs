//! `mdr backup <host> <data.json>` – save a page-storage snapshot.

use std::path::Path;

use anyhow::{Context, Result};
use mdr_core::pagestore::{self, PageAction, PageData};
use mdr_core::storage::Storage;

pub async fn run_backup<S: Storage>(store: &S, host: &str, data_path: &Path) -> Result<()> {
    let bytes = tokio::fs::read(data_path)
        .await
        .with_context(|| format!("read page data: {}", data_path.display()))?;
    let data: PageData = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse page data: {}", data_path.display()))?;

    match pagestore::apply_action(store, host, PageAction::Backup, &data).await {
        Ok(_) => {
            println!("Backed up {} key(s) for {host}.", data.len());
            Ok(())
        }
        Err(e) => anyhow::bail!("{e}"),
    }
}
