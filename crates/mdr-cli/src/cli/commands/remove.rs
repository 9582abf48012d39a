//! `mdr remove <domain>` – remove pairs containing a domain.

use anyhow::Result;
use mdr_core::settings::{normalize_host, Settings};
use mdr_core::storage::Storage;

pub async fn run_remove<S: Storage>(store: &S, domain: &str) -> Result<()> {
    let host = normalize_host(domain);
    if host.is_empty() {
        anyhow::bail!("a domain is required");
    }

    let mut settings = Settings::load(store).await;
    let before = settings.rules.len();
    settings.rules.retain(|rule| !rule.contains_host(&host));
    let removed = before - settings.rules.len();

    if removed == 0 {
        println!("No pair contains {host}.");
        return Ok(());
    }
    settings.save(store).await?;
    println!("Removed {removed} pair(s) containing {host}.");
    Ok(())
}
