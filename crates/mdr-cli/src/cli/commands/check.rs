//! `mdr check <url>` – print the redirect decision for a URL.

use anyhow::Result;
use mdr_core::matcher;
use mdr_core::settings;
use mdr_core::storage::Storage;

pub async fn run_check<S: Storage>(store: &S, url: &str) -> Result<()> {
    let rules = settings::load_rules(store).await;
    match matcher::match_pair(url, &rules) {
        Some(pair) => {
            println!("Mirrored. Backup URL: {}", pair.backup);
        }
        None => {
            println!("Not mirrored: no rule matches (or the URL is marked/unsupported).");
        }
    }
    Ok(())
}
