//! `mdr list` – show settings and configured pairs.

use anyhow::Result;
use mdr_core::settings::Settings;
use mdr_core::storage::Storage;

pub async fn run_list<S: Storage>(store: &S) -> Result<()> {
    let settings = Settings::load(store).await;

    println!(
        "Check page: {}",
        if settings.show_check_page {
            "shown"
        } else {
            "silent"
        }
    );
    println!(
        "Grace period: {}s ({} ms)",
        settings.grace_ms / 1000,
        settings.grace_ms
    );

    if settings.rules.is_empty() {
        println!("No mirror pairs configured.");
        return Ok(());
    }
    println!("Pairs:");
    for rule in &settings.rules {
        let backup = if rule.backup_local_storage {
            "  [backs up localStorage]"
        } else {
            ""
        };
        println!("  {} <-> {}{}", rule.domains[0], rule.domains[1], backup);
    }
    Ok(())
}
