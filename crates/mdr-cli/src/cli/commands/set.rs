//! `mdr set` – update grace period and check-page visibility.

use anyhow::Result;
use mdr_core::settings::{clamp_grace_seconds, Settings};
use mdr_core::storage::Storage;

pub async fn run_set<S: Storage>(
    store: &S,
    grace_seconds: Option<&str>,
    show_check_page: Option<bool>,
) -> Result<()> {
    if grace_seconds.is_none() && show_check_page.is_none() {
        anyhow::bail!("nothing to set; pass --grace-seconds and/or --show-check-page");
    }

    let mut settings = Settings::load(store).await;
    if let Some(input) = grace_seconds {
        let seconds = clamp_grace_seconds(input);
        settings.grace_ms = seconds * 1000;
        println!("Grace period set to {seconds}s.");
    }
    if let Some(show) = show_check_page {
        settings.show_check_page = show;
        println!(
            "Check page will be {}.",
            if show { "shown" } else { "silent" }
        );
    }
    settings.save(store).await?;
    Ok(())
}
