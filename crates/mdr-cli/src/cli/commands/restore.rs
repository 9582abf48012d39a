//! `mdr restore <host>` – restore (or queue a restore of) a page-storage
//! snapshot.

use anyhow::Result;
use mdr_core::pagestore::{self, ActionOutcome, PageAction, PageData};
use mdr_core::settings::{self, normalize_host, Rule};
use mdr_core::storage::Storage;

pub async fn run_restore<S: Storage>(store: &S, host: &str, on_next_load: bool) -> Result<()> {
    if on_next_load {
        let rules = settings::load_rules(store).await;
        let normalized = normalize_host(host);
        let pair_id = rules
            .iter()
            .find(|rule| rule.contains_host(&normalized))
            .and_then(Rule::pair_id)
            .ok_or_else(|| anyhow::anyhow!("not a paired domain: {host}"))?;
        pagestore::request_restore(store, &pair_id).await?;
        println!("Restore queued for the next page load of pair {pair_id}.");
        return Ok(());
    }

    match pagestore::apply_action(store, host, PageAction::Restore, &PageData::new()).await {
        Ok(ActionOutcome::Restored(data)) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        // A restore action never reports BackedUp.
        Ok(ActionOutcome::BackedUp) => Ok(()),
        Err(e) => anyhow::bail!("{e}"),
    }
}
