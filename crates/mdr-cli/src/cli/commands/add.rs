//! `mdr add <domain-a> <domain-b>` – add a mirror pair.

use anyhow::Result;
use mdr_core::settings::{Rule, Settings};
use mdr_core::storage::Storage;

pub async fn run_add<S: Storage>(
    store: &S,
    domain_a: &str,
    domain_b: &str,
    backup_local_storage: bool,
) -> Result<()> {
    let rule = Rule::new(domain_a, domain_b, backup_local_storage);
    if rule.domains.iter().any(|d| d.is_empty()) {
        anyhow::bail!("both domains of a pair are required");
    }
    if rule.domains[0] == rule.domains[1] {
        anyhow::bail!("a domain cannot be paired with itself");
    }

    let mut settings = Settings::load(store).await;
    if settings
        .rules
        .iter()
        .any(|existing| existing.pair_id() == rule.pair_id())
    {
        anyhow::bail!(
            "pair {} <-> {} already exists",
            rule.domains[0],
            rule.domains[1]
        );
    }

    println!("Added pair: {} <-> {}", rule.domains[0], rule.domains[1]);
    settings.rules.push(rule);
    settings.save(store).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdr_core::storage::MemoryStorage;

    #[tokio::test]
    async fn add_normalizes_hosts() {
        let store = MemoryStorage::new();
        run_add(&store, "  WWW.Mirror.example ", "backup.example", false)
            .await
            .unwrap();
        let settings = Settings::load(&store).await;
        assert_eq!(
            settings.rules[0].domains,
            ["mirror.example".to_string(), "backup.example".to_string()]
        );
    }
}
