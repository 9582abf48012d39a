//! Mirror-pair rules and the migration from the legacy stored shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalize a hostname for rule matching: trimmed, lowercased, with one
/// leading `www.` stripped.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// One configured mirror pair, in canonical form. Both hosts are normalized
/// at load time; an empty host makes the rule unusable but is kept so the
/// configuration editor can round-trip half-filled entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub domains: [String; 2],
    #[serde(default)]
    pub backup_local_storage: bool,
}

impl Rule {
    /// Build a rule from two user-supplied hosts, normalizing both.
    pub fn new(domain_a: &str, domain_b: &str, backup_local_storage: bool) -> Self {
        Self {
            domains: [normalize_host(domain_a), normalize_host(domain_b)],
            backup_local_storage,
        }
    }

    /// True when neither side of the pair has been filled in.
    pub fn is_blank(&self) -> bool {
        self.domains.iter().all(|d| d.is_empty())
    }

    /// True when the rule names the given (normalized) host on either side.
    pub fn contains_host(&self, host: &str) -> bool {
        self.domains.iter().any(|d| !d.is_empty() && d == host)
    }

    /// Stable identifier for the pair: both hosts sorted and joined with `_`.
    /// None when either host is empty.
    pub fn pair_id(&self) -> Option<String> {
        let a = &self.domains[0];
        let b = &self.domains[1];
        if a.is_empty() || b.is_empty() {
            return None;
        }
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Some(format!("{lo}_{hi}"))
    }
}

/// Stored rule shapes. Older configurations express a pair as `{from, to}`
/// instead of `domains`; both are accepted on read.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRule {
    Domains {
        domains: Vec<String>,
        #[serde(rename = "backupLocalStorage", default)]
        backup_local_storage: bool,
    },
    Legacy {
        #[serde(default)]
        from: Option<String>,
        #[serde(default)]
        to: Option<String>,
        #[serde(rename = "backupLocalStorage", default)]
        backup_local_storage: bool,
    },
}

/// Pure migration from one stored rule record to the canonical shape.
/// Returns None for records that do not carry two domain slots.
pub fn migrate_rule(value: &Value) -> Option<Rule> {
    let raw: RawRule = serde_json::from_value(value.clone()).ok()?;
    match raw {
        RawRule::Domains {
            domains,
            backup_local_storage,
        } => {
            if domains.len() < 2 {
                return None;
            }
            Some(Rule {
                domains: [normalize_host(&domains[0]), normalize_host(&domains[1])],
                backup_local_storage,
            })
        }
        RawRule::Legacy {
            from,
            to,
            backup_local_storage,
        } => Some(Rule {
            domains: [
                normalize_host(&from.unwrap_or_default()),
                normalize_host(&to.unwrap_or_default()),
            ],
            backup_local_storage,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_host_strips_www_and_case() {
        assert_eq!(normalize_host("Example.ORG"), "example.org");
        assert_eq!(normalize_host("www.example.org"), "example.org");
        assert_eq!(normalize_host("WWW.Example.org"), "example.org");
        assert_eq!(normalize_host("  example.org  "), "example.org");
        // Only a leading prefix is stripped, and only once.
        assert_eq!(normalize_host("www.www.example.org"), "www.example.org");
        assert_eq!(normalize_host("wwwx.example.org"), "wwwx.example.org");
    }

    #[test]
    fn migrate_rule_accepts_domains_shape() {
        let rule = migrate_rule(&json!({
            "domains": ["WWW.A.example", "b.example"],
            "backupLocalStorage": true
        }))
        .unwrap();
        assert_eq!(rule.domains, ["a.example".to_string(), "b.example".to_string()]);
        assert!(rule.backup_local_storage);
    }

    #[test]
    fn migrate_rule_accepts_legacy_from_to() {
        let rule = migrate_rule(&json!({"from": "a.example", "to": "B.example"})).unwrap();
        assert_eq!(rule.domains, ["a.example".to_string(), "b.example".to_string()]);
        assert!(!rule.backup_local_storage);
    }

    #[test]
    fn migrate_rule_ignores_short_domain_lists() {
        assert!(migrate_rule(&json!({"domains": ["a.example"]})).is_none());
        assert!(migrate_rule(&json!({"domains": []})).is_none());
        assert!(migrate_rule(&json!("not an object")).is_none());
    }

    #[test]
    fn migrate_rule_fills_missing_legacy_side_with_empty_host() {
        let rule = migrate_rule(&json!({"from": "a.example"})).unwrap();
        assert_eq!(rule.domains[0], "a.example");
        assert_eq!(rule.domains[1], "");
        assert!(rule.pair_id().is_none());
    }

    #[test]
    fn pair_id_is_order_independent() {
        let ab = Rule::new("a.example", "b.example", false);
        let ba = Rule::new("b.example", "a.example", false);
        assert_eq!(ab.pair_id().unwrap(), "a.example_b.example");
        assert_eq!(ab.pair_id(), ba.pair_id());
    }

    #[test]
    fn rule_round_trips_in_storage_shape() {
        let rule = Rule::new("a.example", "b.example", true);
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            value,
            json!({"domains": ["a.example", "b.example"], "backupLocalStorage": true})
        );
        assert_eq!(migrate_rule(&value).unwrap(), rule);
    }
}
