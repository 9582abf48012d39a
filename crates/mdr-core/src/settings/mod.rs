//! Persisted configuration: mirror-pair rules, grace period, check-page
//! visibility.
//!
//! Settings live as individual keys in the key/value store so readers can
//! fetch only what an event needs. Every read degrades to a default on
//! missing or malformed data; nothing in here returns a hard failure for a
//! bad stored value.

mod rule;

use anyhow::Result;
use serde_json::Value;

use crate::storage::Storage;

pub use rule::{migrate_rule, normalize_host, Rule};

pub const KEY_RULES: &str = "rules";
pub const KEY_SHOW_CHECK_PAGE: &str = "showCheckPage";
pub const KEY_GRACE_MS: &str = "graceMs";
pub const KEY_GRACE_SECONDS: &str = "graceSeconds";

/// Usable range for the stored grace period.
pub const GRACE_MIN_MS: u64 = 1000;
pub const GRACE_MAX_MS: u64 = 10000;
pub const GRACE_DEFAULT_MS: u64 = 3000;

const GRACE_MIN_SECONDS: i64 = 1;
const GRACE_MAX_SECONDS: i64 = 10;
const GRACE_DEFAULT_SECONDS: i64 = 3;

/// The full typed configuration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rules: Vec<Rule>,
    pub show_check_page: bool,
    pub grace_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            show_check_page: true,
            grace_ms: GRACE_DEFAULT_MS,
        }
    }
}

impl Settings {
    /// Assemble the record from storage. Read failures and malformed values
    /// yield the per-field defaults.
    pub async fn load<S: Storage>(store: &S) -> Self {
        Self {
            rules: load_rules(store).await,
            show_check_page: load_show_check_page(store).await,
            grace_ms: load_grace_ms(store).await,
        }
    }

    /// Persist the record. Rules with both hosts blank are dropped, and the
    /// grace period is written in both stored units.
    pub async fn save<S: Storage>(&self, store: &S) -> Result<()> {
        let rules: Vec<&Rule> = self.rules.iter().filter(|r| !r.is_blank()).collect();
        store.set(KEY_RULES, serde_json::to_value(&rules)?).await?;
        store
            .set(KEY_SHOW_CHECK_PAGE, Value::Bool(self.show_check_page))
            .await?;
        store.set(KEY_GRACE_MS, Value::from(self.grace_ms)).await?;
        store
            .set(KEY_GRACE_SECONDS, Value::from(self.grace_ms / 1000))
            .await?;
        Ok(())
    }
}

/// Load and migrate the rule list. Anything that is not an array of rule
/// records reads as no rules at all.
pub async fn load_rules<S: Storage>(store: &S) -> Vec<Rule> {
    match store.get(KEY_RULES).await {
        Some(Value::Array(items)) => items.iter().filter_map(migrate_rule).collect(),
        _ => Vec::new(),
    }
}

/// Check-page visibility: on unless explicitly stored as `false`.
pub async fn load_show_check_page<S: Storage>(store: &S) -> bool {
    !matches!(store.get(KEY_SHOW_CHECK_PAGE).await, Some(Value::Bool(false)))
}

/// Grace duration as read at timer-arm time.
pub async fn load_grace_ms<S: Storage>(store: &S) -> u64 {
    grace_ms_or_default(store.get(KEY_GRACE_MS).await)
}

/// A stored grace period is used only when it sits inside the usable range;
/// anything else (missing, wrong type, out of range) falls back to the
/// default. The write path keeps stored values in range, so this fires only
/// on hand-edited or stale state.
pub fn grace_ms_or_default(value: Option<Value>) -> u64 {
    match value.as_ref().and_then(Value::as_u64) {
        Some(ms) if (GRACE_MIN_MS..=GRACE_MAX_MS).contains(&ms) => ms,
        _ => GRACE_DEFAULT_MS,
    }
}

/// Clamp a grace-seconds input from the configuration surface: values above
/// the maximum clamp down to it, anything below the minimum or non-numeric
/// falls back to the default.
pub fn clamp_grace_seconds(input: &str) -> u64 {
    match input.trim().parse::<i64>() {
        Ok(n) if n > GRACE_MAX_SECONDS => GRACE_MAX_SECONDS as u64,
        Ok(n) if n >= GRACE_MIN_SECONDS => n as u64,
        _ => GRACE_DEFAULT_SECONDS as u64,
    }
}
