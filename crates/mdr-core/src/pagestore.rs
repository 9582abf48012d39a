//! Page-local storage mirroring between the two sides of a mirror pair.
//!
//! Backups are plain key/value snapshots of a page's local storage, kept in
//! the shared store under a per-pair key so either domain of the pair reads
//! the same record.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::matcher;
use crate::settings::{self, normalize_host, Rule};
use crate::storage::Storage;

pub const BACKUP_KEY_PREFIX: &str = "ls_backup_";
pub const RESTORE_KEY_PREFIX: &str = "ls_restore_";

/// Snapshot of a page's local storage.
pub type PageData = BTreeMap<String, String>;

/// Stored backup record for one mirror pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    pub data: PageData,
    /// Unix milliseconds of the last save.
    pub updated_at: u64,
}

/// What the page host should apply after a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoadAction {
    /// Nothing to do.
    None,
    /// Replace the page's local storage with this restored snapshot.
    Restore(PageData),
    /// A fresh backup of the current page data was saved.
    BackedUp,
}

/// Everything the page host applies after `on_page_load`: the storage
/// action plus the address-bar cleanup for marker-tagged arrivals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLoadOutcome {
    pub action: PageLoadAction,
    /// The committed URL with the redirect marker removed, when it carried
    /// one; the host puts this back in the address bar.
    pub clean_url: Option<String>,
}

/// Actions available to user-facing controls via per-tab messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Backup,
    Restore,
}

/// Result of a successful page action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    BackedUp,
    Restored(PageData),
}

/// Why a page action was refused. Display strings double as the wire
/// `reason` field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Not a paired domain")]
    NotPaired,
    #[error("No backup")]
    NoBackup,
    #[error("Backup could not be saved")]
    StorageWrite,
}

/// Wire response for the per-tab messaging contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ActionResponse {
    pub fn from_result(result: &Result<ActionOutcome, ActionError>) -> Self {
        match result {
            Ok(_) => Self {
                ok: true,
                reason: None,
            },
            Err(e) => Self {
                ok: false,
                reason: Some(e.to_string()),
            },
        }
    }
}

pub fn backup_key(pair_id: &str) -> String {
    format!("{BACKUP_KEY_PREFIX}{pair_id}")
}

pub fn restore_key(pair_id: &str) -> String {
    format!("{RESTORE_KEY_PREFIX}{pair_id}")
}

/// A candidate snapshot beats the stored backup when it is non-empty and
/// holds at least as many keys. An empty candidate never overwrites.
pub fn is_better(current: &PageData, existing: Option<&BackupEntry>) -> bool {
    if current.is_empty() {
        return false;
    }
    match existing {
        None => true,
        Some(entry) if entry.data.is_empty() => true,
        Some(entry) => current.len() >= entry.data.len(),
    }
}

/// Page-load hook, run once the navigation has committed at `url`.
///
/// The redirect marker is stripped from the URL first (the cleaned form is
/// handed back for the address bar). For the storage side, a pending
/// restore request wins: the backup is handed back for the page to apply
/// and the request is consumed. Otherwise, a load that arrived via a
/// redirect saves a backup for pairs that opted in, when the current data
/// is worth keeping.
pub async fn on_page_load<S: Storage>(
    store: &S,
    url: &str,
    current: &PageData,
) -> PageLoadOutcome {
    let clean_url = matcher::strip_redirect_marker(url);
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(normalize_host));
    let action = match host {
        Some(host) => page_load_action(store, &host, current, clean_url.is_some()).await,
        None => PageLoadAction::None,
    };
    PageLoadOutcome { action, clean_url }
}

async fn page_load_action<S: Storage>(
    store: &S,
    host: &str,
    current: &PageData,
    had_redirect_marker: bool,
) -> PageLoadAction {
    if host.is_empty() {
        return PageLoadAction::None;
    }
    let rules = settings::load_rules(store).await;
    let Some(rule) = rule_for_host(&rules, host) else {
        return PageLoadAction::None;
    };
    let Some(pair_id) = rule.pair_id() else {
        return PageLoadAction::None;
    };

    let restore_requested = matches!(
        store.get(&restore_key(&pair_id)).await,
        Some(Value::Bool(true))
    );
    let backup = read_backup(store, &pair_id).await;

    if restore_requested {
        if let Some(entry) = &backup {
            let _ = store.remove(&restore_key(&pair_id)).await;
            tracing::info!(host = %host, pair = %pair_id, "restoring page storage from backup");
            return PageLoadAction::Restore(entry.data.clone());
        }
        // No backup to apply yet; the request stays queued.
    }
    if had_redirect_marker && rule.backup_local_storage && is_better(current, backup.as_ref()) {
        if save_backup(store, &pair_id, current).await.is_ok() {
            tracing::debug!(host = %host, pair = %pair_id, keys = current.len(), "page storage backed up after redirect");
            return PageLoadAction::BackedUp;
        }
    }
    PageLoadAction::None
}

/// Queue a restore: the next page load on either side of the pair applies
/// the stored backup.
pub async fn request_restore<S: Storage>(store: &S, pair_id: &str) -> anyhow::Result<()> {
    store.set(&restore_key(pair_id), Value::Bool(true)).await
}

/// Handle a `backup`/`restore` message for the page currently on `host`.
pub async fn apply_action<S: Storage>(
    store: &S,
    host: &str,
    action: PageAction,
    current: &PageData,
) -> Result<ActionOutcome, ActionError> {
    let host = normalize_host(host);
    let rules = settings::load_rules(store).await;
    let pair_id = rule_for_host(&rules, &host)
        .and_then(Rule::pair_id)
        .ok_or(ActionError::NotPaired)?;

    match action {
        PageAction::Backup => {
            save_backup(store, &pair_id, current)
                .await
                .map_err(|_| ActionError::StorageWrite)?;
            Ok(ActionOutcome::BackedUp)
        }
        PageAction::Restore => {
            let entry = read_backup(store, &pair_id)
                .await
                .ok_or(ActionError::NoBackup)?;
            Ok(ActionOutcome::Restored(entry.data))
        }
    }
}

fn rule_for_host<'a>(rules: &'a [Rule], host: &str) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule.contains_host(host))
}

async fn read_backup<S: Storage>(store: &S, pair_id: &str) -> Option<BackupEntry> {
    let value = store.get(&backup_key(pair_id)).await?;
    serde_json::from_value(value).ok()
}

async fn save_backup<S: Storage>(
    store: &S,
    pair_id: &str,
    data: &PageData,
) -> anyhow::Result<()> {
    let entry = BackupEntry {
        data: data.clone(),
        updated_at: now_ms(),
    };
    store
        .set(&backup_key(pair_id), serde_json::to_value(&entry)?)
        .await
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
