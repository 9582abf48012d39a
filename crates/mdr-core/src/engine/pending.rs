//! Per-tab pending-grace registry: at most one armed timer per tab.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::task::JoinHandle;

use crate::matcher::RedirectPair;
use crate::tabs::TabId;

/// One armed grace timer. The sequence number ties the sleeping task to
/// this record, so a timer that was replaced while mid-flight can never
/// consume its successor's record.
struct PendingGrace {
    pair: RedirectPair,
    seq: u64,
    timer: Option<JoinHandle<()>>,
}

/// Owns every piece of per-tab state: pending timers plus the most recent
/// qualifying request URL per tab. Lock scopes are synchronous only; no
/// guard is held across an await.
#[derive(Default)]
pub(super) struct GraceRegistry {
    pending: Mutex<HashMap<TabId, PendingGrace>>,
    last_request: Mutex<HashMap<TabId, String>>,
}

impl GraceRegistry {
    /// Store a new pending record for the tab, cancelling any previous
    /// timer synchronously. The timer handle is attached separately once
    /// the task exists.
    pub fn arm(&self, tab: TabId, pair: RedirectPair, seq: u64) {
        let old = self.pending.lock().unwrap().insert(
            tab,
            PendingGrace {
                pair,
                seq,
                timer: None,
            },
        );
        abort(old);
    }

    /// Attach the spawned timer task to its record. If the record was
    /// cancelled or replaced in the meantime, the fresh task is aborted
    /// instead — the newer arm has already won.
    pub fn attach_timer(&self, tab: TabId, seq: u64, timer: JoinHandle<()>) {
        let mut pending = self.pending.lock().unwrap();
        match pending.get_mut(&tab) {
            Some(entry) if entry.seq == seq => entry.timer = Some(timer),
            _ => timer.abort(),
        }
    }

    /// Cancel any pending timer for the tab.
    pub fn cancel(&self, tab: TabId) {
        abort(self.pending.lock().unwrap().remove(&tab));
    }

    /// Consume the record for a firing timer. Yields the redirect pair only
    /// when the record still belongs to that timer.
    pub fn take_fired(&self, tab: TabId, seq: u64) -> Option<RedirectPair> {
        let mut pending = self.pending.lock().unwrap();
        if pending.get(&tab).is_some_and(|entry| entry.seq == seq) {
            pending.remove(&tab).map(|entry| entry.pair)
        } else {
            None
        }
    }

    /// Record the most recent qualifying request URL for a tab, returning
    /// the previous one.
    pub fn record_request(&self, tab: TabId, url: &str) -> Option<String> {
        self.last_request
            .lock()
            .unwrap()
            .insert(tab, url.to_string())
    }

    /// Drop everything known about a tab.
    pub fn forget_tab(&self, tab: TabId) {
        self.cancel(tab);
        self.last_request.lock().unwrap().remove(&tab);
    }

    #[cfg(test)]
    pub fn has_pending(&self, tab: TabId) -> bool {
        self.pending.lock().unwrap().contains_key(&tab)
    }
}

fn abort(entry: Option<PendingGrace>) {
    if let Some(entry) = entry {
        if let Some(timer) = entry.timer {
            timer.abort();
        }
    }
}
