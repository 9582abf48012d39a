//! Redirect decision engine: navigation events in, check-page redirects out.
//!
//! One engine owns all per-tab state (the design keeps each record touched
//! only by events keyed to that tab). Handlers revalidate tab state after
//! every await; a read that raced a navigation is discarded, not acted on.
//! For a single tab the most recently armed timer always wins.

mod pending;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::check;
use crate::matcher::{self, RedirectPair};
use crate::settings::{self, Rule};
use crate::storage::Storage;
use crate::tabs::{Browser, TabId, TabStatus};
use pending::GraceRegistry;

/// The background engine. Cheap to clone; clones share all state.
pub struct RedirectEngine<B, S> {
    inner: Arc<Inner<B, S>>,
}

impl<B, S> Clone for RedirectEngine<B, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<B, S> {
    browser: B,
    storage: S,
    check_page_url: String,
    /// Rule cache; written only by `reload_rules`, read everywhere else.
    rules: RwLock<Vec<Rule>>,
    registry: GraceRegistry,
    arm_seq: AtomicU64,
}

impl<B: Browser, S: Storage> RedirectEngine<B, S> {
    pub fn new(browser: B, storage: S) -> Self {
        Self::with_check_page_url(browser, storage, check::DEFAULT_CHECK_PAGE_URL)
    }

    pub fn with_check_page_url(
        browser: B,
        storage: S,
        check_page_url: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                browser,
                storage,
                check_page_url: check_page_url.into(),
                rules: RwLock::new(Vec::new()),
                registry: GraceRegistry::default(),
                arm_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Refresh the rule cache from storage. Called at startup and whenever
    /// the stored rule list changes; never cancels in-flight timers.
    pub async fn reload_rules(&self) {
        let rules = settings::load_rules(&self.inner.storage).await;
        tracing::debug!(count = rules.len(), "rule cache reloaded");
        *self.inner.rules.write().unwrap() = rules;
    }

    /// Storage-change notification. Only a change to the rule list is
    /// interesting; everything else is read fresh at decision time anyway.
    pub async fn on_storage_changed(&self, changed_keys: &[String]) {
        if changed_keys.iter().any(|k| k == settings::KEY_RULES) {
            self.reload_rules().await;
        }
    }

    /// Navigation-intercept event for a main-frame request.
    pub async fn on_request(&self, tab: TabId, request_url: &str) {
        let pair = match self.match_cached(request_url) {
            Some(pair) => pair,
            None => {
                // The cache may trail a rule edit; retry against fresh
                // rules before concluding this is not a mirrored host.
                self.reload_rules().await;
                match self.match_cached(request_url) {
                    Some(pair) => pair,
                    None => return,
                }
            }
        };
        let previous = self.inner.registry.record_request(tab, request_url);
        self.maybe_schedule(tab, request_url, pair, previous).await;
    }

    /// Tab-removal event: cancel the timer and drop all per-tab state.
    pub fn on_tab_removed(&self, tab: TabId) {
        self.inner.registry.forget_tab(tab);
    }

    fn match_cached(&self, url: &str) -> Option<RedirectPair> {
        matcher::match_pair(url, &self.inner.rules.read().unwrap())
    }

    /// Decide between arming a grace timer and cancelling one, from the
    /// tab's live state.
    async fn maybe_schedule(
        &self,
        tab: TabId,
        request_url: &str,
        pair: RedirectPair,
        previous: Option<String>,
    ) {
        let tab_url = self.inner.browser.tab(tab).await.and_then(|t| t.url);
        match tab_url {
            Some(current) => {
                if matcher::is_same_host(&current, request_url) {
                    // Already on the matched host; the page gets to load
                    // without a countdown.
                    tracing::debug!(%tab, "tab already on matched host, grace cancelled");
                    self.inner.registry.cancel(tab);
                    return;
                }
            }
            None => {
                // The browser cannot report the tab yet. A repeat
                // navigation to the same host means that page is still
                // coming up; do not race a check page onto it.
                let repeat = previous
                    .as_deref()
                    .is_some_and(|prev| matcher::is_same_host(prev, request_url));
                if repeat {
                    tracing::debug!(%tab, "repeat navigation while tab unqueryable, grace cancelled");
                    self.inner.registry.cancel(tab);
                    return;
                }
            }
        }
        self.arm(tab, pair).await;
    }

    /// Arm (or rearm) the grace timer. The duration comes from
    /// configuration now, not at fire time.
    async fn arm(&self, tab: TabId, pair: RedirectPair) {
        let grace_ms = settings::load_grace_ms(&self.inner.storage).await;
        let seq = self.inner.arm_seq.fetch_add(1, Ordering::Relaxed);
        self.inner.registry.arm(tab, pair, seq);

        let inner = Arc::clone(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(grace_ms)).await;
            inner.fire(tab, seq).await;
        });
        self.inner.registry.attach_timer(tab, seq, timer);
        tracing::debug!(%tab, grace_ms, "grace timer armed");
    }

    #[cfg(test)]
    fn has_pending(&self, tab: TabId) -> bool {
        self.inner.registry.has_pending(tab)
    }
}

impl<B: Browser, S: Storage> Inner<B, S> {
    /// Redirect executor: runs when a grace timer expires.
    async fn fire(&self, tab: TabId, seq: u64) {
        // Clear Pending before anything else, so an event arriving during
        // the decision below never sees stale state.
        let Some(pair) = self.registry.take_fired(tab, seq) else {
            return;
        };

        let Some(snapshot) = self.browser.tab(tab).await else {
            tracing::debug!(%tab, "tab gone at grace expiry");
            return;
        };

        let current_url = snapshot.url.unwrap_or_default();
        let current = matcher::strip_fragment(&current_url);
        let original = matcher::strip_fragment(&pair.original);
        if snapshot.status == TabStatus::Complete && current == original {
            tracing::debug!(%tab, "original page loaded in time");
            return;
        }
        if snapshot.status == TabStatus::Complete && matcher::is_same_host(current, &pair.original)
        {
            tracing::debug!(%tab, "tab settled elsewhere on the original host");
            return;
        }

        // The show/suppress flag is read now, at fire time.
        let show_check_page = settings::load_show_check_page(&self.storage).await;
        let check_url = check::build_check_url(&self.check_page_url, &pair, show_check_page);
        tracing::info!(
            %tab,
            original = %pair.original,
            backup = %pair.backup,
            "grace expired, sending tab to check page"
        );
        self.browser.navigate(tab, &check_url).await;
    }
}
