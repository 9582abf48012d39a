//! Tab identity and the browser seam the engine drives.

use std::fmt;
use std::future::Future;

/// Browser-assigned tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load state as the browser reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Point-in-time view of a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSnapshot {
    /// Current tab URL. None while the browser cannot report one yet
    /// (early in a navigation the tab record may exist without a URL).
    pub url: Option<String>,
    pub status: TabStatus,
}

/// The slice of the browser the redirect engine needs. Implementations are
/// queried fresh before every decision; the engine never caches snapshots
/// across a suspension point.
pub trait Browser: Send + Sync + 'static {
    /// Live snapshot of a tab, or None when the tab no longer exists.
    fn tab(&self, id: TabId) -> impl Future<Output = Option<TabSnapshot>> + Send;

    /// Rewrite the tab's location.
    fn navigate(&self, id: TabId, url: &str) -> impl Future<Output = ()> + Send;
}
