//! Page model: output regions, notifications and the busy indicator.
//!
//! A [`Page`] is a cheaply clonable handle. Region contents and
//! notifications live behind `tokio` read-write locks; the busy counter is
//! atomic so that [`BusyGuard`](crate::BusyGuard) can release it from `Drop`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chatdb_client::response::{HistoryEntry, TableInfo, TableSchema};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use tokio::sync::RwLock;

use crate::table::DataTable;
use crate::token::{RequestToken, RequestTokens};

/// Tracing target for page updates.
pub const TRACING_TARGET: &str = "chatdb_form::page";

/// An independently updated area of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Region {
    /// Connection status banner.
    Connection,
    /// Table listing and per-table details.
    Tables,
    /// Query results.
    DataOutput,
    /// Chart image.
    Chart,
    /// Report download link.
    Report,
    /// Upload status.
    Upload,
    /// Query history.
    History,
    /// Backend health.
    Health,
}

/// Severity of a banner or notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Status text shown at the top of a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub level: Level,
    pub message: String,
}

/// Query output: the raw JSON plus a table when the data is tabular.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataView {
    /// Pretty-printed JSON of the returned data.
    pub json: String,
    /// Rendered table, present when the data is a non-empty array of rows.
    pub table: Option<DataTable>,
    /// Shown instead of a table when the data has no rows.
    pub notice: Option<String>,
}

/// Content rendered into a region on success.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Data(DataView),
    Listing(Vec<TableSchema>),
    /// Chart image source, already cache-busted.
    Chart { src: String },
    /// Visible report download link.
    Download { href: String },
    History(Vec<HistoryEntry>),
    TableDetail {
        info: TableInfo,
        sample: Option<DataTable>,
    },
}

/// Current state of one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionState {
    pub banner: Option<Banner>,
    /// `None` means the region's content is hidden.
    pub view: Option<View>,
}

impl RegionState {
    /// Replaces the region with success content.
    pub fn succeed(&mut self, message: Option<String>, view: Option<View>) {
        self.banner = message.map(|message| Banner {
            level: Level::Success,
            message,
        });
        self.view = view;
    }

    /// Shows an error banner and hides any previous content.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.banner = Some(Banner {
            level: Level::Error,
            message: message.into(),
        });
        self.view = None;
    }
}

/// A transient, dismissible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub message: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Default)]
struct PageInner {
    regions: RwLock<BTreeMap<Region, RegionState>>,
    notifications: RwLock<Vec<Notification>>,
    next_notification: AtomicU64,
    busy: Arc<AtomicUsize>,
}

/// Shared handle to the page state.
#[derive(Debug, Clone, Default)]
pub struct Page {
    inner: Arc<PageInner>,
}

impl Page {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of one region.
    pub async fn region(&self, region: Region) -> RegionState {
        let regions = self.inner.regions.read().await;
        regions.get(&region).cloned().unwrap_or_default()
    }

    /// Applies `update` to a region if `token` is still the latest issued
    /// for it.
    ///
    /// The token check and the update happen under the same write lock, so
    /// a response can never overwrite one from a newer submission. Returns
    /// `None` when the token is stale.
    pub async fn commit<R>(
        &self,
        tokens: &RequestTokens,
        token: RequestToken,
        update: impl FnOnce(&mut RegionState) -> R,
    ) -> Option<R> {
        let mut regions = self.inner.regions.write().await;
        if !tokens.is_current(token) {
            tracing::debug!(
                target: TRACING_TARGET,
                region = %token.region(),
                sequence = token.sequence(),
                "Discarding stale response"
            );
            return None;
        }

        let state = regions.entry(token.region()).or_default();
        Some(update(state))
    }

    /// Clears a region.
    pub async fn clear(&self, region: Region) {
        self.inner.regions.write().await.remove(&region);
    }

    /// Appends a notification and returns its id.
    pub async fn push_notification(&self, level: Level, message: impl Into<String>) -> u64 {
        let id = self.inner.next_notification.fetch_add(1, Ordering::Relaxed) + 1;
        let notification = Notification {
            id,
            level,
            message: message.into(),
            created_at: Timestamp::now(),
        };
        self.inner.notifications.write().await.push(notification);
        id
    }

    /// Removes a notification. Returns `false` if it was already gone.
    pub async fn dismiss(&self, id: u64) -> bool {
        let mut notifications = self.inner.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| n.id != id);
        notifications.len() != before
    }

    /// Returns the notifications currently shown.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.inner.notifications.read().await.clone()
    }

    /// Removes and returns every notification currently shown.
    pub async fn drain_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.inner.notifications.write().await)
    }

    /// Returns `true` while at least one operation is in flight.
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire) > 0
    }

    pub(crate) fn busy_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.inner.busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifications_are_dismissible() {
        let page = Page::new();
        let first = page.push_notification(Level::Info, "one").await;
        let second = page.push_notification(Level::Error, "two").await;
        assert_ne!(first, second);

        assert!(page.dismiss(first).await);
        assert!(!page.dismiss(first).await);

        let shown = page.notifications().await;
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].message, "two");
        assert_eq!(shown[0].level, Level::Error);

        assert_eq!(page.drain_notifications().await.len(), 1);
        assert!(page.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn stale_commit_is_discarded() {
        let page = Page::new();
        let tokens = RequestTokens::new();

        let older = tokens.issue(Region::DataOutput);
        let newer = tokens.issue(Region::DataOutput);

        let applied = page
            .commit(&tokens, newer, |state| state.fail("newer"))
            .await;
        assert!(applied.is_some());

        let applied = page
            .commit(&tokens, older, |state| state.fail("older"))
            .await;
        assert!(applied.is_none());

        let state = page.region(Region::DataOutput).await;
        assert_eq!(state.banner.unwrap().message, "newer");
    }

    #[tokio::test]
    async fn fail_hides_previous_view() {
        let page = Page::new();
        let tokens = RequestTokens::new();

        let token = tokens.issue(Region::Chart);
        page.commit(&tokens, token, |state| {
            state.succeed(None, Some(View::Chart { src: "/a.png".into() }));
        })
        .await;

        let token = tokens.issue(Region::Chart);
        page.commit(&tokens, token, |state| state.fail("boom")).await;

        let state = page.region(Region::Chart).await;
        assert!(state.view.is_none());
        assert_eq!(state.banner.map(|b| b.level), Some(Level::Error));
    }

    #[test]
    fn region_names_are_snake_case() {
        assert_eq!(Region::DataOutput.as_ref(), "data_output");
        assert_eq!("table_info".parse::<Region>().ok(), None);
        assert_eq!("tables".parse::<Region>().ok(), Some(Region::Tables));
    }
}
