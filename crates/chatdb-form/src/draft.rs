//! Draft persistence.
//!
//! [`DraftStore`] keeps the last value typed into each field, keyed by the
//! field's identity, in a small JSON file. [`DraftDebouncer`] coalesces
//! rapid edits so only the value that stays unchanged for the debounce
//! window is written.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chatdb_client::{Error, Result};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Tracing target for draft persistence.
pub const TRACING_TARGET: &str = "chatdb_form::draft";

/// Default trailing-edge debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Field identity of the query editor.
pub const QUERY_FIELD: &str = "query";

/// Key-value store of field drafts. Last write wins per field.
#[derive(Debug, Default)]
pub struct DraftStore {
    path: Option<PathBuf>,
    entries: RwLock<BTreeMap<String, String>>,
}

impl DraftStore {
    /// Creates a store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the store backed by `path`, loading any drafts already there.
    ///
    /// A missing file starts an empty store. An unreadable or corrupt file
    /// is logged and replaced on the next write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries: BTreeMap<String, String> = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!(
                    target: TRACING_TARGET,
                    path = %path.display(),
                    error = %err,
                    "Ignoring corrupt draft file"
                );
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(Error::from(err)
                    .with_message("Failed to read draft file")
                    .with_context(path.display().to_string()));
            }
        };

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path.display(),
            drafts = entries.len(),
            "Opened draft store"
        );

        Ok(Self {
            path: Some(path),
            entries: RwLock::new(entries),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the saved draft for `field`.
    pub async fn load(&self, field: &str) -> Option<String> {
        self.entries.read().await.get(field).cloned()
    }

    /// Saves `value` as the draft for `field`, replacing any earlier value.
    ///
    /// The in-memory entry changes only once the file write succeeded.
    pub async fn save(&self, field: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;

        if let Some(path) = &self.path {
            let mut staged = entries.clone();
            staged.insert(field.to_owned(), value.to_owned());
            let content = serde_json::to_string_pretty(&staged)?;
            write_atomically(path, content.as_bytes()).await?;
            *entries = staged;
        } else {
            entries.insert(field.to_owned(), value.to_owned());
        }

        tracing::trace!(target: TRACING_TARGET, field, "Draft saved");
        Ok(())
    }
}

async fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let staging = path.with_extension("tmp");
    tokio::fs::write(&staging, content).await?;
    tokio::fs::rename(&staging, path).await.map_err(|err| {
        Error::from(err)
            .with_message("Failed to replace draft file")
            .with_context(path.display().to_string())
    })
}

struct PendingWrite {
    generation: u64,
    value: String,
    timer: JoinHandle<()>,
}

/// Trailing-edge debouncer in front of a [`DraftStore`].
///
/// Each edit restarts the timer for its field. When a field stays unchanged
/// for the whole window its latest value is written once. Writes happen
/// under the pending lock and an edit stays pending until its write
/// succeeds.
pub struct DraftDebouncer {
    store: Arc<DraftStore>,
    window: Duration,
    pending: Arc<Mutex<HashMap<String, PendingWrite>>>,
    generation: AtomicU64,
}

impl std::fmt::Debug for DraftDebouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftDebouncer")
            .field("store", &self.store)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl DraftDebouncer {
    /// Creates a debouncer writing into `store` after `window` of quiet.
    pub fn new(store: Arc<DraftStore>, window: Duration) -> Self {
        Self {
            store,
            window,
            pending: Arc::default(),
            generation: AtomicU64::new(0),
        }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<DraftStore> {
        &self.store
    }

    /// Debounce window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records an edit, restarting the field's timer.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn edit(&self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);
        let window = self.window;
        let key = field.clone();

        let mut guard = self.pending.lock().await;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let mut pending = pending.lock().await;
            let Some(write) = pending.get(&key).filter(|w| w.generation == generation) else {
                return;
            };

            match store.save(&key, &write.value).await {
                Ok(()) => {
                    pending.remove(&key);
                }
                Err(err) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        field = %key,
                        error = %err,
                        "Failed to persist draft"
                    );
                }
            }
        });

        let replaced = guard.insert(
            field,
            PendingWrite {
                generation,
                value: value.into(),
                timer,
            },
        );
        if let Some(previous) = replaced {
            previous.timer.abort();
        }
    }

    /// Number of fields with an unwritten edit.
    pub async fn pending(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Writes every pending edit now, cancelling the timers of the ones
    /// written.
    ///
    /// Every field is attempted. Fields that fail to write stay pending and
    /// the first error is returned.
    pub async fn flush(&self) -> Result<()> {
        let mut pending = self.pending.lock().await;
        let fields: Vec<String> = pending.keys().cloned().collect();

        let mut first_error = None;
        for field in fields {
            let Some(write) = pending.get(&field) else {
                continue;
            };

            match self.store.save(&field, &write.value).await {
                Ok(()) => {
                    if let Some(write) = pending.remove(&field) {
                        write.timer.abort();
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        field = %field,
                        error = %err,
                        "Draft kept pending after failed flush"
                    );
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drafts_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("drafts.json");

        let store = DraftStore::open(&path).await.unwrap();
        assert_eq!(store.load(QUERY_FIELD).await, None);
        store
            .save(QUERY_FIELD, "SELECT *\nFROM users  ")
            .await
            .unwrap();
        store.save(QUERY_FIELD, "SELECT 1").await.unwrap();

        let reopened = DraftStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.load(QUERY_FIELD).await.as_deref(),
            Some("SELECT 1")
        );
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = DraftStore::open(&path).await.unwrap();
        assert_eq!(store.load(QUERY_FIELD).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_into_last_value() {
        let store = Arc::new(DraftStore::in_memory());
        let debouncer = DraftDebouncer::new(Arc::clone(&store), DEFAULT_DEBOUNCE);

        debouncer.edit(QUERY_FIELD, "S").await;
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.edit(QUERY_FIELD, "SE").await;
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.edit(QUERY_FIELD, "SEL").await;
        tokio::time::sleep(Duration::from_millis(900)).await;

        assert_eq!(store.load(QUERY_FIELD).await, None);
        assert_eq!(debouncer.pending().await, 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.load(QUERY_FIELD).await.as_deref(), Some("SEL"));
        assert_eq!(debouncer.pending().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fields_debounce_independently() {
        let store = Arc::new(DraftStore::in_memory());
        let debouncer = DraftDebouncer::new(Arc::clone(&store), Duration::from_millis(100));

        debouncer.edit("query", "a").await;
        debouncer.edit("x_axis", "month").await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.load("query").await.as_deref(), Some("a"));
        assert_eq!(store.load("x_axis").await.as_deref(), Some("month"));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_pending_edits_immediately() {
        let store = Arc::new(DraftStore::in_memory());
        let debouncer = DraftDebouncer::new(Arc::clone(&store), DEFAULT_DEBOUNCE);

        debouncer.edit(QUERY_FIELD, "SELECT 2").await;
        debouncer.flush().await.unwrap();
        assert_eq!(store.load(QUERY_FIELD).await.as_deref(), Some("SELECT 2"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(debouncer.pending().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_firing_alongside_flush_keeps_latest_value() {
        let store = Arc::new(DraftStore::in_memory());
        let debouncer = DraftDebouncer::new(Arc::clone(&store), DEFAULT_DEBOUNCE);

        debouncer.edit(QUERY_FIELD, "SELECT old").await;
        tokio::time::sleep(DEFAULT_DEBOUNCE).await;
        debouncer.edit(QUERY_FIELD, "SELECT new").await;
        debouncer.flush().await.unwrap();
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;

        assert_eq!(
            store.load(QUERY_FIELD).await.as_deref(),
            Some("SELECT new")
        );
        assert_eq!(debouncer.pending().await, 0);
    }

    #[tokio::test]
    async fn failed_save_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("state");
        let store = DraftStore::open(blocker.join("drafts.json")).await.unwrap();
        tokio::fs::write(&blocker, "not a directory").await.unwrap();

        assert!(store.save(QUERY_FIELD, "SELECT 1").await.is_err());
        assert_eq!(store.load(QUERY_FIELD).await, None);
    }

    #[tokio::test]
    async fn failed_flush_keeps_every_edit_pending() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("state");
        let path = blocker.join("drafts.json");
        let store = Arc::new(DraftStore::open(&path).await.unwrap());
        let debouncer = DraftDebouncer::new(Arc::clone(&store), Duration::from_secs(3600));
        tokio::fs::write(&blocker, "not a directory").await.unwrap();

        debouncer.edit(QUERY_FIELD, "SELECT month FROM sales").await;
        debouncer.edit("x_axis", "month").await;

        assert!(debouncer.flush().await.is_err());
        assert_eq!(debouncer.pending().await, 2);
        assert_eq!(store.load(QUERY_FIELD).await, None);
        assert_eq!(store.load("x_axis").await, None);

        tokio::fs::remove_file(&blocker).await.unwrap();
        debouncer.flush().await.unwrap();
        assert_eq!(debouncer.pending().await, 0);

        let reopened = DraftStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.load(QUERY_FIELD).await.as_deref(),
            Some("SELECT month FROM sales")
        );
        assert_eq!(reopened.load("x_axis").await.as_deref(), Some("month"));
    }
}
