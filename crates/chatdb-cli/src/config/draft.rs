//! Draft persistence configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result as AnyhowResult, anyhow};
use chatdb_form::{DraftDebouncer, DraftStore};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Where drafts are kept and how long edits settle before being written.
///
/// # Environment Variables
///
/// - `CHATDB_DRAFT_PATH` - Draft file (default: `.chatdb/drafts.json`)
/// - `CHATDB_DRAFT_DEBOUNCE_MS` - Debounce window in milliseconds (default: 1000)
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct DraftConfig {
    /// File holding saved drafts.
    #[arg(long, env = "CHATDB_DRAFT_PATH", default_value = ".chatdb/drafts.json")]
    pub draft_path: PathBuf,

    /// Quiet period in milliseconds before an edit is saved.
    ///
    /// Valid range: 1-60000.
    #[arg(long, env = "CHATDB_DRAFT_DEBOUNCE_MS", default_value_t = 1000)]
    pub draft_debounce_ms: u64,
}

impl DraftConfig {
    /// Validates the debounce window.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.draft_debounce_ms == 0 || self.draft_debounce_ms > 60_000 {
            return Err(anyhow!(
                "Draft debounce {} ms is invalid. Must be between 1 and 60000 ms.",
                self.draft_debounce_ms
            ));
        }
        if self.draft_path.as_os_str().is_empty() {
            return Err(anyhow!("Draft path must not be empty"));
        }
        Ok(())
    }

    /// Debounce window as a `Duration`.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.draft_debounce_ms)
    }

    /// Opens the draft file and wraps it in a debouncer.
    pub async fn open(&self) -> AnyhowResult<Arc<DraftDebouncer>> {
        let store = DraftStore::open(&self.draft_path)
            .await
            .with_context(|| format!("failed to open drafts at {}", self.draft_path.display()))?;
        Ok(Arc::new(DraftDebouncer::new(
            Arc::new(store),
            self.debounce(),
        )))
    }

    /// Logs the configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            draft_path = %self.draft_path.display(),
            draft_debounce_ms = self.draft_debounce_ms,
            "Draft configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use chatdb_form::QUERY_FIELD;

    use super::*;

    fn config(path: PathBuf, debounce_ms: u64) -> DraftConfig {
        DraftConfig {
            draft_path: path,
            draft_debounce_ms: debounce_ms,
        }
    }

    #[test]
    fn validates_debounce_range() {
        assert!(config("d.json".into(), 1000).validate().is_ok());
        assert!(config("d.json".into(), 0).validate().is_err());
        assert!(config("d.json".into(), 60_001).validate().is_err());
        assert!(config(PathBuf::new(), 1000).validate().is_err());
    }

    #[tokio::test]
    async fn open_persists_through_flush() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path().join("drafts.json"), 1000);

        let drafts = config.open().await.unwrap();
        drafts.edit(QUERY_FIELD, "SELECT 42").await;
        drafts.flush().await.unwrap();

        let reopened = config.open().await.unwrap();
        assert_eq!(
            reopened.store().load(QUERY_FIELD).await.as_deref(),
            Some("SELECT 42")
        );
    }
}
