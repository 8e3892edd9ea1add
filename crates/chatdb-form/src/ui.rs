//! UI helpers shared by every operation.
//!
//! Free functions over a [`Page`]; the page itself is the only shared state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use jiff::Timestamp;

use crate::page::{Level, Page};

/// Tracing target for UI helpers.
pub const TRACING_TARGET: &str = "chatdb_form::ui";

/// Shows a transient notification and returns its id.
pub async fn toast(page: &Page, level: Level, message: impl Into<String>) -> u64 {
    let message = message.into();
    tracing::debug!(target: TRACING_TARGET, level = %level, message = %message, "Toast");
    page.push_notification(level, message).await
}

/// Marks the page busy until the returned guard drops.
pub fn busy(page: &Page) -> BusyGuard {
    BusyGuard::new(page.busy_counter())
}

/// Appends a `t=<unix millis>` query parameter so a re-rendered resource is
/// fetched again instead of served from cache.
pub fn cache_bust(url: &str, at: Timestamp) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={}", at.as_millisecond())
}

/// Keeps the busy indicator on while alive.
///
/// Guards nest: the indicator clears when the last one drops, whichever
/// path the operation leaves by.
#[derive(Debug)]
#[must_use = "the busy indicator clears as soon as the guard is dropped"]
pub struct BusyGuard {
    counter: Arc<AtomicUsize>,
}

impl BusyGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self { counter }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::AssertUnwindSafe;

    use super::*;

    #[test]
    fn cache_bust_appends_timestamp() {
        let at = Timestamp::from_millisecond(1_700_000_000_123).unwrap();
        assert_eq!(
            cache_bust("/charts/1.png", at),
            "/charts/1.png?t=1700000000123"
        );
        assert_eq!(
            cache_bust("/charts/1.png?v=2", at),
            "/charts/1.png?v=2&t=1700000000123"
        );
    }

    #[test]
    fn busy_guards_nest() {
        let page = Page::new();
        assert!(!page.is_busy());

        let outer = busy(&page);
        let inner = busy(&page);
        drop(inner);
        assert!(page.is_busy());
        drop(outer);
        assert!(!page.is_busy());
    }

    #[test]
    fn busy_clears_on_unwind() {
        let page = Page::new();
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = busy(&page);
            panic!("operation failed");
        }));
        assert!(result.is_err());
        assert!(!page.is_busy());
    }

    #[tokio::test]
    async fn toast_pushes_notification() {
        let page = Page::new();
        let id = toast(&page, Level::Success, "done").await;
        let shown = page.notifications().await;
        assert_eq!(shown[0].id, id);
        assert_eq!(shown[0].message, "done");
    }
}
