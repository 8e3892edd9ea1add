//! Per-region request tokens.
//!
//! Each submission takes a fresh token for the region it renders into.
//! Only the holder of the latest token may update that region.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use strum::IntoEnumIterator;

use crate::page::Region;

/// Identifies one submission against one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    region: Region,
    sequence: u64,
}

impl RequestToken {
    /// Region this token renders into.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Monotonic sequence number within the region.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Latest issued token per region.
#[derive(Debug)]
pub struct RequestTokens {
    latest: HashMap<Region, AtomicU64>,
}

impl Default for RequestTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestTokens {
    /// Creates counters for every region.
    pub fn new() -> Self {
        let latest = Region::iter().map(|r| (r, AtomicU64::new(0))).collect();
        Self { latest }
    }

    fn counter(&self, region: Region) -> &AtomicU64 {
        // Every variant is inserted by `new`.
        &self.latest[&region]
    }

    /// Issues a token that supersedes every earlier token for `region`.
    pub fn issue(&self, region: Region) -> RequestToken {
        let sequence = self.counter(region).fetch_add(1, Ordering::AcqRel) + 1;
        RequestToken { region, sequence }
    }

    /// Returns `true` if no newer token has been issued for its region.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.counter(token.region).load(Ordering::Acquire) == token.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_token_supersedes_older() {
        let tokens = RequestTokens::new();
        let first = tokens.issue(Region::Chart);
        assert!(tokens.is_current(first));

        let second = tokens.issue(Region::Chart);
        assert!(!tokens.is_current(first));
        assert!(tokens.is_current(second));
        assert!(second.sequence() > first.sequence());
    }

    #[test]
    fn regions_are_independent() {
        let tokens = RequestTokens::new();
        let chart = tokens.issue(Region::Chart);
        let _ = tokens.issue(Region::DataOutput);
        assert!(tokens.is_current(chart));
    }
}
