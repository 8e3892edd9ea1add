#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod orchestrator;
mod token;

pub mod draft;
pub mod page;
pub mod table;
pub mod ui;

#[cfg(test)]
mod mock;

pub use draft::{DEFAULT_DEBOUNCE, DraftDebouncer, DraftStore, QUERY_FIELD};
pub use orchestrator::{
    FormOrchestrator, NO_DATA_NOTICE, Outcome, TRACING_TARGET, failure_message, region_of,
};
pub use page::{Banner, DataView, Level, Notification, Page, Region, RegionState, View};
pub use table::DataTable;
pub use token::{RequestToken, RequestTokens};
pub use ui::BusyGuard;
