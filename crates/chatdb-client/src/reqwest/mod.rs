//! Reqwest-based HTTP implementation of [`ChatDbProvider`].
//!
//! [`ChatDbProvider`]: crate::ChatDbProvider

mod client;
mod config;
mod error;

pub use client::ReqwestClient;
pub use config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, ReqwestConfig};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "chatdb_client::reqwest";
