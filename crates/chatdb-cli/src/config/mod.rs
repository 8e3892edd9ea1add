//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── command: Command       # Operation to run, or the interactive shell
//! ├── client: ReqwestConfig  # Backend URL, timeout, user agent, offline fallback
//! ├── drafts: DraftConfig    # Draft file and debounce window
//! └── format, verbose        # Output format and log verbosity
//! ```
//!
//! All options can be provided via CLI arguments or environment variables.
//!
//! ```bash
//! chatdb --base-url http://localhost:5000 query "SELECT * FROM users"
//! CHATDB_URL=http://localhost:5000 chatdb shell
//! ```

mod command;
mod draft;

use std::process;

use anyhow::Context;
use chatdb_client::reqwest::ReqwestConfig;
use clap::{Parser, ValueEnum};
pub use command::Command;
pub use draft::DraftConfig;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// How page regions are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain-text tables.
    #[default]
    Text,
    /// HTML tables and elements.
    Html,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "chatdb")]
#[command(about = "Query, chart and report on databases through a ChatDB backend")]
#[command(version)]
pub struct Cli {
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,

    /// Backend connection configuration.
    #[clap(flatten)]
    pub client: ReqwestConfig,

    /// Draft persistence configuration.
    #[clap(flatten)]
    pub drafts: DraftConfig,

    /// Output format for rendered results.
    #[arg(long, global = true, env = "CHATDB_FORMAT", value_enum, default_value_t)]
    #[serde(default)]
    pub format: OutputFormat,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    #[serde(default)]
    pub verbose: bool,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded first so clap's `env` fallbacks can see it.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.client
            .validate()
            .context("invalid backend configuration")?;
        self.drafts
            .validate()
            .context("invalid draft configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            base_url = %self.client.base_url,
            http_timeout_secs = self.client.effective_timeout().as_secs(),
            offline_fallback = self.client.offline_fallback,
            command = self.command.name(),
            "Backend configuration"
        );

        self.drafts.log();
    }

    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "dotenv").then_some("dotenv"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
