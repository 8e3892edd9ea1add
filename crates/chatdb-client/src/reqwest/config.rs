//! Configuration for the reqwest HTTP client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default backend address: the Flask development server.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/";

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the reqwest HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Base URL of the ChatDB backend
    #[cfg_attr(
        feature = "config",
        arg(long = "base-url", env = "CHATDB_URL", default_value = DEFAULT_BASE_URL)
    )]
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// HTTP request timeout in seconds (0 uses the default)
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Answer with an offline placeholder when the backend is unreachable
    #[cfg_attr(
        feature = "config",
        arg(long = "offline-fallback", env = "CHATDB_OFFLINE_FALLBACK")
    )]
    #[serde(default)]
    pub offline_fallback: bool,
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base url is valid")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            http_timeout: default_timeout_secs(),
            user_agent: None,
            offline_fallback: false,
        }
    }
}

impl ReqwestConfig {
    /// Creates a configuration pointing at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("chatdb-client/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Enable or disable the offline fallback.
    #[must_use]
    pub fn with_offline_fallback(mut self, enabled: bool) -> Self {
        self.offline_fallback = enabled;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(Error::configuration()
                .with_message(format!(
                    "Base URL '{}' must use http or https",
                    self.base_url
                ))
                .with_context("base_url"));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(Error::configuration()
                .with_message(format!("Base URL '{}' cannot be a base", self.base_url))
                .with_context("base_url"));
        }
        Ok(())
    }

    /// Resolves an endpoint path or a backend-relative link against the
    /// base URL.
    ///
    /// The base URL is treated as a directory, so a prefix such as
    /// `https://host/chatdb` is preserved.
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let directory = format!("{}/", base.path());
            base.set_path(&directory);
        }

        base.join(path.trim_start_matches('/')).map_err(|err| {
            Error::configuration()
                .with_message(format!("Cannot resolve '{path}' against '{base}'"))
                .with_source(err)
        })
    }
}
