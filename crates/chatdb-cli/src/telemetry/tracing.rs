//! Tracing initialization.
//!
//! Logs go to stderr; stdout carries only rendered results.

use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over `default_level`.
///
/// ```bash
/// RUST_LOG=debug chatdb health
/// RUST_LOG=chatdb_client=trace,chatdb_form=debug chatdb shell
/// ```
pub(super) fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter = create_env_filter(default_level)?;
    let fmt_layer = create_fmt_layer();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}

fn create_env_filter(default_level: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))
}

fn create_fmt_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
}
