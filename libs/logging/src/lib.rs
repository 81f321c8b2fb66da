#![cfg_attr(test, allow(clippy::unwrap_used))]

use anyhow::{Context, Result};
use tracing::{Subscriber, subscriber::DefaultGuard};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter::ParseError, fmt, layer::SubscriberExt as _,
    util::SubscriberInitExt,
};

/// Registers a global subscriber that logs to stderr.
///
/// stdout is reserved for the output the user asked for, e.g. the list of DNS servers,
/// so nothing in here may ever write to it.
pub fn setup_global_subscriber(directives: &str) -> Result<()> {
    let filter = try_filter(directives).context("Failed to parse directives")?;

    let subscriber = Registry::default().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(stderr_supports_ansi())
            .without_time()
            .with_target(false)
            .compact()
            .with_filter(filter),
    );
    init(subscriber)?;

    Ok(())
}

pub fn init(subscriber: impl Subscriber + Send + Sync + 'static) -> Result<()> {
    tracing::subscriber::set_global_default(subscriber).context("Could not set global default")?;

    Ok(())
}

/// Constructs an [`EnvFilter`] from `RUST_LOG`-style directives.
///
/// An empty string falls back to `warn` so that a bare CLI invocation stays quiet.
pub fn try_filter(directives: &str) -> Result<EnvFilter, ParseError> {
    let directives = directives.trim();

    if directives.is_empty() {
        return EnvFilter::try_new("warn");
    }

    EnvFilter::try_new(directives)
}

/// Whether we should emit ANSI colour codes on stderr.
pub fn stderr_supports_ansi() -> bool {
    supports_color::on(supports_color::Stream::Stderr).is_some()
}

/// Initialises a logger to be used in tests.
pub fn test(directives: &str) -> DefaultGuard {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(directives)
        .set_default()
}
