// Logging module for structured logging using the tracing crate
//
// The library only emits events; installing a subscriber is left to the
// binary (or to whoever embeds the library).

use std::error::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Output format of log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Build the event filter: `RUST_LOG` when set, otherwise `default_level`.
pub fn build_filter(default_level: &str) -> Result<EnvFilter, Box<dyn Error>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_level)?),
    }
}

/// Initialize the tracing subscriber for structured logging
///
/// Events go to stderr so that command output (such as a preview written to
/// stdout) stays clean. Calling this again once a global subscriber is
/// installed is a no-op.
///
/// # Errors
///
/// Returns an error if `default_level` is not a valid filter directive or
/// the subscriber cannot be installed.
///
/// # Examples
///
/// ```
/// use tilemark::logging::{init_subscriber, LogFormat};
///
/// init_subscriber("info", LogFormat::Text).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(default_level: &str, format: LogFormat) -> Result<(), Box<dyn Error>> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let filter = build_filter(default_level)?;
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}
