//! Logging setup.
//!
//! Logs always go to stderr: stdout carries command output and, under
//! `mdatlas serve`, the JSON-RPC stream itself.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber.
///
/// `log_level` is any `EnvFilter` directive (`debug`, `mdatlas_outline=trace`)
/// and wins over `RUST_LOG`. Colors are off when `no_color` is set or
/// `NO_COLOR` is present. Fails with [`AppError::Config`] on a bad directive or
/// when a subscriber is already installed.
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let env_filter = build_filter(log_level)?;
    let ansi = !no_color && std::env::var_os("NO_COLOR").is_none();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(ansi),
        )
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))
}

fn build_filter(log_level: Option<&str>) -> AppResult<EnvFilter> {
    let directive = match log_level {
        Some(level) => level.to_string(),
        None => std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
    };

    EnvFilter::try_new(&directive)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", directive, e)))
}
