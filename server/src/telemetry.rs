//! Logging setup
//!
//! `RUST_LOG` takes precedence over the configured level. Records emitted
//! through the `log` facade by the core crate are forwarded into tracing.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ServerConfig};
use crate::error::{Result, ServerError};

/// Build the filter from `RUST_LOG`, falling back to `level`
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|e| ServerError::Logging(e.to_string())),
    }
}

/// Install the global subscriber
pub fn init(config: &ServerConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(&config.log_level)?);

    let installed = match config.log_format {
        LogFormat::Text => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
    installed.map_err(|e| ServerError::Logging(e.to_string()))
}
