//! Tracing subscriber bootstrap shared by host applications.
//!
//! `RUST_LOG` takes precedence over the configured level so operators can
//! raise verbosity without touching the service configuration.

use crate::config::ObservabilityConfig;
use crate::error::CommonError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the `EnvFilter` for the given configuration.
///
/// # Errors
///
/// Returns `CommonError::Configuration` if the configured directive does not parse.
pub fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter, CommonError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| CommonError::Configuration(format!("invalid log level: {e}"))),
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns `CommonError::Tracing` if a global subscriber is already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), CommonError> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    result.map_err(|e| CommonError::Tracing(e.to_string()))
}
