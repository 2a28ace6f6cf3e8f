//! Layout Controller configuration.
//!
//! Configuration is loaded from environment variables. Defaults reproduce the
//! three-column recording view: side A on the left, side B on the right,
//! arbiters in the centre (two shown), solo and unassigned participants
//! alternating left/right.

use crate::layout::LayoutConfig;

use common::config::{ObservabilityConfig, DEFAULT_LOG_LEVEL};
use common::types::Role;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default declared slots, in display order.
pub const DEFAULT_SLOTS: &str = "left,center,right";

/// Default role to slot mapping.
pub const DEFAULT_ROLE_SLOTS: &str = "side-a=left,side-b=right,arbiter=center";

/// Default overflow-eligible roles.
pub const DEFAULT_OVERFLOW_ROLES: &str = "solo,unassigned";

/// Default overflow round-robin slots.
pub const DEFAULT_OVERFLOW_SLOTS: &str = "left,right";

/// Default slot for roles with no placement.
pub const DEFAULT_FALLBACK_SLOT: &str = "center";

/// Default per-slot rendering capacities.
pub const DEFAULT_SLOT_CAPACITIES: &str = "center=2";

/// Default recomputation debounce window in milliseconds (0 disables coalescing).
pub const DEFAULT_DEBOUNCE_MS: u64 = 0;

/// Default bound for the engine subscription and session mailbox.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Configuration errors. All of them are fatal at load time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("No display slots declared")]
    NoSlots,

    #[error("Slot declared more than once: {0}")]
    DuplicateSlot(String),

    #[error("Undeclared slot '{slot}' referenced in {field}")]
    UnknownSlot { field: &'static str, slot: String },

    #[error("Role {0} is given more than one placement")]
    ConflictingRole(Role),

    #[error("Overflow slot list is empty")]
    NoOverflowSlots,

    #[error("No default slot configured")]
    MissingDefaultSlot,
}

/// Layout Controller configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Validated role to slot table.
    pub layout: LayoutConfig,

    /// Window over which bursts of roster mutations are folded into one
    /// recomputation. `None` recomputes synchronously on every mutation.
    pub debounce: Option<Duration>,

    /// Bound for the engine subscription and the session mailbox.
    pub event_buffer: usize,

    /// Logging configuration.
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any variable fails to parse or the resulting
    /// layout table is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| -> String {
            vars.get(key).cloned().unwrap_or_else(|| default.to_string())
        };

        let mut builder = LayoutConfig::builder();

        for slot in split_list(&get("LC_SLOTS", DEFAULT_SLOTS)) {
            builder = builder.slot(slot);
        }

        for (role, slot) in split_pairs(&get("LC_ROLE_SLOTS", DEFAULT_ROLE_SLOTS), "LC_ROLE_SLOTS")?
        {
            builder = builder.map_role(parse_role(role, "LC_ROLE_SLOTS")?, slot);
        }

        for role in split_list(&get("LC_OVERFLOW_ROLES", DEFAULT_OVERFLOW_ROLES)) {
            builder = builder.overflow_role(parse_role(role, "LC_OVERFLOW_ROLES")?);
        }

        for slot in split_list(&get("LC_OVERFLOW_SLOTS", DEFAULT_OVERFLOW_SLOTS)) {
            builder = builder.overflow_slot(slot);
        }

        let default_slot = get("LC_DEFAULT_SLOT", DEFAULT_FALLBACK_SLOT);
        if !default_slot.trim().is_empty() {
            builder = builder.default_slot(default_slot.trim());
        }

        for (slot, capacity) in split_pairs(
            &get("LC_SLOT_CAPACITIES", DEFAULT_SLOT_CAPACITIES),
            "LC_SLOT_CAPACITIES",
        )? {
            let capacity = capacity.parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue(format!("LC_SLOT_CAPACITIES '{slot}={capacity}': {e}"))
            })?;
            builder = builder.capacity(slot, capacity);
        }

        let layout = builder.build()?;

        let debounce_ms = parse_number(vars, "LC_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?;
        let debounce = (debounce_ms > 0).then(|| Duration::from_millis(debounce_ms));

        let event_buffer = parse_number(vars, "LC_EVENT_BUFFER", DEFAULT_EVENT_BUFFER)?;
        if event_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "LC_EVENT_BUFFER must be greater than zero".to_string(),
            ));
        }

        let json_logs = match vars.get("LC_JSON_LOGS").map(|s| s.trim().to_ascii_lowercase()) {
            None => false,
            Some(value) => match value.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(ConfigError::InvalidValue(format!(
                        "LC_JSON_LOGS '{other}' is not a boolean"
                    )))
                }
            },
        };

        let observability = ObservabilityConfig {
            log_level: get("LC_LOG_LEVEL", DEFAULT_LOG_LEVEL),
            json_logs,
        };

        Ok(Config {
            layout,
            debounce,
            event_buffer,
            observability,
        })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn split_pairs<'a>(raw: &'a str, var: &str) -> Result<Vec<(&'a str, &'a str)>, ConfigError> {
    split_list(raw)
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.trim(), value.trim()))
                .ok_or_else(|| ConfigError::InvalidValue(format!("{var} entry '{pair}' is not key=value")))
        })
        .collect()
}

fn parse_role(raw: &str, var: &str) -> Result<Role, ConfigError> {
    raw.parse::<Role>()
        .map_err(|e| ConfigError::InvalidValue(format!("{var}: {e}")))
}

fn parse_number<T>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("{key} '{raw}': {e}"))),
    }
}
