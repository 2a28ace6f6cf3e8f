//! Common utilities and types shared across layout controller components.

#![warn(clippy::pedantic)]

/// Module for common error types
pub mod error;

/// Module for common data types (participants, roles, session identity)
pub mod types;

/// Module for common configuration
pub mod config;

/// Module for tracing subscriber bootstrap
pub mod observability;
