//! Configuration management for the concierge chat engine
//!
//! Supports loading configuration from:
//! - YAML/TOML files (config/default, config/{env})
//! - Environment variables (CONCIERGE_ prefix, `__` separator)
//! - Runtime overrides
//!
//! # Dialogue Catalog
//!
//! Services, keyword sets, canned messages and the ticket field schema are
//! data, not code. `DialogueCatalog::builtin()` carries the default content;
//! a YAML/JSON/TOML file named by `Settings::catalog_path` replaces any part
//! of it. `CatalogValidator` checks the loaded catalog at startup.

pub mod catalog;
pub mod constants;
pub mod settings;
pub mod validator;

pub use catalog::{CasualReply, CatalogMessages, DialogueCatalog, GreetingConfig};
pub use settings::{
    load_settings, ConversationConfig, ObservabilityConfig, RuntimeEnvironment, ServerConfig,
    Settings, TicketConfig,
};
pub use validator::{CatalogIssue, CatalogReport, CatalogValidator, IssueCategory, IssueSeverity};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Unsupported catalog format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Catalog validation failed with {0} critical issue(s)")]
    InvalidCatalog(usize),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
