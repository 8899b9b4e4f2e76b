//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{pacing, server, tickets};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Conversation pacing and randomness
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Ticket backend behaviour
    #[serde(default)]
    pub tickets: TicketConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Optional catalog file (YAML, JSON or TOML); built-in catalog when unset
    #[serde(default)]
    pub catalog_path: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent chat sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle time after which a session is dropped
    #[serde(default = "default_session_timeout")]
    pub session_timeout_seconds: u64,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    server::DEFAULT_PORT
}
fn default_max_sessions() -> usize {
    server::DEFAULT_MAX_SESSIONS
}
fn default_session_timeout() -> u64 {
    server::DEFAULT_SESSION_TIMEOUT_SECS
}
fn default_request_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_sessions: default_max_sessions(),
            session_timeout_seconds: default_session_timeout(),
            request_timeout_seconds: default_request_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Conversation pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Simulate a thinking pause before each reply
    #[serde(default = "default_true")]
    pub thinking_delay_enabled: bool,

    #[serde(default = "default_delay_min")]
    pub thinking_delay_min_ms: u64,

    /// Exclusive upper bound
    #[serde(default = "default_delay_max")]
    pub thinking_delay_max_ms: u64,

    /// Fixed seed for greeting selection; entropy-seeded when unset
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_delay_min() -> u64 {
    pacing::THINKING_DELAY_MIN_MS
}
fn default_delay_max() -> u64 {
    pacing::THINKING_DELAY_MAX_MS
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            thinking_delay_enabled: true,
            thinking_delay_min_ms: default_delay_min(),
            thinking_delay_max_ms: default_delay_max(),
            rng_seed: None,
        }
    }
}

/// Ticket backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketConfig {
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    #[serde(default = "default_id_suffix_len")]
    pub id_suffix_len: usize,

    /// Artificial latency of the simulated backend
    #[serde(default = "default_submit_latency")]
    pub submit_latency_ms: u64,

    /// Fixed seed for ticket ids; entropy-seeded when unset
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_id_prefix() -> String {
    tickets::ID_PREFIX.to_string()
}
fn default_id_suffix_len() -> usize {
    tickets::ID_SUFFIX_LEN
}
fn default_submit_latency() -> u64 {
    pacing::TICKET_SUBMIT_LATENCY_MS
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            id_suffix_len: default_id_suffix_len(),
            submit_latency_ms: default_submit_latency(),
            rng_seed: None,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_conversation()?;
        self.validate_tickets()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port must be non-zero".to_string(),
            });
        }

        if self.server.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_sessions".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.environment.is_strict() && !self.server.cors_enabled {
            return Err(ConfigError::InvalidValue {
                field: "server.cors_enabled".to_string(),
                message: "CORS cannot be disabled outside development".to_string(),
            });
        }

        Ok(())
    }

    fn validate_conversation(&self) -> Result<(), ConfigError> {
        let conv = &self.conversation;
        if conv.thinking_delay_min_ms > conv.thinking_delay_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "conversation.thinking_delay_min_ms".to_string(),
                message: format!(
                    "Minimum ({}) exceeds maximum ({})",
                    conv.thinking_delay_min_ms, conv.thinking_delay_max_ms
                ),
            });
        }

        if conv.thinking_delay_max_ms > 10_000 {
            tracing::warn!(
                max_ms = conv.thinking_delay_max_ms,
                "Thinking delay above 10s will feel unresponsive"
            );
        }

        Ok(())
    }

    fn validate_tickets(&self) -> Result<(), ConfigError> {
        if self.tickets.id_suffix_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tickets.id_suffix_len".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.tickets.id_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tickets.id_prefix".to_string(),
                message: "Must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (CONCIERGE_ prefix, e.g. CONCIERGE_SERVER__PORT)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
/// 4. Built-in defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Same as [`load_settings`] with an explicit config directory
pub fn load_settings_from(config_dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name(&format!("{}/default", config_dir)).required(false));

    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&format!("{}/{}", config_dir, env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("CONCIERGE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
