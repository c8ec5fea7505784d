//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `tadohub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values; `SUPERVISOR_TOKEN` makes the add-on work
//! out of the box under the Home Assistant supervisor.

use serde::Deserialize;

use tadohub_domain::zone::HvacMode;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Home Assistant connection settings.
    pub homeassistant: HomeAssistantConfig,
    /// Schedule persistence settings.
    pub schedules: SchedulesConfig,
    /// Whole-home away preset.
    pub away: AwayConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Home Assistant connection configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HomeAssistantConfig {
    /// Base URL of the Home Assistant instance.
    pub base_url: String,
    /// Long-lived access token.
    pub token: String,
    /// Reserved prefix for the automations this add-on manages.
    pub entity_prefix: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Bounded retries for timed-out or refused requests.
    pub max_retries: u32,
    /// Treat every `climate.*` entity as a zone instead of only
    /// Tado-named ones.
    pub auto_discover: bool,
}

/// Schedule persistence configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulesConfig {
    /// Path of the JSON schedule file.
    pub path: String,
    /// Keep a `.bak` copy of the previous document on every save.
    pub backup: bool,
}

/// Away preset configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AwayConfig {
    /// Target temperature while away, in °C.
    pub temperature: f64,
    /// Mode applied while away.
    pub mode: HvacMode,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `tadohub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("tadohub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TADOHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("TADOHUB_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("TADOHUB_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("TADOHUB_HA_URL") {
            self.homeassistant.base_url = val;
        }
        if let Ok(val) = std::env::var("TADOHUB_HA_TOKEN") {
            self.homeassistant.token = val;
        } else if let Ok(val) = std::env::var("SUPERVISOR_TOKEN") {
            self.homeassistant.token = val;
        }
        if let Ok(val) = std::env::var("TADOHUB_SCHEDULE_PATH") {
            self.schedules.path = val;
        }
        if let Ok(val) = std::env::var("TADOHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.homeassistant.entity_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "entity_prefix must not be empty".to_string(),
            ));
        }
        if !self.away.temperature.is_finite() {
            return Err(ConfigError::Validation(
                "away temperature must be a number".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "http://homeassistant:8123".to_string(),
            token: String::new(),
            entity_prefix: "tado_local".to_string(),
            timeout_secs: 10,
            max_retries: 2,
            auto_discover: false,
        }
    }
}

impl Default for SchedulesConfig {
    fn default() -> Self {
        Self {
            path: "schedules.json".to_string(),
            backup: true,
        }
    }
}

impl Default for AwayConfig {
    fn default() -> Self {
        Self {
            temperature: 16.0,
            mode: HvacMode::Auto,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "tadohubd=info,tadohub=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
