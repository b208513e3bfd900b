use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Config file used when `LED_API_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config/led_api.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gpio: GpioConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub tunnel: TunnelConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Numbering {
    /// SoC GPIO line numbers.
    Bcm,
    /// Physical pin positions on the 40-pin header.
    Board,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Rppal,
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    pub pin: u8,
    pub numbering: Numbering,
    pub backend: Backend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Development mode: skips the tunnel.
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    /// Require credentials on every route.
    pub force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    pub auth_token: String,
    pub binary: String,
    pub startup_timeout_secs: u64,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            pin: 18,
            numbering: Numbering::Bcm,
            backend: Backend::Rppal,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            debug: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "raspberry".to_string(),
            force: true,
        }
    }
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            auth_token: String::new(),
            binary: "ngrok".to_string(),
            startup_timeout_secs: 15,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load the file named by `LED_API_CONFIG` (or the default path), falling
    /// back to built-in defaults when it does not exist, then apply
    /// environment overrides and validate.
    pub fn load_with_fallback() -> Result<Self, ConfigError> {
        let path = std::env::var("LED_API_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            tracing::info!("Loading configuration from {}", path);
            Self::load(&path)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", path);
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `LED_API_*` / `NGROK_AUTHTOKEN` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LED_API_PIN") {
            self.gpio.pin = parse_override("LED_API_PIN", &value)?;
        }
        if let Some(value) = lookup("LED_API_NUMBERING") {
            self.gpio.numbering = match value.to_lowercase().as_str() {
                "bcm" => Numbering::Bcm,
                "board" => Numbering::Board,
                _ => return Err(invalid_override("LED_API_NUMBERING", &value)),
            };
        }
        if let Some(value) = lookup("LED_API_BACKEND") {
            self.gpio.backend = match value.to_lowercase().as_str() {
                "rppal" => Backend::Rppal,
                "simulated" => Backend::Simulated,
                _ => return Err(invalid_override("LED_API_BACKEND", &value)),
            };
        }
        if let Some(value) = lookup("LED_API_HOST") {
            self.server.host = value;
        }
        if let Some(value) = lookup("LED_API_PORT") {
            self.server.port = parse_override("LED_API_PORT", &value)?;
        }
        if let Some(value) = lookup("LED_API_DEBUG") {
            self.server.debug = parse_flag("LED_API_DEBUG", &value)?;
        }
        if let Some(value) = lookup("LED_API_AUTH_USERNAME") {
            self.auth.username = value;
        }
        if let Some(value) = lookup("LED_API_AUTH_PASSWORD") {
            self.auth.password = value;
        }
        if let Some(value) = lookup("LED_API_AUTH_FORCE") {
            self.auth.force = parse_flag("LED_API_AUTH_FORCE", &value)?;
        }
        if let Some(value) = lookup("NGROK_AUTHTOKEN") {
            self.tunnel.auth_token = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.force && (self.auth.username.is_empty() || self.auth.password.is_empty()) {
            return Err(ConfigError::InvalidAuth);
        }
        if self.tunnel.startup_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Credentials to enforce, or `None` when routes are open.
    pub fn required_credentials(&self) -> Option<&AuthConfig> {
        self.auth.force.then_some(&self.auth)
    }
}

fn parse_override<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid_override(key, value))
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid_override(key, value)),
    }
}

fn invalid_override(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidOverride {
        key,
        value: value.to_string(),
    }
}
