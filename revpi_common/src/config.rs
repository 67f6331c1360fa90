//! Configuration loading traits and types.
//!
//! This module provides TOML configuration for the RevPi components.
//! Configuration only selects the control device, the component model and
//! the pins a component binds to; process-image offsets are fixed constants.
//!
//! # Usage
//!
//! ```rust,no_run
//! use revpi_common::config::{ComponentConfig, ConfigError, ConfigLoader};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = ComponentConfig::load(Path::new("revpi.toml"))?;
//!     config.validate()?;
//!     println!("Device: {}", config.device_path.display());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::picontrol::consts::DEFAULT_DEVICE_PATH;

/// Model name of the board component.
pub const BOARD_MODEL: &str = "kunbus:revolutionpi";

/// Model name of the standalone encoder component.
pub const ENCODER_MODEL: &str = "kunbus:revolutionpi-encoder";

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for driver logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Every control-channel command.
    Trace,
    /// Address derivation and pin initialization.
    Debug,
    /// Lifecycle events.
    #[default]
    Info,
    /// Enumeration anomalies and suspicious device values.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Matching `tracing` level.
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

fn default_service_name() -> String {
    "revpi".to_string()
}

/// Fields shared by every component configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "revpi-line-3"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Component instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Encoder component attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Name of the counter variable configured in encoder mode.
    pub pin: String,
}

fn default_device_path() -> PathBuf {
    PathBuf::from(DEFAULT_DEVICE_PATH)
}

fn default_model() -> String {
    BOARD_MODEL.to_string()
}

/// Configuration of one board or encoder component.
///
/// # TOML Example
///
/// ```toml
/// model = "kunbus:revolutionpi-encoder"
/// device_path = "/dev/piControl0"
///
/// [shared]
/// service_name = "spindle-encoder"
///
/// [encoder]
/// pin = "Counter_5"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentConfig {
    /// Shared fields.
    #[serde(default)]
    pub shared: SharedConfig,

    /// piControl character device.
    #[serde(default = "default_device_path")]
    pub device_path: PathBuf,

    /// Component model to instantiate.
    #[serde(default = "default_model")]
    pub model: String,

    /// Encoder attributes, required by the encoder model.
    #[serde(default)]
    pub encoder: Option<EncoderConfig>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            device_path: default_device_path(),
            model: default_model(),
            encoder: None,
        }
    }
}

impl ComponentConfig {
    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `shared` is valid
    /// 2. `device_path` is not empty
    /// 3. `model` is a known model
    /// 4. The encoder model names a non-empty pin
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.device_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "device_path cannot be empty".to_string(),
            ));
        }

        match self.model.as_str() {
            BOARD_MODEL => Ok(()),
            ENCODER_MODEL => match &self.encoder {
                Some(enc) if !enc.pin.is_empty() => Ok(()),
                _ => Err(ConfigError::ValidationError(format!(
                    "model {ENCODER_MODEL} requires [encoder] pin"
                ))),
            },
            other => Err(ConfigError::ValidationError(format!(
                "unknown model '{other}'"
            ))),
        }
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for every `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
