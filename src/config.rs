//! CLI configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via FORMDATA_CONFIG or --config)
//! 3. Environment variables

use formdata_codec::{boundary, DecodeLimits, APPLICATION_OCTET_STREAM};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Encoding configuration.
    pub encode: EncodeConfig,
    /// Decoding configuration.
    pub decode: DecodeConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Loads configuration from an explicit path, else from FORMDATA_CONFIG,
    /// then applies environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match std::env::var("FORMDATA_CONFIG") {
                Ok(path) => Self::from_file(&path)?,
                Err(_) => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.encode.apply_env_overrides();
        self.decode.apply_env_overrides();
        self.output.apply_env_overrides();
    }

    /// Validates configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.encode.validate()?;
        self.decode.validate()
    }

    /// Renders the configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<config>"), e.to_string()))
    }
}

/// Encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Content type for files appended without an explicit type.
    pub default_file_content_type: String,
    /// Fixed boundary instead of a random one.
    pub boundary: Option<String>,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            default_file_content_type: APPLICATION_OCTET_STREAM.to_string(),
            boundary: None,
        }
    }
}

impl EncodeConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(content_type) = std::env::var("FORMDATA_DEFAULT_FILE_TYPE") {
            if !content_type.is_empty() {
                self.default_file_content_type = content_type;
            }
        }

        if let Ok(b) = std::env::var("FORMDATA_BOUNDARY") {
            self.boundary = if b.is_empty() { None } else { Some(b) };
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref b) = self.boundary {
            boundary::validate(b).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }
        if self.default_file_content_type.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_file_content_type must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decoding configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Maximum number of parts (0 = unlimited).
    pub max_parts: usize,
    /// Maximum body size in megabytes (0 = unlimited).
    pub max_body_size_mb: usize,
}

impl DecodeConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(max) = std::env::var("FORMDATA_MAX_PARTS") {
            if let Ok(n) = max.parse() {
                self.max_parts = n;
            }
        }

        if let Ok(size) = std::env::var("FORMDATA_MAX_BODY_MB") {
            if let Ok(mb) = size.parse() {
                self.max_body_size_mb = mb;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_size_bytes().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "max_body_size_mb {} is too large",
                self.max_body_size_mb
            )));
        }
        Ok(())
    }

    fn max_body_size_bytes(&self) -> Option<usize> {
        self.max_body_size_mb.checked_mul(1024 * 1024)
    }

    /// Returns the configured limits.
    ///
    /// A body size too large to count in bytes saturates to `usize::MAX`.
    pub fn limits(&self) -> DecodeLimits {
        let mut limits = DecodeLimits::new();
        if self.max_parts > 0 {
            limits = limits.with_max_parts(self.max_parts);
        }
        if self.max_body_size_mb > 0 {
            let max = self.max_body_size_bytes().unwrap_or(usize::MAX);
            limits = limits.with_max_body_size(max);
        }
        limits
    }
}

/// Output format for decoded parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable listing.
    #[default]
    Text,
    /// JSON array of part summaries.
    Json,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl OutputConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(format) = std::env::var("FORMDATA_OUTPUT") {
            match format.to_lowercase().as_str() {
                "json" => self.format = OutputFormat::Json,
                "text" => self.format = OutputFormat::Text,
                _ => {}
            }
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
