//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). Every setting has a default, so an empty environment is valid.

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

use messenger_core::{DomainError, StoreLayout};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub store: StoreConfig,
    pub storage: StorageConfig,
    pub display: DisplayConfig,
    pub log: LogConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            env: Environment::default(),
        }
    }
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(ConfigError::InvalidValue("APP_ENV", s.to_string())),
        }
    }
}

/// Where collections live in the realtime tree
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_profiles_root")]
    pub profiles_root: String,
    #[serde(default = "default_discussions_root")]
    pub discussions_root: String,
}

impl StoreConfig {
    /// Build the store layout from the configured roots
    pub fn layout(&self) -> Result<StoreLayout, DomainError> {
        StoreLayout::new(&self.profiles_root, &self.discussions_root)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            profiles_root: default_profiles_root(),
            discussions_root: default_discussions_root(),
        }
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_public_url")]
    pub public_url: String,
    #[serde(default = "default_max_image_size")]
    pub max_image_mb: u32,
}

impl StorageConfig {
    #[must_use]
    pub fn max_image_bytes(&self) -> usize {
        self.max_image_mb as usize * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            public_url: default_public_url(),
            max_image_mb: default_max_image_size(),
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayConfig {
    /// Offset used to compute calendar dates for separators
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl DisplayConfig {
    /// The display offset; out-of-range values fall back to UTC
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

/// Log output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub json: bool,
}

// Default value functions
fn default_app_name() -> String {
    "messenger".to_string()
}

fn default_profiles_root() -> String {
    "ProfilsTable".to_string()
}

fn default_discussions_root() -> String {
    "TheDiscussions".to_string()
}

fn default_bucket() -> String {
    "profileImages".to_string()
}

fn default_public_url() -> String {
    "http://localhost:54321/storage/v1/object/public".to_string()
}

fn default_max_image_size() -> u32 {
    10
}

/// Offsets beyond a day are rejected at load time
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let utc_offset_minutes = parse_or(&lookup, "DISPLAY_UTC_OFFSET_MINUTES", 0i32)?;
        if utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::InvalidValue(
                "DISPLAY_UTC_OFFSET_MINUTES",
                utc_offset_minutes.to_string(),
            ));
        }

        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: parse_or(&lookup, "APP_ENV", Environment::default())?,
            },
            store: StoreConfig {
                profiles_root: lookup("STORE_PROFILES_ROOT")
                    .unwrap_or_else(default_profiles_root),
                discussions_root: lookup("STORE_DISCUSSIONS_ROOT")
                    .unwrap_or_else(default_discussions_root),
            },
            storage: StorageConfig {
                bucket: lookup("STORAGE_BUCKET").unwrap_or_else(default_bucket),
                public_url: lookup("STORAGE_PUBLIC_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_public_url),
                max_image_mb: parse_or(&lookup, "STORAGE_MAX_IMAGE_MB", default_max_image_size())?,
            },
            display: DisplayConfig { utc_offset_minutes },
            log: LogConfig {
                json: parse_or(&lookup, "LOG_JSON", false)?,
            },
        };

        config
            .store
            .layout()
            .map_err(|e| ConfigError::InvalidValue("STORE_*_ROOT", e.to_string()))?;

        Ok(config)
    }
}

/// Parse an optional variable, keeping `default` when it is unset
fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
