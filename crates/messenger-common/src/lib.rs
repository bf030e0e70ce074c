//! # messenger-common
//!
//! Shared utilities including configuration, the application error
//! taxonomy, password hashing, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LEN};
pub use config::{
    AppConfig, AppSettings, ConfigError, DisplayConfig, Environment, LogConfig, StorageConfig,
    StoreConfig,
};
pub use error::{AppError, AppResult, ErrorNotice, Presentation};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
