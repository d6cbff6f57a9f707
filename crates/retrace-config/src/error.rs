//! Configuration error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render TOML config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("user config directory could not be determined")]
    NoConfigDir,
}
