//! Configuration management for Retrace
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (`RETRACE_*` prefix, highest precedence)
//! 2. retrace.local.toml (gitignored, local overrides)
//! 3. retrace.toml (git-tracked, project config)
//! 4. ~/.config/retrace/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main Retrace configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetraceConfig {
    pub project: ProjectConfig,
    pub storage: StorageConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "retrace-project".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from(".retrace/data"),
        }
    }
}

/// Where entity states and the audit log live.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    /// Everything in memory; nothing survives the process.
    Memory,
    /// JSON documents and a JSON-lines log under the data directory.
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Entity kind recorded when callers do not name one.
    pub default_entity_kind: String,
    /// Filename of the audit log inside the data directory.
    pub log_filename: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_entity_kind: "project".to_string(),
            log_filename: "audit.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing filter directive, e.g. `info` or `retrace=debug`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl RetraceConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Create a development configuration
    pub fn development() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..Default::default()
            },
            logging: LoggingConfig {
                filter: "debug".to_string(),
            },
            ..Default::default()
        }
    }

    /// Create a production configuration
    pub fn production() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::File,
                ..Default::default()
            },
            logging: LoggingConfig {
                filter: "info".to_string(),
            },
            ..Default::default()
        }
    }

    /// Parses a configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid TOML or
    /// does not match the configuration schema.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Renders the configuration as TOML, e.g. for a fresh `retrace.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if the configuration cannot be
    /// serialized.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects configurations that cannot work at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audit.default_entity_kind.is_empty() {
            return Err(ConfigError::Validation(
                "audit.default_entity_kind must not be empty".to_string(),
            ));
        }
        if self.audit.log_filename.is_empty() {
            return Err(ConfigError::Validation(
                "audit.log_filename must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.storage.data_dir.is_relative() {
            self.storage.data_dir = base.join(&self.storage.data_dir);
        }
    }

    /// Path of the audit log file inside the data directory.
    pub fn audit_log_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.audit.log_filename)
    }

    /// Directory holding the current entity documents.
    pub fn entities_dir(&self) -> PathBuf {
        self.storage.data_dir.join("entities")
    }
}
