//! Configuration loaded from a YAML file.
//!
//! Every section has defaults, so an empty document yields an in-memory
//! annotator that logs at `info` level.
//!
//! ```yaml
//! logger:
//!   level: debug
//!   format: json
//! store:
//!   kind: sqlite
//!   uri: sqlite://workflows.db
//!   create_schema: true
//! annotator:
//!   boundary: space
//!   duplicates: upsert
//!   generalization_levels: 2
//! ```

use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::{BoundaryMode, DuplicatePolicy};

/// Top level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logger: Logger,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub annotator: AnnotatorSettings,
}

impl Config {
    /// Reads and parses a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parses a configuration document.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

/// Logger section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Logger {
    /// Set to `false` to leave tracing uninitialized.
    #[serde(default = "default_true")]
    pub enable: bool,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    /// Full `EnvFilter` directive replacing the level based default.
    #[serde(default)]
    pub override_filter: Option<String>,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            enable: true,
            level: LogLevel::default(),
            format: LogFormat::default(),
            override_filter: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(level)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Store backend section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreSettings {
    /// Process local store, optionally seeded from a YAML or JSON fixture.
    InMemory {
        #[serde(default)]
        seed: Option<PathBuf>,
    },
    /// SQLite database using the relational annotation layout.
    Sqlite {
        uri: String,
        /// Create missing tables on startup.
        #[serde(default)]
        create_schema: bool,
        /// Maximum rows per multi-row insert statement.
        #[serde(default = "default_batch_rows")]
        max_batch_rows: usize,
    },
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::InMemory { seed: None }
    }
}

/// Annotation engine section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnnotatorSettings {
    #[serde(default)]
    pub boundary: BoundaryMode,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    /// Generalization hops performed by a full pipeline run.
    #[serde(default = "default_levels")]
    pub generalization_levels: u32,
}

impl Default for AnnotatorSettings {
    fn default() -> Self {
        Self {
            boundary: BoundaryMode::default(),
            duplicates: DuplicatePolicy::default(),
            generalization_levels: default_levels(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_levels() -> u32 {
    1
}

fn default_batch_rows() -> usize {
    100
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
