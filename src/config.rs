use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::registry::StageRegistry;

/// Entry fields registered when no configuration says otherwise.
pub const DEFAULT_FIELDS: &[&str] = &[
    "activity",
    "author",
    "cost_type",
    "priority",
    "project",
    "spent_on",
    "status",
    "tracker",
    "user",
];

pub const DEFAULT_SUM_FIELD: &str = "costs";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine configuration, usually read from a TOML file:
///
/// ```toml
/// fields = ["status", "priority", "author"]
/// sum_field = "costs"
/// entries = "entries.json"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Entry fields that get a filter and a group-by stage.
    pub fields: Vec<String>,
    /// Field summed alongside every count.
    pub sum_field: Option<String>,
    /// Entries file used when none is given on the command line.
    pub entries: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            sum_field: Some(DEFAULT_SUM_FIELD.to_string()),
            entries: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A relative `entries` path is resolved against the
    /// directory holding the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("loading config from {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if let Some(entries) = &config.entries
            && entries.is_relative()
            && let Some(dir) = path.parent()
        {
            config.entries = Some(dir.join(entries));
        }
        Ok(config)
    }

    pub fn registry(&self) -> StageRegistry {
        StageRegistry::with_fields(&self.fields)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(field) = self.fields.iter().find(|f| f.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "empty field name in fields: {:?}",
                field
            )));
        }
        if self.sum_field.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(ConfigError::Invalid("sum_field must not be empty".into()));
        }
        Ok(())
    }
}
