//! YAML batch configuration.
//!
//! ```yaml
//! workers: 8
//! create_backup: true
//! backup_dir: /srv/backups
//! recursive: true
//! rules:
//!   - search: "2024"
//!     replace: "2025"
//! ```
use crate::batch::BatchOptions;
use crate::replace::{ReplaceError, ReplaceRule};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid YAML: {0}")]
    Parse(String),

    #[error("rule {index}: {source}")]
    InvalidRule {
        index: usize,
        #[source]
        source: ReplaceError,
    },

    #[error("workers must be at least 1")]
    InvalidWorkers,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub search: String,
    #[serde(default)]
    pub replace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub workers: usize,
    pub create_backup: bool,
    pub backup_dir: Option<PathBuf>,
    pub recursive: bool,
    pub rules: Vec<RuleConfig>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            create_backup: true,
            backup_dir: None,
            recursive: true,
            rules: Vec::new(),
        }
    }
}

impl BatchConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self).map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Validated rules, in file order.
    pub fn rules(&self) -> Result<Vec<ReplaceRule>> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                ReplaceRule::new(rule.search.as_str(), rule.replace.as_str())
                    .map_err(|source| ConfigError::InvalidRule { index, source })
            })
            .collect()
    }

    pub fn options(&self) -> BatchOptions {
        BatchOptions {
            create_backup: self.create_backup,
            backup_dir: self.backup_dir.clone(),
        }
    }
}
