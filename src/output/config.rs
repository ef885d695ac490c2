//! Sink configuration
//!
//! Loaded from JSON, validated before any sink is built from it. Missing
//! fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::errors::{OutputError, OutputResult};
use crate::observability::Event;

/// Configuration for file-backed output sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// File the sink appends to.
    pub path: PathBuf,
    /// Column family every cell is written under.
    pub column_family: String,
    /// Flush automatically after this many records. `0` means only on
    /// explicit `flush`/`close`.
    pub flush_threshold: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("zephyr-output.jsonl"),
            column_family: "column".to_string(),
            flush_threshold: 0,
        }
    }
}

impl SinkConfig {
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_column_family(mut self, family: impl Into<String>) -> Self {
        self.column_family = family.into();
        self
    }

    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold;
        self
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> OutputResult<Self> {
        let config: SinkConfig = serde_json::from_str(json)
            .map_err(|e| OutputError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        info!(
            event = %Event::ConfigLoaded,
            path = %config.path.display(),
            family = %config.column_family,
            flush_threshold = config.flush_threshold
        );
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: &Path) -> OutputResult<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| OutputError::io(format!("Failed to read config: {}", path.display()), e))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> OutputResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(OutputError::InvalidConfig("path must not be empty".to_string()));
        }
        if self.column_family.is_empty() {
            return Err(OutputError::InvalidConfig("column_family must not be empty".to_string()));
        }
        if let Some(bad) = self
            .column_family
            .chars()
            .find(|c| *c == ':' || c.is_whitespace() || c.is_control())
        {
            return Err(OutputError::InvalidConfig(format!(
                "column_family contains {:?}",
                bad
            )));
        }
        Ok(())
    }
}
