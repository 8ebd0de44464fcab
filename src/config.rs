use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Status reported when the program of a simple command cannot be found.
    pub not_found_status: i32,
    /// Status reported when the program exists but cannot be executed.
    pub not_executable_status: i32,
    /// Upper bound on one top-level run, in milliseconds.
    pub deadline_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            not_found_status: 127,
            not_executable_status: 126,
            deadline_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        trace!("loaded engine config from {}", path.display());

        Self::from_toml_str(&contents)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}
