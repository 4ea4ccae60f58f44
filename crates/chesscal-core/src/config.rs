//! JSON configuration helpers shared by every pipeline config.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Board(#[from] crate::BoardError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Load/store a config value as pretty JSON.
pub trait JsonConfig: Serialize + DeserializeOwned {
    /// Load a JSON config from disk. Missing fields take their defaults.
    fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Termination settings for iterative sub-pixel corner refinement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubPixParams {
    /// Half side length of the search window (pixels); `[11, 11]` searches 23x23.
    pub window: [i32; 2],
    /// Dead zone in the middle of the search window; `[-1, -1]` disables it.
    pub zero_zone: [i32; 2],
    pub max_iterations: i32,
    pub epsilon: f64,
}

impl Default for SubPixParams {
    fn default() -> Self {
        Self {
            window: [11, 11],
            zero_zone: [-1, -1],
            max_iterations: 30,
            epsilon: 0.001,
        }
    }
}

impl SubPixParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.iter().any(|&w| w < 1) {
            return Err(ConfigError::Invalid(format!(
                "sub-pixel window must be positive, got {:?}",
                self.window
            )));
        }
        if self.max_iterations < 1 || !(self.epsilon > 0.0) {
            return Err(ConfigError::Invalid(
                "sub-pixel refinement needs max_iterations >= 1 and epsilon > 0".into(),
            ));
        }
        Ok(())
    }
}
