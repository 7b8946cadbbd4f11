//! Serializable run configuration.
//!
//! A run is one engine over one bar series with a starting account balance.
//! Configs are written as TOML:
//!
//! ```toml
//! starting_equity = 1000.0
//!
//! [engine]
//! type = "martingale"
//! base_lot = 13.0
//! take_profit = 15.0
//! reverse_signals = true
//! ```
//!
//! Any omitted field takes its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lotlab_core::engine::{
    Engine, EngineError, ExecutionConfig, MartingaleConfig, MartingaleEngine, SignalExecutor,
};

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid engine parameters: {0}")]
    Engine(#[from] EngineError),

    #[error("starting_equity must be a finite number (got {0})")]
    StartingEquity(f64),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Engine selection plus that engine's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineConfig {
    /// Fixed-size signal execution.
    Signals(ExecutionConfig),
    /// Martingale lot scaling with take-profit and flip handling.
    Martingale(MartingaleConfig),
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::Martingale(MartingaleConfig::default())
    }
}

impl EngineConfig {
    /// The name the built engine reports.
    pub fn name(&self) -> &'static str {
        match self {
            EngineConfig::Signals(_) => "signals",
            EngineConfig::Martingale(_) => "martingale",
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            EngineConfig::Signals(c) => c.validate(),
            EngineConfig::Martingale(c) => c.validate(),
        }
    }

    /// Build the engine described by this config.
    pub fn build(&self) -> Box<dyn Engine> {
        match self {
            EngineConfig::Signals(c) => Box::new(SignalExecutor::new(c.clone())),
            EngineConfig::Martingale(c) => Box::new(MartingaleEngine::new(c.clone())),
        }
    }
}

/// Configuration for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Account balance the equity curve starts from.
    pub starting_equity: f64,
    pub engine: EngineConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            starting_equity: 1000.0,
            engine: EngineConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string. Does not validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.starting_equity.is_finite() {
            return Err(ConfigError::StartingEquity(self.starting_equity));
        }
        self.engine.validate()?;
        Ok(())
    }

    /// Validate, then build the configured engine.
    pub fn build_engine(&self) -> Result<Box<dyn Engine>, ConfigError> {
        self.validate()?;
        Ok(self.engine.build())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
