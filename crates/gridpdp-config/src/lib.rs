//! Configuration management for gridpdp
//!
//! Layers settings in order of increasing precedence:
//!
//! 1. Built-in defaults
//! 2. User config: `~/.config/gridpdp/config.toml`
//! 3. Project config: `gridpdp.toml`
//! 4. Local overrides: `gridpdp.local.toml` (gitignored)
//! 5. Environment variables: `GRIDPDP_EVALUATOR__MODE`, ...
//!
//! Relative policy sources are resolved against the project directory.

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

use gridpdp::{PdpOptions, Registry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete gridpdp configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdpConfig {
    /// Options handed to the decision point
    pub evaluator: PdpOptions,
}

impl PdpConfig {
    /// Load configuration from all sources with the current directory as
    /// the project root
    pub fn load() -> anyhow::Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from a specific project directory
    pub fn load_from_dir(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        ConfigLoader::new().with_project_dir(dir).load()
    }

    /// Read a single TOML file without layering or path resolution
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve relative policy sources against the project directory
    pub fn resolve_paths(&mut self, project_dir: &Path) {
        for source in &mut self.evaluator.policy_sources {
            if source.is_relative() {
                *source = project_dir.join(&*source);
            }
        }
    }

    /// Check that the configured factories and store algorithm exist.
    ///
    /// Policy sources are not opened here; loading them is the decision
    /// point's job.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let options = &self.evaluator;
        let registry = Registry::with_factories(
            &options.attribute_factory,
            &options.function_factory,
            &options.algorithm_factory,
        )
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        registry
            .algorithm(&options.combining_algorithm)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Policy sources after resolution
    pub fn policy_sources(&self) -> &[PathBuf] {
        &self.evaluator.policy_sources
    }
}
