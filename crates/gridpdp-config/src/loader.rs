//! Layered configuration loading

use crate::{PdpConfig, Paths};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Prefix of environment overrides, e.g. `GRIDPDP_EVALUATOR__MODE`.
const ENV_PREFIX: &str = "GRIDPDP";

/// Builds a [`PdpConfig`] from defaults, files and the environment.
pub struct ConfigLoader {
    project_dir: PathBuf,
    user_config: bool,
    explicit_file: Option<PathBuf>,
    env_vars: Option<HashMap<String, String>>,
}

fn toml_file(path: PathBuf) -> config::File<config::FileSourceFile, config::FileFormat> {
    config::File::from(path)
        .required(false)
        .format(config::FileFormat::Toml)
}

impl ConfigLoader {
    /// Loader rooted at the current directory
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            user_config: true,
            explicit_file: None,
            env_vars: None,
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Skip `~/.config/gridpdp/config.toml`
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// An extra file layered above the local overrides. Unlike the
    /// discovered files it must exist.
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read environment overrides from `vars` instead of the process
    /// environment.
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    /// Merge every source, deserialize and resolve relative paths
    pub fn load(self) -> Result<PdpConfig> {
        let defaults = PdpConfig::default();
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&defaults)?);

        if self.user_config
            && let Ok(user_file) = Paths::new().user_config_file()
            && user_file.exists()
        {
            builder = builder.add_source(toml_file(user_file));
        }

        for file in [
            Paths::project_config_file(&self.project_dir),
            Paths::local_config_file(&self.project_dir),
        ] {
            if file.exists() {
                builder = builder.add_source(toml_file(file));
            }
        }

        if let Some(file) = self.explicit_file {
            if !file.exists() {
                anyhow::bail!("Config file not found: {}", file.display());
            }
            builder = builder.add_source(toml_file(file).required(true));
        }

        // GRIDPDP_EVALUATOR__PARALLEL_THRESHOLD=0
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("evaluator.policy_sources")
                .source(self.env_vars),
        );

        let merged = builder.build().context("Failed to build configuration")?;
        let mut config: PdpConfig = merged
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.resolve_paths(&self.project_dir);
        Ok(config)
    }

    /// Fall back to defaults when loading fails
    pub fn load_or_default(self) -> PdpConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
