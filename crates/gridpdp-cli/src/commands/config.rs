//! Configuration commands.

use std::path::Path;

use anyhow::{Context, Result};
use gridpdp_config::{Paths, PdpConfig};

use crate::ConfigFormat;
use crate::style::{colors::SemanticStyle, print_error, print_hint, print_info_table, print_success};

/// Show the effective configuration.
pub fn show(project: &Path, format: ConfigFormat) -> Result<()> {
    let config = PdpConfig::load_from_dir(project).context("Failed to load configuration")?;

    match format {
        ConfigFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        ConfigFormat::Toml => println!("{}", config.to_toml()?),
        ConfigFormat::Text => {
            let evaluator = &config.evaluator;
            println!("{}", "gridpdp configuration".header());
            let sources = if evaluator.policy_sources.is_empty() {
                "(none)".to_string()
            } else {
                evaluator
                    .policy_sources
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            print_info_table(&[
                ("Policy sources", sources),
                ("Attribute factory", evaluator.attribute_factory.clone()),
                ("Function factory", evaluator.function_factory.clone()),
                ("Algorithm factory", evaluator.algorithm_factory.clone()),
                ("Combining algorithm", evaluator.combining_algorithm.clone()),
                ("Mode", format!("{:?}", evaluator.mode)),
                ("Parallel threshold", evaluator.parallel_threshold.to_string()),
            ]);
            if !Paths::is_project(project) {
                print_hint(&format!(
                    "No {} found; showing defaults and overrides",
                    Paths::project_config_file(project).display()
                ));
            }
        }
    }

    Ok(())
}

/// Validate the configuration in a project directory.
pub fn validate(project: &Path) -> Result<()> {
    let config = PdpConfig::load_from_dir(project).context("Failed to load configuration")?;

    if let Err(e) = config.validate() {
        print_error(&format!("Configuration validation failed: {e}"));
        return Err(e.into());
    }

    let missing: Vec<_> = config
        .policy_sources()
        .iter()
        .filter(|p| !p.exists())
        .collect();
    if !missing.is_empty() {
        for path in &missing {
            print_error(&format!("Policy source not found: {}", path.display()));
        }
        anyhow::bail!("{} policy sources are missing", missing.len());
    }

    print_success("Configuration is valid");
    Ok(())
}
