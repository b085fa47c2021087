//! Load policy documents and report what they contain.

use std::path::PathBuf;

use anyhow::Result;
use gridpdp::{Policy, PolicyBuilder, Registry};

use crate::style::{colors::SemanticStyle, print_error, print_grid_table, print_success};

fn kind(policy: &Policy) -> &'static str {
    match policy {
        Policy::Rule(_) => "rule",
        Policy::Set(_) => "policy set",
    }
}

pub fn run(policies: &[PathBuf]) -> Result<()> {
    let registry = Registry::builtin();
    let mut builder = PolicyBuilder::new(&registry);
    let mut rows = Vec::new();
    let mut failures = 0usize;

    for path in policies {
        match builder.load(path) {
            Ok(policy) => rows.push(vec![
                path.display().to_string(),
                policy.id().to_string(),
                kind(&policy).to_string(),
                policy.rule_count().to_string(),
            ]),
            Err(e) => {
                failures += 1;
                print_error(&format!("{}: {e}", path.display().code()));
            }
        }
    }

    if !rows.is_empty() {
        print_grid_table(&["Source", "Policy", "Kind", "Rules"], &rows);
    }

    if failures > 0 {
        anyhow::bail!(
            "{failures} of {} policy documents failed to load",
            policies.len()
        );
    }
    print_success(&format!("{} policy documents loaded", policies.len()));
    Ok(())
}
