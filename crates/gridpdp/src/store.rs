//! The policy store: an ordered set of top-level policies.

use std::path::PathBuf;

use tracing::{error, info};

use crate::algorithm::CombiningAlgorithm;
use crate::context::RequestTuple;
use crate::document::PolicyBuilder;
use crate::error::Result;
use crate::policy::Policy;
use crate::registry::Registry;
use crate::target::MatchResult;

/// Immutable once loaded. A reload builds a new store.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    algorithm: CombiningAlgorithm,
    policies: Vec<Policy>,
    sources: Vec<PathBuf>,
}

impl PolicyStore {
    /// An empty store. `algorithm` combines independent top-level policies.
    pub fn new(algorithm: CombiningAlgorithm) -> Self {
        Self {
            algorithm,
            policies: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: impl Into<Policy>) -> Self {
        self.policies.push(policy.into());
        self
    }

    /// Loads every source in order. The first failing source aborts the load.
    pub fn load(
        registry: &Registry,
        algorithm: CombiningAlgorithm,
        sources: &[PathBuf],
    ) -> Result<Self> {
        let mut builder = PolicyBuilder::new(registry);
        let mut store = Self::new(algorithm);
        for source in sources {
            match builder.load(source) {
                Ok(policy) => store.policies.push(policy),
                Err(e) => {
                    error!(
                        source = %source.display(),
                        loaded = store.policies.len(),
                        "Policy store load aborted"
                    );
                    return Err(e);
                }
            }
        }
        store.sources = sources.to_vec();
        info!(
            policies = store.policies.len(),
            rules = store.rule_count(),
            algorithm = %algorithm,
            "Policy store loaded"
        );
        Ok(store)
    }

    pub fn algorithm(&self) -> CombiningAlgorithm {
        self.algorithm
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.policies.iter().map(Policy::rule_count).sum()
    }

    /// Top-level policies whose target matches `tuple`, in store order.
    pub fn find_policy(&self, tuple: &RequestTuple) -> Vec<&Policy> {
        self.policies
            .iter()
            .filter(|p| p.matches(tuple) == MatchResult::Match)
            .collect()
    }
}
