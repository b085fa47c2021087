//! A reloadable policy decision point.
//!
//! Holds the frozen registry and the current store snapshot. A reload builds
//! a complete new store and swaps the `Arc`; evaluations already running keep
//! the snapshot they started with.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::PdpError;
use crate::evaluator::{DEFAULT_PARALLEL_THRESHOLD, EvaluationMode, Evaluator, Response};
use crate::registry::{ALGORITHM_FACTORY, ATTRIBUTE_FACTORY, FUNCTION_FACTORY, Registry};
use crate::request::Request;
use crate::store::PolicyStore;

/// Store algorithm used when none is configured.
pub const DEFAULT_STORE_ALGORITHM: &str = "Permit-Overrides";

/// Evaluator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdpOptions {
    /// Policy documents, loaded in order.
    pub policy_sources: Vec<PathBuf>,
    pub attribute_factory: String,
    pub function_factory: String,
    pub algorithm_factory: String,
    /// Combines independent top-level policies.
    pub combining_algorithm: String,
    pub mode: EvaluationMode,
    /// Minimum tuple count for parallel evaluation; 0 disables it.
    pub parallel_threshold: usize,
}

impl Default for PdpOptions {
    fn default() -> Self {
        Self {
            policy_sources: Vec::new(),
            attribute_factory: ATTRIBUTE_FACTORY.to_string(),
            function_factory: FUNCTION_FACTORY.to_string(),
            algorithm_factory: ALGORITHM_FACTORY.to_string(),
            combining_algorithm: DEFAULT_STORE_ALGORITHM.to_string(),
            mode: EvaluationMode::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Shared entry point for evaluating requests.
#[derive(Debug)]
pub struct PolicyDecisionPoint {
    registry: Arc<Registry>,
    options: PdpOptions,
    store: RwLock<Arc<PolicyStore>>,
}

impl PolicyDecisionPoint {
    /// Selects the configured factories and loads every policy source.
    pub fn new(options: PdpOptions) -> Result<Self, PdpError> {
        let registry = Registry::with_factories(
            &options.attribute_factory,
            &options.function_factory,
            &options.algorithm_factory,
        )?;
        Self::with_registry(registry, options)
    }

    /// Like [`new`](Self::new) with a registry that may carry aliases.
    pub fn with_registry(registry: Registry, options: PdpOptions) -> Result<Self, PdpError> {
        let store = build_store(&registry, &options)?;
        Ok(Self {
            registry: Arc::new(registry),
            options,
            store: RwLock::new(Arc::new(store)),
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn options(&self) -> &PdpOptions {
        &self.options
    }

    /// The current store snapshot.
    pub fn store(&self) -> Arc<PolicyStore> {
        let guard = self.store.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// An evaluator bound to the current snapshot.
    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(self.store())
            .with_mode(self.options.mode)
            .with_parallel_threshold(self.options.parallel_threshold)
    }

    pub fn evaluate(&self, request: &Request) -> Response {
        self.evaluator().evaluate(request)
    }

    /// True when at least one tuple of `request` is permitted.
    pub fn is_permitted(&self, request: &Request) -> bool {
        self.evaluate(request).is_permitted()
    }

    /// Rebuilds the store from the configured sources and swaps it in.
    ///
    /// On failure the current store stays in place.
    pub fn reload(&self) -> Result<(), PdpError> {
        match build_store(&self.registry, &self.options) {
            Ok(store) => {
                let policies = store.len();
                self.replace_store(store);
                info!(policies, "Policy store reloaded");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Policy store reload failed; keeping current store");
                Err(e)
            }
        }
    }

    /// Swaps in a store built elsewhere.
    pub fn replace_store(&self, store: PolicyStore) {
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(store);
    }
}

fn build_store(registry: &Registry, options: &PdpOptions) -> Result<PolicyStore, PdpError> {
    let algorithm = registry.algorithm(&options.combining_algorithm)?;
    Ok(PolicyStore::load(
        registry,
        algorithm,
        &options.policy_sources,
    )?)
}
