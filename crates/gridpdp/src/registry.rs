//! Extension registries: attribute types, comparison functions and combining
//! algorithms.
//!
//! A [`Registry`] is assembled once with a [`RegistryBuilder`] and is frozen
//! afterwards. It is shared read-only (usually behind an `Arc`) by everything
//! that parses or evaluates policies.

use std::collections::HashMap;

use tracing::debug;

use crate::algorithm::CombiningAlgorithm;
use crate::error::{RegistryError, ValueError};
use crate::function::{Function, FunctionFamily};
use crate::value::{AttributeKind, AttributeValue};

/// Identifier of the built-in attribute factory.
pub const ATTRIBUTE_FACTORY: &str = "attr.factory";
/// Identifier of the built-in function factory.
pub const FUNCTION_FACTORY: &str = "fn.factory";
/// Identifier of the built-in algorithm factory.
pub const ALGORITHM_FACTORY: &str = "alg.factory";

// ============================================================================
// Factories
// ============================================================================

/// Maps type identifiers to attribute kinds.
#[derive(Debug, Clone)]
pub struct AttributeFactory {
    types: HashMap<String, AttributeKind>,
}

impl AttributeFactory {
    fn builtin() -> Self {
        let types = AttributeKind::ALL
            .iter()
            .map(|kind| (kind.type_id().to_string(), *kind))
            .collect();
        Self { types }
    }

    pub fn id(&self) -> &'static str {
        ATTRIBUTE_FACTORY
    }

    pub fn kind(&self, type_id: &str) -> Option<AttributeKind> {
        self.types.get(type_id).copied()
    }

    /// Builds a value of the registered kind from its raw literal.
    pub fn create(&self, raw: &str, type_id: &str) -> Result<AttributeValue, ValueError> {
        let kind = self
            .kind(type_id)
            .ok_or_else(|| ValueError::UnknownType(type_id.to_string()))?;
        kind.parse(raw)
    }

    /// Registered type identifiers, sorted.
    pub fn type_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.types.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Maps function identifiers (`string-equal`, `period-inrange`, ...) to functions.
#[derive(Debug, Clone)]
pub struct FunctionFactory {
    functions: HashMap<String, Function>,
}

impl FunctionFactory {
    fn builtin() -> Self {
        let mut functions = HashMap::new();
        for kind in AttributeKind::ALL {
            for family in [
                FunctionFamily::Equal,
                FunctionFamily::Match,
                FunctionFamily::InRange,
            ] {
                if let Some(function) = Function::new(family, kind) {
                    functions.insert(function.id(), function);
                }
            }
        }
        Self { functions }
    }

    pub fn id(&self) -> &'static str {
        FUNCTION_FACTORY
    }

    pub fn create(&self, function_id: &str) -> Option<Function> {
        self.functions.get(function_id).copied()
    }

    pub fn function_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Maps algorithm identifiers to combining algorithms.
#[derive(Debug, Clone)]
pub struct AlgorithmFactory {
    algorithms: HashMap<String, CombiningAlgorithm>,
}

impl AlgorithmFactory {
    fn builtin() -> Self {
        let algorithms = CombiningAlgorithm::ALL
            .iter()
            .map(|alg| (alg.id().to_string(), *alg))
            .collect();
        Self { algorithms }
    }

    pub fn id(&self) -> &'static str {
        ALGORITHM_FACTORY
    }

    pub fn create(&self, algorithm_id: &str) -> Option<CombiningAlgorithm> {
        self.algorithms.get(algorithm_id).copied()
    }

    pub fn algorithm_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.algorithms.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

// ============================================================================
// Registry
// ============================================================================

/// The frozen set of factories used to load and evaluate policies.
#[derive(Debug, Clone)]
pub struct Registry {
    attributes: AttributeFactory,
    functions: FunctionFactory,
    algorithms: AlgorithmFactory,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// The built-in kinds, functions and algorithms with no aliases.
    pub fn builtin() -> Self {
        Self {
            attributes: AttributeFactory::builtin(),
            functions: FunctionFactory::builtin(),
            algorithms: AlgorithmFactory::builtin(),
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Selects factories by identifier, failing on any that is not registered.
    pub fn with_factories(
        attribute_factory: &str,
        function_factory: &str,
        algorithm_factory: &str,
    ) -> Result<Self, RegistryError> {
        Self::builder().build_with_factories(attribute_factory, function_factory, algorithm_factory)
    }

    pub fn attributes(&self) -> &AttributeFactory {
        &self.attributes
    }

    pub fn functions(&self) -> &FunctionFactory {
        &self.functions
    }

    pub fn algorithms(&self) -> &AlgorithmFactory {
        &self.algorithms
    }

    /// Resolves an algorithm identifier, for configuration checks.
    pub fn algorithm(&self, algorithm_id: &str) -> Result<CombiningAlgorithm, RegistryError> {
        self.algorithms
            .create(algorithm_id)
            .ok_or_else(|| RegistryError::UnknownAlgorithm(algorithm_id.to_string()))
    }
}

// ============================================================================
// RegistryBuilder
// ============================================================================

/// Registers aliases on top of the built-ins, then freezes into a [`Registry`].
///
/// # Example
///
/// ```
/// use gridpdp::Registry;
///
/// let registry = Registry::builder()
///     .type_alias("dn", "x500Name")
///     .unwrap()
///     .algorithm_alias("deny-overrides", "Deny-Overrides")
///     .unwrap()
///     .build();
///
/// assert!(registry.functions().create("dn-match").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    registry: Registry,
    type_aliases: Vec<String>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::builtin(),
            type_aliases: Vec::new(),
        }
    }

    /// Registers `alias` as another type identifier for `target`.
    ///
    /// Function identifiers built from the alias (`<alias>-equal`, ...) are
    /// registered as well.
    pub fn type_alias(mut self, alias: &str, target: &str) -> Result<Self, RegistryError> {
        let kind = self
            .registry
            .attributes
            .kind(target)
            .ok_or_else(|| dangling(alias, target))?;
        self.registry
            .attributes
            .types
            .insert(alias.to_string(), kind);
        self.type_aliases.push(alias.to_string());
        Ok(self)
    }

    pub fn function_alias(mut self, alias: &str, target: &str) -> Result<Self, RegistryError> {
        let function = self
            .registry
            .functions
            .create(target)
            .ok_or_else(|| dangling(alias, target))?;
        self.registry
            .functions
            .functions
            .insert(alias.to_string(), function);
        Ok(self)
    }

    pub fn algorithm_alias(mut self, alias: &str, target: &str) -> Result<Self, RegistryError> {
        let algorithm = self
            .registry
            .algorithms
            .create(target)
            .ok_or_else(|| dangling(alias, target))?;
        self.registry
            .algorithms
            .algorithms
            .insert(alias.to_string(), algorithm);
        Ok(self)
    }

    /// Freezes the registry.
    pub fn build(mut self) -> Registry {
        for alias in &self.type_aliases {
            let Some(kind) = self.registry.attributes.kind(alias) else {
                continue;
            };
            for family in [
                FunctionFamily::Equal,
                FunctionFamily::Match,
                FunctionFamily::InRange,
            ] {
                if let Some(function) = Function::new(family, kind) {
                    self.registry
                        .functions
                        .functions
                        .entry(format!("{alias}-{}", family.suffix()))
                        .or_insert(function);
                }
            }
        }
        debug!(
            types = self.registry.attributes.types.len(),
            functions = self.registry.functions.functions.len(),
            algorithms = self.registry.algorithms.algorithms.len(),
            "Registry frozen"
        );
        self.registry
    }

    /// Freezes the registry after checking that the named factories exist.
    pub fn build_with_factories(
        self,
        attribute_factory: &str,
        function_factory: &str,
        algorithm_factory: &str,
    ) -> Result<Registry, RegistryError> {
        check_factory("attribute factory", attribute_factory, ATTRIBUTE_FACTORY)?;
        check_factory("function factory", function_factory, FUNCTION_FACTORY)?;
        check_factory("algorithm factory", algorithm_factory, ALGORITHM_FACTORY)?;
        Ok(self.build())
    }
}

fn dangling(alias: &str, target: &str) -> RegistryError {
    RegistryError::DanglingAlias {
        alias: alias.to_string(),
        target: target.to_string(),
    }
}

fn check_factory(kind: &'static str, id: &str, builtin: &str) -> Result<(), RegistryError> {
    if id == builtin {
        Ok(())
    } else {
        Err(RegistryError::UnknownFactory {
            kind,
            id: id.to_string(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
