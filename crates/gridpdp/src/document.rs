//! Policy documents and the builder that turns them into policy trees.
//!
//! Documents are JSON or TOML, chosen by file extension. The builder resolves
//! every group reference before any node is constructed, so the resulting
//! [`Policy`] tree is fully materialized and acyclic.
//!
//! ```toml
//! id = "grid-access"
//! combining_algorithm = "Deny-Overrides"
//!
//! [[children]]
//! id = "alice-may-act"
//! effect = "Permit"
//! subjects = { type = "x500Name", entries = ["/O=Grid/CN=Alice"] }
//!
//! [[children]]
//! id = "nobody-deletes"
//! effect = "Deny"
//! actions = { type = "string", entries = ["delete"] }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{INLINE_SOURCE, PolicyError, Result};
use crate::function::FunctionFamily;
use crate::policy::{Effect, Policy, PolicySet, Rule};
use crate::registry::Registry;
use crate::request::Axis;
use crate::target::{AllOf, AnyOf, Matcher, Target};

/// Algorithm used by policy sets that do not name one.
pub const DEFAULT_SET_ALGORITHM: &str = "Deny-Overrides";

// ============================================================================
// Format
// ============================================================================

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// `.toml` files are TOML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }

    pub fn parse<T: DeserializeOwned>(self, text: &str) -> std::result::Result<T, String> {
        match self {
            Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

// ============================================================================
// Document shapes
// ============================================================================

/// A policy node as written in a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combining_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PolicyDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<AxisDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<AxisDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<AxisDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<AxisDocument>,
}

impl PolicyDocument {
    fn axis(&self, axis: Axis) -> Option<&AxisDocument> {
        match axis {
            Axis::Subject => self.subjects.as_ref(),
            Axis::Resource => self.resources.as_ref(),
            Axis::Action => self.actions.as_ref(),
            Axis::Context => self.conditions.as_ref(),
        }
    }

    fn has_target(&self) -> bool {
        Axis::ALL.iter().any(|a| self.axis(*a).is_some())
    }
}

/// One axis of a target: alternatives written inline or pulled in from group files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisDocument {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_refs: Vec<GroupRef>,
}

/// An alternative on an axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryDocument {
    /// A bare literal using the axis type and function.
    Literal(String),
    /// Several patterns that must all hold.
    Group(GroupEntry),
    /// A single pattern.
    Pattern(PatternDocument),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupEntry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    pub attributes: Vec<PatternDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternDocument {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_id: Option<String>,
    pub value: String,
}

/// Reference to a group stored in another file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupRef {
    /// Path of the group file, relative to the referencing document.
    pub location: PathBuf,
    pub group_id: String,
}

/// A file of reusable attribute groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupFile {
    #[serde(default)]
    pub groups: Vec<GroupDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupDocument {
    pub group_id: String,
    pub axis: Axis,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_refs: Vec<GroupRef>,
}

// ============================================================================
// PolicyBuilder
// ============================================================================

/// Type and function inherited from an enclosing axis, group or entry.
#[derive(Debug, Clone, Copy, Default)]
struct Defaults<'a> {
    type_id: Option<&'a str>,
    function: Option<&'a str>,
}

impl<'a> Defaults<'a> {
    fn refine(self, type_id: Option<&'a str>, function: Option<&'a str>) -> Self {
        Self {
            type_id: type_id.or(self.type_id),
            function: function.or(self.function),
        }
    }
}

/// Builds policy trees from documents against a frozen [`Registry`].
///
/// Group files are read at most once per builder.
#[derive(Debug)]
pub struct PolicyBuilder<'r> {
    registry: &'r Registry,
    groups: HashMap<PathBuf, Arc<GroupFile>>,
    include_stack: Vec<(PathBuf, String)>,
}

impl<'r> PolicyBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            groups: HashMap::new(),
            include_stack: Vec::new(),
        }
    }

    /// Reads and builds the policy document at `path`.
    pub fn load(&mut self, path: &Path) -> Result<Policy> {
        let result = read_document::<PolicyDocument>(path).and_then(|document| {
            let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
            self.build(&document, base_dir)
        });
        match &result {
            Ok(policy) => debug!(
                source = %path.display(),
                policy_id = policy.id(),
                rules = policy.rule_count(),
                "Policy document loaded"
            ),
            Err(e) => error!(source = %path.display(), error = %e, "Policy document rejected"),
        }
        result
    }

    /// Builds a policy document held in memory. Group locations resolve
    /// against `base_dir`.
    pub fn parse_str(&mut self, text: &str, format: Format, base_dir: &Path) -> Result<Policy> {
        let document: PolicyDocument = format.parse(text).map_err(|reason| PolicyError::Parse {
            path: PathBuf::from(INLINE_SOURCE),
            reason,
        })?;
        self.build(&document, base_dir)
    }

    /// Builds a parsed document.
    pub fn build(&mut self, document: &PolicyDocument, base_dir: &Path) -> Result<Policy> {
        self.include_stack.clear();
        self.build_node(document, base_dir)
    }

    fn build_node(&mut self, doc: &PolicyDocument, base_dir: &Path) -> Result<Policy> {
        if doc.id.trim().is_empty() {
            return Err(PolicyError::malformed("<unnamed>", "policy id is empty"));
        }

        if let Some(effect) = doc.effect {
            if !doc.children.is_empty() || doc.combining_algorithm.is_some() {
                return Err(PolicyError::malformed(
                    &doc.id,
                    "a rule with an effect cannot have children or a combining algorithm",
                ));
            }
            let target = self.build_target(doc, base_dir)?;
            return Ok(Policy::Rule(Rule {
                id: doc.id.clone(),
                description: doc.description.clone(),
                effect,
                target,
            }));
        }

        if doc.children.is_empty() {
            return Err(PolicyError::malformed(
                &doc.id,
                "a policy needs either an effect or children",
            ));
        }

        let algorithm_id = doc
            .combining_algorithm
            .as_deref()
            .unwrap_or(DEFAULT_SET_ALGORITHM);
        let algorithm = self.registry.algorithms().create(algorithm_id).ok_or_else(|| {
            PolicyError::UnknownAlgorithm {
                policy: doc.id.clone(),
                algorithm_id: algorithm_id.to_string(),
            }
        })?;

        let target = if doc.has_target() {
            Some(self.build_target(doc, base_dir)?)
        } else {
            None
        };

        let children = doc
            .children
            .iter()
            .map(|child| self.build_node(child, base_dir))
            .collect::<Result<Vec<_>>>()?;

        Ok(Policy::Set(PolicySet {
            id: doc.id.clone(),
            description: doc.description.clone(),
            algorithm,
            target,
            children,
        }))
    }

    fn build_target(&mut self, doc: &PolicyDocument, base_dir: &Path) -> Result<Target> {
        let mut target = Target::new();
        for axis in Axis::ALL {
            let Some(axis_doc) = doc.axis(axis) else {
                continue;
            };
            let defaults = Defaults::default()
                .refine(axis_doc.type_id.as_deref(), axis_doc.function.as_deref());
            let mut any_of = AnyOf::default();
            self.collect_alternatives(
                &doc.id,
                axis,
                &axis_doc.entries,
                &axis_doc.group_refs,
                defaults,
                base_dir,
                &mut any_of,
            )?;
            if any_of.is_unconstrained() {
                return Err(PolicyError::malformed(
                    &doc.id,
                    format!("{axis} axis is declared but has no entries"),
                ));
            }
            target = target.with_axis(axis, any_of);
        }
        Ok(target)
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_alternatives(
        &mut self,
        policy: &str,
        axis: Axis,
        entries: &[EntryDocument],
        group_refs: &[GroupRef],
        defaults: Defaults<'_>,
        base_dir: &Path,
        out: &mut AnyOf,
    ) -> Result<()> {
        for entry in entries {
            let all_of = match entry {
                EntryDocument::Literal(value) => {
                    AllOf::new(vec![self.build_matcher(policy, defaults, None, value)?])
                }
                EntryDocument::Pattern(pattern) => {
                    AllOf::new(vec![self.build_pattern(policy, defaults, pattern)?])
                }
                EntryDocument::Group(group) => {
                    if group.attributes.is_empty() {
                        return Err(PolicyError::malformed(
                            policy,
                            format!("empty attribute group on the {axis} axis"),
                        ));
                    }
                    let defaults =
                        defaults.refine(group.type_id.as_deref(), group.function.as_deref());
                    let matchers = group
                        .attributes
                        .iter()
                        .map(|p| self.build_pattern(policy, defaults, p))
                        .collect::<Result<Vec<_>>>()?;
                    AllOf::new(matchers)
                }
            };
            out.push(all_of);
        }

        for group_ref in group_refs {
            self.include_group(policy, axis, group_ref, defaults, base_dir, out)?;
        }
        Ok(())
    }

    fn include_group(
        &mut self,
        policy: &str,
        axis: Axis,
        group_ref: &GroupRef,
        defaults: Defaults<'_>,
        base_dir: &Path,
        out: &mut AnyOf,
    ) -> Result<()> {
        let location = resolve_location(base_dir, &group_ref.location);
        let key = (location.clone(), group_ref.group_id.clone());
        if self.include_stack.contains(&key) {
            return Err(PolicyError::CyclicGroupReference {
                policy: policy.to_string(),
                location,
                group_id: group_ref.group_id.clone(),
            });
        }

        let file = self.group_file(&location)?;
        let mut found = false;
        let group_dir = location
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        self.include_stack.push(key);
        for group in file
            .groups
            .iter()
            .filter(|g| g.group_id == group_ref.group_id && g.axis == axis)
        {
            found = true;
            let defaults = defaults.refine(group.type_id.as_deref(), group.function.as_deref());
            self.collect_alternatives(
                policy,
                axis,
                &group.entries,
                &group.group_refs,
                defaults,
                &group_dir,
                out,
            )?;
        }
        self.include_stack.pop();

        if found {
            Ok(())
        } else {
            Err(PolicyError::GroupNotFound {
                policy: policy.to_string(),
                location,
                group_id: group_ref.group_id.clone(),
            })
        }
    }

    fn group_file(&mut self, location: &Path) -> Result<Arc<GroupFile>> {
        if let Some(file) = self.groups.get(location) {
            return Ok(Arc::clone(file));
        }
        let file = Arc::new(read_document::<GroupFile>(location)?);
        self.groups.insert(location.to_path_buf(), Arc::clone(&file));
        Ok(file)
    }

    fn build_pattern(
        &self,
        policy: &str,
        defaults: Defaults<'_>,
        pattern: &PatternDocument,
    ) -> Result<Matcher> {
        let defaults = defaults.refine(pattern.type_id.as_deref(), pattern.function.as_deref());
        self.build_matcher(policy, defaults, pattern.attribute_id.as_deref(), &pattern.value)
    }

    fn build_matcher(
        &self,
        policy: &str,
        defaults: Defaults<'_>,
        attribute_id: Option<&str>,
        value: &str,
    ) -> Result<Matcher> {
        let type_id = defaults.type_id.ok_or_else(|| {
            PolicyError::malformed(policy, format!("pattern '{value}' has no type"))
        })?;
        let kind = self
            .registry
            .attributes()
            .kind(type_id)
            .ok_or_else(|| PolicyError::UnknownType {
                policy: policy.to_string(),
                type_id: type_id.to_string(),
            })?;

        let function_id = match defaults.function {
            None => format!("{type_id}-{}", FunctionFamily::Equal.suffix()),
            Some(name) => match FunctionFamily::from_short_name(name) {
                Some(family) => format!("{type_id}-{}", family.suffix()),
                None => name.to_string(),
            },
        };
        let function = self
            .registry
            .functions()
            .create(&function_id)
            .ok_or_else(|| PolicyError::UnknownFunction {
                policy: policy.to_string(),
                function_id: function_id.clone(),
            })?;

        if function.pattern_kind() != kind {
            return Err(PolicyError::InvalidPattern {
                policy: policy.to_string(),
                reason: format!("{function_id} does not take {type_id} patterns"),
            });
        }

        let matcher =
            Matcher::compile(function, value).map_err(|reason| PolicyError::InvalidPattern {
                policy: policy.to_string(),
                reason,
            })?;
        Ok(match attribute_id {
            Some(id) => matcher.with_attribute_id(id),
            None => matcher,
        })
    }
}

fn resolve_location(base_dir: &Path, location: &Path) -> PathBuf {
    let joined = base_dir.join(location);
    std::fs::canonicalize(&joined).unwrap_or(joined)
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Format::from_path(path)
        .parse(&text)
        .map_err(|reason| PolicyError::Parse {
            path: path.to_path_buf(),
            reason,
        })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::CombiningAlgorithm;
    use crate::target::MatchResult;
    use std::fs;
    use tempfile::TempDir;

    fn build_json(text: &str) -> Result<Policy> {
        let registry = Registry::builtin();
        PolicyBuilder::new(&registry).parse_str(text, Format::Json, Path::new("."))
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/b.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("a/b.TOML")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("a/b.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a/b")), Format::Json);
    }

    #[test]
    fn test_rule_with_inline_entries() {
        let policy = build_json(
            r#"{
                "id": "r1",
                "effect": "Permit",
                "subjects": {
                    "type": "x500Name",
                    "function": "Match",
                    "entries": [
                        "/O=Grid/CN=.*",
                        {"attributes": [
                            {"type": "string", "function": "Equal", "attribute_id": "vo", "value": "atlas"},
                            {"type": "string", "function": "Equal", "value": "admin"}
                        ]}
                    ]
                }
            }"#,
        )
        .unwrap();
        let Policy::Rule(rule) = &policy else {
            panic!("expected a rule");
        };
        let subjects = rule.target.axis(Axis::Subject);
        assert_eq!(subjects.groups().len(), 2);
        assert_eq!(subjects.groups()[0].matchers()[0].function().id(), "x500Name-match");
        assert_eq!(subjects.groups()[1].matchers()[0].attribute_id(), Some("vo"));
        assert_eq!(subjects.groups()[1].matchers()[1].function().id(), "string-equal");
        assert!(rule.target.axis(Axis::Action).is_unconstrained());
    }

    #[test]
    fn test_set_defaults_to_deny_overrides() {
        let policy = build_json(
            r#"{"id": "s", "children": [{"id": "r", "effect": "Deny"}]}"#,
        )
        .unwrap();
        let Policy::Set(set) = &policy else {
            panic!("expected a set");
        };
        assert_eq!(set.algorithm, CombiningAlgorithm::DenyOverrides);
        assert!(set.target.is_none());
    }

    #[test]
    fn test_full_function_id() {
        let policy = build_json(
            r#"{"id": "r", "effect": "Permit",
                "conditions": {"entries": [{"type": "period", "function": "period-inrange",
                                            "value": "2020-01-01T00:00:00Z/P1Y"}]}}"#,
        )
        .unwrap();
        let Policy::Rule(rule) = &policy else {
            panic!("expected a rule");
        };
        let f = rule.target.axis(Axis::Context).groups()[0].matchers()[0].function();
        assert_eq!(f.id(), "period-inrange");
    }

    #[test]
    fn test_load_time_errors() {
        let cases = [
            (r#"{"id": "", "effect": "Permit"}"#, "empty id"),
            (r#"{"id": "x"}"#, "neither effect nor children"),
            (
                r#"{"id": "x", "effect": "Permit", "children": [{"id": "y", "effect": "Deny"}]}"#,
                "effect with children",
            ),
            (
                r#"{"id": "x", "effect": "Permit", "actions": {"type": "string", "entries": []}}"#,
                "declared empty axis",
            ),
            (
                r#"{"id": "x", "effect": "Permit", "actions": {"entries": ["read"]}}"#,
                "pattern without type",
            ),
        ];
        for (text, label) in cases {
            let err = build_json(text).unwrap_err();
            assert!(matches!(err, PolicyError::Malformed { .. }), "{label}: {err}");
        }
    }

    #[test]
    fn test_unknown_registrations() {
        let err = build_json(
            r#"{"id": "x", "effect": "Permit", "actions": {"type": "ipAddress", "entries": ["a"]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownType { ref type_id, .. } if type_id == "ipAddress"));

        let err = build_json(
            r#"{"id": "x", "effect": "Permit", "actions": {"type": "dateTime", "function": "Match", "entries": ["a"]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownFunction { ref function_id, .. } if function_id == "dateTime-match"));

        let err = build_json(
            r#"{"id": "x", "combining_algorithm": "Ordered-Deny", "children": [{"id": "r", "effect": "Deny"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownAlgorithm { ref policy, .. } if policy == "x"));
    }

    #[test]
    fn test_invalid_patterns() {
        let bad_literal = build_json(
            r#"{"id": "x", "effect": "Permit", "conditions": {"type": "dateTime", "entries": ["noon"]}}"#,
        )
        .unwrap_err();
        assert!(matches!(bad_literal, PolicyError::InvalidPattern { .. }));

        let bad_regex = build_json(
            r#"{"id": "x", "effect": "Permit", "subjects": {"type": "string", "function": "Match", "entries": ["(oops"]}}"#,
        )
        .unwrap_err();
        assert!(matches!(bad_regex, PolicyError::InvalidPattern { .. }));

        let mismatch = build_json(
            r#"{"id": "x", "effect": "Permit", "subjects": {"type": "x500Name", "function": "string-equal", "entries": ["/CN=a"]}}"#,
        )
        .unwrap_err();
        assert!(matches!(mismatch, PolicyError::InvalidPattern { .. }));
    }

    #[test]
    fn test_group_refs_resolve_relative_to_document() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("groups")).unwrap();
        fs::write(
            dir.path().join("groups/admins.toml"),
            r#"
                [[groups]]
                group_id = "admins"
                axis = "subject"
                type = "x500Name"
                entries = ["/O=Grid/CN=Alice", "/O=Grid/CN=Bob"]

                [[groups]]
                group_id = "admins"
                axis = "action"
                type = "string"
                entries = ["ignored"]
            "#,
        )
        .unwrap();
        fs::write(
            dir.path().join("policy.toml"),
            r#"
                id = "admins-permit"
                effect = "Permit"
                [subjects]
                group_refs = [{ location = "groups/admins.toml", group_id = "admins" }]
            "#,
        )
        .unwrap();

        let registry = Registry::builtin();
        let policy = PolicyBuilder::new(&registry)
            .load(&dir.path().join("policy.toml"))
            .unwrap();
        let Policy::Rule(rule) = &policy else {
            panic!("expected a rule");
        };
        assert_eq!(rule.target.axis(Axis::Subject).groups().len(), 2);
        assert!(rule.target.axis(Axis::Action).is_unconstrained());
    }

    #[test]
    fn test_cyclic_group_reference() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.toml"),
            r#"
                [[groups]]
                group_id = "g"
                axis = "subject"
                type = "string"
                entries = ["x"]
                group_refs = [{ location = "b.toml", group_id = "g" }]
            "#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b.toml"),
            r#"
                [[groups]]
                group_id = "g"
                axis = "subject"
                group_refs = [{ location = "a.toml", group_id = "g" }]
            "#,
        )
        .unwrap();

        let registry = Registry::builtin();
        let err = PolicyBuilder::new(&registry)
            .parse_str(
                r#"{"id": "r", "effect": "Permit",
                    "subjects": {"group_refs": [{"location": "a.toml", "group_id": "g"}]}}"#,
                Format::Json,
                dir.path(),
            )
            .unwrap_err();
        assert!(matches!(err, PolicyError::CyclicGroupReference { ref group_id, .. } if group_id == "g"));
    }

    #[test]
    fn test_missing_group() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("g.toml"), "groups = []").unwrap();
        let registry = Registry::builtin();
        let err = PolicyBuilder::new(&registry)
            .parse_str(
                r#"{"id": "r", "effect": "Permit",
                    "subjects": {"group_refs": [{"location": "g.toml", "group_id": "nobody"}]}}"#,
                Format::Json,
                dir.path(),
            )
            .unwrap_err();
        assert!(matches!(err, PolicyError::GroupNotFound { .. }));
    }

    #[test]
    fn test_missing_group_file() {
        let registry = Registry::builtin();
        let err = PolicyBuilder::new(&registry)
            .parse_str(
                r#"{"id": "r", "effect": "Permit",
                    "subjects": {"group_refs": [{"location": "nowhere.toml", "group_id": "g"}]}}"#,
                Format::Json,
                Path::new("/nonexistent"),
            )
            .unwrap_err();
        assert!(matches!(err, PolicyError::Io { .. }));
    }

    #[test]
    fn test_set_target_is_built() {
        let policy = build_json(
            r#"{"id": "s",
                "resources": {"type": "anyURI", "entries": ["https://grid.example.org/jobs"]},
                "children": [{"id": "r", "effect": "Permit"}]}"#,
        )
        .unwrap();
        let Policy::Set(set) = &policy else {
            panic!("expected a set");
        };
        assert!(set.target.is_some());
        assert_eq!(
            policy.matches(&crate::context::RequestTuple::default()),
            MatchResult::NoMatch
        );
    }
}
