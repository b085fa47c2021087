//! The authorization query.
//!
//! A [`Request`] holds one or more [`RequestItem`]s. Each item has four axes
//! (subjects, resources, actions, contexts); an axis is a list of alternative
//! attribute groups, and every attribute in a group holds at once.

use std::fmt::{self, Display};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::document::Format;
use crate::error::{INLINE_SOURCE, RequestError, ValueError};
use crate::registry::Registry;
use crate::value::AttributeValue;

// ============================================================================
// Axis
// ============================================================================

/// One of the four axes of a request item or rule target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Subject,
    Resource,
    Action,
    Context,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::Subject, Axis::Resource, Axis::Action, Axis::Context];

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::Subject => "subject",
            Axis::Resource => "resource",
            Axis::Action => "action",
            Axis::Context => "context",
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RequestAttribute
// ============================================================================

/// A single attribute of a request.
///
/// Construction never fails. If the type is unknown or the literal does not
/// parse, the attribute keeps the error and behaves as indeterminate wherever
/// a matcher looks at it.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAttribute {
    attribute_id: String,
    #[serde(rename = "type")]
    type_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    issuer: Option<String>,
    #[serde(rename = "value")]
    raw_value: String,
    #[serde(skip)]
    value: Result<AttributeValue, ValueError>,
}

impl RequestAttribute {
    pub fn new(
        registry: &Registry,
        attribute_id: impl Into<String>,
        type_id: impl Into<String>,
        raw_value: impl Into<String>,
    ) -> Self {
        let attribute_id = attribute_id.into();
        let type_id = type_id.into();
        let raw_value = raw_value.into();
        let value = registry.attributes().create(&raw_value, &type_id);
        if let Err(e) = &value {
            warn!(
                attribute_id = %attribute_id,
                type_id = %type_id,
                error = %e,
                "Request attribute is unresolved"
            );
        }
        Self {
            attribute_id,
            type_id,
            issuer: None,
            raw_value,
            value,
        }
    }

    /// Wraps an already typed value.
    pub fn from_value(attribute_id: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            attribute_id: attribute_id.into(),
            type_id: value.type_id().to_string(),
            issuer: None,
            raw_value: value.encode(),
            value: Ok(value),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn attribute_id(&self) -> &str {
        &self.attribute_id
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    /// The typed value, or `None` if the attribute is unresolved.
    pub fn value(&self) -> Option<&AttributeValue> {
        self.value.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ValueError> {
        self.value.as_ref().err()
    }

    pub fn is_resolved(&self) -> bool {
        self.value.is_ok()
    }
}

impl Display for RequestAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attribute_id.is_empty() {
            write!(f, "{}:{}", self.type_id, self.raw_value)
        } else {
            write!(f, "{}={}:{}", self.attribute_id, self.type_id, self.raw_value)
        }
    }
}

// ============================================================================
// AttributeGroup
// ============================================================================

/// An AND-group of request attributes. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AttributeGroup(Arc<[RequestAttribute]>);

impl AttributeGroup {
    pub fn new(attributes: Vec<RequestAttribute>) -> Self {
        Self(attributes.into())
    }

    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Whether any attribute of the group failed to resolve.
    pub fn has_unresolved(&self) -> bool {
        self.0.iter().any(|a| !a.is_resolved())
    }
}

impl Default for AttributeGroup {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for AttributeGroup {
    type Target = [RequestAttribute];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<RequestAttribute>> for AttributeGroup {
    fn from(attributes: Vec<RequestAttribute>) -> Self {
        Self::new(attributes)
    }
}

impl Serialize for AttributeGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl Display for AttributeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attribute) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" & ")?;
            }
            write!(f, "{attribute}")?;
        }
        Ok(())
    }
}

// ============================================================================
// RequestItem / Request
// ============================================================================

/// Four OR-lists of AND-groups.
#[derive(Debug, Clone, Default)]
pub struct RequestItem {
    subjects: Vec<AttributeGroup>,
    resources: Vec<AttributeGroup>,
    actions: Vec<AttributeGroup>,
    contexts: Vec<AttributeGroup>,
}

impl RequestItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an alternative group to `axis`.
    pub fn with_group(mut self, axis: Axis, group: impl Into<AttributeGroup>) -> Self {
        self.push_group(axis, group.into());
        self
    }

    pub fn with_subject(self, group: impl Into<AttributeGroup>) -> Self {
        self.with_group(Axis::Subject, group)
    }

    pub fn with_resource(self, group: impl Into<AttributeGroup>) -> Self {
        self.with_group(Axis::Resource, group)
    }

    pub fn with_action(self, group: impl Into<AttributeGroup>) -> Self {
        self.with_group(Axis::Action, group)
    }

    pub fn with_context(self, group: impl Into<AttributeGroup>) -> Self {
        self.with_group(Axis::Context, group)
    }

    pub fn push_group(&mut self, axis: Axis, group: AttributeGroup) {
        self.groups_mut(axis).push(group);
    }

    pub fn groups(&self, axis: Axis) -> &[AttributeGroup] {
        match axis {
            Axis::Subject => &self.subjects,
            Axis::Resource => &self.resources,
            Axis::Action => &self.actions,
            Axis::Context => &self.contexts,
        }
    }

    fn groups_mut(&mut self, axis: Axis) -> &mut Vec<AttributeGroup> {
        match axis {
            Axis::Subject => &mut self.subjects,
            Axis::Resource => &mut self.resources,
            Axis::Action => &mut self.actions,
            Axis::Context => &mut self.contexts,
        }
    }

    /// Number of tuples this item expands to. An empty axis counts as one.
    pub fn tuple_count(&self) -> usize {
        Axis::ALL
            .iter()
            .map(|axis| self.groups(*axis).len().max(1))
            .product()
    }
}

/// An authorization query: an ordered list of items.
#[derive(Debug, Clone, Default)]
pub struct Request {
    items: Vec<RequestItem>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: RequestItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(&self) -> &[RequestItem] {
        &self.items
    }

    pub fn tuple_count(&self) -> usize {
        self.items.iter().map(RequestItem::tuple_count).sum()
    }

    /// Reads a request document; the format follows the file extension.
    pub fn load(registry: &Registry, path: &Path) -> Result<Self, RequestError> {
        let text = std::fs::read_to_string(path).map_err(|source| RequestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let format = Format::from_path(path);
        Self::parse_document(registry, &text, format, path.to_path_buf())
    }

    /// Parses a request document held in memory.
    pub fn parse_str(registry: &Registry, text: &str, format: Format) -> Result<Self, RequestError> {
        Self::parse_document(registry, text, format, PathBuf::from(INLINE_SOURCE))
    }

    fn parse_document(
        registry: &Registry,
        text: &str,
        format: Format,
        path: PathBuf,
    ) -> Result<Self, RequestError> {
        let document: RequestDocument = format
            .parse(text)
            .map_err(|reason| RequestError::Parse { path, reason })?;
        Ok(document.into_request(registry))
    }
}

// ============================================================================
// Request document
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestDocument {
    #[serde(default)]
    items: Vec<ItemDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ItemDocument {
    #[serde(default)]
    subjects: Vec<GroupDocument>,
    #[serde(default)]
    resources: Vec<GroupDocument>,
    #[serde(default)]
    actions: Vec<GroupDocument>,
    #[serde(default)]
    contexts: Vec<GroupDocument>,
}

/// A group is a list of attributes, or a single attribute standing alone.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GroupDocument {
    Many(Vec<AttributeDocument>),
    One(AttributeDocument),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttributeDocument {
    #[serde(default)]
    attribute_id: String,
    #[serde(rename = "type")]
    type_id: String,
    #[serde(default)]
    issuer: Option<String>,
    value: String,
}

impl RequestDocument {
    fn into_request(self, registry: &Registry) -> Request {
        let items = self
            .items
            .into_iter()
            .map(|item| {
                let mut built = RequestItem::new();
                for (axis, groups) in [
                    (Axis::Subject, item.subjects),
                    (Axis::Resource, item.resources),
                    (Axis::Action, item.actions),
                    (Axis::Context, item.contexts),
                ] {
                    for group in groups {
                        built.push_group(axis, group.into_group(registry));
                    }
                }
                built
            })
            .collect();
        Request { items }
    }
}

impl GroupDocument {
    fn into_group(self, registry: &Registry) -> AttributeGroup {
        let attributes = match self {
            GroupDocument::Many(many) => many,
            GroupDocument::One(one) => vec![one],
        };
        attributes
            .into_iter()
            .map(|a| {
                let attribute = RequestAttribute::new(registry, a.attribute_id, a.type_id, a.value);
                match a.issuer {
                    Some(issuer) => attribute.with_issuer(issuer),
                    None => attribute,
                }
            })
            .collect::<Vec<_>>()
            .into()
    }
}

// ============================================================================
// Tests
// ============================================================================
