//! Target expressions.
//!
//! A target has one OR-list per axis ([`AnyOf`]); each alternative is an
//! AND-list ([`AllOf`]) of [`Matcher`]s. A matcher holds when some attribute
//! of the tuple's group for that axis satisfies it.

use serde::Serialize;

use crate::context::RequestTuple;
use crate::function::{Function, Pattern};
use crate::request::{AttributeGroup, Axis};

// ============================================================================
// MatchResult
// ============================================================================

/// Outcome of matching a target (or part of one) against a tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchResult {
    Match,
    NoMatch,
    /// Matching could not be decided: an unresolved attribute or a value of
    /// the wrong kind stood in the way.
    Indeterminate,
}

impl MatchResult {
    pub fn is_match(self) -> bool {
        self == MatchResult::Match
    }

    /// Conjunction: any `NoMatch` wins, then any `Indeterminate`.
    pub fn all(results: impl IntoIterator<Item = MatchResult>) -> MatchResult {
        let mut indeterminate = false;
        for result in results {
            match result {
                MatchResult::NoMatch => return MatchResult::NoMatch,
                MatchResult::Indeterminate => indeterminate = true,
                MatchResult::Match => {}
            }
        }
        if indeterminate {
            MatchResult::Indeterminate
        } else {
            MatchResult::Match
        }
    }

    /// Disjunction: any `Match` wins, then any `Indeterminate`.
    pub fn any(results: impl IntoIterator<Item = MatchResult>) -> MatchResult {
        let mut indeterminate = false;
        for result in results {
            match result {
                MatchResult::Match => return MatchResult::Match,
                MatchResult::Indeterminate => indeterminate = true,
                MatchResult::NoMatch => {}
            }
        }
        if indeterminate {
            MatchResult::Indeterminate
        } else {
            MatchResult::NoMatch
        }
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// A `(pattern, function)` pair, optionally scoped to one attribute id.
#[derive(Debug, Clone)]
pub struct Matcher {
    attribute_id: Option<String>,
    function: Function,
    pattern: Pattern,
}

impl Matcher {
    pub fn new(function: Function, pattern: Pattern) -> Self {
        Self {
            attribute_id: None,
            function,
            pattern,
        }
    }

    /// Compiles `raw` for `function`.
    pub fn compile(function: Function, raw: &str) -> Result<Self, String> {
        Ok(Self::new(function, function.compile(raw)?))
    }

    /// Restricts candidates to request attributes with this id.
    pub fn with_attribute_id(mut self, attribute_id: impl Into<String>) -> Self {
        self.attribute_id = Some(attribute_id.into());
        self
    }

    pub fn attribute_id(&self) -> Option<&str> {
        self.attribute_id.as_deref()
    }

    pub fn function(&self) -> Function {
        self.function
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Matches against one AND-group of request attributes.
    ///
    /// Candidates are the attributes of the function's kind (and id, when
    /// scoped). If none satisfies the pattern the result is `Indeterminate`
    /// when an attribute that could have been a candidate was unresolved or,
    /// for a scoped matcher, carried a value of another kind. An unscoped
    /// matcher skips attributes of other kinds, so they only yield `NoMatch`.
    pub fn evaluate(&self, group: &AttributeGroup) -> MatchResult {
        let mut indeterminate = false;
        for attribute in group.iter() {
            if let Some(id) = &self.attribute_id
                && attribute.attribute_id() != id
            {
                continue;
            }
            let Some(value) = attribute.value() else {
                indeterminate = true;
                continue;
            };
            match self.function.evaluate(&self.pattern, value) {
                Some(true) => return MatchResult::Match,
                Some(false) => {}
                None => indeterminate |= self.attribute_id.is_some(),
            }
        }
        if indeterminate {
            MatchResult::Indeterminate
        } else {
            MatchResult::NoMatch
        }
    }
}

// ============================================================================
// AllOf / AnyOf
// ============================================================================

/// An AND-group of matchers.
#[derive(Debug, Clone, Default)]
pub struct AllOf {
    matchers: Vec<Matcher>,
}

impl AllOf {
    pub fn new(matchers: Vec<Matcher>) -> Self {
        Self { matchers }
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn evaluate(&self, group: &AttributeGroup) -> MatchResult {
        MatchResult::all(self.matchers.iter().map(|m| m.evaluate(group)))
    }
}

impl From<Vec<Matcher>> for AllOf {
    fn from(matchers: Vec<Matcher>) -> Self {
        Self::new(matchers)
    }
}

/// An OR-list of AND-groups. Empty means the axis is unconstrained.
#[derive(Debug, Clone, Default)]
pub struct AnyOf {
    groups: Vec<AllOf>,
}

impl AnyOf {
    pub fn new(groups: Vec<AllOf>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[AllOf] {
        &self.groups
    }

    pub fn push(&mut self, group: AllOf) {
        self.groups.push(group);
    }

    pub fn is_unconstrained(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn evaluate(&self, group: &AttributeGroup) -> MatchResult {
        if self.groups.is_empty() {
            return MatchResult::Match;
        }
        MatchResult::any(self.groups.iter().map(|g| g.evaluate(group)))
    }
}

// ============================================================================
// Target
// ============================================================================

/// The target expression of a rule: one [`AnyOf`] per axis.
#[derive(Debug, Clone, Default)]
pub struct Target {
    subjects: AnyOf,
    resources: AnyOf,
    actions: AnyOf,
    contexts: AnyOf,
}

impl Target {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an alternative AND-group to `axis`.
    pub fn with_group(mut self, axis: Axis, group: impl Into<AllOf>) -> Self {
        self.axis_mut(axis).push(group.into());
        self
    }

    pub fn with_axis(mut self, axis: Axis, any_of: AnyOf) -> Self {
        *self.axis_mut(axis) = any_of;
        self
    }

    pub fn axis(&self, axis: Axis) -> &AnyOf {
        match axis {
            Axis::Subject => &self.subjects,
            Axis::Resource => &self.resources,
            Axis::Action => &self.actions,
            Axis::Context => &self.contexts,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AnyOf {
        match axis {
            Axis::Subject => &mut self.subjects,
            Axis::Resource => &mut self.resources,
            Axis::Action => &mut self.actions,
            Axis::Context => &mut self.contexts,
        }
    }

    /// True when no axis is constrained, so the target matches every tuple.
    pub fn is_empty(&self) -> bool {
        Axis::ALL.iter().all(|a| self.axis(*a).is_unconstrained())
    }

    /// `Match` only if every axis matches.
    pub fn evaluate(&self, tuple: &RequestTuple) -> MatchResult {
        MatchResult::all(
            Axis::ALL
                .iter()
                .map(|axis| self.axis(*axis).evaluate(tuple.group(*axis))),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
