//! The policy tree.
//!
//! Leaves are [`Rule`]s carrying an [`Effect`] and a [`Target`]; interior
//! nodes are [`PolicySet`]s that combine their children with a
//! [`CombiningAlgorithm`]. Trees are built once at load time and never
//! mutated afterwards.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::algorithm::CombiningAlgorithm;
use crate::context::RequestTuple;
use crate::request::Axis;
use crate::target::{AllOf, MatchResult, Target};

// ============================================================================
// Effect / Decision
// ============================================================================

/// The outcome statically attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Permit,
    Deny,
}

impl Effect {
    pub fn decision(self) -> Decision {
        match self {
            Effect::Permit => Decision::Permit,
            Effect::Deny => Decision::Deny,
        }
    }
}

impl Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.decision(), f)
    }
}

/// Result of evaluating a policy node against a tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Permit,
    Deny,
    Indeterminate,
    NotApplicable,
}

impl Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Permit => "Permit",
            Decision::Deny => "Deny",
            Decision::Indeterminate => "Indeterminate",
            Decision::NotApplicable => "NotApplicable",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Rule / PolicySet
// ============================================================================

/// A leaf node: when its target matches, it evaluates to its effect.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub description: Option<String>,
    pub effect: Effect,
    pub target: Target,
}

impl Rule {
    pub fn new(id: impl Into<String>, effect: Effect) -> Self {
        Self {
            id: id.into(),
            description: None,
            effect,
            target: Target::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Adds an alternative AND-group to one axis of the target.
    pub fn with_group(mut self, axis: Axis, group: impl Into<AllOf>) -> Self {
        self.target = self.target.with_group(axis, group);
        self
    }
}

/// An interior node combining its children.
///
/// With no target of its own a set always matches and leaves discrimination
/// to its rules.
#[derive(Debug, Clone)]
pub struct PolicySet {
    pub id: String,
    pub description: Option<String>,
    pub algorithm: CombiningAlgorithm,
    pub target: Option<Target>,
    pub children: Vec<Policy>,
}

impl PolicySet {
    pub fn new(id: impl Into<String>, algorithm: CombiningAlgorithm) -> Self {
        Self {
            id: id.into(),
            description: None,
            algorithm,
            target: None,
            children: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_child(mut self, child: impl Into<Policy>) -> Self {
        self.children.push(child.into());
        self
    }
}

// ============================================================================
// Policy
// ============================================================================

/// A node of the policy tree.
#[derive(Debug, Clone)]
pub enum Policy {
    Rule(Rule),
    Set(PolicySet),
}

impl From<Rule> for Policy {
    fn from(rule: Rule) -> Self {
        Policy::Rule(rule)
    }
}

impl From<PolicySet> for Policy {
    fn from(set: PolicySet) -> Self {
        Policy::Set(set)
    }
}

impl Policy {
    pub fn id(&self) -> &str {
        match self {
            Policy::Rule(rule) => &rule.id,
            Policy::Set(set) => &set.id,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Policy::Rule(rule) => rule.description.as_deref(),
            Policy::Set(set) => set.description.as_deref(),
        }
    }

    /// The statically declared effect. Only rules have one.
    pub fn effect(&self) -> Option<Effect> {
        match self {
            Policy::Rule(rule) => Some(rule.effect),
            Policy::Set(_) => None,
        }
    }

    pub fn children(&self) -> &[Policy] {
        match self {
            Policy::Rule(_) => &[],
            Policy::Set(set) => &set.children,
        }
    }

    /// Number of rules in this subtree.
    pub fn rule_count(&self) -> usize {
        match self {
            Policy::Rule(_) => 1,
            Policy::Set(set) => set.children.iter().map(Policy::rule_count).sum(),
        }
    }

    pub fn matches(&self, tuple: &RequestTuple) -> MatchResult {
        match self {
            Policy::Rule(rule) => rule.target.evaluate(tuple),
            Policy::Set(set) => set
                .target
                .as_ref()
                .map_or(MatchResult::Match, |t| t.evaluate(tuple)),
        }
    }

    /// Evaluates a node whose target is already known to match.
    pub fn eval(&self, tuple: &RequestTuple) -> Decision {
        match self {
            Policy::Rule(rule) => rule.effect.decision(),
            Policy::Set(set) => set.algorithm.combine(tuple, &set.children),
        }
    }

    /// `matches` then, on a match, `eval`.
    pub fn decide(&self, tuple: &RequestTuple) -> Decision {
        match self.matches(tuple) {
            MatchResult::Match => self.eval(tuple),
            MatchResult::NoMatch => Decision::NotApplicable,
            MatchResult::Indeterminate => Decision::Indeterminate,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
