//! # gridpdp: Policy Decision Point for grid authorization
//!
//! Evaluates authorization requests against declarative policies built from
//! typed attributes, OR-of-AND target expressions and combining algorithms.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Request                                     │
//! │  items × (subjects, resources, actions,      │
//! │           contexts) as OR-lists of AND-groups│
//! └─────────────────┬───────────────────────────┘
//!                   │ EvaluationContext::new / split
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  RequestTuple (one group per axis)           │
//! └─────────────────┬───────────────────────────┘
//!                   │ PolicyStore::find_policy
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Evaluator                                   │
//! │  ├─ Policy::eval (Rule effect / PolicySet    │
//! │  │  combined by its CombiningAlgorithm)      │
//! │  ├─ Permit set per EvaluationMode            │
//! │  └─ Store algorithm for the aggregate        │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Response                                    │
//! │  one ResponseItem per permitted tuple;       │
//! │  absent tuples are denied                    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use gridpdp::{
//!     CombiningAlgorithm, Evaluator, Format, PolicyBuilder, PolicyStore, Registry, Request,
//!     RequestAttribute, RequestItem,
//! };
//! use std::path::Path;
//!
//! let registry = Registry::builtin();
//! let policy = PolicyBuilder::new(&registry)
//!     .parse_str(
//!         r#"{
//!             "id": "grid",
//!             "combining_algorithm": "Deny-Overrides",
//!             "children": [
//!                 {"id": "alice", "effect": "Permit",
//!                  "subjects": {"type": "x500Name", "entries": ["/O=Grid/CN=Alice"]}},
//!                 {"id": "no-delete", "effect": "Deny",
//!                  "actions": {"type": "string", "entries": ["delete"]}}
//!             ]
//!         }"#,
//!         Format::Json,
//!         Path::new("."),
//!     )
//!     .unwrap();
//!
//! let store = PolicyStore::new(CombiningAlgorithm::PermitOverrides).with_policy(policy);
//! let evaluator = Evaluator::new(store);
//!
//! let alice = vec![RequestAttribute::new(&registry, "dn", "x500Name", "/O=Grid/CN=Alice")];
//! let read = Request::new().with_item(
//!     RequestItem::new()
//!         .with_subject(alice.clone())
//!         .with_action(vec![RequestAttribute::new(&registry, "", "string", "read")]),
//! );
//! let delete = Request::new().with_item(
//!     RequestItem::new()
//!         .with_subject(alice)
//!         .with_action(vec![RequestAttribute::new(&registry, "", "string", "delete")]),
//! );
//!
//! assert!(evaluator.evaluate(&read).is_permitted());
//! assert!(!evaluator.evaluate(&delete).is_permitted());
//! ```

pub mod algorithm;
pub mod context;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod function;
pub mod pdp;
pub mod policy;
pub mod registry;
pub mod request;
pub mod store;
pub mod target;
pub mod temporal;
pub mod value;

pub use algorithm::{CombiningAlgorithm, Outcome};
pub use context::{EvaluationContext, RequestTuple, split};
pub use document::{Format, PolicyBuilder, PolicyDocument};
pub use error::{PdpError, PolicyError, RegistryError, RequestError, ValueError};
pub use evaluator::{
    CandidateDecision, EvaluationMode, Evaluator, Response, ResponseItem, TupleOutcome,
};
pub use function::{Function, FunctionFamily, Pattern};
pub use pdp::{PdpOptions, PolicyDecisionPoint};
pub use policy::{Decision, Effect, Policy, PolicySet, Rule};
pub use registry::{Registry, RegistryBuilder};
pub use request::{AttributeGroup, Axis, Request, RequestAttribute, RequestItem};
pub use store::PolicyStore;
pub use target::{AllOf, AnyOf, MatchResult, Matcher, Target};
pub use temporal::{Duration, Period};
pub use value::{AttributeKind, AttributeValue};
