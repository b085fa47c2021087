//! Request evaluation.
//!
//! For each tuple of a request the evaluator asks the store for candidate
//! policies, decides them in order under the configured [`EvaluationMode`],
//! and records a [`ResponseItem`] when the tuple ends with a non-empty permit
//! set. Tuples without one are absent from the [`Response`]: absence is the
//! deny decision.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::algorithm::Outcome;
use crate::context::{EvaluationContext, RequestTuple};
use crate::policy::{Decision, Effect};
use crate::request::Request;
use crate::store::PolicyStore;

/// Tuple count from which evaluation is spread over the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

// ============================================================================
// EvaluationMode
// ============================================================================

/// How candidate decisions build a tuple's permit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationMode {
    /// A deny empties the permit set and stops.
    #[default]
    FailsOnDeny,
    /// A deny stops; permits seen before it are kept.
    StopsOnDeny,
    /// The first permit stops.
    StopsOnPermit,
    /// Every candidate is evaluated; denies are ignored.
    StopsNever,
}

// ============================================================================
// Outcomes
// ============================================================================

/// One top-level candidate and what it decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateDecision {
    pub policy_id: String,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
}

/// Everything the evaluator learned about one tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TupleOutcome {
    /// Candidates in the order they were decided. Later candidates are
    /// missing when the mode stopped early.
    pub candidates: Vec<CandidateDecision>,
    /// Ids of the policies that contributed a permit.
    pub permit_set: Vec<String>,
    /// The store algorithm applied to the decided candidates.
    pub decision: Decision,
}

impl TupleOutcome {
    pub fn is_permitted(&self) -> bool {
        !self.permit_set.is_empty()
    }
}

/// A permitted tuple. `decision` is always `Permit`; the store aggregate
/// over every decided candidate lives in [`TupleOutcome::decision`].
#[derive(Debug, Clone, Serialize)]
pub struct ResponseItem {
    pub tuple: RequestTuple,
    pub decision: Decision,
    pub policy_ids: Vec<String>,
}

/// Permitted tuples in request order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Response {
    items: Vec<ResponseItem>,
}

impl Response {
    pub fn items(&self) -> &[ResponseItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when at least one tuple was permitted.
    pub fn is_permitted(&self) -> bool {
        !self.items.is_empty()
    }
}

impl IntoIterator for Response {
    type Item = ResponseItem;
    type IntoIter = std::vec::IntoIter<ResponseItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluates requests against one store snapshot.
#[derive(Debug, Clone)]
pub struct Evaluator {
    store: Arc<PolicyStore>,
    mode: EvaluationMode,
    parallel_threshold: usize,
}

impl Evaluator {
    pub fn new(store: impl Into<Arc<PolicyStore>>) -> Self {
        Self {
            store: store.into(),
            mode: EvaluationMode::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Zero disables parallel evaluation.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    pub fn evaluate(&self, request: &Request) -> Response {
        self.evaluate_with(request, &self.store)
    }

    /// Evaluates against `store` instead of the evaluator's own.
    pub fn evaluate_with(&self, request: &Request, store: &PolicyStore) -> Response {
        let tuples = EvaluationContext::new(request).into_tuples();
        let count = tuples.len();
        let parallel = self.parallel_threshold > 0 && count >= self.parallel_threshold;

        let to_item = |tuple: RequestTuple| {
            let outcome = self.decide_with(&tuple, store);
            outcome.is_permitted().then(|| ResponseItem {
                tuple,
                decision: Decision::Permit,
                policy_ids: outcome.permit_set,
            })
        };

        let items: Vec<ResponseItem> = if parallel {
            tuples.into_par_iter().filter_map(to_item).collect()
        } else {
            tuples.into_iter().filter_map(to_item).collect()
        };

        debug!(
            tuples = count,
            permitted = items.len(),
            parallel,
            "Request evaluated"
        );
        Response { items }
    }

    pub fn decide(&self, tuple: &RequestTuple) -> TupleOutcome {
        self.decide_with(tuple, &self.store)
    }

    /// Decides one tuple, keeping the per-candidate trace.
    pub fn decide_with(&self, tuple: &RequestTuple, store: &PolicyStore) -> TupleOutcome {
        let mut candidates = Vec::new();
        let mut permit_set = Vec::new();

        for policy in store.find_policy(tuple) {
            let decision = policy.eval(tuple);
            debug!(policy_id = policy.id(), %decision, "Candidate decided");
            if decision == Decision::Indeterminate {
                warn!(policy_id = policy.id(), tuple = %tuple, "Candidate is indeterminate");
            }
            candidates.push(CandidateDecision {
                policy_id: policy.id().to_string(),
                decision,
                effect: policy.effect(),
            });

            match (decision, self.mode) {
                (Decision::Deny, EvaluationMode::FailsOnDeny) => {
                    permit_set.clear();
                    break;
                }
                (Decision::Deny, EvaluationMode::StopsOnDeny) => break,
                (Decision::Permit, mode) => {
                    permit_set.push(policy.id().to_string());
                    if mode == EvaluationMode::StopsOnPermit {
                        break;
                    }
                }
                _ => {}
            }
        }

        let decision = store.algorithm().combine_outcomes(
            candidates
                .iter()
                .map(|c| Outcome::new(c.decision, c.effect)),
        );
        TupleOutcome {
            candidates,
            permit_set,
            decision,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::CombiningAlgorithm;
    use crate::policy::{PolicySet, Rule};
    use crate::registry::Registry;
    use crate::request::{Axis, RequestAttribute, RequestItem};
    use test_case::test_case;

    fn store(effects: &[Effect], algorithm: CombiningAlgorithm) -> PolicyStore {
        effects
            .iter()
            .enumerate()
            .fold(PolicyStore::new(algorithm), |store, (i, effect)| {
                store.with_policy(Rule::new(format!("p{i}"), *effect))
            })
    }

    fn tuple() -> RequestTuple {
        RequestTuple::default()
    }

    #[test]
    fn test_deny_clears_permit_set() {
        use Effect::{Deny, Permit};
        let evaluator = Evaluator::new(store(&[Permit, Deny, Permit], CombiningAlgorithm::DenyOverrides));
        let outcome = evaluator.decide(&tuple());
        assert_eq!(outcome.decision, Decision::Deny);
        assert!(outcome.permit_set.is_empty());
        assert_eq!(outcome.candidates.len(), 2, "evaluation stops at the deny");
    }

    #[test]
    fn test_permit_overrides_aggregate() {
        use Effect::{Deny, Permit};
        let evaluator = Evaluator::new(store(&[Deny, Permit, Deny], CombiningAlgorithm::PermitOverrides))
            .with_mode(EvaluationMode::StopsNever);
        let outcome = evaluator.decide(&tuple());
        assert_eq!(outcome.decision, Decision::Permit);
        assert_eq!(outcome.permit_set, vec!["p1".to_string()]);
    }

    #[test_case(EvaluationMode::FailsOnDeny, &[]; "fails on deny")]
    #[test_case(EvaluationMode::StopsOnDeny, &["p0"]; "stops on deny")]
    #[test_case(EvaluationMode::StopsOnPermit, &["p0"]; "stops on permit")]
    #[test_case(EvaluationMode::StopsNever, &["p0", "p2"]; "stops never")]
    fn test_modes(mode: EvaluationMode, expected: &[&str]) {
        use Effect::{Deny, Permit};
        let evaluator =
            Evaluator::new(store(&[Permit, Deny, Permit], CombiningAlgorithm::PermitOverrides))
                .with_mode(mode);
        let outcome = evaluator.decide(&tuple());
        assert_eq!(outcome.permit_set, expected);
    }

    #[test_case(EvaluationMode::StopsNever, CombiningAlgorithm::DenyOverrides, Decision::Deny; "stops never deny overrides")]
    #[test_case(EvaluationMode::StopsOnDeny, CombiningAlgorithm::DenyOverrides, Decision::Deny; "stops on deny deny overrides")]
    #[test_case(EvaluationMode::StopsNever, CombiningAlgorithm::PermitOverrides, Decision::Permit; "stops never permit overrides")]
    #[test_case(EvaluationMode::StopsOnDeny, CombiningAlgorithm::FirstApplicable, Decision::Permit; "stops on deny first applicable")]
    fn test_permitted_item_is_labelled_permit(
        mode: EvaluationMode,
        algorithm: CombiningAlgorithm,
        aggregate: Decision,
    ) {
        use Effect::{Deny, Permit};
        let evaluator = Evaluator::new(store(&[Permit, Deny], algorithm)).with_mode(mode);

        let outcome = evaluator.decide(&tuple());
        assert_eq!(outcome.decision, aggregate);

        let response = evaluator.evaluate(&Request::new().with_item(RequestItem::new()));
        assert_eq!(response.len(), 1);
        assert_eq!(response.items()[0].decision, Decision::Permit);
        assert_eq!(response.items()[0].policy_ids, vec!["p0".to_string()]);
    }

    #[test]
    fn test_response_only_holds_permitted_tuples() {
        let r = Registry::builtin();
        let f = crate::function::Function::new(
            crate::function::FunctionFamily::Equal,
            crate::value::AttributeKind::String,
        )
        .unwrap();
        let alice = crate::target::Matcher::compile(f, "alice").unwrap();
        let store = PolicyStore::new(CombiningAlgorithm::PermitOverrides).with_policy(
            PolicySet::new("set", CombiningAlgorithm::DenyOverrides)
                .with_child(Rule::new("alice", Effect::Permit).with_group(Axis::Subject, vec![alice])),
        );

        let request = Request::new().with_item(
            RequestItem::new()
                .with_subject(vec![RequestAttribute::new(&r, "", "string", "bob")])
                .with_subject(vec![RequestAttribute::new(&r, "", "string", "alice")]),
        );
        let response = Evaluator::new(store).evaluate(&request);
        assert_eq!(response.len(), 1);
        assert!(response.is_permitted());
        let item = &response.items()[0];
        assert_eq!(item.tuple.subject()[0].raw_value(), "alice");
        assert_eq!(item.policy_ids, vec!["set".to_string()]);
        assert_eq!(item.decision, Decision::Permit);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let r = Registry::builtin();
        let store = Arc::new(store(&[Effect::Permit], CombiningAlgorithm::PermitOverrides));
        let mut item = RequestItem::new();
        for i in 0..100 {
            item = item.with_subject(vec![RequestAttribute::new(&r, "", "string", i.to_string())]);
        }
        let request = Request::new().with_item(item);

        let sequential = Evaluator::new(Arc::clone(&store))
            .with_parallel_threshold(0)
            .evaluate(&request);
        let parallel = Evaluator::new(store).with_parallel_threshold(8).evaluate(&request);

        let order = |resp: &Response| -> Vec<String> {
            resp.items()
                .iter()
                .map(|i| i.tuple.subject()[0].raw_value().to_string())
                .collect()
        };
        assert_eq!(order(&sequential), order(&parallel));
        assert_eq!(parallel.len(), 100);
    }

    #[test]
    fn test_empty_store_denies() {
        let evaluator = Evaluator::new(PolicyStore::new(CombiningAlgorithm::PermitOverrides));
        let response = evaluator.evaluate(&Request::new().with_item(RequestItem::new()));
        assert!(!response.is_permitted());
        assert_eq!(evaluator.decide(&tuple()).decision, Decision::NotApplicable);
    }

    #[test]
    fn test_mode_serde() {
        let mode: EvaluationMode = serde_json::from_str("\"stops-on-permit\"").unwrap();
        assert_eq!(mode, EvaluationMode::StopsOnPermit);
    }
}
