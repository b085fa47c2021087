#![no_main]

use arbitrary::Arbitrary;
use gridpdp::{
    AttributeKind, Axis, CombiningAlgorithm, Decision, EvaluationContext, EvaluationMode,
    Evaluator, Function, FunctionFamily, Matcher, Policy, PolicySet, PolicyStore, Registry,
    Request, RequestAttribute, RequestItem, Rule,
};
use libfuzzer_sys::fuzz_target;

const VALUES: [&str; 4] = ["alice", "bob", "read", "delete"];

fn value(index: u8) -> &'static str {
    VALUES[usize::from(index) % VALUES.len()]
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzAlgorithm {
    DenyOverrides,
    PermitOverrides,
    FirstApplicable,
}

impl From<FuzzAlgorithm> for CombiningAlgorithm {
    fn from(f: FuzzAlgorithm) -> Self {
        match f {
            FuzzAlgorithm::DenyOverrides => Self::DenyOverrides,
            FuzzAlgorithm::PermitOverrides => Self::PermitOverrides,
            FuzzAlgorithm::FirstApplicable => Self::FirstApplicable,
        }
    }
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzMode {
    FailsOnDeny,
    StopsOnDeny,
    StopsOnPermit,
    StopsNever,
}

impl From<FuzzMode> for EvaluationMode {
    fn from(f: FuzzMode) -> Self {
        match f {
            FuzzMode::FailsOnDeny => Self::FailsOnDeny,
            FuzzMode::StopsOnDeny => Self::StopsOnDeny,
            FuzzMode::StopsOnPermit => Self::StopsOnPermit,
            FuzzMode::StopsNever => Self::StopsNever,
        }
    }
}

/// One pattern; regex patterns use the value as a prefix.
#[derive(Debug, Clone, Arbitrary)]
struct FuzzMatcher {
    value: u8,
    regex: bool,
    scoped: bool,
}

impl FuzzMatcher {
    fn build(&self) -> Matcher {
        let (family, raw) = if self.regex {
            (FunctionFamily::Match, format!("{}.*", &value(self.value)[..1]))
        } else {
            (FunctionFamily::Equal, value(self.value).to_string())
        };
        let function =
            Function::new(family, AttributeKind::String).expect("string supports both families");
        let matcher = Matcher::compile(function, &raw).expect("pattern compiles");
        if self.scoped {
            matcher.with_attribute_id("id")
        } else {
            matcher
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzRule {
    permit: bool,
    /// Axis index, then OR-list of AND-groups
    groups: Vec<(u8, Vec<FuzzMatcher>)>,
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzPolicy {
    algorithm: FuzzAlgorithm,
    rules: Vec<FuzzRule>,
}

impl FuzzPolicy {
    fn build(&self, index: usize) -> Policy {
        let mut set = PolicySet::new(format!("set-{index}"), self.algorithm.into());
        for (i, fuzz_rule) in self.rules.iter().take(8).enumerate() {
            let effect = if fuzz_rule.permit {
                gridpdp::Effect::Permit
            } else {
                gridpdp::Effect::Deny
            };
            let mut rule = Rule::new(format!("rule-{index}-{i}"), effect);
            for (axis, matchers) in fuzz_rule.groups.iter().take(4) {
                let axis = Axis::ALL[usize::from(*axis) % Axis::ALL.len()];
                let group: Vec<Matcher> = matchers.iter().take(4).map(FuzzMatcher::build).collect();
                rule = rule.with_group(axis, group);
            }
            set = set.with_child(rule);
        }
        set.into()
    }
}

/// (attribute id selector, value, unknown type)
type FuzzAttribute = (bool, u8, bool);

#[derive(Debug, Clone, Arbitrary)]
struct FuzzItem {
    subjects: Vec<Vec<FuzzAttribute>>,
    actions: Vec<Vec<FuzzAttribute>>,
}

fn group(registry: &Registry, attributes: &[FuzzAttribute]) -> Vec<RequestAttribute> {
    attributes
        .iter()
        .take(4)
        .map(|(scoped, v, unknown)| {
            let id = if *scoped { "id" } else { "other" };
            let type_id = if *unknown { "ipAddress" } else { "string" };
            RequestAttribute::new(registry, id, type_id, value(*v))
        })
        .collect()
}

fuzz_target!(|input: (FuzzAlgorithm, FuzzMode, Vec<FuzzPolicy>, Vec<FuzzItem>)| {
    let (store_algorithm, mode, policies, items) = input;
    let registry = Registry::builtin();

    let mut store = PolicyStore::new(store_algorithm.into());
    for (i, policy) in policies.iter().take(4).enumerate() {
        store = store.with_policy(policy.build(i));
    }

    let mut request = Request::new();
    for fuzz_item in items.iter().take(3) {
        let mut item = RequestItem::new();
        for g in fuzz_item.subjects.iter().take(3) {
            item = item.with_subject(group(&registry, g));
        }
        for g in fuzz_item.actions.iter().take(3) {
            item = item.with_action(group(&registry, g));
        }
        request = request.with_item(item);
    }

    let sequential = Evaluator::new(store)
        .with_mode(mode.into())
        .with_parallel_threshold(0);
    let parallel = Evaluator::new(std::sync::Arc::clone(sequential.store()))
        .with_mode(mode.into())
        .with_parallel_threshold(1);

    let response = sequential.evaluate(&request);
    let parallel_response = parallel.evaluate(&request);

    // Parallel evaluation preserves content and order
    assert_eq!(response.len(), parallel_response.len());
    for (a, b) in response.items().iter().zip(parallel_response.items()) {
        assert_eq!(a.tuple.to_string(), b.tuple.to_string());
        assert_eq!(a.policy_ids, b.policy_ids);
        assert_eq!(a.decision, b.decision);
        assert_eq!(a.decision, Decision::Permit);
    }

    // Every response item is a tuple whose trace shows a permit
    let context = EvaluationContext::new(&request);
    assert_eq!(context.len(), request.tuple_count());
    let permitted: Vec<_> = context
        .tuples()
        .iter()
        .map(|tuple| sequential.decide(tuple))
        .filter(|outcome| outcome.is_permitted())
        .collect();
    assert_eq!(permitted.len(), response.len());

    for outcome in &permitted {
        if matches!(EvaluationMode::from(mode), EvaluationMode::FailsOnDeny) {
            assert!(outcome.candidates.iter().all(|c| c.decision != Decision::Deny));
        }
        for id in &outcome.permit_set {
            assert!(
                outcome
                    .candidates
                    .iter()
                    .any(|c| &c.policy_id == id && c.decision == Decision::Permit)
            );
        }
    }
});
