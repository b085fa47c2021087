//! Property-based tests using proptest.
//!
//! Invariants of tuple expansion, value encoding and the combining algorithms
//! that must hold for all inputs.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use gridpdp::{
    AttributeValue, CombiningAlgorithm, Decision, Duration, Effect, Outcome, Period, Registry,
    RequestAttribute, RequestItem, split,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// 1970 to roughly 2200, whole seconds.
fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..7_258_118_400).prop_map(|s| DateTime::from_timestamp(s, 0).unwrap_or_default())
}

fn duration() -> impl Strategy<Value = Duration> {
    prop_oneof![
        3 => (0u32..1_200, 0i64..1_000_000_000),
        1 => (any::<u32>(), 0i64..=i64::MAX),
    ]
    .prop_map(|(months, seconds)| Duration::new(months, seconds).unwrap_or_default())
}

fn attribute_value() -> impl Strategy<Value = AttributeValue> {
    prop_oneof![
        "\\PC{0,40}".prop_map(AttributeValue::String),
        instant().prop_map(AttributeValue::DateTime),
        (0i32..200_000).prop_map(|days| {
            let date = NaiveDate::from_num_days_from_ce_opt(700_000 + days).unwrap_or_default();
            AttributeValue::Date(date)
        }),
        (0u32..86_400, 0u32..1_000).prop_map(|(secs, millis)| {
            let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, millis * 1_000_000)
                .unwrap_or_default();
            AttributeValue::Time(time)
        }),
        duration().prop_map(AttributeValue::Duration),
        (instant(), 0i64..1_000_000_000).prop_map(|(start, len)| {
            let end = start + chrono::TimeDelta::seconds(len);
            AttributeValue::Period(Period::new(start, end).unwrap_or_else(|| unreachable!()))
        }),
        (instant(), duration()).prop_filter_map("period overflows", |(start, d)| {
            Period::starting_at(start, d).map(AttributeValue::Period)
        }),
        "[a-z]{1,8}://[a-z0-9.]{1,20}(/[a-z0-9]{0,10}){0,3}".prop_map(AttributeValue::AnyUri),
        "(/[A-Z]{1,2}=[A-Za-z0-9 ]{0,10}[A-Za-z0-9]){1,4}".prop_map(AttributeValue::X500Name),
    ]
}

fn outcome() -> impl Strategy<Value = Outcome> {
    (
        prop_oneof![
            Just(Decision::Permit),
            Just(Decision::Deny),
            Just(Decision::Indeterminate),
            Just(Decision::NotApplicable),
        ],
        prop_oneof![Just(None), Just(Some(Effect::Permit)), Just(Some(Effect::Deny))],
    )
        .prop_map(|(decision, effect)| Outcome::new(decision, effect))
}

fn decided(outcomes: &[Outcome], d: Decision) -> bool {
    outcomes.iter().any(|o| o.decision == d)
}

proptest! {
    // ========================================================================
    // Tuple expansion
    // ========================================================================

    /// split() yields max(n,1) per axis, multiplied.
    #[test]
    fn tuple_count(ns in 0usize..5, nr in 0usize..5, na in 0usize..5, nc in 0usize..5) {
        let registry = Registry::builtin();
        let group = |i: usize| vec![RequestAttribute::new(&registry, "", "string", i.to_string())];
        let mut item = RequestItem::new();
        for i in 0..ns { item = item.with_subject(group(i)); }
        for i in 0..nr { item = item.with_resource(group(i)); }
        for i in 0..na { item = item.with_action(group(i)); }
        for i in 0..nc { item = item.with_context(group(i)); }

        let expected = ns.max(1) * nr.max(1) * na.max(1) * nc.max(1);
        prop_assert_eq!(split(&item).len(), expected);
        prop_assert_eq!(item.tuple_count(), expected);
    }

    // ========================================================================
    // Value encoding
    // ========================================================================

    /// Parsing a value's canonical encoding reproduces an equal value.
    #[test]
    fn encode_then_create_is_equal(value in attribute_value()) {
        let registry = Registry::builtin();
        let created = registry
            .attributes()
            .create(&value.encode(), value.type_id())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(created.equal(&value), Some(true));
        prop_assert_eq!(created.encode(), value.encode());
    }

    // ========================================================================
    // Combining algorithms
    // ========================================================================

    #[test]
    fn deny_overrides_invariants(outcomes in prop::collection::vec(outcome(), 0..8)) {
        let result = CombiningAlgorithm::DenyOverrides.combine_outcomes(outcomes.clone());
        if decided(&outcomes, Decision::Deny) {
            prop_assert_eq!(result, Decision::Deny);
        } else if !decided(&outcomes, Decision::Indeterminate) {
            let expected = if decided(&outcomes, Decision::Permit) {
                Decision::Permit
            } else {
                Decision::NotApplicable
            };
            prop_assert_eq!(result, expected);
        } else {
            prop_assert_ne!(result, Decision::Deny);
            prop_assert_ne!(result, Decision::NotApplicable);
        }
    }

    #[test]
    fn permit_overrides_invariants(outcomes in prop::collection::vec(outcome(), 0..8)) {
        let result = CombiningAlgorithm::PermitOverrides.combine_outcomes(outcomes.clone());
        if decided(&outcomes, Decision::Permit) {
            prop_assert_eq!(result, Decision::Permit);
        } else if !decided(&outcomes, Decision::Indeterminate) {
            let expected = if decided(&outcomes, Decision::Deny) {
                Decision::Deny
            } else {
                Decision::NotApplicable
            };
            prop_assert_eq!(result, expected);
        } else {
            prop_assert_ne!(result, Decision::Permit);
            prop_assert_ne!(result, Decision::NotApplicable);
        }
    }

    /// The overrides algorithms do not depend on child order.
    #[test]
    fn overrides_ignore_order(outcomes in prop::collection::vec(outcome(), 0..8)) {
        let reversed: Vec<Outcome> = outcomes.iter().rev().copied().collect();
        for alg in [CombiningAlgorithm::DenyOverrides, CombiningAlgorithm::PermitOverrides] {
            prop_assert_eq!(
                alg.combine_outcomes(outcomes.clone()),
                alg.combine_outcomes(reversed.clone())
            );
        }
    }

    #[test]
    fn first_applicable_takes_first(outcomes in prop::collection::vec(outcome(), 0..8)) {
        let expected = outcomes
            .iter()
            .map(|o| o.decision)
            .find(|d| *d != Decision::NotApplicable)
            .unwrap_or(Decision::NotApplicable);
        prop_assert_eq!(
            CombiningAlgorithm::FirstApplicable.combine_outcomes(outcomes),
            expected
        );
    }
}
