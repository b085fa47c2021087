//! Combining algorithms.
//!
//! An algorithm reduces the decisions of several policy nodes to one. The
//! reduction is driven lazily so that a decisive child stops evaluation of
//! the children after it.

use std::fmt::{self, Display};

use crate::context::RequestTuple;
use crate::policy::{Decision, Effect, Policy};

/// A child's decision together with its statically declared effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub decision: Decision,
    pub effect: Option<Effect>,
}

impl Outcome {
    pub fn new(decision: Decision, effect: Option<Effect>) -> Self {
        Self { decision, effect }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombiningAlgorithm {
    /// A single deny wins. An indeterminate child that would have denied
    /// makes the result indeterminate.
    DenyOverrides,
    /// Mirror image of `DenyOverrides`.
    PermitOverrides,
    /// The first child that applies decides.
    FirstApplicable,
}

impl CombiningAlgorithm {
    pub const ALL: [CombiningAlgorithm; 3] = [
        CombiningAlgorithm::DenyOverrides,
        CombiningAlgorithm::PermitOverrides,
        CombiningAlgorithm::FirstApplicable,
    ];

    pub fn id(self) -> &'static str {
        match self {
            CombiningAlgorithm::DenyOverrides => "Deny-Overrides",
            CombiningAlgorithm::PermitOverrides => "Permit-Overrides",
            CombiningAlgorithm::FirstApplicable => "First-Applicable",
        }
    }

    /// Combines `children` for `tuple`, deciding each child only as needed.
    pub fn combine(self, tuple: &RequestTuple, children: &[Policy]) -> Decision {
        self.combine_outcomes(
            children
                .iter()
                .map(|child| Outcome::new(child.decide(tuple), child.effect())),
        )
    }

    /// Combines a stream of outcomes, consuming it only up to the decisive one.
    pub fn combine_outcomes(self, outcomes: impl IntoIterator<Item = Outcome>) -> Decision {
        match self {
            CombiningAlgorithm::DenyOverrides => overrides(Effect::Deny, outcomes),
            CombiningAlgorithm::PermitOverrides => overrides(Effect::Permit, outcomes),
            CombiningAlgorithm::FirstApplicable => outcomes
                .into_iter()
                .map(|o| o.decision)
                .find(|d| *d != Decision::NotApplicable)
                .unwrap_or(Decision::NotApplicable),
        }
    }
}

impl Display for CombiningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Shared body of deny- and permit-overrides; `winner` is the overriding effect.
fn overrides(winner: Effect, outcomes: impl IntoIterator<Item = Outcome>) -> Decision {
    let winning = winner.decision();
    let losing = match winner {
        Effect::Deny => Decision::Permit,
        Effect::Permit => Decision::Deny,
    };

    let mut saw_losing = false;
    let mut potential_winner = false;
    let mut saw_indeterminate = false;

    for outcome in outcomes {
        if outcome.decision == winning {
            return winning;
        }
        if outcome.decision == losing {
            saw_losing = true;
        } else if outcome.decision == Decision::Indeterminate {
            saw_indeterminate = true;
            potential_winner |= outcome.effect == Some(winner);
        }
    }

    if potential_winner {
        Decision::Indeterminate
    } else if saw_losing {
        losing
    } else if saw_indeterminate {
        Decision::Indeterminate
    } else {
        Decision::NotApplicable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    use Decision::{Deny, Indeterminate, NotApplicable, Permit};

    fn outcomes(decisions: &[(Decision, Option<Effect>)]) -> Vec<Outcome> {
        decisions.iter().map(|(d, e)| Outcome::new(*d, *e)).collect()
    }

    fn plain(decisions: &[Decision]) -> Vec<Outcome> {
        decisions
            .iter()
            .map(|d| {
                let effect = match d {
                    Permit => Some(Effect::Permit),
                    Deny => Some(Effect::Deny),
                    _ => None,
                };
                Outcome::new(*d, effect)
            })
            .collect()
    }

    #[test_case(&[Permit, Deny, Permit], Deny; "deny wins")]
    #[test_case(&[Permit, NotApplicable], Permit; "permit without deny")]
    #[test_case(&[NotApplicable, NotApplicable], NotApplicable; "nothing applies")]
    #[test_case(&[Indeterminate, NotApplicable], Indeterminate; "error without decision")]
    #[test_case(&[Permit, Indeterminate], Permit; "permit beats plain error")]
    #[test_case(&[], NotApplicable; "no children")]
    fn test_deny_overrides(input: &[Decision], expected: Decision) {
        assert_eq!(
            CombiningAlgorithm::DenyOverrides.combine_outcomes(plain(input)),
            expected
        );
    }

    #[test_case(&[Deny, Permit, Deny], Permit; "permit wins")]
    #[test_case(&[Deny, NotApplicable], Deny; "deny without permit")]
    #[test_case(&[Indeterminate, Deny], Deny; "deny beats plain error")]
    #[test_case(&[NotApplicable], NotApplicable; "nothing applies")]
    fn test_permit_overrides(input: &[Decision], expected: Decision) {
        assert_eq!(
            CombiningAlgorithm::PermitOverrides.combine_outcomes(plain(input)),
            expected
        );
    }

    #[test]
    fn test_potential_deny_forces_indeterminate() {
        let input = outcomes(&[(Permit, Some(Effect::Permit)), (Indeterminate, Some(Effect::Deny))]);
        assert_eq!(
            CombiningAlgorithm::DenyOverrides.combine_outcomes(input),
            Indeterminate
        );
    }

    #[test]
    fn test_potential_permit_forces_indeterminate() {
        let input = outcomes(&[(Deny, Some(Effect::Deny)), (Indeterminate, Some(Effect::Permit))]);
        assert_eq!(
            CombiningAlgorithm::PermitOverrides.combine_outcomes(input),
            Indeterminate
        );
    }

    #[test]
    fn test_short_circuit_stops_consuming() {
        let mut seen = 0;
        let stream = plain(&[Permit, Deny, Permit]).into_iter().inspect(|_| seen += 1);
        assert_eq!(CombiningAlgorithm::DenyOverrides.combine_outcomes(stream), Deny);
        assert_eq!(seen, 2);
    }

    #[test_case(&[NotApplicable, Deny, Permit], Deny; "first applicable denies")]
    #[test_case(&[NotApplicable, Indeterminate, Permit], Indeterminate; "error is applicable")]
    #[test_case(&[NotApplicable], NotApplicable; "none applicable")]
    fn test_first_applicable(input: &[Decision], expected: Decision) {
        assert_eq!(
            CombiningAlgorithm::FirstApplicable.combine_outcomes(plain(input)),
            expected
        );
    }

    #[test]
    fn test_ids() {
        for alg in CombiningAlgorithm::ALL {
            assert_eq!(alg.to_string(), alg.id());
        }
    }
}
