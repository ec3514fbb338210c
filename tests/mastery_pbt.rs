//! Property-based tests for the mastery core.
//!
//! Invariants:
//! - Estimated mastery always stays inside [0, 1], for any history.
//! - Dependency caps never raise a score and never leave [0, 1].
//! - Weak-concept ranking is strictly below threshold and ascending.
//! - Bandit arm updates keep statistics finite and symmetric.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use proptest::prelude::*;

use edapt_engine::adaptive::config::{DependencyConfig, MasteryWeights};
use edapt_engine::adaptive::decision::ArmParameters;
use edapt_engine::adaptive::dependencies::{apply_dependency_caps, ConceptGraph};
use edapt_engine::adaptive::mastery::{weak_concepts, MasteryEstimator};
use edapt_engine::adaptive::types::{AnswerEvent, Difficulty};

fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Medium),
        Just(Difficulty::Hard),
    ]
}

fn arb_answer() -> impl Strategy<Value = AnswerEvent> {
    (
        prop_oneof![
            Just(None),
            Just(Some("Loops".to_string())),
            Just(Some("Variables".to_string())),
        ],
        any::<bool>(),
        arb_difficulty(),
        proptest::option::of(0i64..365),
        1000i64..60_000,
    )
        .prop_map(|(concept, is_correct, difficulty, days_ago, time_spent_ms)| {
            AnswerEvent {
                concept,
                is_correct,
                difficulty,
                timestamp: days_ago.map(|d| Utc::now() - Duration::days(d)),
                time_spent_ms,
            }
        })
}

fn arb_scores() -> impl Strategy<Value = HashMap<String, f64>> {
    proptest::collection::hash_map(
        prop_oneof![
            Just("Variables".to_string()),
            Just("Functions".to_string()),
            Just("Loops".to_string()),
            Just("Arrays".to_string()),
            Just("Objects".to_string()),
            Just("Async".to_string()),
        ],
        0.0f64..=1.0,
        0..6,
    )
}

proptest! {
    #[test]
    fn mastery_always_in_unit_interval(answers in proptest::collection::vec(arb_answer(), 0..50)) {
        let estimator = MasteryEstimator::new(MasteryWeights::default());
        let scores = estimator.estimate(&answers, Utc::now());
        for (_, score) in &scores {
            prop_assert!(*score >= 0.0 && *score <= 1.0);
        }
    }

    #[test]
    fn dependency_caps_never_raise_scores(scores in arb_scores()) {
        let graph = ConceptGraph::with_default_curriculum();
        let capped = apply_dependency_caps(&scores, &graph, &DependencyConfig::default());
        prop_assert_eq!(capped.len(), scores.len());
        for (concept, &score) in &scores {
            let after = capped[concept];
            prop_assert!(after <= score + 1e-12);
            prop_assert!((0.0..=1.0).contains(&after));
        }
    }

    #[test]
    fn weak_concepts_strictly_below_and_sorted(scores in arb_scores(), threshold in 0.0f64..=1.0) {
        let weak = weak_concepts(&scores, threshold);
        for entry in &weak {
            prop_assert!(entry.mastery < threshold);
        }
        for pair in weak.windows(2) {
            prop_assert!(pair[0].mastery <= pair[1].mastery);
        }
    }

    #[test]
    fn arm_updates_stay_finite_and_symmetric(
        rewards in proptest::collection::vec(0.0f64..=1.0, 1..20),
        score in 0.0f64..=1.0,
    ) {
        let mut arm = ArmParameters::new("r1", 4);
        let x = vec![score, 1.0, 0.0, 0.0];
        for reward in rewards {
            arm.update(&x, reward);
        }
        for i in 0..4 {
            for j in 0..4 {
                prop_assert!(arm.a[i][j].is_finite());
                prop_assert!((arm.a[i][j] - arm.a[j][i]).abs() < 1e-9);
            }
        }
        let ucb = arm.ucb_score(&x, 1.0);
        prop_assert!(ucb.is_finite());
    }
}
