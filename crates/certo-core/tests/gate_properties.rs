//! Property tests for the execution gate engine's invariants:
//! determinism, finalization dominance, the regression prerequisite, and
//! the mutual exclusivity of a derived-defect finding with the
//! security/performance unlock.

use std::collections::BTreeMap;

use certo_core::checklist::{
    PERFORMANCE_ITEM_ID, REGRESSION_ITEM_ID, SECURITY_ITEM_ID, default_checklist,
};
use certo_core::gate::{
    GateIds, GateInput, GateState, Phase, RegressionStatus, compute_execution_gate,
};
use certo_core::model::defect::{Defect, Severity};
use certo_core::model::item::Category;
use certo_core::model::review::{ReviewEntry, ReviewStatus};
use proptest::prelude::*;

fn review_status() -> impl Strategy<Value = ReviewStatus> {
    prop_oneof![
        Just(ReviewStatus::None),
        Just(ReviewStatus::Verified),
        Just(ReviewStatus::CannotVerify),
        Just(ReviewStatus::Hold),
    ]
}

fn template_item_id() -> impl Strategy<Value = String> {
    let ids: Vec<String> = default_checklist()
        .into_iter()
        .map(|item| item.id)
        .collect();
    proptest::sample::select(ids)
}

fn reviews() -> impl Strategy<Value = BTreeMap<String, ReviewEntry>> {
    proptest::collection::btree_map(
        template_item_id(),
        review_status().prop_map(|status| ReviewEntry::new(status, 1_000)),
        0..8,
    )
}

fn defects() -> impl Strategy<Value = Vec<Defect>> {
    proptest::collection::vec((1u8..=4u8, any::<bool>()), 0..8).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(index, (cycle, derived))| Defect {
                id: format!("df-{:03}", index + 1),
                title: format!("generated defect {index}"),
                summary: None,
                severity: Severity::Major,
                report_cycle: cycle,
                derived,
                created_at_us: 1_000 + i64::try_from(index).unwrap_or(0),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn recomputation_is_deterministic(
        reviews in reviews(),
        defects in defects(),
        finalized in any::<bool>(),
    ) {
        let checklist = default_checklist();
        let input = GateInput {
            checklist: &checklist,
            reviews: &reviews,
            defects: &defects,
            finalized,
        };
        let ids = GateIds::default();

        let first = compute_execution_gate(&input, &ids);
        let second = compute_execution_gate(&input, &ids);

        prop_assert_eq!(first.item_gates, second.item_gates);
        // Everything except the wall-clock stamp must match exactly.
        prop_assert_eq!(first.execution_state.phase, second.execution_state.phase);
        prop_assert_eq!(
            first.execution_state.feature_regression_status,
            second.execution_state.feature_regression_status
        );
        prop_assert_eq!(
            first.execution_state.allow_security_performance,
            second.execution_state.allow_security_performance
        );
        prop_assert_eq!(
            first.execution_state.derived_found_in_feature_regression,
            second.execution_state.derived_found_in_feature_regression
        );
        prop_assert_eq!(
            first.execution_state.finalized_at.is_some(),
            second.execution_state.finalized_at.is_some()
        );
    }

    #[test]
    fn derived_found_never_coexists_with_allow(
        reviews in reviews(),
        defects in defects(),
        finalized in any::<bool>(),
    ) {
        let checklist = default_checklist();
        let outcome = compute_execution_gate(
            &GateInput {
                checklist: &checklist,
                reviews: &reviews,
                defects: &defects,
                finalized,
            },
            &GateIds::default(),
        );

        let state = &outcome.execution_state;
        prop_assert!(
            !(state.feature_regression_status == RegressionStatus::DerivedFound
                && state.allow_security_performance),
            "DERIVED_FOUND with the unlock flag set: {state:?}"
        );
    }

    #[test]
    fn finalization_dominates_every_other_rule(
        reviews in reviews(),
        defects in defects(),
    ) {
        let checklist = default_checklist();
        let outcome = compute_execution_gate(
            &GateInput {
                checklist: &checklist,
                reviews: &reviews,
                defects: &defects,
                finalized: true,
            },
            &GateIds::default(),
        );

        for item in &checklist {
            let gate = outcome.gate_for(&item.id).expect("every item has a gate");
            if item.category == Category::Execution {
                prop_assert_eq!(gate.state, GateState::BlockedByFinalization);
            } else {
                prop_assert_eq!(gate.state, GateState::Enabled);
            }
        }
        prop_assert!(!outcome.execution_state.allow_security_performance);
        prop_assert!(outcome.execution_state.finalized_at.is_some());
    }

    #[test]
    fn phase_matches_cycle_thresholds(
        reviews in reviews(),
        defects in defects(),
    ) {
        let checklist = default_checklist();
        let outcome = compute_execution_gate(
            &GateInput {
                checklist: &checklist,
                reviews: &reviews,
                defects: &defects,
                finalized: false,
            },
            &GateIds::default(),
        );

        let max_cycle = defects.iter().map(|d| d.report_cycle).max().unwrap_or(0);
        let regression_done = reviews
            .get(REGRESSION_ITEM_ID)
            .is_some_and(|entry| entry.status.is_terminal());

        let expected = if max_cycle >= 4 {
            Phase::Patch2Final
        } else if max_cycle >= 3 || regression_done {
            Phase::Patch1Regression
        } else {
            Phase::Initial
        };
        prop_assert_eq!(outcome.execution_state.phase, expected);
    }

    #[test]
    fn security_and_performance_gates_agree_with_allow_flag(
        reviews in reviews(),
        defects in defects(),
    ) {
        let checklist = default_checklist();
        let outcome = compute_execution_gate(
            &GateInput {
                checklist: &checklist,
                reviews: &reviews,
                defects: &defects,
                finalized: false,
            },
            &GateIds::default(),
        );

        let allow = outcome.execution_state.allow_security_performance;
        for id in [SECURITY_ITEM_ID, PERFORMANCE_ITEM_ID] {
            let gate = outcome.gate_for(id).expect("on checklist");
            prop_assert_eq!(
                gate.is_enabled(),
                allow,
                "gate for {} disagrees with allowSecurityPerformance",
                id
            );
        }
    }

    #[test]
    fn empty_checklist_never_panics(
        reviews in reviews(),
        defects in defects(),
        finalized in any::<bool>(),
    ) {
        let outcome = compute_execution_gate(
            &GateInput {
                checklist: &[],
                reviews: &reviews,
                defects: &defects,
                finalized,
            },
            &GateIds::default(),
        );
        prop_assert!(outcome.item_gates.is_empty());
    }
}
