//! The execution gate engine.
//!
//! A pure function from the current snapshot of {checklist, review
//! judgements, defects, finalized flag} to per-item enablement gates plus
//! the overall execution phase state. No I/O and no mutable state: callers
//! recompute on every relevant change and persist the returned
//! [`ExecutionState`] themselves (see `db::query::append_snapshot`).
//!
//! Gating rules, in precedence order:
//! 1. Finalization freezes every `execution`-category item.
//! 2. Until the post-patch regression item reaches a terminal judgement
//!    (pass *or* fail), security and performance testing stay disabled.
//! 3. A derived defect at or after the regression cycle disables security
//!    and performance testing even once regression is done.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checklist;
use crate::model::defect::{Defect, FINAL_CYCLE, REGRESSION_CYCLE};
use crate::model::item::{Category, ChecklistItem};
use crate::model::review::ReviewEntry;

/// Reason shown on items frozen by finalization.
pub const REASON_FINALIZED: &str =
    "execution results are finalized; this item can no longer change";
/// Reason shown on security/performance items before regression completes.
pub const REASON_REGRESSION_PENDING: &str =
    "waiting on the post-patch functional regression result";
/// Reason shown on security/performance items after a derived defect.
pub const REASON_DERIVED_DEFECT: &str =
    "a derived defect was found in regression; security and performance testing is skipped";

/// The checklist item ids the gate engine treats specially, injected so the
/// engine never depends on a concrete id scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateIds {
    /// Functional regression test, cycle after the first patch.
    pub regression: String,
    /// Security testing.
    pub security: String,
    /// Performance and load testing.
    pub performance: String,
}

impl Default for GateIds {
    fn default() -> Self {
        Self {
            regression: checklist::REGRESSION_ITEM_ID.to_string(),
            security: checklist::SECURITY_ITEM_ID.to_string(),
            performance: checklist::PERFORMANCE_ITEM_ID.to_string(),
        }
    }
}

/// Overall execution phase, driven by the highest defect report cycle seen
/// and the regression item's judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Initial,
    Patch1Regression,
    Patch2Final,
}

impl Phase {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::Patch1Regression => "PATCH1_REGRESSION",
            Self::Patch2Final => "PATCH2_FINAL",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = crate::error::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIAL" => Ok(Self::Initial),
            "PATCH1_REGRESSION" => Ok(Self::Patch1Regression),
            "PATCH2_FINAL" => Ok(Self::Patch2Final),
            _ => Err(crate::error::ParseEnumError {
                expected: "phase",
                got: s.to_string(),
            }),
        }
    }
}

/// Outcome of the mandatory post-patch regression check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegressionStatus {
    Pending,
    DerivedFound,
    Pass,
}

impl RegressionStatus {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::DerivedFound => "DERIVED_FOUND",
            Self::Pass => "PASS",
        }
    }
}

impl fmt::Display for RegressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RegressionStatus {
    type Err = crate::error::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "DERIVED_FOUND" => Ok(Self::DerivedFound),
            "PASS" => Ok(Self::Pass),
            _ => Err(crate::error::ParseEnumError {
                expected: "regression status",
                got: s.to_string(),
            }),
        }
    }
}

/// Enablement decision for one checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GateState {
    Enabled,
    Disabled,
    BlockedByFinalization,
}

/// Per-item gate: the enablement state plus a user-facing reason when the
/// item is not enabled. View artifact only, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemGate {
    pub state: GateState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl ItemGate {
    const fn enabled() -> Self {
        Self {
            state: GateState::Enabled,
            reason: None,
        }
    }

    const fn with_reason(state: GateState, reason: &'static str) -> Self {
        Self {
            state,
            reason: Some(reason),
        }
    }

    /// Whether the item may currently be worked on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self.state, GateState::Enabled)
    }
}

/// The derived phase snapshot, recomputed fresh on every call and persisted
/// by the caller for audit/history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    pub phase: Phase,
    pub feature_regression_status: RegressionStatus,
    pub allow_security_performance: bool,
    pub derived_found_in_feature_regression: bool,
    /// Present exactly when the input snapshot was finalized. The value is
    /// advisory metadata; only its presence carries meaning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

/// Everything the engine reads. All fields are borrowed and immutable.
#[derive(Debug, Clone, Copy)]
pub struct GateInput<'a> {
    pub checklist: &'a [ChecklistItem],
    pub reviews: &'a BTreeMap<String, ReviewEntry>,
    pub defects: &'a [Defect],
    pub finalized: bool,
}

/// Engine output: one gate per checklist item plus the phase snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateOutcome {
    pub item_gates: BTreeMap<String, ItemGate>,
    pub execution_state: ExecutionState,
}

impl GateOutcome {
    /// The gate for one item; absent ids (not on the checklist) get `None`.
    #[must_use]
    pub fn gate_for(&self, item_id: &str) -> Option<&ItemGate> {
        self.item_gates.get(item_id)
    }
}

/// Compute the execution gate for the given snapshot.
///
/// Deterministic and order-independent in its inputs; the only wall-clock
/// dependence is the `finalized_at` stamp, a pass-through of the
/// `finalized` edge. An empty checklist yields an empty gate map, never a
/// panic.
#[must_use]
pub fn compute_execution_gate(input: &GateInput<'_>, ids: &GateIds) -> GateOutcome {
    // Pass or explicit fail both count as done; only unreviewed/hold block.
    let regression_done = input
        .reviews
        .get(&ids.regression)
        .is_some_and(|entry| entry.status.is_terminal());

    // A derived defect surfacing during or after the post-patch regression
    // cycle signals instability introduced by the patch.
    let derived_found = input
        .defects
        .iter()
        .any(|defect| defect.derived && defect.report_cycle >= REGRESSION_CYCLE);

    let max_cycle = input
        .defects
        .iter()
        .map(|defect| defect.report_cycle)
        .max()
        .unwrap_or(0);

    // Version threshold outranks the regression-done flag: a 4th-cycle
    // defect forces the final phase regardless of regression status.
    let phase = if max_cycle >= FINAL_CYCLE {
        Phase::Patch2Final
    } else if max_cycle >= REGRESSION_CYCLE || regression_done {
        Phase::Patch1Regression
    } else {
        Phase::Initial
    };

    let feature_regression_status = if !regression_done {
        RegressionStatus::Pending
    } else if derived_found {
        RegressionStatus::DerivedFound
    } else {
        RegressionStatus::Pass
    };

    let allow_security_performance = regression_done && !derived_found && !input.finalized;

    let execution_state = ExecutionState {
        phase,
        feature_regression_status,
        allow_security_performance,
        derived_found_in_feature_regression: derived_found,
        finalized_at: input.finalized.then(Utc::now),
    };

    let mut item_gates: BTreeMap<String, ItemGate> = input
        .checklist
        .iter()
        .map(|item| (item.id.clone(), ItemGate::enabled()))
        .collect();

    // Finalization is terminal and supersedes every other rule: freeze the
    // live execution checklist, leave other categories editable.
    if input.finalized {
        for item in input.checklist {
            if item.category == Category::Execution {
                item_gates.insert(
                    item.id.clone(),
                    ItemGate::with_reason(GateState::BlockedByFinalization, REASON_FINALIZED),
                );
            }
        }
        return GateOutcome {
            item_gates,
            execution_state,
        };
    }

    if !regression_done {
        gate_security_performance(&mut item_gates, ids, REASON_REGRESSION_PENDING);
    } else if derived_found {
        gate_security_performance(&mut item_gates, ids, REASON_DERIVED_DEFECT);
    }

    GateOutcome {
        item_gates,
        execution_state,
    }
}

/// Disable the security and performance items with the given reason.
///
/// Only ids actually present on the checklist are touched, so a synthetic
/// checklist without those items stays untouched.
fn gate_security_performance(
    gates: &mut BTreeMap<String, ItemGate>,
    ids: &GateIds,
    reason: &'static str,
) {
    for id in [ids.security.as_str(), ids.performance.as_str()] {
        if let Some(gate) = gates.get_mut(id) {
            *gate = ItemGate::with_reason(GateState::Disabled, reason);
        }
    }
}
