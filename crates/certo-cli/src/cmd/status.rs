//! `ct status` — quick orientation: phase, locks, counts.
//!
//! Like `git status` for a certification run: what phase the execution is
//! in, whether security/performance testing is unlocked, what is gated and
//! why, and how much of the checklist has a judgement.

use std::io::Write;
use std::path::Path;

use certo_core::db::query::{self, DefectFilter};
use certo_core::gate::{GateState, Phase, RegressionStatus};
use certo_core::model::defect::FINAL_CYCLE;
use certo_core::model::review::ReviewStatus;
use chrono::{TimeZone, Utc};
use clap::Args;
use serde::Serialize;

use crate::cmd::{compute_gate, open_project};
use crate::output::{OutputMode, pretty_kv, render};

/// Arguments for `ct status`.
#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

/// Review judgement counts across the checklist.
#[derive(Debug, Serialize)]
struct ReviewCounts {
    verified: usize,
    cannot_verify: usize,
    hold: usize,
    unreviewed: usize,
}

/// Defect counts, total and per reporting cycle.
#[derive(Debug, Serialize)]
struct DefectCounts {
    total: usize,
    derived: usize,
    by_cycle: Vec<usize>,
}

/// One gated item with its user-facing reason.
#[derive(Debug, Serialize)]
struct GatedItem {
    item_id: String,
    state: GateState,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Full status output payload.
#[derive(Debug, Serialize)]
struct StatusOutput {
    project: String,
    phase: Phase,
    feature_regression_status: RegressionStatus,
    allow_security_performance: bool,
    derived_found_in_feature_regression: bool,
    finalized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    finalized_at: Option<String>,
    reviews: ReviewCounts,
    defects: DefectCounts,
    gated: Vec<GatedItem>,
}

/// Execute `ct status`.
///
/// # Errors
///
/// Returns an error if the project is missing or a store read fails.
pub fn run_status(
    _args: &StatusArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let Some(project) = open_project(project_root, output)? else {
        anyhow::bail!("project not initialized");
    };

    let outcome = compute_gate(&project)?;
    let meta = query::get_meta(&project.conn)?;
    let checklist = query::list_checklist(&project.conn)?;
    let reviews = query::list_reviews(&project.conn)?;
    let defects = query::list_defects(&project.conn, &DefectFilter::default())?;

    let mut counts = ReviewCounts {
        verified: 0,
        cannot_verify: 0,
        hold: 0,
        unreviewed: 0,
    };
    for item in &checklist {
        let status = reviews
            .get(&item.id)
            .map_or(ReviewStatus::None, |entry| entry.status);
        match status {
            ReviewStatus::Verified => counts.verified += 1,
            ReviewStatus::CannotVerify => counts.cannot_verify += 1,
            ReviewStatus::Hold => counts.hold += 1,
            ReviewStatus::None => counts.unreviewed += 1,
        }
    }

    let mut by_cycle = vec![0usize; usize::from(FINAL_CYCLE)];
    for defect in &defects {
        if let Some(slot) = by_cycle.get_mut(usize::from(defect.report_cycle) - 1) {
            *slot += 1;
        }
    }

    let gated = outcome
        .item_gates
        .iter()
        .filter(|(_, gate)| !gate.is_enabled())
        .map(|(item_id, gate)| GatedItem {
            item_id: item_id.clone(),
            state: gate.state,
            reason: gate.reason.map(str::to_string),
        })
        .collect();

    let finalized_at = meta
        .finalized_at_us
        .and_then(|micros| Utc.timestamp_micros(micros).single())
        .map(|stamp| stamp.to_rfc3339());

    let payload = StatusOutput {
        project: meta.name,
        phase: outcome.execution_state.phase,
        feature_regression_status: outcome.execution_state.feature_regression_status,
        allow_security_performance: outcome.execution_state.allow_security_performance,
        derived_found_in_feature_regression: outcome
            .execution_state
            .derived_found_in_feature_regression,
        finalized: meta.finalized,
        finalized_at,
        reviews: counts,
        defects: DefectCounts {
            total: defects.len(),
            derived: defects.iter().filter(|d| d.derived).count(),
            by_cycle,
        },
        gated,
    };

    render(output, &payload, |payload, w| {
        render_status_human(payload, w)
    })
}

fn render_status_human(payload: &StatusOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.project.is_empty() {
        pretty_kv(w, "Project", "(unnamed)")?;
    } else {
        pretty_kv(w, "Project", &payload.project)?;
    }
    pretty_kv(w, "Phase", payload.phase.to_string())?;
    pretty_kv(
        w,
        "Regression",
        payload.feature_regression_status.to_string(),
    )?;
    pretty_kv(
        w,
        "Sec/perf",
        if payload.allow_security_performance {
            "unlocked"
        } else {
            "locked"
        },
    )?;
    if payload.finalized {
        let stamp = payload.finalized_at.as_deref().unwrap_or("(unknown time)");
        pretty_kv(w, "Finalized", stamp)?;
    }

    writeln!(w)?;
    writeln!(
        w,
        "Reviews: {} verified, {} cannot-verify, {} hold, {} unreviewed",
        payload.reviews.verified,
        payload.reviews.cannot_verify,
        payload.reviews.hold,
        payload.reviews.unreviewed,
    )?;
    let cycles = payload
        .defects
        .by_cycle
        .iter()
        .enumerate()
        .map(|(index, count)| format!("c{}={count}", index + 1))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(
        w,
        "Defects: {} total ({} derived)  {}",
        payload.defects.total, payload.defects.derived, cycles,
    )?;

    if !payload.gated.is_empty() {
        writeln!(w)?;
        writeln!(w, "Gated items:")?;
        for item in &payload.gated {
            let reason = item.reason.as_deref().unwrap_or("");
            writeln!(w, "  {}  {reason}", item.item_id)?;
        }
    }

    Ok(())
}
