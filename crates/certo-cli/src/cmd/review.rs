//! `ct review` — record a judgement, refusing when the item is gated.

use std::io::Write;
use std::path::Path;

use certo_core::db::query;
use certo_core::error::CertoError;
use certo_core::gate::Phase;
use certo_core::model::review::ReviewStatus;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::debug;

use crate::cmd::{open_project, record_gate};
use crate::output::{CliError, OutputMode, render, render_error};

/// Verdicts accepted on the command line. `clear` resets to unreviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Verdict {
    Verified,
    CannotVerify,
    Hold,
    Clear,
}

impl Verdict {
    const fn status(self) -> ReviewStatus {
        match self {
            Self::Verified => ReviewStatus::Verified,
            Self::CannotVerify => ReviewStatus::CannotVerify,
            Self::Hold => ReviewStatus::Hold,
            Self::Clear => ReviewStatus::None,
        }
    }
}

/// Arguments for `ct review`.
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Checklist item id (see `ct checklist`).
    pub item_id: String,

    /// The judgement to record.
    #[arg(value_enum)]
    pub verdict: Verdict,

    /// Free-form note attached to the judgement.
    #[arg(long)]
    pub note: Option<String>,
}

/// Result payload for a recorded review.
#[derive(Debug, Serialize)]
struct ReviewOutput {
    item_id: String,
    status: ReviewStatus,
    phase: Phase,
    allow_security_performance: bool,
}

/// Execute `ct review`.
///
/// The item's current gate is consulted first: a `disabled` or
/// `blockedByFinalization` gate refuses the mutation with the gate's own
/// reason, mirroring how the checklist UI locks gated items.
///
/// # Errors
///
/// Returns an error if the project is missing, the item is unknown, the
/// item is gated, or a store operation fails.
pub fn run_review(args: &ReviewArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let Some(project) = open_project(project_root, output)? else {
        anyhow::bail!("project not initialized");
    };

    if query::get_item(&project.conn, &args.item_id)?.is_none() {
        let err = CertoError::ItemNotFound {
            item_id: args.item_id.clone(),
        };
        render_error(output, &CliError::from(&err))?;
        anyhow::bail!(err);
    }

    let before = crate::cmd::compute_gate(&project)?;
    if let Some(gate) = before.gate_for(&args.item_id)
        && !gate.is_enabled()
    {
        let err = CertoError::ItemGated {
            item_id: args.item_id.clone(),
            reason: gate.reason.unwrap_or("gated").to_string(),
        };
        render_error(output, &CliError::from(&err))?;
        anyhow::bail!(err);
    }

    let status = args.verdict.status();
    query::upsert_review(
        &project.conn,
        &args.item_id,
        status,
        args.note.as_deref(),
        certo_core::now_us(),
    )?;
    debug!(item_id = %args.item_id, %status, "review recorded");

    let outcome = record_gate(&project)?;
    let payload = ReviewOutput {
        item_id: args.item_id.clone(),
        status,
        phase: outcome.execution_state.phase,
        allow_security_performance: outcome.execution_state.allow_security_performance,
    };

    render(output, &payload, |payload, w| {
        render_review_human(payload, w)
    })
}

fn render_review_human(payload: &ReviewOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "✓ {} -> {}", payload.item_id, payload.status)?;
    writeln!(w, "  phase: {}", payload.phase)?;
    if payload.allow_security_performance {
        writeln!(w, "  security/performance testing: unlocked")?;
    }
    Ok(())
}
