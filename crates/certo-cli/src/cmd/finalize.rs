//! `ct finalize` — irreversibly lock the execution phase's results.

use std::io::Write;
use std::path::Path;

use certo_core::db::query;
use certo_core::error::CertoError;
use certo_core::gate::Phase;
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cmd::{open_project, record_gate};
use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `ct finalize`.
#[derive(Args, Debug)]
pub struct FinalizeArgs {
    /// Confirm the lock. Finalization cannot be undone.
    #[arg(long)]
    pub yes: bool,
}

/// Result payload for a finalization.
#[derive(Debug, Serialize)]
struct FinalizeOutput {
    phase: Phase,
    finalized_at: String,
    blocked_items: usize,
}

/// Execute `ct finalize`.
///
/// # Errors
///
/// Returns an error when run without `--yes`, when already finalized, or
/// when a store operation fails.
pub fn run_finalize(
    args: &FinalizeArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let Some(project) = open_project(project_root, output)? else {
        anyhow::bail!("project not initialized");
    };

    if !args.yes {
        render_error(
            output,
            &CliError::with_details(
                "refusing to finalize without confirmation",
                "finalization is irreversible; re-run as `ct finalize --yes`",
                "confirm_required",
            ),
        )?;
        anyhow::bail!("finalize not confirmed");
    }

    if !query::mark_finalized(&project.conn, certo_core::now_us())? {
        let err = CertoError::AlreadyFinalized;
        render_error(output, &CliError::from(&err))?;
        anyhow::bail!(err);
    }
    info!("execution finalized");

    let outcome = record_gate(&project)?;
    let blocked_items = outcome
        .item_gates
        .values()
        .filter(|gate| !gate.is_enabled())
        .count();
    let finalized_at = outcome
        .execution_state
        .finalized_at
        .map(|stamp| stamp.to_rfc3339())
        .unwrap_or_default();

    let payload = FinalizeOutput {
        phase: outcome.execution_state.phase,
        finalized_at,
        blocked_items,
    };

    render(output, &payload, |payload, w| {
        render_finalize_human(payload, w)
    })
}

fn render_finalize_human(payload: &FinalizeOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "✓ Execution finalized at {}", payload.finalized_at)?;
    writeln!(
        w,
        "  {} execution items are now locked; completion items stay editable.",
        payload.blocked_items
    )?;
    writeln!(w, "  phase: {}", payload.phase)?;
    Ok(())
}
