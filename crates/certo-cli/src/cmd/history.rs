//! `ct history` — the persisted gate-snapshot audit trail.

use std::io::Write;
use std::path::Path;

use certo_core::db::query::{self, GateSnapshot};
use clap::Args;
use serde::Serialize;

use crate::cmd::open_project;
use crate::output::{OutputMode, render};

/// Arguments for `ct history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of snapshots to show, newest first.
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

/// Payload for `ct history`.
#[derive(Debug, Serialize)]
struct HistoryOutput {
    snapshots: Vec<GateSnapshot>,
}

/// Execute `ct history`.
///
/// # Errors
///
/// Returns an error if the project is missing or the query fails.
pub fn run_history(
    args: &HistoryArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let Some(project) = open_project(project_root, output)? else {
        anyhow::bail!("project not initialized");
    };

    let snapshots = query::list_snapshots(&project.conn, args.limit)?;
    render(output, &HistoryOutput { snapshots }, |payload, w| {
        render_history_human(payload, w)
    })
}

fn render_history_human(payload: &HistoryOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.snapshots.is_empty() {
        writeln!(w, "No snapshots recorded.")?;
        return Ok(());
    }

    for snapshot in &payload.snapshots {
        let lock_marker = if snapshot.allow_security_performance {
            "sec/perf:open"
        } else {
            "sec/perf:locked"
        };
        let finalized_marker = if snapshot.finalized_at.is_some() {
            "  FINALIZED"
        } else {
            ""
        };
        writeln!(
            w,
            "#{:<4} {}  {:<18} {:<14} {}{}",
            snapshot.snapshot_id,
            snapshot.recorded_at.to_rfc3339(),
            snapshot.phase.to_string(),
            snapshot.regression_status.to_string(),
            lock_marker,
            finalized_marker,
        )?;
    }
    Ok(())
}
