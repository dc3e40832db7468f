//! One module per `ct` subcommand, plus the shared project-open and
//! gate-recompute helpers every mutating command goes through.

pub mod checklist;
pub mod completions;
pub mod defect;
pub mod finalize;
pub mod history;
pub mod init;
pub mod na;
pub mod review;
pub mod status;

use std::path::Path;

use anyhow::Result;
use certo_core::config::{self, ProjectConfig};
use certo_core::db::{self, query};
use certo_core::error::CertoError;
use certo_core::gate::{GateInput, GateOutcome, compute_execution_gate};
use rusqlite::Connection;

use crate::output::{CliError, OutputMode, render_error};

/// An opened project: store connection plus effective config.
pub struct Project {
    pub conn: Connection,
    pub config: ProjectConfig,
}

/// Open the project at `project_root`, rendering a structured error and
/// returning `None` when `.certo/` is missing.
///
/// # Errors
///
/// Returns an error if the config or store cannot be opened.
pub fn open_project(project_root: &Path, output: OutputMode) -> Result<Option<Project>> {
    if !project_root.join(".certo").is_dir() {
        render_error(output, &CliError::from(&CertoError::NotInitialized))?;
        return Ok(None);
    }

    let config = config::load_project_config(project_root)?;
    let conn = db::open_store(&db::store_path(project_root))?;
    Ok(Some(Project { conn, config }))
}

/// Compute the current gate outcome from the stored snapshot, without
/// writing anything. Read-only commands use this.
///
/// # Errors
///
/// Returns an error if any store read fails.
pub fn compute_gate(project: &Project) -> Result<GateOutcome> {
    let checklist = query::list_checklist(&project.conn)?;
    let reviews = query::list_reviews(&project.conn)?;
    let defects = query::list_defects(&project.conn, &query::DefectFilter::default())?;
    let meta = query::get_meta(&project.conn)?;

    Ok(compute_execution_gate(
        &GateInput {
            checklist: &checklist,
            reviews: &reviews,
            defects: &defects,
            finalized: meta.finalized,
        },
        &project.config.gate_ids(),
    ))
}

/// Recompute the gate and append the resulting execution state to the
/// audit trail. Every mutating command calls this exactly once, after its
/// write.
///
/// # Errors
///
/// Returns an error if the recompute or the snapshot append fails.
pub fn record_gate(project: &Project) -> Result<GateOutcome> {
    let outcome = compute_gate(project)?;
    query::append_snapshot(
        &project.conn,
        &outcome.execution_state,
        certo_core::now_us(),
    )?;
    Ok(outcome)
}
