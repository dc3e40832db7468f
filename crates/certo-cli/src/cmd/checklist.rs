//! `ct checklist` — the full item list with review status and live gates.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use certo_core::db::query;
use certo_core::gate::GateState;
use certo_core::model::item::Category;
use certo_core::model::review::ReviewStatus;
use clap::Args;
use serde::Serialize;

use crate::cmd::{compute_gate, open_project};
use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `ct checklist`.
#[derive(Args, Debug, Default)]
pub struct ChecklistArgs {
    /// Only show one category (setup, design, execution, completion).
    #[arg(long)]
    pub category: Option<String>,
}

/// One row of checklist output.
#[derive(Debug, Serialize)]
struct ChecklistRow {
    id: String,
    title: String,
    category: Category,
    applicable: bool,
    review_status: ReviewStatus,
    gate: GateState,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Full checklist output payload.
#[derive(Debug, Serialize)]
struct ChecklistOutput {
    items: Vec<ChecklistRow>,
}

/// Execute `ct checklist`.
///
/// # Errors
///
/// Returns an error if the project is missing or a store read fails.
pub fn run_checklist(
    args: &ChecklistArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let category = match args.category.as_deref() {
        Some(raw) => match Category::from_str(raw) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                render_error(output, &CliError::new(error.to_string()))?;
                anyhow::bail!("invalid category");
            }
        },
        None => None,
    };

    let Some(project) = open_project(project_root, output)? else {
        anyhow::bail!("project not initialized");
    };

    let outcome = compute_gate(&project)?;
    let reviews = query::list_reviews(&project.conn)?;

    let items = query::list_checklist(&project.conn)?
        .into_iter()
        .filter(|item| category.is_none_or(|wanted| item.category == wanted))
        .map(|item| {
            let gate = outcome.gate_for(&item.id).copied();
            ChecklistRow {
                review_status: reviews
                    .get(&item.id)
                    .map_or(ReviewStatus::None, |entry| entry.status),
                gate: gate.map_or(GateState::Enabled, |g| g.state),
                reason: gate.and_then(|g| g.reason.map(str::to_string)),
                id: item.id,
                title: item.title,
                category: item.category,
                applicable: item.applicable,
            }
        })
        .collect();

    render(output, &ChecklistOutput { items }, |payload, w| {
        render_checklist_human(payload, w)
    })
}

fn gate_marker(row: &ChecklistRow) -> &'static str {
    match row.gate {
        GateState::Enabled => " ",
        GateState::Disabled => "x",
        GateState::BlockedByFinalization => "#",
    }
}

fn render_checklist_human(payload: &ChecklistOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let mut current_category: Option<Category> = None;

    for row in &payload.items {
        if current_category != Some(row.category) {
            if current_category.is_some() {
                writeln!(w)?;
            }
            writeln!(w, "{}", row.category.heading())?;
            current_category = Some(row.category);
        }

        let na_suffix = if row.applicable { "" } else { "  (n/a)" };
        writeln!(
            w,
            "  [{}] {:<24} {:<14} {}{}",
            gate_marker(row),
            row.id,
            row.review_status.to_string(),
            row.title,
            na_suffix,
        )?;
        if let Some(ref reason) = row.reason {
            writeln!(w, "       ^ {reason}")?;
        }
    }

    Ok(())
}
