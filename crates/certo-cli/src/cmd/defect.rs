//! `ct defect` — append defect records and list them.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use certo_core::db::query::{self, DefectFilter};
use certo_core::gate::{Phase, RegressionStatus};
use certo_core::model::defect::{Defect, Severity};
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::debug;

use crate::cmd::{open_project, record_gate};
use crate::output::{OutputMode, render};

#[derive(Subcommand, Debug)]
pub enum DefectCommand {
    /// Report a new defect.
    Report(ReportArgs),
    /// List recorded defects.
    List(ListArgs),
}

fn parse_severity(raw: &str) -> Result<Severity, String> {
    Severity::from_str(raw).map_err(|error| error.to_string())
}

fn parse_cycle(raw: &str) -> Result<u8, String> {
    let value: u8 = raw
        .parse()
        .map_err(|_| format!("invalid report cycle: '{raw}'"))?;
    certo_core::model::defect::validate_cycle(value)
        .map_err(|bad| format!("report cycle {bad} is out of range (1-4)"))
}

/// Arguments for `ct defect report`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Short defect title.
    #[arg(long)]
    pub title: String,

    /// Longer description of the observed problem.
    #[arg(long)]
    pub summary: Option<String>,

    /// Reporting cycle that produced this defect (1-2 initial discovery,
    /// 3 post-first-patch regression, 4 final).
    #[arg(long, value_parser = parse_cycle)]
    pub cycle: u8,

    /// The defect was discovered as a side effect of an earlier fix.
    #[arg(long)]
    pub derived: bool,

    /// Severity: critical, major, minor, or cosmetic.
    #[arg(long, default_value = "major", value_parser = parse_severity)]
    pub severity: Severity,
}

/// Arguments for `ct defect list`.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only show defects from one reporting cycle.
    #[arg(long, value_parser = parse_cycle)]
    pub cycle: Option<u8>,

    /// Only show derived defects.
    #[arg(long)]
    pub derived: bool,
}

/// Result payload for a reported defect.
#[derive(Debug, Serialize)]
struct ReportOutput {
    defect: Defect,
    phase: Phase,
    feature_regression_status: RegressionStatus,
    allow_security_performance: bool,
}

/// Payload for `ct defect list`.
#[derive(Debug, Serialize)]
struct ListOutput {
    defects: Vec<Defect>,
}

/// Execute `ct defect report`.
///
/// # Errors
///
/// Returns an error if the project is missing or a store operation fails.
pub fn run_report(args: &ReportArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let Some(project) = open_project(project_root, output)? else {
        anyhow::bail!("project not initialized");
    };

    let defect = Defect {
        id: query::next_defect_id(&project.conn)?,
        title: args.title.clone(),
        summary: args.summary.clone(),
        severity: args.severity,
        report_cycle: args.cycle,
        derived: args.derived,
        created_at_us: certo_core::now_us(),
    };
    query::insert_defect(&project.conn, &defect)?;
    debug!(defect_id = %defect.id, cycle = defect.report_cycle, derived = defect.derived, "defect recorded");

    let outcome = record_gate(&project)?;
    let payload = ReportOutput {
        defect,
        phase: outcome.execution_state.phase,
        feature_regression_status: outcome.execution_state.feature_regression_status,
        allow_security_performance: outcome.execution_state.allow_security_performance,
    };

    render(output, &payload, |payload, w| {
        render_report_human(payload, w)
    })
}

/// Execute `ct defect list`.
///
/// # Errors
///
/// Returns an error if the project is missing or the query fails.
pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let Some(project) = open_project(project_root, output)? else {
        anyhow::bail!("project not initialized");
    };

    let filter = DefectFilter {
        cycle: args.cycle,
        derived: args.derived.then_some(true),
    };
    let defects = query::list_defects(&project.conn, &filter)?;

    render(output, &ListOutput { defects }, |payload, w| {
        render_list_human(payload, w)
    })
}

fn render_report_human(payload: &ReportOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let derived_marker = if payload.defect.derived {
        " (derived)"
    } else {
        ""
    };
    writeln!(
        w,
        "✓ {} recorded: {} [{} cycle {}{}]",
        payload.defect.id,
        payload.defect.title,
        payload.defect.severity,
        payload.defect.report_cycle,
        derived_marker,
    )?;
    writeln!(w, "  phase: {}", payload.phase)?;
    if payload.feature_regression_status == RegressionStatus::DerivedFound {
        writeln!(
            w,
            "  regression: DERIVED_FOUND — security/performance testing is now locked"
        )?;
    }
    Ok(())
}

fn render_list_human(payload: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.defects.is_empty() {
        writeln!(w, "No defects recorded.")?;
        return Ok(());
    }

    for defect in &payload.defects {
        let derived_marker = if defect.derived { " derived" } else { "" };
        writeln!(
            w,
            "{}  cycle {}  {:<8}{}  {}",
            defect.id, defect.report_cycle, defect.severity, derived_marker, defect.title,
        )?;
    }
    writeln!(w, "{} defects", payload.defects.len())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ListArgs, ReportArgs, run_list, run_report};
    use crate::cmd::testutil::init_project;
    use crate::output::OutputMode;
    use certo_core::db::query::{self, DefectFilter};
    use certo_core::model::defect::Severity;

    fn report(title: &str, cycle: u8, derived: bool) -> ReportArgs {
        ReportArgs {
            title: title.to_string(),
            summary: None,
            cycle,
            derived,
            severity: Severity::Major,
        }
    }

    #[test]
    fn report_assigns_sequential_ids_and_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = init_project(dir.path());

        run_report(
            &report("Crash on empty config", 1, false),
            OutputMode::Json,
            dir.path(),
        )
        .expect("first report");
        run_report(
            &report("Regression in retry path", 3, true),
            OutputMode::Json,
            dir.path(),
        )
        .expect("second report");

        let defects =
            query::list_defects(&project.conn, &DefectFilter::default()).expect("list");
        assert_eq!(defects.len(), 2);
        assert_eq!(defects[0].id, "df-001");
        assert_eq!(defects[1].id, "df-002");

        let snapshots = query::list_snapshots(&project.conn, 10).expect("snapshots");
        assert_eq!(snapshots.len(), 2);
    }

    #[test]
    fn list_honors_filters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _project = init_project(dir.path());

        run_report(&report("A", 1, false), OutputMode::Json, dir.path()).expect("a");
        run_report(&report("B", 3, true), OutputMode::Json, dir.path()).expect("b");

        let args = ListArgs {
            cycle: Some(3),
            derived: true,
        };
        assert!(run_list(&args, OutputMode::Json, dir.path()).is_ok());
    }
}
