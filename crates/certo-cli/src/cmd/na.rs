//! `ct na` — toggle the applicability display flag on a checklist item.

use std::io::Write;
use std::path::Path;

use certo_core::db::query;
use certo_core::error::CertoError;
use clap::Args;
use serde::Serialize;

use crate::cmd::open_project;
use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `ct na`.
#[derive(Args, Debug)]
pub struct NaArgs {
    /// Checklist item id (see `ct checklist`).
    pub item_id: String,

    /// Mark the item applicable again instead.
    #[arg(long)]
    pub undo: bool,
}

/// Result payload for an applicability toggle.
#[derive(Debug, Serialize)]
struct NaOutput {
    item_id: String,
    applicable: bool,
}

/// Execute `ct na`.
///
/// The flag is purely presentational: the gate engine ignores it, so no
/// snapshot is recorded.
///
/// # Errors
///
/// Returns an error if the project is missing, the item is unknown, or the
/// update fails.
pub fn run_na(args: &NaArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let Some(project) = open_project(project_root, output)? else {
        anyhow::bail!("project not initialized");
    };

    let applicable = args.undo;
    if query::set_applicable(&project.conn, &args.item_id, applicable)? == 0 {
        let err = CertoError::ItemNotFound {
            item_id: args.item_id.clone(),
        };
        render_error(output, &CliError::from(&err))?;
        anyhow::bail!(err);
    }

    let payload = NaOutput {
        item_id: args.item_id.clone(),
        applicable,
    };
    render(output, &payload, |payload, w| render_na_human(payload, w))
}

fn render_na_human(payload: &NaOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.applicable {
        writeln!(w, "✓ {} marked applicable", payload.item_id)
    } else {
        writeln!(w, "✓ {} marked not applicable", payload.item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{NaArgs, run_na};
    use crate::cmd::testutil::init_project;
    use crate::output::OutputMode;
    use certo_core::db::query;

    #[test]
    fn toggle_and_undo() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = init_project(dir.path());

        run_na(
            &NaArgs {
                item_id: "exec-performance".to_string(),
                undo: false,
            },
            OutputMode::Json,
            dir.path(),
        )
        .expect("mark na");
        let item = query::get_item(&project.conn, "exec-performance")
            .expect("query")
            .expect("present");
        assert!(!item.applicable);

        run_na(
            &NaArgs {
                item_id: "exec-performance".to_string(),
                undo: true,
            },
            OutputMode::Json,
            dir.path(),
        )
        .expect("undo");
        let item = query::get_item(&project.conn, "exec-performance")
            .expect("query")
            .expect("present");
        assert!(item.applicable);
    }

    #[test]
    fn unknown_item_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _project = init_project(dir.path());

        let result = run_na(
            &NaArgs {
                item_id: "exec-nope".to_string(),
                undo: false,
            },
            OutputMode::Json,
            dir.path(),
        );
        assert!(result.is_err());
    }
}
