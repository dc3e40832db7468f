use anyhow::{Context as _, Result};
use certo_core::checklist::default_checklist;
use certo_core::config::{ProjectConfig, save_project_config};
use certo_core::db::{self, query};
use clap::Args;
use std::path::Path;

use crate::cmd::{Project, record_gate};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project display name used in reports and `ct status`.
    #[arg(long)]
    pub name: Option<String>,

    /// Force re-initialization even if `.certo/` already exists.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "certo.db\ncerto.db-wal\ncerto.db-shm\n";

/// Execute `ct init`. Creates the project skeleton:
///
/// ```text
/// .certo/
///   certo.db       (SQLite store, migrated and seeded with the checklist)
///   config.toml    (project name + gate item-id overrides)
///   .gitignore     (the store and its WAL siblings)
/// ```
///
/// # Errors
///
/// Returns an error if `.certo/` already exists and `--force` is not set,
/// or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, project_root: &Path) -> Result<()> {
    let certo_dir = project_root.join(".certo");

    if certo_dir.exists() && !args.force {
        anyhow::bail!(".certo/ already exists. Use `ct init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&certo_dir)
        .with_context(|| format!("create project directory {}", certo_dir.display()))?;

    let name = args.name.clone().unwrap_or_default();
    let mut config = ProjectConfig::default();
    config.project.name.clone_from(&name);
    save_project_config(project_root, &config)?;

    let gitignore_path = certo_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("write {}", gitignore_path.display()))?;

    let conn = db::open_store(&db::store_path(project_root))?;
    let template = default_checklist();
    query::seed_checklist(&conn, &template)?;
    query::init_meta(&conn, &name, certo_core::now_us())?;

    // Record the day-one snapshot so the audit trail starts at INITIAL.
    let project = Project { conn, config };
    let outcome = record_gate(&project)?;

    println!("✓ Initialized .certo/ project structure.");
    println!();
    if name.is_empty() {
        println!("  Project:   (unnamed — set one with `ct init --force --name <name>`)");
    } else {
        println!("  Project:   {name}");
    }
    println!("  Checklist: {} items seeded", template.len());
    println!("  Phase:     {}", outcome.execution_state.phase);
    println!();
    println!("Next steps:");
    println!("  See the checklist and what is currently gated:");
    println!("    ct checklist");
    println!();
    println!("  Record your first review judgement:");
    println!("    ct review setup-environment verified");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{InitArgs, run_init};
    use certo_core::db::{self, query};

    #[test]
    fn fresh_init_creates_structure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = InitArgs {
            name: Some("router-fw-2.1".to_string()),
            force: false,
        };

        run_init(&args, dir.path()).expect("init");

        assert!(dir.path().join(".certo").is_dir());
        assert!(dir.path().join(".certo/config.toml").is_file());
        assert!(dir.path().join(".certo/.gitignore").is_file());
        assert!(dir.path().join(".certo/certo.db").is_file());

        let conn = db::open_store(&db::store_path(dir.path())).expect("reopen");
        let items = query::list_checklist(&conn).expect("list");
        assert!(!items.is_empty());
        let meta = query::get_meta(&conn).expect("meta");
        assert_eq!(meta.name, "router-fw-2.1");
        // The day-one snapshot is present.
        let snapshots = query::list_snapshots(&conn, 10).expect("snapshots");
        assert_eq!(snapshots.len(), 1);
    }

    #[test]
    fn second_init_requires_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = InitArgs {
            name: None,
            force: false,
        };

        run_init(&args, dir.path()).expect("first init");
        assert!(run_init(&args, dir.path()).is_err());

        let force_args = InitArgs {
            name: None,
            force: true,
        };
        run_init(&force_args, dir.path()).expect("forced init");
    }
}
