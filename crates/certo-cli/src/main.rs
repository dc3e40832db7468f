#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "certo: certification-testing workflow tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, env, and TTY state.
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a certo project",
        long_about = "Initialize a certo project in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize with a project name\n    ct init --name router-fw-2.1\n\n    # Reinitialize an existing project\n    ct init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Review",
        about = "Show the checklist with review status and gates",
        after_help = "EXAMPLES:\n    # Full checklist\n    ct checklist\n\n    # Execution items only\n    ct checklist --category execution\n\n    # Emit machine-readable output\n    ct checklist --json"
    )]
    Checklist(cmd::checklist::ChecklistArgs),

    #[command(
        next_help_heading = "Review",
        about = "Record a review judgement on a checklist item",
        long_about = "Record verified, cannot-verify, hold, or clear on a checklist item.\nGated items are refused with the gate's reason.",
        after_help = "EXAMPLES:\n    # Pass\n    ct review exec-functional verified\n\n    # Explicit fail, with a note\n    ct review exec-regression-patch1 cannot-verify --note \"3 cases regressed\"\n\n    # Back to unreviewed\n    ct review exec-functional clear"
    )]
    Review(cmd::review::ReviewArgs),

    #[command(
        next_help_heading = "Review",
        about = "Mark a checklist item as not applicable",
        after_help = "EXAMPLES:\n    # This test has no performance surface\n    ct na exec-performance\n\n    # Put it back\n    ct na exec-performance --undo"
    )]
    Na(cmd::na::NaArgs),

    #[command(
        next_help_heading = "Defects",
        about = "Report and list defects",
        after_help = "EXAMPLES:\n    # Report a first-cycle defect\n    ct defect report --title \"Crash on empty config\" --cycle 1 --severity critical\n\n    # Report a derived defect found in the regression cycle\n    ct defect report --title \"Retry path regressed\" --cycle 3 --derived\n\n    # List regression-cycle defects\n    ct defect list --cycle 3"
    )]
    Defect {
        #[command(subcommand)]
        command: cmd::defect::DefectCommand,
    },

    #[command(
        next_help_heading = "Execution",
        about = "Show phase, locks, and progress counts",
        after_help = "EXAMPLES:\n    # Human-readable status\n    ct status\n\n    # Emit machine-readable output\n    ct status --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Execution",
        about = "Irreversibly lock the execution results",
        after_help = "EXAMPLES:\n    # Finalization requires explicit confirmation\n    ct finalize --yes"
    )]
    Finalize(cmd::finalize::FinalizeArgs),

    #[command(
        next_help_heading = "Execution",
        about = "Show the gate-snapshot audit trail",
        after_help = "EXAMPLES:\n    # Latest 20 snapshots\n    ct history\n\n    # Everything\n    ct history --limit 1000"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    ct completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CERTO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "certo=debug,info"
        } else {
            "certo=info,warn"
        })
    });

    let format = env::var("CERTO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = std::env::current_dir()?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, &project_root),
        Commands::Checklist(ref args) => {
            cmd::checklist::run_checklist(args, output, &project_root)
        }
        Commands::Review(ref args) => cmd::review::run_review(args, output, &project_root),
        Commands::Na(ref args) => cmd::na::run_na(args, output, &project_root),
        Commands::Defect { ref command } => match command {
            cmd::defect::DefectCommand::Report(args) => {
                cmd::defect::run_report(args, output, &project_root)
            }
            cmd::defect::DefectCommand::List(args) => {
                cmd::defect::run_list(args, output, &project_root)
            }
        },
        Commands::Status(ref args) => cmd::status::run_status(args, output, &project_root),
        Commands::Finalize(ref args) => {
            cmd::finalize::run_finalize(args, output, &project_root)
        }
        Commands::History(ref args) => cmd::history::run_history(args, output, &project_root),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["ct", "--json", "status"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["ct", "status", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn review_verdict_parses_kebab_case() {
        let cli = Cli::parse_from(["ct", "review", "exec-security", "cannot-verify"]);
        let Commands::Review(args) = cli.command else {
            panic!("expected review command");
        };
        assert_eq!(args.verdict, cmd::review::Verdict::CannotVerify);
    }

    #[test]
    fn defect_report_cycle_range_is_enforced() {
        let result = Cli::try_parse_from([
            "ct", "defect", "report", "--title", "x", "--cycle", "5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn history_limit_defaults() {
        let cli = Cli::parse_from(["ct", "history"]);
        let Commands::History(args) = cli.command else {
            panic!("expected history command");
        };
        assert_eq!(args.limit, 20);
    }
}
