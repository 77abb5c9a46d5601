//! CLI entry point and command handlers for handin.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use handin::batch::BatchRunner;
use handin::config::AssignmentConfig;
use handin::env::Env;
use handin::error::{exit_code, HandinError};
use handin::interface::SvComparator;
use handin::perms::{self, AfsPermissions, PermissionService};
use handin::pipeline::{CheckContext, CheckOptions, Checker};
use handin::problem::Problem;
use handin::report;
use handin::roster;
use handin::submit;
use handin::toolchain::VcsToolchain;

#[derive(Parser)]
#[command(name = "handin")]
#[command(version)]
#[command(about = "Homework handin checking for hardware design courses", long_about = None)]
#[command(
    after_help = "GETTING STARTED:\n    handin check hw3            Check your work in the current directory\n    handin submit hw3           Check and copy files into your handin directory\n\n    Course-wide paths (config/reference/handin trees) are read from an\n    optional handin.yaml; every flag below overrides it."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct PathArgs {
    /// Directory containing <id>_cfg.json files
    #[arg(long, value_name = "DIR")]
    cfg_dir: Option<String>,
    /// Root of the interface reference files (omit to skip the interface check)
    #[arg(long, value_name = "DIR")]
    ref_dir: Option<String>,
    /// Environment file (default: ./handin.yaml when present)
    #[arg(long, value_name = "FILE")]
    env: Option<PathBuf>,
    /// Skip the compilation stage
    #[arg(long)]
    no_compile: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check your work in the current directory against an assignment config
    Check {
        /// Assignment id (e.g. hw3), matched case-insensitively
        hw: String,
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Check, then copy your files into your handin directory
    Submit {
        /// Assignment id (e.g. hw3)
        hw: String,
        #[command(flatten)]
        paths: PathArgs,
        /// Root of the per-student handin directories
        #[arg(long, value_name = "DIR")]
        handin_dir: Option<String>,
        /// Student id (default: $USER)
        #[arg(long)]
        user: Option<String>,
        /// Submit even if checks failed
        #[arg(long)]
        force: bool,
    },
    /// Check every student on a roster (course staff)
    Batch {
        /// Assignment id (e.g. hw3)
        hw: String,
        #[command(flatten)]
        paths: PathArgs,
        /// Roster CSV with one row per student
        #[arg(long, value_name = "FILE")]
        roster: PathBuf,
        /// Roster column holding the student id
        #[arg(long, default_value = roster::DEFAULT_FIELD)]
        field: String,
        /// Root of the per-student handin directories
        #[arg(long, value_name = "DIR")]
        handin_dir: Option<String>,
        /// Where to write the <id>_results.txt aggregate
        #[arg(long, value_name = "DIR")]
        results_dir: Option<String>,
    },
    /// Manage per-student handin directories (course staff)
    Dirs {
        #[command(subcommand)]
        command: DirsCommands,
    },
    /// Show version information
    Version {
        /// Show additional build information
        #[arg(long, short)]
        verbose: bool,
    },
}

/// Subcommands for handin directory management
#[derive(Subcommand)]
enum DirsCommands {
    /// Create one directory per student and open write access
    Create {
        /// Root under which student directories are created
        #[arg(long, value_name = "DIR")]
        base: PathBuf,
        /// Roster CSV with one row per student
        #[arg(long, value_name = "FILE")]
        roster: PathBuf,
        /// Roster column holding the student id
        #[arg(long, default_value = roster::DEFAULT_FIELD)]
        field: String,
        /// Print the permission commands without executing them
        #[arg(long)]
        dry_run: bool,
        /// Print every permission command as it runs
        #[arg(long, short)]
        verbose: bool,
    },
    /// Re-open write access on existing student directories
    Open {
        #[arg(long, value_name = "DIR")]
        base: PathBuf,
        #[arg(long, value_name = "FILE")]
        roster: PathBuf,
        #[arg(long, default_value = roster::DEFAULT_FIELD)]
        field: String,
        #[arg(long)]
        dry_run: bool,
        #[arg(long, short)]
        verbose: bool,
    },
    /// Close write access (after a deadline)
    Close {
        #[arg(long, value_name = "DIR")]
        base: PathBuf,
        #[arg(long, value_name = "FILE")]
        roster: PathBuf,
        #[arg(long, default_value = roster::DEFAULT_FIELD)]
        field: String,
        #[arg(long)]
        dry_run: bool,
        #[arg(long, short)]
        verbose: bool,
    },
}

fn main() {
    // Reports piped to files should stay plain text.
    if !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        let code = err
            .downcast_ref::<HandinError>()
            .map(HandinError::exit_code)
            .unwrap_or(exit_code::UNKNOWN);
        eprintln!("{} {err:#}", "ERROR:".red());
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Check { hw, paths } => cmd_check(&hw, &paths),
        Commands::Submit {
            hw,
            paths,
            handin_dir,
            user,
            force,
        } => cmd_submit(&hw, &paths, handin_dir.as_deref(), user.as_deref(), force),
        Commands::Batch {
            hw,
            paths,
            roster,
            field,
            handin_dir,
            results_dir,
        } => cmd_batch(
            &hw,
            &paths,
            &roster,
            &field,
            handin_dir.as_deref(),
            results_dir.as_deref(),
        ),
        Commands::Dirs { command } => match command {
            DirsCommands::Create {
                base,
                roster,
                field,
                dry_run,
                verbose,
            } => cmd_dirs_create(&base, &roster, &field, dry_run, verbose),
            DirsCommands::Open {
                base,
                roster,
                field,
                dry_run,
                verbose,
            } => cmd_dirs_open(&base, &roster, &field, dry_run, verbose),
            DirsCommands::Close {
                base,
                roster,
                field,
                dry_run,
                verbose,
            } => cmd_dirs_close(&base, &roster, &field, dry_run, verbose),
        },
        Commands::Version { verbose } => cmd_version(verbose),
    }
}

/// Everything a check-style command needs, resolved from flags plus the
/// environment file.
struct CheckSetup {
    config: AssignmentConfig,
    options: CheckOptions,
    env: Env,
}

fn load_setup(hw: &str, paths: &PathArgs, silent: bool) -> Result<CheckSetup> {
    let env = Env::load(paths.env.as_deref())?;

    let cfg_dir = Env::resolve_path(paths.cfg_dir.as_deref(), env.cfg_dir.as_deref())
        .unwrap_or_else(|| PathBuf::from("."));
    let config = AssignmentConfig::load(hw, &cfg_dir)?;

    let options = CheckOptions {
        ref_dir: Env::resolve_path(paths.ref_dir.as_deref(), env.ref_dir.as_deref()),
        skip_compile: paths.no_compile,
        silent,
    };

    Ok(CheckSetup {
        config,
        options,
        env,
    })
}

/// Run every problem of `config` against `dir`, printing failures as they
/// come. Returns the per-problem outcomes alongside the resolved problems.
fn check_directory(
    config: &AssignmentConfig,
    options: CheckOptions,
    dir: &Path,
) -> Result<(Vec<Problem>, Vec<handin::pipeline::Outcome>)> {
    let toolchain = VcsToolchain;
    let comparator = SvComparator::default();
    let checker = Checker::new(&toolchain, &comparator, options);
    let ctx = CheckContext::new(dir);

    let mut problems = Vec::new();
    let mut outcomes = Vec::new();
    for record in &config.problems {
        let mut problem = Problem::from_record(record);
        problem.resolve(dir);
        let outcome = checker.check(&problem, &ctx)?;
        problems.push(problem);
        outcomes.push(outcome);
    }
    Ok((problems, outcomes))
}

fn cmd_check(hw: &str, paths: &PathArgs) -> Result<()> {
    let setup = load_setup(hw, paths, false)?;
    let cwd = std::env::current_dir()?;
    let (_, outcomes) = check_directory(&setup.config, setup.options.clone(), &cwd)?;

    finish_local_check(&setup, &cwd, &outcomes)
}

/// Write or clear `errors.log` in `dir` and convert failures into the
/// CheckFailed exit path.
fn finish_local_check(
    setup: &CheckSetup,
    dir: &Path,
    outcomes: &[handin::pipeline::Outcome],
) -> Result<()> {
    if outcomes.iter().any(|o| o.has_errors()) {
        let user = whoami();
        let mut log = report::output_header(&user, &setup.config.id, setup.env.course.as_deref());
        for outcome in outcomes {
            log.push_str(&outcome.report());
        }
        report::write_error_log(dir, &log)?;
        println!("\nSee {} for details.", handin::paths::ERROR_LOG);
        return Err(HandinError::CheckFailed.into());
    }

    report::remove_stale_error_log(dir)?;
    println!("{}", "All checks passed.".green());
    Ok(())
}

fn cmd_submit(
    hw: &str,
    paths: &PathArgs,
    handin_dir: Option<&str>,
    user: Option<&str>,
    force: bool,
) -> Result<()> {
    let setup = load_setup(hw, paths, false)?;
    let cwd = std::env::current_dir()?;
    let (problems, outcomes) = check_directory(&setup.config, setup.options.clone(), &cwd)?;

    let user = user.map(str::to_string).unwrap_or_else(whoami);
    let handin_root = Env::resolve_path(handin_dir, setup.env.handin_dir.as_deref())
        .ok_or_else(|| anyhow::anyhow!("no handin directory configured (--handin-dir)"))?;

    let failed = outcomes.iter().any(|o| o.has_errors());
    if failed && !force {
        // Writes errors.log and exits through the CheckFailed path.
        return finish_local_check(&setup, &cwd, &outcomes);
    }

    let service = AfsPermissions::new(false, false);
    let submission = submit::Submission {
        user: &user,
        assignment: &setup.config.id,
        course: setup.env.course.as_deref(),
        force,
    };
    let result = submit::submit(
        &service,
        &submission,
        &cwd,
        &handin_root,
        &problems,
        &outcomes,
    )?;

    if result.forced {
        println!(
            "{} submitted {} file(s) with failing checks",
            "⚠".yellow(),
            result.copied
        );
    } else {
        report::remove_stale_error_log(&cwd)?;
        println!(
            "{} Submitted {} file(s) to {}",
            "✓".green(),
            result.copied,
            handin_root.join(user.to_lowercase()).display()
        );
    }

    Ok(())
}

fn cmd_batch(
    hw: &str,
    paths: &PathArgs,
    roster_path: &Path,
    field: &str,
    handin_dir: Option<&str>,
    results_dir: Option<&str>,
) -> Result<()> {
    let setup = load_setup(hw, paths, true)?;
    let handin_root = Env::resolve_path(handin_dir, setup.env.handin_dir.as_deref())
        .ok_or_else(|| anyhow::anyhow!("no handin directory configured (--handin-dir)"))?;
    let results_root = Env::resolve_path(results_dir, setup.env.results_dir.as_deref())
        .unwrap_or_else(|| PathBuf::from("."));

    let students = roster::load_roster(roster_path, field)?;
    let problems: Vec<Problem> = setup
        .config
        .problems
        .iter()
        .map(Problem::from_record)
        .collect();

    let toolchain = VcsToolchain;
    let comparator = SvComparator::default();
    let checker = Checker::new(&toolchain, &comparator, setup.options);
    let runner = BatchRunner::new(
        &checker,
        &problems,
        &handin_root,
        &setup.config.id,
        setup.env.course.as_deref(),
    );

    handin::batch::setup_signal_handler();

    println!(
        "Checking {} student(s) for {}",
        students.len(),
        setup.config.id.cyan()
    );
    let results = runner.run(&students)?;

    let mut failing = Vec::new();
    for result in &results {
        let marker = if result.has_errors {
            "✗".red()
        } else {
            "✓".green()
        };
        println!("  {} {}", marker, result.student);
        if result.has_errors {
            failing.push(result.report.clone());
        }
    }

    match report::write_results(&results_root, &setup.config.id, &failing)? {
        Some(path) => println!(
            "\n{} of {} student(s) had errors; written to {}",
            failing.len(),
            results.len(),
            path.display()
        ),
        None => println!("\n{}", "No errors across the roster.".green()),
    }

    Ok(())
}

fn load_dirs_roster(roster_path: &Path, field: &str) -> Result<Vec<String>> {
    let students = roster::load_roster(roster_path, field)?;
    if students.is_empty() {
        anyhow::bail!("roster is empty");
    }
    Ok(students)
}

fn cmd_dirs_create(
    base: &Path,
    roster_path: &Path,
    field: &str,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    let students = load_dirs_roster(roster_path, field)?;
    let service = AfsPermissions::new(dry_run, verbose);
    let bad_ids = perms::create_student_dirs(&service, base, &students)?;
    perms::print_bad_ids(&bad_ids);
    println!(
        "{} {} student dir(s) processed, {} failed",
        "Done!".green(),
        students.len(),
        bad_ids.len()
    );
    Ok(())
}

fn cmd_dirs_open(
    base: &Path,
    roster_path: &Path,
    field: &str,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    let students = load_dirs_roster(roster_path, field)?;
    let service = AfsPermissions::new(dry_run, verbose);
    let mut bad_ids = Vec::new();
    for student in &students {
        let dir = base.join(student.to_lowercase());
        if service.open(student, &dir).is_err() {
            bad_ids.push(student.clone());
        }
    }
    perms::print_bad_ids(&bad_ids);
    Ok(())
}

fn cmd_dirs_close(
    base: &Path,
    roster_path: &Path,
    field: &str,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    let students = load_dirs_roster(roster_path, field)?;
    let service = AfsPermissions::new(dry_run, verbose);
    let bad_ids = perms::close_student_dirs(&service, base, &students);
    perms::print_bad_ids(&bad_ids);
    Ok(())
}

fn cmd_version(verbose: bool) -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    println!("handin {}", VERSION);

    if verbose {
        const GIT_SHA: &str = env!("GIT_SHA");
        const BUILD_DATE: &str = env!("BUILD_DATE");
        println!("commit: {}", GIT_SHA);
        println!("built: {}", BUILD_DATE);
    }

    Ok(())
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}
