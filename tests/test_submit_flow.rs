//! Submit flow: refusal on failures, handin-dir gating, copy, log sync.

use handin::config::AssignmentConfig;
use handin::error::HandinError;
use handin::pipeline::{CheckContext, CheckOptions, Checker, Outcome};
use handin::problem::Problem;
use handin::submit::{self, Submission};
use std::fs;
use std::path::{Path, PathBuf};

mod support;
use support::harness::{CourseHarness, ScriptedComparator, ScriptedPerms, ScriptedToolchain};

const HW2_CONFIG: &str = r#"[
    {
        "number": 1,
        "files": ["shifter.sv", "shifter_tb.sv"],
        "compileFiles": ["shifter.sv"]
    }
]"#;

/// Run the full check pipeline over `work_dir` and return what the submit
/// flow consumes.
fn checked(harness: &CourseHarness, work_dir: &Path) -> (String, Vec<Problem>, Vec<Outcome>) {
    let config = AssignmentConfig::load("hw2", &harness.cfg_dir).expect("config load");
    let toolchain = ScriptedToolchain::passing();
    let comparator = ScriptedComparator::matching();
    let checker = Checker::new(
        &toolchain,
        &comparator,
        CheckOptions {
            silent: true,
            ..Default::default()
        },
    );
    let ctx = CheckContext::new(work_dir);

    let mut problems = Vec::new();
    let mut outcomes = Vec::new();
    for record in &config.problems {
        let mut problem = Problem::from_record(record);
        problem.resolve(work_dir);
        outcomes.push(checker.check(&problem, &ctx).expect("check run"));
        problems.push(problem);
    }
    (config.id, problems, outcomes)
}

fn workspace(harness: &CourseHarness, files: &[&str]) -> PathBuf {
    let dir = harness.dir.path().join("work");
    fs::create_dir_all(&dir).expect("create workspace");
    for file in files {
        fs::write(dir.join(file), format!("// {file}\n")).expect("write work file");
    }
    dir
}

fn submission<'a>(assignment: &'a str, force: bool) -> Submission<'a> {
    Submission {
        user: "abell",
        assignment,
        course: Some("18-240"),
        force,
    }
}

#[test]
fn test_submit_refuses_failed_checks() {
    let harness = CourseHarness::new();
    harness.write_config("hw2", HW2_CONFIG);
    let target = harness.add_student("abell", &[]);
    let work = workspace(&harness, &["shifter.sv"]); // testbench missing

    let (id, problems, outcomes) = checked(&harness, &work);
    let perms = ScriptedPerms { writable: true };

    let err = submit::submit(
        &perms,
        &submission(&id, false),
        &work,
        &harness.handin_dir,
        &problems,
        &outcomes,
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<HandinError>().unwrap(),
        HandinError::CheckFailed
    ));
    // Nothing landed in the handin directory.
    assert!(!target.join("shifter.sv").exists());
}

#[test]
fn test_submit_requires_existing_handin_directory() {
    let harness = CourseHarness::new();
    harness.write_config("hw2", HW2_CONFIG);
    let work = workspace(&harness, &["shifter.sv", "shifter_tb.sv"]);

    let (id, problems, outcomes) = checked(&harness, &work);
    let perms = ScriptedPerms { writable: true };

    let err = submit::submit(
        &perms,
        &submission(&id, false),
        &work,
        &harness.handin_dir,
        &problems,
        &outcomes,
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<HandinError>().unwrap(),
        HandinError::HandinDirMissing
    ));
}

#[test]
fn test_submit_requires_write_access() {
    let harness = CourseHarness::new();
    harness.write_config("hw2", HW2_CONFIG);
    harness.add_student("abell", &[]);
    let work = workspace(&harness, &["shifter.sv", "shifter_tb.sv"]);

    let (id, problems, outcomes) = checked(&harness, &work);
    let perms = ScriptedPerms { writable: false };

    let err = submit::submit(
        &perms,
        &submission(&id, false),
        &work,
        &harness.handin_dir,
        &problems,
        &outcomes,
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<HandinError>().unwrap(),
        HandinError::HandinPermDenied
    ));
}

#[test]
fn test_clean_submit_copies_files_and_clears_stale_log() {
    let harness = CourseHarness::new();
    harness.write_config("hw2", HW2_CONFIG);
    let target = harness.add_student("abell", &[]);
    fs::write(target.join(handin::paths::ERROR_LOG), "old failures").expect("stale log");
    let work = workspace(&harness, &["shifter.sv", "shifter_tb.sv"]);

    let (id, problems, outcomes) = checked(&harness, &work);
    let perms = ScriptedPerms { writable: true };

    let result = submit::submit(
        &perms,
        &submission(&id, false),
        &work,
        &harness.handin_dir,
        &problems,
        &outcomes,
    )
    .expect("submit");

    assert_eq!(result.copied, 2);
    assert!(!result.forced);
    assert!(target.join("shifter.sv").exists());
    assert!(target.join("shifter_tb.sv").exists());
    assert!(!target.join(handin::paths::ERROR_LOG).exists());
}

#[test]
fn test_forced_submit_copies_and_writes_error_log() {
    let harness = CourseHarness::new();
    harness.write_config("hw2", HW2_CONFIG);
    let target = harness.add_student("abell", &[]);
    let work = workspace(&harness, &["shifter.sv"]); // testbench missing

    let (id, problems, outcomes) = checked(&harness, &work);
    let perms = ScriptedPerms { writable: true };

    let result = submit::submit(
        &perms,
        &submission(&id, true),
        &work,
        &harness.handin_dir,
        &problems,
        &outcomes,
    )
    .expect("forced submit");

    assert!(result.forced);
    assert_eq!(result.copied, 1);
    assert!(target.join("shifter.sv").exists());

    let log = fs::read_to_string(target.join(handin::paths::ERROR_LOG)).expect("read log");
    assert!(log.contains("abell"));
    assert!(log.contains("shifter_tb.sv"));
    assert!(log.contains("file does not exist"));
}
