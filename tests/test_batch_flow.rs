//! Roster-wide batch flow: roster → per-student checks → results artifact.

use handin::batch::BatchRunner;
use handin::config::AssignmentConfig;
use handin::pipeline::{CheckOptions, Checker};
use handin::problem::Problem;
use handin::report;
use handin::roster;
use std::fs;

mod support;
use support::harness::{CourseHarness, ScriptedComparator, ScriptedToolchain};

const HW5_CONFIG: &str = r#"[
    {
        "number": 1,
        "files": ["counter.sv"],
        "compileFiles": ["counter.sv"]
    },
    {
        "number": 2,
        "files": ["divider.sv"],
        "compileFiles": ["divider.sv"]
    }
]"#;

fn batch_problems(config: &AssignmentConfig) -> Vec<Problem> {
    config.problems.iter().map(Problem::from_record).collect()
}

#[test]
fn test_full_batch_writes_results_for_failures_only() {
    let harness = CourseHarness::new();
    harness.write_config("hw5", HW5_CONFIG);
    harness.add_student("abell", &["counter.sv", "divider.sv"]);
    harness.add_student("amellon", &["counter.sv"]); // divider.sv missing
    harness.add_student("acarnegie", &["counter.sv", "divider.sv"]);
    let roster_path = harness.write_roster(&["abell", "amellon", "acarnegie"]);

    let students = roster::load_roster(&roster_path, roster::DEFAULT_FIELD).expect("roster");
    assert_eq!(students.len(), 3);

    let config = AssignmentConfig::load("hw5", &harness.cfg_dir).expect("config");
    let problems = batch_problems(&config);
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
    let runner = BatchRunner::new(
        &checker,
        &problems,
        &harness.handin_dir,
        &config.id,
        Some("18-240"),
    );

    let results = runner.run(&students).expect("batch run");
    assert_eq!(results.len(), 3);
    assert!(!results[0].has_errors);
    assert!(results[1].has_errors);
    assert!(!results[2].has_errors);

    // Per-student error logs land only in failing directories.
    assert!(!harness
        .handin_dir
        .join("abell")
        .join(handin::paths::ERROR_LOG)
        .exists());
    assert!(harness
        .handin_dir
        .join("amellon")
        .join(handin::paths::ERROR_LOG)
        .exists());

    // Aggregate results file holds only the failing reports.
    let failing: Vec<String> = results
        .iter()
        .filter(|r| r.has_errors)
        .map(|r| r.report.clone())
        .collect();
    let path = report::write_results(harness.dir.path(), &config.id, &failing)
        .expect("write results")
        .expect("some failures");
    let contents = fs::read_to_string(&path).expect("read results");
    assert!(contents.contains("amellon"));
    assert!(contents.contains("divider.sv"));
    assert!(!contents.contains("acarnegie"));
    assert!(contents.contains("generated:"));
}

#[test]
fn test_clean_roster_writes_no_results_file() {
    let harness = CourseHarness::new();
    harness.write_config("hw5", HW5_CONFIG);
    harness.add_student("abell", &["counter.sv", "divider.sv"]);

    let config = AssignmentConfig::load("hw5", &harness.cfg_dir).expect("config");
    let problems = batch_problems(&config);
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
    let runner = BatchRunner::new(&checker, &problems, &harness.handin_dir, &config.id, None);

    let results = runner.run(&["abell".to_string()]).expect("batch run");
    assert!(!results[0].has_errors);

    let written = report::write_results(harness.dir.path(), &config.id, &[]).expect("write");
    assert!(written.is_none());
    assert!(!harness
        .dir
        .path()
        .join(format!("{}_results.txt", config.id))
        .exists());
}

#[test]
fn test_batch_report_header_and_banner_shape() {
    let harness = CourseHarness::new();
    harness.write_config("hw5", HW5_CONFIG);
    harness.add_student("amellon", &[]); // everything missing

    let config = AssignmentConfig::load("hw5", &harness.cfg_dir).expect("config");
    let problems = batch_problems(&config);
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
    let runner = BatchRunner::new(
        &checker,
        &problems,
        &harness.handin_dir,
        &config.id,
        Some("18-240"),
    );

    let result = runner.check_student("amellon").expect("check");
    assert!(result.has_errors);

    // Banner lines are fixed-width asterisk rules.
    for line in result.report.lines().filter(|l| l.starts_with('*')) {
        assert_eq!(line.chars().count(), 80, "banner line drifted: {line}");
    }
    assert!(result.report.contains("amellon"));
    assert!(result.report.contains("18-240"));
    assert!(result.report.contains("Problem 1"));
    assert!(result.report.contains("Problem 2"));
}
