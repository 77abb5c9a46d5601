//! Roster-wide checking.
//!
//! The batch runner drives the check pipeline once per student, ascending
//! problem order within each student, and never short-circuits: one
//! student's failure - or even an infrastructure fault while checking them
//! - does not prevent checking the rest of the roster. Config-level
//! failures are the only thing that aborts a batch, and those happen
//! before the runner is constructed.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::HandinError;
use crate::pipeline::{CheckContext, Checker};
use crate::problem::Problem;
use crate::report;

/// The aggregate result for one student.
#[derive(Debug, Clone)]
pub struct StudentResult {
    pub student: String,
    pub has_errors: bool,
    /// Full formatted report: banner header plus per-problem blocks.
    pub report: String,
}

static BATCH_INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Install a SIGINT handler for graceful batch interruption: the current
/// student finishes (temp dirs and log writes complete), then the batch
/// stops. A second Ctrl-C forces exit.
pub fn setup_signal_handler() {
    BATCH_INTERRUPTED.store(false, Ordering::SeqCst);
    let _ = ctrlc::set_handler(move || {
        if BATCH_INTERRUPTED.load(Ordering::SeqCst) {
            eprintln!("\n{} Force exit", "✗".red());
            std::process::exit(crate::error::exit_code::INTERRUPTED);
        }
        eprintln!(
            "\n{} Interrupt received - finishing current student before stopping...",
            "→".yellow()
        );
        BATCH_INTERRUPTED.store(true, Ordering::SeqCst);
    });
}

fn interrupted() -> bool {
    BATCH_INTERRUPTED.load(Ordering::SeqCst)
}

/// Drives the pipeline across a roster for one assignment.
pub struct BatchRunner<'a> {
    checker: &'a Checker<'a>,
    /// Unresolved descriptors, sorted ascending by problem number. Cloned
    /// and resolved per student so one student's glob matches never leak
    /// into another's run.
    problems: &'a [Problem],
    handin_dir: &'a Path,
    assignment: &'a str,
    course: Option<&'a str>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        checker: &'a Checker<'a>,
        problems: &'a [Problem],
        handin_dir: &'a Path,
        assignment: &'a str,
        course: Option<&'a str>,
    ) -> Self {
        BatchRunner {
            checker,
            problems,
            handin_dir,
            assignment,
            course,
        }
    }

    /// Check every student on the roster. Always returns one result per
    /// student checked; an interrupt ends the sweep early with
    /// [`HandinError::Interrupted`] after the current student completes.
    pub fn run(&self, roster: &[String]) -> Result<Vec<StudentResult>> {
        let mut results = Vec::with_capacity(roster.len());

        for student in roster {
            if interrupted() {
                return Err(HandinError::Interrupted.into());
            }

            match self.check_student(student) {
                Ok(result) => results.push(result),
                // Infrastructure faults for one student (unreadable dir,
                // tool hiccup) are recorded as a failed result so the rest
                // of the roster still runs.
                Err(err) => results.push(StudentResult {
                    student: student.clone(),
                    has_errors: true,
                    report: format!(
                        "{}{}: {:#}\n",
                        report::output_header(student, self.assignment, self.course),
                        student,
                        err
                    ),
                }),
            }
        }

        Ok(results)
    }

    /// Check one student's directory against every problem, ascending by
    /// number, and maintain their `errors.log`: written when anything
    /// failed, removed when everything passes.
    pub fn check_student(&self, student: &str) -> Result<StudentResult> {
        let student_dir = self.handin_dir.join(student.to_lowercase());
        let mut report = report::output_header(student, self.assignment, self.course);

        if !student_dir.is_dir() {
            report.push_str(&format!("{student}: handin directory missing\n"));
            return Ok(StudentResult {
                student: student.to_string(),
                has_errors: true,
                report,
            });
        }

        let ctx = CheckContext::new(&student_dir);
        let mut has_errors = false;

        for unresolved in self.problems {
            let mut problem = unresolved.clone();
            problem.resolve(&student_dir);

            let outcome = self.checker.check(&problem, &ctx)?;
            if outcome.has_errors() {
                has_errors = true;
                report.push_str(&outcome.report());
            }
        }

        if has_errors {
            report::write_error_log(&student_dir, &report)?;
        } else {
            report::remove_stale_error_log(&student_dir)?;
        }

        Ok(StudentResult {
            student: student.to_string(),
            has_errors,
            report,
        })
    }
}
