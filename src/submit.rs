//! Submitting checked work into the handin tree.
//!
//! The submit flow runs after the check pipeline: it refuses failed work
//! unless forced, validates the student's handin directory and write
//! access, copies the checked files, and keeps the handin-side
//! `errors.log` in sync with what was submitted.

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::error::HandinError;
use crate::perms::PermissionService;
use crate::pipeline::Outcome;
use crate::problem::Problem;
use crate::report;

/// Identity and policy for one submission attempt.
pub struct Submission<'a> {
    pub user: &'a str,
    pub assignment: &'a str,
    pub course: Option<&'a str>,
    /// Submit even when checks failed.
    pub force: bool,
}

/// What a completed submission did.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// Files copied into the handin directory.
    pub copied: usize,
    /// True when the copy went through despite failing checks.
    pub forced: bool,
}

/// Copy a checked submission from `source_dir` into the student's handin
/// directory under `handin_root`.
///
/// Any failing outcome refuses the submission unless `force` is set. The
/// target directory must already exist and be writable by the student;
/// each condition maps to its own error kind so callers surface the right
/// message and exit code. A forced submission with failures writes the
/// handin-side `errors.log` alongside the files; a clean one removes any
/// stale log.
pub fn submit(
    service: &dyn PermissionService,
    submission: &Submission,
    source_dir: &Path,
    handin_root: &Path,
    problems: &[Problem],
    outcomes: &[Outcome],
) -> Result<SubmitOutcome> {
    let failed = outcomes.iter().any(|o| o.has_errors());
    if failed && !submission.force {
        return Err(HandinError::CheckFailed.into());
    }

    let target = handin_root.join(submission.user.to_lowercase());
    if !target.is_dir() {
        return Err(HandinError::HandinDirMissing.into());
    }
    if !service.can_write(submission.user, &target)? {
        return Err(HandinError::HandinPermDenied.into());
    }

    let mut copied = 0usize;
    for problem in problems {
        for file in problem.files_to_submit() {
            let source = source_dir.join(&file);
            // Missing files were already reported by the existence stage.
            if !source.exists() {
                continue;
            }
            let dest = target.join(&file);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &dest)?;
            copied += 1;
        }
    }

    if failed {
        let mut log = report::output_header(
            submission.user,
            submission.assignment,
            submission.course,
        );
        for outcome in outcomes {
            log.push_str(&outcome.report());
        }
        report::write_error_log(&target, &log)?;
    } else {
        report::remove_stale_error_log(&target)?;
    }

    Ok(SubmitOutcome {
        copied,
        forced: failed,
    })
}
