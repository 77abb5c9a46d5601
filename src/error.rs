//! Error taxonomy and stable exit codes.
//!
//! Every failure class the tool can surface to a caller has a fixed exit
//! code. Grading scripts branch on these values, so they are part of the
//! external interface and must not be renumbered.

use thiserror::Error;

/// Exit codes surfaced to callers.
pub mod exit_code {
    /// No matching assignment config file.
    pub const NO_CONFIG: i32 = 100;
    /// Config file exists but could not be parsed.
    pub const BAD_CONFIG: i32 = 101;
    /// One or more problem checks failed.
    pub const CHECK_FAILED: i32 = 200;
    /// A required file does not exist.
    pub const NO_EXIST: i32 = 201;
    /// Compilation failed.
    pub const NO_COMPILE: i32 = 202;
    /// Reserved for testbench execution.
    pub const FAIL_TEST: i32 = 203;
    /// Module interface does not match the reference.
    pub const BAD_INTERFACE: i32 = 204;
    /// Student handin directory not found.
    pub const HANDIN_DIR: i32 = 210;
    /// No write access to the handin directory.
    pub const HANDIN_PERM: i32 = 211;
    /// Interrupted by the user (128 + SIGINT).
    pub const INTERRUPTED: i32 = 130;
    /// Anything unclassified.
    pub const UNKNOWN: i32 = 255;
}

/// Failure classes that terminate a run.
///
/// Per-problem failures (missing files, compile errors, interface
/// mismatches) are *not* modeled here; they are accumulated as
/// [`crate::pipeline::Diagnostic`] values and never abort the batch. This
/// enum covers the run-level conditions that do.
#[derive(Debug, Error)]
pub enum HandinError {
    #[error("no config found. Are you sure the assignment id is correct?")]
    ConfigNotFound,

    #[error("error parsing config file:\n{0}\n\nPlease contact course staff.")]
    ConfigMalformed(String),

    #[error("one or more checks failed")]
    CheckFailed,

    #[error(
        "your handin directory was not found. Are you sure you are \
         enrolled? Please contact course staff if the problem persists."
    )]
    HandinDirMissing,

    #[error(
        "access to handin directory denied. Are you trying to submit past \
         the deadline? If not, please contact course staff."
    )]
    HandinPermDenied,

    #[error("interrupted")]
    Interrupted,
}

impl HandinError {
    pub fn exit_code(&self) -> i32 {
        match self {
            HandinError::ConfigNotFound => exit_code::NO_CONFIG,
            HandinError::ConfigMalformed(_) => exit_code::BAD_CONFIG,
            HandinError::CheckFailed => exit_code::CHECK_FAILED,
            HandinError::HandinDirMissing => exit_code::HANDIN_DIR,
            HandinError::HandinPermDenied => exit_code::HANDIN_PERM,
            HandinError::Interrupted => exit_code::INTERRUPTED,
        }
    }
}
