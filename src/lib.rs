//! # handin - homework check pipeline
//!
//! Configuration-driven verification of hardware-design homework
//! submissions. Given a declarative per-assignment config, the tool runs a
//! three-stage check sequence (existence, interface conformance,
//! compilation) against a student working directory, accumulates failures
//! without short-circuiting across problems, and renders structured error
//! reports for students and course staff.
//!
//! ## Core Concepts
//!
//! - **Assignment config**: one JSON document per assignment, one record
//!   per gradable problem (`<id>_cfg.json`, matched case-insensitively)
//! - **Problem descriptor**: the resolved unit of work for one problem -
//!   which files must exist, which must compile, which modules to target
//! - **Check pipeline**: the staged checker; any failing stage ends that
//!   problem's run, later problems are unaffected
//! - **Batch runner**: drives the pipeline across a class roster and
//!   produces the roster-level results artifact
//!
//! ## Modules
//!
//! - [`config`] - assignment config search and parsing
//! - [`problem`] - problem descriptors and wildcard resolution
//! - [`pipeline`] - the three-stage check pipeline and its diagnostics
//! - [`toolchain`] - compiler toolchain boundary (vlogan/vcs)
//! - [`interface`] - module interface comparator boundary
//! - [`submit`] - copying checked work into the handin tree
//! - [`batch`] - roster-wide checking
//! - [`report`] - banner rendering and persisted artifacts
//! - [`perms`] - handin directory permission management (AFS)
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use handin::config::AssignmentConfig;
//! use handin::pipeline::{CheckContext, CheckOptions, Checker};
//! use handin::problem::Problem;
//!
//! let config = AssignmentConfig::load("hw3", Path::new("/afs/course/cfg"))
//!     .expect("failed to load config");
//!
//! let comparator = handin::interface::SvComparator::default();
//! let checker = Checker::new(
//!     &handin::toolchain::VcsToolchain,
//!     &comparator,
//!     CheckOptions::default(),
//! );
//!
//! let ctx = CheckContext::new(std::env::current_dir().unwrap());
//! for record in &config.problems {
//!     let mut problem = Problem::from_record(record);
//!     problem.resolve(&ctx.student_dir);
//!     let outcome = checker.check(&problem, &ctx).expect("check run failed");
//!     if outcome.has_errors() {
//!         eprintln!("{}", outcome.report());
//!     }
//! }
//! ```

pub mod batch;
pub mod config;
pub mod env;
pub mod error;
pub mod interface;
pub mod perms;
pub mod pipeline;
pub mod problem;
pub mod report;
pub mod roster;
pub mod submit;
pub mod toolchain;

/// Fixed file-name conventions shared across the tool.
pub mod paths {
    /// Suffix of per-assignment config files: `<id>_cfg.json`
    pub const CONFIG_SUFFIX: &str = "_cfg.json";
    /// Per-student error report written into the working directory
    pub const ERROR_LOG: &str = "errors.log";
    /// Suffix of the roster-level results artifact: `<id>_results.txt`
    pub const RESULTS_SUFFIX: &str = "_results.txt";
    /// Suffix of interface reference files: `<stem>_ref.sv`
    pub const REF_SUFFIX: &str = "_ref.sv";
    /// Optional tool environment file searched in the working directory
    pub const ENV_FILE: &str = "handin.yaml";
}

/// Generate a UTC timestamp in ISO 8601 format: `YYYY-MM-DDTHH:MM:SSZ`
///
/// Uses `chrono::Utc::now()` so the timestamp is truly UTC, not local time
/// with a misleading `Z` suffix.
pub fn utc_now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
