//! Handin directory permission management.
//!
//! Handin directories live on AFS; write access is granted and revoked
//! with the `fs` command. [`PermissionService`] is the seam the rest of
//! the tool consumes: a boolean can-write query plus open/close operations
//! keyed by user and path. Failures for individual students are collected
//! and reported in bulk - one bad id never aborts a roster-wide sweep.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fs as stdfs;
use std::path::Path;
use std::process::Command;

/// Access control over per-student handin directories.
pub trait PermissionService {
    /// Whether `user` currently has write access to `path`.
    fn can_write(&self, user: &str, path: &Path) -> Result<bool>;

    /// Grant `user` write access to `path`. An error means the grant
    /// failed for this user; callers collect the id and continue.
    fn open(&self, user: &str, path: &Path) -> Result<()>;

    /// Reduce `user` to read-only access on `path`.
    fn close(&self, user: &str, path: &Path) -> Result<()>;

    /// Commands are echoed without executing; filesystem changes are
    /// skipped too.
    fn dry_run(&self) -> bool {
        false
    }

    fn verbose(&self) -> bool {
        false
    }
}

/// Default ACL applied before each student grant: staff and admins keep
/// full control, nobody else gets in.
const DEFAULT_ACL: &[&str] = &[
    "ee:ta",
    "rlidwka",
    "ee:staff",
    "rlidwka",
    "ee",
    "rlidwka",
    "system:administrators",
    "rlidwk",
];

/// Credential-merge accounts use the mail-style principal; grants are
/// retried with this suffix when the bare id fails.
const EMAIL_SUFFIX: &str = "@andrew.cmu.edu";

/// AFS-backed permission service shelling out to `fs sa` / `fs la`.
pub struct AfsPermissions {
    /// Print the commands and skip execution.
    pub dry_run: bool,
    pub verbose: bool,
}

impl AfsPermissions {
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        AfsPermissions { dry_run, verbose }
    }

    fn run_fs(&self, args: &[&str]) -> Result<bool> {
        if self.verbose {
            println!("fs {}", args.join(" "));
        }
        if self.dry_run {
            return Ok(true);
        }
        let status = Command::new("fs")
            .args(args)
            .stderr(std::process::Stdio::null())
            .status()
            .context("failed to run 'fs' - is AFS available?")?;
        Ok(status.success())
    }

    /// Grant an access right, retrying with the mail-style principal.
    fn set_access(&self, user: &str, path: &Path, right: &str) -> Result<()> {
        let path_str = path.to_string_lossy();
        if self.run_fs(&["sa", &path_str, user, right])? {
            return Ok(());
        }
        let email = format!("{user}{EMAIL_SUFFIX}");
        if self.run_fs(&["sa", &path_str, &email, right])? {
            return Ok(());
        }
        bail!("unable to set '{right}' access on {path_str} for {user}");
    }
}

impl PermissionService for AfsPermissions {
    fn can_write(&self, user: &str, path: &Path) -> Result<bool> {
        let output = Command::new("fs")
            .arg("la")
            .arg(path)
            .output()
            .context("failed to run 'fs' - is AFS available?")?;
        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(has_write_entry(&listing, user))
    }

    fn open(&self, user: &str, path: &Path) -> Result<()> {
        // Reset to the default ACL first so stale grants do not linger.
        let path_str = path.to_string_lossy();
        let mut clear = vec!["sa", &path_str, "-clear", "-acl"];
        clear.extend_from_slice(DEFAULT_ACL);
        if !self.run_fs(&clear)? {
            bail!("unable to set default ACL on {path_str}");
        }
        self.set_access(user, path, "write")
    }

    fn close(&self, user: &str, path: &Path) -> Result<()> {
        self.set_access(user, path, "read")
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Scan an `fs la` listing for the line describing `user` and check it
/// carries the write right set (`rlidwk`).
fn has_write_entry(listing: &str, user: &str) -> bool {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.strip_prefix(user)
                .is_some_and(|rest| rest.starts_with(char::is_whitespace))
        })
        .any(|line| line.contains("rlidwk"))
}

/// Create a handin directory per student under `base` and open write
/// access. Returns the ids that could not be fully set up; the sweep
/// never aborts on one bad id.
pub fn create_student_dirs(
    service: &dyn PermissionService,
    base: &Path,
    students: &[String],
) -> Result<Vec<String>> {
    let mut bad_ids = Vec::new();

    for student in students {
        let dir = base.join(student.to_lowercase());
        if !service.dry_run() && !dir.exists() {
            stdfs::create_dir(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        } else if service.verbose() {
            println!(
                "\thandin dir already exists for {}, skipping",
                student.to_lowercase()
            );
        }
        if service.open(student, &dir).is_err() {
            bad_ids.push(student.clone());
        }
    }

    Ok(bad_ids)
}

/// Revoke write access on every student directory under `base`. Returns
/// the ids whose revocation failed.
pub fn close_student_dirs(
    service: &dyn PermissionService,
    base: &Path,
    students: &[String],
) -> Vec<String> {
    let mut bad_ids = Vec::new();
    for student in students {
        let dir = base.join(student.to_lowercase());
        if service.close(student, &dir).is_err() {
            bad_ids.push(student.clone());
        }
    }
    bad_ids
}

/// Bulk report for ids whose permission changes failed.
pub fn print_bad_ids(bad_ids: &[String]) {
    if bad_ids.is_empty() {
        return;
    }
    eprintln!("\n{} unable to set perms for", "Error:".red());
    for id in bad_ids {
        eprintln!("\t{id}");
    }
    eprintln!("Please check that the id is correct, and that the student is in the system.");
}
