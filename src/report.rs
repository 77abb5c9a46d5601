//! Report rendering and persisted artifacts.
//!
//! Interactive output is colored; anything written to disk goes through
//! [`strip_ansi`] first so `errors.log` and the roster results file are
//! plain text. Stripping is lossless with respect to message content.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::paths;

/// Width of every banner and header line.
pub const BANNER_WIDTH: usize = 80;

/// A fully decorative banner line: 80 asterisks.
pub fn banner_line() -> String {
    format!("{}\n", "*".repeat(BANNER_WIDTH))
}

/// One 80-column header line with `text` centered between asterisk ends.
/// `filled` pads with asterisks instead of spaces. Deterministic for a
/// given input.
pub fn header_line(text: &str, filled: bool) -> String {
    let inner = BANNER_WIDTH - 2;
    let padded = format!(" {text} ");
    let remaining = inner.saturating_sub(padded.chars().count());
    let first = remaining / 2;
    let second = remaining - first;
    let filler = if filled { "*" } else { " " };
    format!(
        "*{}{}{}*\n",
        filler.repeat(first),
        padded,
        filler.repeat(second)
    )
}

/// The banner block heading one student's error log.
pub fn output_header(student: &str, assignment: &str, course: Option<&str>) -> String {
    let title = match course {
        Some(course) => format!("{course}: {assignment}"),
        None => assignment.to_string(),
    };
    let mut header = banner_line();
    header.push_str(&header_line(&title, false));
    header.push_str(&header_line(&format!("Error log for: {student}"), false));
    header.push_str(&banner_line());
    header
}

/// Remove ANSI SGR escape sequences, leaving message content intact.
pub fn strip_ansi(s: &str) -> String {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    let re = ANSI.get_or_init(|| Regex::new("\x1b\\[[0-9;]*m").expect("valid ANSI regex"));
    re.replace_all(s, "").into_owned()
}

/// Write (or overwrite) `errors.log` in `dir`, stripped of decoration.
pub fn write_error_log(dir: &Path, contents: &str) -> Result<()> {
    let path = dir.join(paths::ERROR_LOG);
    fs::write(&path, strip_ansi(contents))
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Remove a stale `errors.log` left by a previous failing run.
pub fn remove_stale_error_log(dir: &Path) -> Result<()> {
    let path = dir.join(paths::ERROR_LOG);
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Write the roster-level results artifact: all failing students' reports
/// joined with a blank-line separator, plus a generated-at stamp. Returns
/// the written path, or `None` when no student failed (nothing is written).
pub fn write_results(
    results_dir: &Path,
    assignment: &str,
    reports: &[String],
) -> Result<Option<PathBuf>> {
    if reports.is_empty() {
        return Ok(None);
    }

    let path = results_dir.join(format!("{assignment}{}", paths::RESULTS_SUFFIX));
    let mut contents = reports.join("\n\n");
    contents.push_str(&format!("\n\ngenerated: {}\n", crate::utc_now_iso()));
    fs::write(&path, strip_ansi(&contents))
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(Some(path))
}
