//! Roster loading.
//!
//! Class rosters arrive as CSV exports from the registrar. Only one column
//! matters - the student identifier - so this is a header-indexed column
//! extraction, not a general CSV machine. Quoted cells without embedded
//! commas are handled; that is all the registrar exports produce.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Header name of the student-identifier column in registrar exports.
pub const DEFAULT_FIELD: &str = "Andrew ID";

/// Load the ordered list of student identifiers from `path`, taking the
/// column whose header equals `field`.
pub fn load_roster(path: &Path, field: &str) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read roster {}", path.display()))?;
    parse_roster(&content, field)
}

fn parse_roster(content: &str, field: &str) -> Result<Vec<String>> {
    let mut lines = content.lines();
    let header = lines.next().unwrap_or_default();

    let column = split_row(header)
        .iter()
        .position(|cell| cell == field)
        .with_context(|| format!("roster has no '{field}' column"))?;

    let mut students = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_row(line);
        let Some(id) = cells.get(column) else {
            bail!("roster row has too few columns: {line}");
        };
        if !id.is_empty() {
            students.push(id.clone());
        }
    }

    Ok(students)
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().trim_matches('"').to_string())
        .collect()
}
