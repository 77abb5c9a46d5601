//! Assignment configuration search and parsing.
//!
//! One JSON document per assignment, an array of problem records. The file
//! is named `<assignmentId>_cfg.json` and located by a case-insensitive
//! scan of the config directory, so `handin check hw3` finds
//! `HW3_cfg.json` too.

use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HandinError;
use crate::paths;

/// One raw problem record as it appears in the config JSON.
///
/// Any of the list fields may be absent or explicitly `null`, meaning "not
/// applicable" - neither is an error, the corresponding descriptor field
/// is simply left unset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    /// Problem number, unique within the assignment. Negative numbers mark
    /// lab problems, which skip the interface check.
    pub number: i64,
    /// Files that must exist in the student directory (glob-capable).
    #[serde(default)]
    pub files: Option<Vec<String>>,
    /// Files submitted to the compiler toolchain (glob-capable).
    #[serde(default)]
    pub compile_files: Option<Vec<String>>,
    /// Reserved for future testbench execution. Parsed, never consumed.
    #[serde(default)]
    pub test_files: Option<Vec<String>>,
    /// When present, compilation is scoped per named module instead of
    /// whole-file.
    #[serde(default)]
    pub specific_modules: Option<Vec<String>>,
}

/// A parsed assignment config: canonical id plus problem records sorted
/// ascending by problem number.
#[derive(Debug, Clone)]
pub struct AssignmentConfig {
    /// Assignment id with the case taken from the matched filename.
    pub id: String,
    pub problems: Vec<ProblemRecord>,
}

impl AssignmentConfig {
    /// Locate and parse the config for `id` under `cfg_dir`.
    ///
    /// Fails with [`HandinError::ConfigNotFound`] when no file matches and
    /// [`HandinError::ConfigMalformed`] when the content is not a valid
    /// problem array. Both are terminal for the entire run - there is no
    /// per-student recovery without a valid config.
    pub fn load(id: &str, cfg_dir: &Path) -> Result<Self> {
        let path = find_config(id, cfg_dir)?;
        let canonical_id = canonical_id(&path);

        let content = fs::read_to_string(&path)
            .map_err(|e| HandinError::ConfigMalformed(e.to_string()))?;
        let mut problems: Vec<ProblemRecord> = serde_json::from_str(&content)
            .map_err(|e| HandinError::ConfigMalformed(e.to_string()))?;

        problems.sort_by_key(|p| p.number);

        Ok(AssignmentConfig {
            id: canonical_id,
            problems,
        })
    }
}

/// Case-insensitive search for `<id>_cfg.json` in `cfg_dir`.
pub fn find_config(id: &str, cfg_dir: &Path) -> Result<PathBuf> {
    let wanted = format!("{}{}", id, paths::CONFIG_SUFFIX).to_lowercase();

    let entries = fs::read_dir(cfg_dir).map_err(|_| HandinError::ConfigNotFound)?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().to_lowercase() == wanted {
            return Ok(entry.path());
        }
    }

    Err(HandinError::ConfigNotFound.into())
}

/// Recover the properly-cased assignment id from a matched config path.
fn canonical_id(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // The filename matched `<id>_cfg.json` case-insensitively, so the id
    // is everything before the suffix.
    name[..name.len().saturating_sub(paths::CONFIG_SUFFIX.len())].to_string()
}
