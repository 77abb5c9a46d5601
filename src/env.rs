//! Tool environment configuration.
//!
//! Course-wide paths (config dir, reference dir, handin tree, results dir)
//! live in an optional `handin.yaml` so students and staff do not retype
//! them on every invocation. CLI flags override anything set here.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Parsed environment file. Every field is optional; unset fields fall
/// back to CLI flags or their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Env {
    /// Directory containing `<id>_cfg.json` files.
    #[serde(default)]
    pub cfg_dir: Option<String>,
    /// Root of the interface reference files.
    #[serde(default)]
    pub ref_dir: Option<String>,
    /// Root of the per-student handin directories.
    #[serde(default)]
    pub handin_dir: Option<String>,
    /// Where roster-level results artifacts are written.
    #[serde(default)]
    pub results_dir: Option<String>,
    /// Course label used in report headers (e.g. "18-240").
    #[serde(default)]
    pub course: Option<String>,
}

impl Env {
    /// Load the environment file. An explicit `path` must exist; otherwise
    /// `handin.yaml` in the working directory is used when present, and a
    /// missing default file yields an empty environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(paths::ENV_FILE);
                if !default.exists() {
                    return Ok(Env::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read environment file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse environment file {}", path.display()))
    }

    /// Resolve one path-valued setting: flag wins over environment file,
    /// `~` is expanded in either.
    pub fn resolve_path(flag: Option<&str>, env_value: Option<&str>) -> Option<PathBuf> {
        flag.or(env_value)
            .map(|raw| PathBuf::from(shellexpand::tilde(raw).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("handin.yaml");
        fs::write(
            &path,
            "cfg_dir: /afs/course/cfg\nhandin_dir: /afs/course/handin\ncourse: 18-240\n",
        )
        .unwrap();

        let env = Env::load(Some(&path)).unwrap();
        assert_eq!(env.cfg_dir.as_deref(), Some("/afs/course/cfg"));
        assert_eq!(env.course.as_deref(), Some("18-240"));
        assert!(env.ref_dir.is_none());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Env::load(Some(Path::new("/nonexistent/handin.yaml"))).is_err());
    }

    #[test]
    fn test_flag_overrides_env_value() {
        let resolved = Env::resolve_path(Some("/from/flag"), Some("/from/env")).unwrap();
        assert_eq!(resolved, PathBuf::from("/from/flag"));
    }

    #[test]
    fn test_env_value_used_when_no_flag() {
        let resolved = Env::resolve_path(None, Some("/from/env")).unwrap();
        assert_eq!(resolved, PathBuf::from("/from/env"));
    }

    #[test]
    fn test_tilde_expansion() {
        let resolved = Env::resolve_path(Some("~/handin"), None).unwrap();
        assert!(!resolved.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_neither_set_is_none() {
        assert!(Env::resolve_path(None, None).is_none());
    }
}
