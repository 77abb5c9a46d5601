//! Module interface comparator boundary.
//!
//! Interface conformance is delegated to an external comparator: given a
//! reference file and a candidate file (plus an optional module filter),
//! it produces an empty result on match and a diagnostic string on
//! mismatch. The pipeline consumes it purely through that contract.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::paths;

/// External interface comparator: empty string means the candidate's
/// module interfaces match the reference.
pub trait InterfaceComparator {
    fn compare(
        &self,
        reference: &Path,
        candidate: &Path,
        modules: Option<&[String]>,
    ) -> Result<String>;
}

/// Comparator backed by the course's `svinterface` checker binary.
///
/// The binary prints mismatch details to stdout and nothing on a match;
/// its exit status is not meaningful.
pub struct SvComparator {
    pub command: String,
}

impl Default for SvComparator {
    fn default() -> Self {
        SvComparator {
            command: "svinterface".to_string(),
        }
    }
}

impl InterfaceComparator for SvComparator {
    fn compare(
        &self,
        reference: &Path,
        candidate: &Path,
        modules: Option<&[String]>,
    ) -> Result<String> {
        let mut cmd = Command::new(&self.command);
        cmd.arg(reference).arg(candidate);
        if let Some(modules) = modules {
            for module in modules {
                cmd.arg("--module").arg(module);
            }
        }

        let output = cmd
            .output()
            .with_context(|| format!("failed to run '{}' - is it on PATH?", self.command))?;

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Map a student file to its reference artifact: same base name with the
/// extension replaced by `_ref.sv`, located under the reference root.
/// `pipes.sv` under `/afs/course/ref` becomes `/afs/course/ref/pipes_ref.sv`.
pub fn reference_path(ref_dir: &Path, file: &str) -> PathBuf {
    let stem = Path::new(file).with_extension("");
    ref_dir.join(format!("{}{}", stem.to_string_lossy(), paths::REF_SUFFIX))
}
