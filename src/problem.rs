//! Problem descriptors and wildcard resolution.
//!
//! A [`Problem`] is the unit of work for one numbered problem: which files
//! must exist, which are handed to the compiler, which modules to target.
//! File lists come from the config glob-capable; [`Problem::resolve`]
//! expands them into concrete, sorted, deduplicated relative paths.

use std::collections::BTreeSet;
use std::path::Path;

use crate::config::ProblemRecord;

/// Descriptor for one gradable problem.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    pub number: i64,
    /// Paths that must exist in the student directory.
    pub exist_files: Vec<String>,
    /// Paths submitted to the compiler toolchain.
    pub compile_files: Vec<String>,
    /// Reserved for future testbench execution; never consumed by the
    /// pipeline in this version.
    pub test_files: Vec<String>,
    /// When set, compilation runs per named module instead of whole-file.
    pub specific_modules: Option<Vec<String>>,
    /// True once any `exist_files` entry contained a wildcard. Compile-file
    /// wildcards deliberately do not set this: the flag only drives the
    /// "files that will be handed in" listing, which is defined over
    /// `exist_files`. Existing configs rely on the asymmetry.
    pub use_wildcard: bool,
}

impl Problem {
    /// Build an unresolved descriptor from one parsed config record.
    pub fn from_record(record: &ProblemRecord) -> Self {
        Problem {
            number: record.number,
            exist_files: record.files.clone().unwrap_or_default(),
            compile_files: record.compile_files.clone().unwrap_or_default(),
            test_files: record.test_files.clone().unwrap_or_default(),
            specific_modules: record.specific_modules.clone(),
            use_wildcard: false,
        }
    }

    /// Lab problems carry a negative number and skip the interface check.
    pub fn is_lab(&self) -> bool {
        self.number < 0
    }

    /// Expand glob patterns in the file lists against `base`.
    ///
    /// Literal entries pass through untouched whether or not they exist;
    /// the existence check owns reporting on those. Matches are recorded
    /// relative to `base`, sorted alphabetically, deduplicated. Resolution
    /// is idempotent: resolved lists contain no wildcard markers, so a
    /// second pass is a no-op.
    pub fn resolve(&mut self, base: &Path) {
        let mut saw_wildcard = false;
        self.exist_files = expand_list(&self.exist_files, base, &mut saw_wildcard);
        if saw_wildcard {
            self.use_wildcard = true;
        }

        let mut ignored = false;
        self.compile_files = expand_list(&self.compile_files, base, &mut ignored);
    }

    /// Union of all files this problem touches, in first-seen order.
    /// The submit flow copies exactly these into the handin directory.
    pub fn files_to_submit(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut files = Vec::new();
        for f in self.exist_files.iter().chain(self.compile_files.iter()) {
            if seen.insert(f.clone()) {
                files.push(f.clone());
            }
        }
        files
    }
}

/// Expand one file list: partition into literals and glob patterns, expand
/// patterns under `base`, union, sort, dedup.
fn expand_list(entries: &[String], base: &Path, saw_wildcard: &mut bool) -> Vec<String> {
    let mut resolved = BTreeSet::new();

    for entry in entries {
        if !entry.contains('*') {
            resolved.insert(entry.clone());
            continue;
        }

        *saw_wildcard = true;
        let pattern = base.join(entry);
        let Ok(matches) = glob::glob(&pattern.to_string_lossy()) else {
            // An unparseable pattern matches nothing, same as an empty glob.
            continue;
        };
        for path in matches.flatten() {
            let relative = path.strip_prefix(base).unwrap_or(&path);
            resolved.insert(relative.to_string_lossy().into_owned());
        }
    }

    resolved.into_iter().collect()
}
