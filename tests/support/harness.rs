use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use anyhow::Result;
use handin::interface::InterfaceComparator;
use handin::perms::PermissionService;
use handin::toolchain::{ToolOutput, Toolchain};

/// CourseHarness provides an isolated on-disk course layout for tests:
/// a config directory, a reference directory, and a handin tree, all
/// inside one temp dir that is cleaned up on drop.
pub struct CourseHarness {
    pub dir: TempDir,
    pub cfg_dir: PathBuf,
    pub ref_dir: PathBuf,
    pub handin_dir: PathBuf,
}

impl CourseHarness {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg_dir = dir.path().join("cfg");
        let ref_dir = dir.path().join("reference");
        let handin_dir = dir.path().join("handin");
        for d in [&cfg_dir, &ref_dir, &handin_dir] {
            fs::create_dir_all(d).expect("Failed to create course dir");
        }
        CourseHarness {
            dir,
            cfg_dir,
            ref_dir,
            handin_dir,
        }
    }

    /// Write an assignment config file `<id>_cfg.json` into the config dir.
    pub fn write_config(&self, id: &str, json: &str) {
        let path = self.cfg_dir.join(format!("{id}_cfg.json"));
        fs::write(path, json).expect("Failed to write config");
    }

    /// Create a student handin directory populated with the given files.
    pub fn add_student(&self, id: &str, files: &[&str]) -> PathBuf {
        let dir = self.handin_dir.join(id);
        fs::create_dir_all(&dir).expect("Failed to create student dir");
        for file in files {
            let path = dir.join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent dir");
            }
            fs::write(&path, format!("// {file}\n")).expect("Failed to write student file");
        }
        dir
    }

    /// Write a reference interface file `<stem>_ref.sv` for `file`.
    pub fn add_reference(&self, file: &str) {
        let stem = Path::new(file)
            .file_stem()
            .expect("reference file needs a stem")
            .to_string_lossy();
        let path = self.ref_dir.join(format!("{stem}_ref.sv"));
        fs::write(&path, "// reference\n").expect("Failed to write reference");
    }

    /// Write a roster CSV and return its path.
    pub fn write_roster(&self, students: &[&str]) -> PathBuf {
        let mut csv = String::from("Name,Andrew ID\n");
        for student in students {
            csv.push_str(&format!("Somebody,{student}\n"));
        }
        let path = self.dir.path().join("roster.csv");
        fs::write(&path, csv).expect("Failed to write roster");
        path
    }
}

/// Toolchain stand-in that succeeds unless a listed file or module is
/// involved in the invocation.
pub struct ScriptedToolchain {
    pub failing: Vec<String>,
}

impl ScriptedToolchain {
    pub fn passing() -> Self {
        ScriptedToolchain { failing: vec![] }
    }

    fn matches(&self, name: &str) -> bool {
        self.failing.iter().any(|f| name.contains(f.as_str()))
    }

    fn outcome(&self, hit: bool, what: &str) -> Result<ToolOutput> {
        if hit {
            Ok(ToolOutput::Failure {
                transcript: format!("Error: {what} did not build\n"),
            })
        } else {
            Ok(ToolOutput::Success)
        }
    }
}

impl Toolchain for ScriptedToolchain {
    fn compile(&self, files: &[PathBuf], _work_dir: &Path) -> Result<ToolOutput> {
        let hit = files
            .iter()
            .any(|f| self.matches(&f.to_string_lossy()));
        self.outcome(hit, "compilation unit")
    }

    fn analyze(&self, files: &[PathBuf], _work_dir: &Path) -> Result<ToolOutput> {
        let hit = files
            .iter()
            .any(|f| self.matches(&f.to_string_lossy()));
        self.outcome(hit, "analysis unit")
    }

    fn elaborate(&self, module: &str, _work_dir: &Path) -> Result<ToolOutput> {
        self.outcome(self.matches(module), module)
    }
}

/// Permission stand-in with a scriptable can-write answer.
pub struct ScriptedPerms {
    pub writable: bool,
}

impl PermissionService for ScriptedPerms {
    fn can_write(&self, _user: &str, _path: &Path) -> Result<bool> {
        Ok(self.writable)
    }

    fn open(&self, _user: &str, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn close(&self, _user: &str, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Comparator stand-in that reports a mismatch for listed candidates.
pub struct ScriptedComparator {
    pub mismatching: Vec<String>,
}

impl ScriptedComparator {
    pub fn matching() -> Self {
        ScriptedComparator {
            mismatching: vec![],
        }
    }
}

impl InterfaceComparator for ScriptedComparator {
    fn compare(
        &self,
        _reference: &Path,
        candidate: &Path,
        _modules: Option<&[String]>,
    ) -> Result<String> {
        let name = candidate.to_string_lossy();
        if self.mismatching.iter().any(|m| name.contains(m.as_str())) {
            Ok(format!("port mismatch in {name}"))
        } else {
            Ok(String::new())
        }
    }
}
