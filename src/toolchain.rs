//! Compiler toolchain boundary.
//!
//! The pipeline never interprets compiler output; it only needs to know
//! whether an invocation succeeded and, if not, the captured transcript.
//! [`Toolchain`] is the seam: production uses [`VcsToolchain`] (vlogan +
//! vcs as external processes), tests substitute in-memory fakes.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Result of one toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Success,
    /// Non-zero exit, with combined stdout/stderr transcript.
    Failure { transcript: String },
}

impl ToolOutput {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutput::Success)
    }
}

/// External compiler toolchain, invoked with `work_dir` as the process
/// working directory so build artifacts land in the compile sandbox
/// rather than the student's workspace.
pub trait Toolchain {
    /// Whole-file compilation of `files` in one invocation.
    fn compile(&self, files: &[PathBuf], work_dir: &Path) -> Result<ToolOutput>;

    /// Analysis-only pass over `files` (first step of per-module mode).
    fn analyze(&self, files: &[PathBuf], work_dir: &Path) -> Result<ToolOutput>;

    /// Elaborate one named module from previously analyzed sources.
    fn elaborate(&self, module: &str, work_dir: &Path) -> Result<ToolOutput>;
}

/// Flags shared by every vcs/vlogan invocation: quiet, SystemVerilog,
/// no license banner.
const TOOL_FLAGS: &[&str] = &["-q", "-sverilog", "-nc"];

/// The VCS toolchain: `vcs` for compilation and elaboration, `vlogan` for
/// the analysis-only pass.
pub struct VcsToolchain;

impl Toolchain for VcsToolchain {
    fn compile(&self, files: &[PathBuf], work_dir: &Path) -> Result<ToolOutput> {
        run_tool("vcs", files, work_dir)
    }

    fn analyze(&self, files: &[PathBuf], work_dir: &Path) -> Result<ToolOutput> {
        run_tool("vlogan", files, work_dir)
    }

    fn elaborate(&self, module: &str, work_dir: &Path) -> Result<ToolOutput> {
        run_tool("vcs", &[PathBuf::from(module)], work_dir)
    }
}

fn run_tool(program: &str, args: &[PathBuf], work_dir: &Path) -> Result<ToolOutput> {
    let output = Command::new(program)
        .args(TOOL_FLAGS)
        .args(args)
        .current_dir(work_dir)
        .output()
        .with_context(|| format!("failed to run '{program}' - is it on PATH?"))?;

    if output.status.success() {
        return Ok(ToolOutput::Success);
    }

    let mut transcript = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !transcript.is_empty() && !transcript.ends_with('\n') {
            transcript.push('\n');
        }
        transcript.push_str(&stderr);
    }

    Ok(ToolOutput::Failure { transcript })
}
