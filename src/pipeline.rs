//! The three-stage check pipeline.
//!
//! One [`Checker::check`] call evaluates one problem against one student
//! directory: existence, then interface conformance, then compilation. A
//! failing stage accumulates its diagnostics and ends the run for that
//! problem; later stages are skipped, so a problem missing files is never
//! handed to the compiler. Each call produces a fresh [`Outcome`] - there
//! is no error state to clear between problems or students.
//!
//! Diagnostics separate content from presentation: they carry a kind and
//! plain text, and color is applied only at the display boundary. The
//! persisted artifacts are built from the plain form.

use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::interface::{self, InterfaceComparator};
use crate::problem::Problem;
use crate::report;
use crate::toolchain::{ToolOutput, Toolchain};

/// Classification of a per-problem failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    FileMissing,
    InterfaceMismatch,
    CompileFailed,
}

impl DiagnosticKind {
    /// The student-facing label, appended after the file name.
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::FileMissing => "file does not exist",
            DiagnosticKind::InterfaceMismatch => "incorrect interface",
            DiagnosticKind::CompileFailed => "failed to compile",
        }
    }
}

/// One recorded failure: what went wrong, for which file(s), and any
/// captured tool output.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// File name or comma-joined file list the failure applies to.
    pub subject: String,
    /// Comparator detail or compiler transcript, when available.
    pub detail: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            subject: subject.into(),
            detail: None,
        }
    }

    pub fn with_detail(
        kind: DiagnosticKind,
        subject: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            subject: subject.into(),
            detail: Some(detail.into()),
        }
    }

    /// One-line summary: `a.sv: file does not exist`
    pub fn headline(&self) -> String {
        format!("{}: {}", self.subject, self.kind.label())
    }

    /// Headline plus captured detail, plain text for persistence.
    pub fn message(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}\n{}\n", self.headline(), detail.trim_end()),
            None => format!("{}\n", self.headline()),
        }
    }

    /// Colored headline for interactive display.
    pub fn render(&self) -> String {
        format!("{}: {}", self.subject, self.kind.label().red())
    }
}

/// The immutable result of checking one problem. Produced fresh by every
/// pipeline invocation.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub number: i64,
    pub diagnostics: Vec<Diagnostic>,
}

impl Outcome {
    fn clean(number: i64) -> Self {
        Outcome {
            number,
            diagnostics: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Plain-text failure block for this problem, headed by its number.
    /// Empty on full success.
    pub fn report(&self) -> String {
        if self.diagnostics.is_empty() {
            return String::new();
        }
        let mut out = report::header_line(&format!("Problem {}", self.number), true);
        for diagnostic in &self.diagnostics {
            out.push_str(&diagnostic.message());
        }
        out.push('\n');
        out
    }
}

/// Where a check runs: the student's working directory, threaded through
/// every stage explicitly. The process working directory is never touched,
/// so there is nothing to restore on any exit path.
#[derive(Debug, Clone)]
pub struct CheckContext {
    pub student_dir: PathBuf,
}

impl CheckContext {
    pub fn new(student_dir: impl Into<PathBuf>) -> Self {
        CheckContext {
            student_dir: student_dir.into(),
        }
    }
}

/// Run-wide options for the checker.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Reference root for the interface stage; `None` disables the stage.
    pub ref_dir: Option<PathBuf>,
    /// Disable the compilation stage for this run.
    pub skip_compile: bool,
    /// Suppress interactive per-file progress (batch mode).
    pub silent: bool,
}

/// The check pipeline, generic over its two external collaborators so
/// tests can substitute fakes.
pub struct Checker<'a> {
    toolchain: &'a dyn Toolchain,
    comparator: &'a dyn InterfaceComparator,
    options: CheckOptions,
}

impl<'a> Checker<'a> {
    pub fn new(
        toolchain: &'a dyn Toolchain,
        comparator: &'a dyn InterfaceComparator,
        options: CheckOptions,
    ) -> Self {
        Checker {
            toolchain,
            comparator,
            options,
        }
    }

    /// Check one resolved problem against one student directory.
    ///
    /// Stage order is existence, interface, compilation; the first stage
    /// to record any diagnostic ends the problem (stage-local accumulation,
    /// no progression past a failed stage). Errors returned here are
    /// infrastructure faults (tool not installed, sandbox creation), not
    /// check failures.
    pub fn check(&self, problem: &Problem, ctx: &CheckContext) -> Result<Outcome> {
        let mut outcome = Outcome::clean(problem.number);

        if !problem.exist_files.is_empty() {
            self.check_existence(problem, ctx, &mut outcome.diagnostics);
            if outcome.has_errors() {
                return Ok(outcome);
            }
        }

        if !problem.is_lab() {
            if let Some(ref_dir) = self.options.ref_dir.as_deref() {
                self.check_interface(problem, ctx, ref_dir, &mut outcome.diagnostics)?;
                if outcome.has_errors() {
                    return Ok(outcome);
                }
            }
        }

        if !self.options.skip_compile && !problem.compile_files.is_empty() {
            self.check_compilation(problem, ctx, &mut outcome.diagnostics)?;
        }

        Ok(outcome)
    }

    /// Stage 1: every `exist_files` entry must be present under the
    /// student directory. All missing files are reported together.
    fn check_existence(&self, problem: &Problem, ctx: &CheckContext, diags: &mut Vec<Diagnostic>) {
        if problem.use_wildcard && !self.options.silent {
            println!("Files that will be handed in:");
        }

        for file in &problem.exist_files {
            if !ctx.student_dir.join(file).exists() {
                diags.push(Diagnostic::new(DiagnosticKind::FileMissing, file));
            } else if !self.options.silent {
                if problem.use_wildcard {
                    println!("\t{file}");
                } else {
                    println!("{file}: file exists, good");
                }
            }
        }

        if !self.options.silent {
            if problem.use_wildcard {
                println!(
                    "If you do not wish to hand in these files, please move \
                     them away from your current directory"
                );
            }
            for diagnostic in diags.iter() {
                println!("{}", diagnostic.render());
            }
        }
    }

    /// Stage 2: compare each exist file that has a reference artifact
    /// against it. Files without a reference are silently skipped. All
    /// files are evaluated; any mismatch fails the stage.
    fn check_interface(
        &self,
        problem: &Problem,
        ctx: &CheckContext,
        ref_dir: &Path,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        for file in &problem.exist_files {
            let reference = interface::reference_path(ref_dir, file);
            if !reference.exists() {
                continue;
            }

            let candidate = ctx.student_dir.join(file);
            let mismatch = self.comparator.compare(
                &reference,
                &candidate,
                problem.specific_modules.as_deref(),
            )?;

            if mismatch.is_empty() {
                if !self.options.silent {
                    println!("{file}: interface matches reference, good");
                }
            } else {
                let diagnostic =
                    Diagnostic::with_detail(DiagnosticKind::InterfaceMismatch, file, mismatch);
                if !self.options.silent {
                    println!("{}", diagnostic.render());
                }
                diags.push(diagnostic);
            }
        }

        Ok(())
    }

    /// Stage 3: compile inside a fresh sandbox directory so toolchain
    /// artifacts never pollute the student workspace. The sandbox is
    /// removed on every exit path, including unwinds, by `TempDir`'s drop.
    fn check_compilation(
        &self,
        problem: &Problem,
        ctx: &CheckContext,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        let files = anchor_compile_files(&problem.compile_files, &ctx.student_dir);
        let subject = problem.compile_files.join(", ");

        let sandbox = tempfile::tempdir()?;
        let work_dir = sandbox.path();

        match &problem.specific_modules {
            Some(modules) => {
                // Analysis failure aborts the stage before any elaboration.
                if let ToolOutput::Failure { transcript } =
                    self.toolchain.analyze(&files, work_dir)?
                {
                    self.record_compile_failure(&subject, transcript, diags);
                    return Ok(());
                }
                // Per-module elaborations fail independently and accumulate.
                for module in modules {
                    if let ToolOutput::Failure { transcript } =
                        self.toolchain.elaborate(module, work_dir)?
                    {
                        self.record_compile_failure(&subject, transcript, diags);
                    }
                }
            }
            None => {
                if let ToolOutput::Failure { transcript } =
                    self.toolchain.compile(&files, work_dir)?
                {
                    self.record_compile_failure(&subject, transcript, diags);
                }
            }
        }

        if diags.is_empty() && !self.options.silent {
            println!("{subject}: file(s) compile, good");
        }
        Ok(())
    }

    fn record_compile_failure(
        &self,
        subject: &str,
        transcript: String,
        diags: &mut Vec<Diagnostic>,
    ) {
        let diagnostic =
            Diagnostic::with_detail(DiagnosticKind::CompileFailed, subject, transcript);
        if !self.options.silent {
            println!("{}", diagnostic.render());
        }
        diags.push(diagnostic);
    }
}

/// Anchor compile files to the student directory. Absolute paths pass
/// through unchanged; relative paths are joined onto the student dir, not
/// the compile sandbox the toolchain runs in.
fn anchor_compile_files(files: &[String], student_dir: &Path) -> Vec<PathBuf> {
    files
        .iter()
        .map(|f| {
            let path = Path::new(f);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                student_dir.join(path)
            }
        })
        .collect()
}
