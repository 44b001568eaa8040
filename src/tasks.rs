//! Task runner: clean, compile and lint steps with aliases
//!
//! `build` is clean + compile, `test` is lint and `default` is build + test.
//! Requested tasks are expanded in order, duplicates dropped, and run one
//! after another. The first failing task stops the run.

use crate::build::progress::{NullProgress, ProgressEvent, ProgressReporter};
use crate::build::{BuildContext, BuildError, BuildPipeline, BuildResult};
use crate::compiler::StyleCompiler;
use crate::config::ConfigError;
use crate::lint::{LintReport, Linter};
use clap::ValueEnum;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// A task name accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Task {
    /// build + test
    Default,
    /// clean + compile
    Build,
    /// lint
    Test,
    /// Remove the output directory
    Clean,
    /// Compile every entry file
    Compile,
    /// Lint the generated CSS
    Lint,
}

impl Task {
    pub fn name(self) -> &'static str {
        match self {
            Task::Default => "default",
            Task::Build => "build",
            Task::Test => "test",
            Task::Clean => "clean",
            Task::Compile => "compile",
            Task::Lint => "lint",
        }
    }

    fn expand_into(self, out: &mut Vec<Step>) {
        match self {
            Task::Default => {
                Task::Build.expand_into(out);
                Task::Test.expand_into(out);
            }
            Task::Build => {
                Task::Clean.expand_into(out);
                Task::Compile.expand_into(out);
            }
            Task::Test => Task::Lint.expand_into(out),
            Task::Clean => push_step(out, Step::Clean),
            Task::Compile => push_step(out, Step::Compile),
            Task::Lint => push_step(out, Step::Lint),
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A unit of work that actually runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Clean,
    Compile,
    Lint,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::Clean => "clean",
            Step::Compile => "compile",
            Step::Lint => "lint",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn push_step(out: &mut Vec<Step>, step: Step) {
    if !out.contains(&step) {
        out.push(step);
    }
}

/// Expand aliases into steps, keeping first-mention order.
pub fn expand(tasks: &[Task]) -> Vec<Step> {
    let mut out = Vec::new();
    for task in tasks {
        task.expand_into(&mut out);
    }
    out
}

/// Task failure
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("Failed to remove {}: {source}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Refusing to clean {}: it contains the source directory", path.display())]
    CleanWouldRemoveSources { path: PathBuf },
    #[error("{failed} file(s) failed to compile")]
    CompileFailed { failed: usize },
    #[error("Lint found {violations} violation(s) and {unreadable} unreadable file(s)")]
    LintFailed { violations: usize, unreadable: usize },
}

/// Runs tasks against one project
pub struct TaskRunner {
    context: BuildContext,
    compiler: Arc<dyn StyleCompiler>,
    reporter: Arc<dyn ProgressReporter>,
    dry_run: bool,
}

impl TaskRunner {
    pub fn new(context: BuildContext, compiler: Arc<dyn StyleCompiler>) -> Self {
        Self { context, compiler, reporter: Arc::new(NullProgress::new()), dry_run: false }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// In dry-run mode nothing is removed, compiled, written or linted.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Expand and run `tasks`, stopping at the first failure.
    ///
    /// Returns the steps that ran.
    pub fn run(&self, tasks: &[Task]) -> Result<Vec<Step>, TaskError> {
        let plan = expand(tasks);
        tracing::debug!(steps = ?plan, "running tasks");

        for step in &plan {
            self.message(format!("Running \"{}\" task", step));
            match step {
                Step::Clean => self.clean()?,
                Step::Compile => {
                    self.compile()?;
                }
                Step::Lint => {
                    self.lint()?;
                }
            }
        }

        Ok(plan)
    }

    /// Remove the output directory. A missing directory is fine.
    pub fn clean(&self) -> Result<(), TaskError> {
        let out_dir = self.context.out_dir();
        if self.context.src_dir().starts_with(&out_dir) {
            return Err(TaskError::CleanWouldRemoveSources { path: out_dir });
        }

        if self.dry_run {
            self.message(format!("Would remove {}", out_dir.display()));
            return Ok(());
        }

        match fs::remove_dir_all(&out_dir) {
            Ok(()) => {
                self.message(format!("Cleaned {}", out_dir.display()));
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TaskError::Clean { path: out_dir, source: e }),
        }
    }

    /// Compile the source tree. Any failed entry fails the task.
    pub fn compile(&self) -> Result<BuildResult, TaskError> {
        let pipeline = BuildPipeline::new(self.context.clone(), Arc::clone(&self.compiler))
            .with_reporter(Arc::clone(&self.reporter))
            .with_dry_run(self.dry_run);

        let result = pipeline.build()?;
        tracing::debug!("{}", result.summary());
        if !result.is_success() {
            return Err(TaskError::CompileFailed { failed: result.failed_count() });
        }
        Ok(result)
    }

    /// Lint the output directory. Any violation fails the task.
    pub fn lint(&self) -> Result<LintReport, TaskError> {
        let config = &self.context.config().lint;
        if !config.enabled || self.dry_run {
            self.message("Lint skipped".to_string());
            return Ok(LintReport::default());
        }

        let linter = Linter::from_config(config, self.context.project_root())?;
        let report = linter.lint_dir(&self.context.out_dir());

        for file in &report.files {
            for violation in &file.violations {
                self.reporter.report(ProgressEvent::Error {
                    target_id: Some(file.name.clone()),
                    message: violation.to_string(),
                });
            }
        }
        for error in &report.errors {
            self.reporter
                .report(ProgressEvent::Error { target_id: None, message: error.to_string() });
        }

        if !report.is_clean() {
            return Err(TaskError::LintFailed {
                violations: report.violation_count(),
                unreadable: report.errors.len(),
            });
        }

        self.message(format!("{} file(s) lint free", report.files.len()));
        Ok(report)
    }

    fn message(&self, message: String) {
        self.reporter.report(ProgressEvent::Message { message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::SearchPathSet;
    use crate::compiler::CompileError;
    use crate::config::default_config;
    use tempfile::TempDir;

    struct CopyCompiler;

    impl StyleCompiler for CopyCompiler {
        fn compile(&self, source: &str, _: &SearchPathSet) -> Result<String, CompileError> {
            Ok(source.to_string())
        }
    }

    fn runner(temp: &TempDir) -> TaskRunner {
        let ctx = BuildContext::new(default_config(), temp.path().to_path_buf());
        TaskRunner::new(ctx, Arc::new(CopyCompiler))
    }

    #[test]
    fn test_expand_aliases() {
        assert_eq!(expand(&[Task::Default]), vec![Step::Clean, Step::Compile, Step::Lint]);
        assert_eq!(expand(&[Task::Build]), vec![Step::Clean, Step::Compile]);
        assert_eq!(expand(&[Task::Test]), vec![Step::Lint]);
        assert_eq!(expand(&[Task::Clean]), vec![Step::Clean]);
    }

    #[test]
    fn test_expand_dedupes_in_first_mention_order() {
        assert_eq!(
            expand(&[Task::Lint, Task::Default]),
            vec![Step::Lint, Step::Clean, Step::Compile]
        );
        assert_eq!(expand(&[Task::Compile, Task::Build]), vec![Step::Compile, Step::Clean]);
        assert!(expand(&[]).is_empty());
    }

    #[test]
    fn test_task_names_match_value_enum() {
        for task in Task::value_variants() {
            assert_eq!(Task::from_str(task.name(), false).unwrap(), *task);
        }
        assert_eq!(Step::Lint.to_string(), "lint");
    }

    #[test]
    fn test_clean_removes_output_and_tolerates_missing() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("dist/nested")).unwrap();
        fs::write(temp.path().join("dist/nested/a.css"), "a{}").unwrap();

        let runner = runner(&temp);
        runner.clean().unwrap();
        assert!(!temp.path().join("dist").exists());
        runner.clean().unwrap();
    }

    #[test]
    fn test_clean_refuses_to_remove_sources() {
        let temp = TempDir::new().unwrap();
        let mut config = default_config();
        config.project.out = PathBuf::from(".");
        let ctx = BuildContext::new(config, temp.path().to_path_buf());
        let runner = TaskRunner::new(ctx, Arc::new(CopyCompiler));
        assert!(matches!(runner.clean(), Err(TaskError::CleanWouldRemoveSources { .. })));
    }

    #[test]
    fn test_default_runs_clean_compile_lint() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/a.less"), ".a { color: red; }\n").unwrap();
        fs::create_dir_all(temp.path().join("dist")).unwrap();
        fs::write(temp.path().join("dist/stale.css"), ".stale { color: red; }").unwrap();

        let ran = runner(&temp).run(&[Task::Default]).unwrap();
        assert_eq!(ran, vec![Step::Clean, Step::Compile, Step::Lint]);
        assert!(temp.path().join("dist/a.css").exists());
        assert!(!temp.path().join("dist/stale.css").exists());
    }

    #[test]
    fn test_lint_failure_stops_the_run() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/a.less"), ".a { color: red !important; }\n").unwrap();

        let err = runner(&temp).run(&[Task::Compile, Task::Lint, Task::Clean]).unwrap_err();
        assert!(matches!(err, TaskError::LintFailed { violations: 1, unreadable: 0 }));
        assert!(temp.path().join("dist/a.css").exists());
    }

    #[test]
    fn test_compile_failure_is_task_failure() {
        struct Broken;
        impl StyleCompiler for Broken {
            fn compile(&self, _: &str, _: &SearchPathSet) -> Result<String, CompileError> {
                Err(CompileError::Message("broken".to_string()))
            }
        }

        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/a.less"), "a{}").unwrap();
        let ctx = BuildContext::new(default_config(), temp.path().to_path_buf());
        let err = TaskRunner::new(ctx, Arc::new(Broken)).run(&[Task::Build]).unwrap_err();
        assert!(matches!(err, TaskError::CompileFailed { failed: 1 }));
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/a.less"), "a{}").unwrap();
        fs::create_dir_all(temp.path().join("dist")).unwrap();
        fs::write(temp.path().join("dist/old.css"), "a{}").unwrap();

        runner(&temp).with_dry_run(true).run(&[Task::Default]).unwrap();
        assert!(temp.path().join("dist/old.css").exists());
        assert!(!temp.path().join("dist/a.css").exists());
    }

    #[test]
    fn test_lint_disabled() {
        let temp = TempDir::new().unwrap();
        let mut config = default_config();
        config.lint.enabled = false;
        let ctx = BuildContext::new(config, temp.path().to_path_buf());
        let runner = TaskRunner::new(ctx, Arc::new(CopyCompiler));
        assert!(runner.lint().unwrap().files.is_empty());
    }
}
