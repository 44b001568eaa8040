//! Build pipeline orchestration.
//!
//! A run has two phases. Discovery walks the source root once and plans
//! every output; it either succeeds completely or aborts the run. Compilation
//! then hands each planned entry file to a pool of scoped worker threads and
//! waits for all of them before returning, so no write outlives the run.
//! A failure on one file is recorded in its [`TargetResult`] and never stops
//! the other files.

use crate::build::progress::{NullProgress, ProgressEvent, ProgressReporter, TargetStatus};
use crate::build::{
    BuildContext, BuildResult, DiscoveryError, MappingError, OutputPlan, PlannedOutput,
    SearchPathSet, SourceCatalog, TargetResult,
};
use crate::compiler::{apply_banner, CompileError, StyleCompiler};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Fatal error that stops a whole run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The source root could not be walked
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Two entry files claim the same output
    #[error(transparent)]
    Mapping(#[from] MappingError),
    /// The output root could not be created
    #[error("Failed to create output directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure on a single entry file. Recorded, never fatal.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("Error reading file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error compiling file {}: {source}", path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },
    #[error("Error creating file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Build pipeline for compiling a source tree.
pub struct BuildPipeline {
    /// Build context
    context: BuildContext,
    /// Turns source text into CSS
    compiler: Arc<dyn StyleCompiler>,
    /// Where progress goes
    reporter: Arc<dyn ProgressReporter>,
    /// Number of worker threads
    jobs: usize,
    /// Whether to plan without compiling or writing
    dry_run: bool,
}

impl BuildPipeline {
    /// Create a new build pipeline.
    pub fn new(context: BuildContext, compiler: Arc<dyn StyleCompiler>) -> Self {
        let jobs = context.jobs();
        Self { context, compiler, reporter: Arc::new(NullProgress::new()), jobs, dry_run: false }
    }

    /// Set the progress reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set dry-run mode (plan only, nothing is created or compiled).
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Get the number of parallel jobs.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Get the build context.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Run discovery and output planning only.
    pub fn plan(&self) -> Result<(SourceCatalog, OutputPlan), BuildError> {
        let src_dir = self.context.src_dir();
        let catalog = SourceCatalog::scan(&src_dir, self.context.extension())?;
        tracing::debug!(
            entries = catalog.entries().len(),
            includes = catalog.includes().len(),
            search_paths = catalog.search_paths().len(),
            "discovery finished"
        );

        let plan = OutputPlan::new(
            catalog.entries(),
            &self.context.out_dir(),
            self.context.collision_policy(),
        )?;
        Ok((catalog, plan))
    }

    /// Run the build pipeline.
    ///
    /// # Errors
    /// Only fatal problems are returned: an unusable source root, an output
    /// collision under the `error` policy, or an output root that cannot be
    /// created. Per-file failures are reported in the [`BuildResult`].
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let mut result = BuildResult::new();

        self.reporter.report(ProgressEvent::Message { message: "Processing paths...".to_string() });
        let (catalog, plan) = self.plan()?;

        for warning in catalog.warnings() {
            self.warn(&mut result, None, warning.to_string());
        }
        for warning in plan.warnings() {
            self.warn(&mut result, None, warning.clone());
        }

        if !self.dry_run {
            let out_dir = self.context.out_dir();
            fs::create_dir_all(&out_dir).map_err(|e| BuildError::Io { path: out_dir, source: e })?;
        }

        self.reporter.report(ProgressEvent::BuildStarted { total_targets: plan.len() });

        let banner = self.context.banner();
        for target in self.execute_plan(&plan, catalog.search_paths(), banner.as_deref()) {
            result.add_result(target);
        }
        let result = result.with_duration(start.elapsed());

        self.reporter.report(ProgressEvent::BuildCompleted {
            success: result.is_success(),
            duration_ms: result.total_duration.as_millis() as u64,
            succeeded: result.success_count(),
            skipped: result.skipped_count(),
            failed: result.failed_count(),
        });

        Ok(result)
    }

    fn warn(&self, result: &mut BuildResult, target_id: Option<String>, message: String) {
        tracing::warn!("{}", message);
        self.reporter.report(ProgressEvent::Warning { target_id, message: message.clone() });
        result.add_warning(message);
    }

    /// Compile every planned output and wait for all of them.
    ///
    /// Results come back in plan order whatever order the workers finish in.
    fn execute_plan(
        &self,
        plan: &OutputPlan,
        search_paths: &SearchPathSet,
        banner: Option<&str>,
    ) -> Vec<TargetResult> {
        let outputs = plan.outputs();
        if outputs.is_empty() {
            return vec![];
        }

        if self.jobs == 1 || outputs.len() == 1 {
            return outputs.iter().map(|p| self.execute_target(p, search_paths, banner)).collect();
        }

        let next_idx = AtomicUsize::new(0);
        let num_workers = self.jobs.min(outputs.len());

        let mut results: Vec<(usize, TargetResult)> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..num_workers)
                .map(|_| {
                    let next_idx = &next_idx;
                    s.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let idx = next_idx.fetch_add(1, Ordering::SeqCst);
                            if idx >= outputs.len() {
                                break;
                            }
                            let result = self.execute_target(&outputs[idx], search_paths, banner);
                            done.push((idx, result));
                        }
                        done
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        tracing::error!("compile worker panicked; its results are lost");
                        Vec::new()
                    })
                })
                .collect()
        });

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, r)| r).collect()
    }

    /// Compile a single entry file and report it.
    fn execute_target(
        &self,
        planned: &PlannedOutput,
        search_paths: &SearchPathSet,
        banner: Option<&str>,
    ) -> TargetResult {
        let start = Instant::now();
        let target_id = planned.entry.id();

        self.reporter.report(ProgressEvent::TargetStarted { target_id: target_id.clone() });

        let result = if self.dry_run {
            TargetResult::skipped(target_id.clone())
        } else {
            match self.compile_entry(planned, search_paths, banner) {
                Ok(output) => {
                    TargetResult::success(target_id.clone(), vec![output], start.elapsed())
                }
                Err(e) => {
                    tracing::warn!(
                        file = %target_id,
                        compiler = self.compiler.name(),
                        error = %e,
                        "entry file failed"
                    );
                    TargetResult::failed(target_id.clone(), e.to_string(), start.elapsed())
                }
            }
        };

        let status = match &result.status {
            crate::build::BuildStatus::Success => TargetStatus::Success,
            crate::build::BuildStatus::Skipped => TargetStatus::Skipped,
            crate::build::BuildStatus::Failed(e) => TargetStatus::Failed(e.clone()),
        };
        self.reporter.report(ProgressEvent::TargetCompleted {
            target_id,
            status,
            duration_ms: result.duration.as_millis() as u64,
        });

        result
    }

    /// Read, compile and write one entry file.
    fn compile_entry(
        &self,
        planned: &PlannedOutput,
        search_paths: &SearchPathSet,
        banner: Option<&str>,
    ) -> Result<PathBuf, FileError> {
        let source_path = &planned.entry.source;
        let source = fs::read_to_string(source_path)
            .map_err(|e| FileError::Read { path: source_path.clone(), source: e })?;

        let css = self
            .compiler
            .compile(&source, search_paths)
            .map_err(|e| FileError::Compile { path: source_path.clone(), source: e })?;

        let output = &planned.target.path;
        fs::write(output, apply_banner(&css, banner))
            .map_err(|e| FileError::Write { path: output.clone(), source: e })?;

        Ok(output.clone())
    }
}
