//! The `stylegen-tasks` runner.

use super::{
    exit_for_clap_error, init_tracing, load_project, DEFAULT_LOG_FILTER, EXIT_ERROR, EXIT_SUCCESS,
};
use crate::build::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
use crate::build::BuildContext;
use crate::compiler::LesscCompiler;
use crate::config::loader::{merge_cli_overrides, CliOverrides};
use crate::tasks::{Task, TaskRunner};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Stylegen task runner - clean, compile and lint a stylesheet project
#[derive(Parser, Debug)]
#[command(name = "stylegen-tasks")]
#[command(version)]
pub struct TasksCli {
    /// Tasks to run: default, build, test, clean, compile, lint
    #[arg(value_enum, default_value = "default")]
    pub tasks: Vec<Task>,

    /// Path to stylegen.toml (searched upwards from the working directory by default)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Source directory, overriding `project.src` (relative to the config file)
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Output directory, overriding `project.out` (relative to the config file)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Number of parallel compile jobs (default: CPU count)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Report every file
    #[arg(short, long)]
    pub verbose: bool,

    /// Show what would be done without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Parse the process arguments and run the requested tasks.
pub fn run_tasks() -> ExitCode {
    run_tasks_from(std::env::args_os())
}

/// Run the task runner with explicit arguments (first item is the program name).
pub fn run_tasks_from<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match TasksCli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => return exit_for_clap_error(e),
    };

    init_tracing(if cli.verbose { "stylegen=debug" } else { DEFAULT_LOG_FILTER });

    let reporter: Arc<dyn ProgressReporter> =
        Arc::new(ConsoleProgress::new().with_verbose(cli.verbose));

    let (mut config, project_root) = match load_project(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            reporter.report(ProgressEvent::Error { target_id: None, message: e.to_string() });
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let overrides = CliOverrides { out: cli.out, src: cli.src, jobs: cli.jobs };
    merge_cli_overrides(&mut config, &overrides);

    let compiler = Arc::new(LesscCompiler::from_config(&config.compiler));
    let context = BuildContext::new(config, project_root);
    let runner = TaskRunner::new(context, compiler)
        .with_reporter(Arc::clone(&reporter))
        .with_dry_run(cli.dry_run);

    match runner.run(&cli.tasks) {
        Ok(ran) => {
            let names: Vec<_> = ran.iter().map(|t| t.name()).collect();
            let message = format!("Done: {}", names.join(", "));
            reporter.report(ProgressEvent::Message { message });
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            reporter.report(ProgressEvent::Error { target_id: None, message: e.to_string() });
            ExitCode::from(EXIT_ERROR)
        }
    }
}
