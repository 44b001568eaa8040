//! The `stylegen` generator: compile a source tree once and exit.

use super::{
    exit_for_clap_error, init_tracing, load_project, DEFAULT_LOG_FILTER, EXIT_ERROR, EXIT_SUCCESS,
};
use crate::build::progress::{ConsoleProgress, NullProgress, ProgressEvent, ProgressReporter};
use crate::build::{BuildContext, BuildPipeline};
use crate::compiler::LesscCompiler;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Stylegen - compile every entry stylesheet in a source tree into one flat CSS directory
#[derive(Parser, Debug)]
#[command(name = "stylegen")]
pub struct GeneratorCli {
    /// Directory containing the style sources
    #[arg(short = 'i', long = "inputdir", default_value = "../src")]
    pub inputdir: PathBuf,

    /// Directory the CSS files are written to
    #[arg(short = 'o', long = "outputdir", default_value = "../dist")]
    pub outputdir: PathBuf,

    /// Suppress all log output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Parse the process arguments and run the generator.
pub fn run_generator() -> ExitCode {
    run_generator_from(std::env::args_os())
}

/// Run the generator with explicit arguments (first item is the program name).
///
/// Per-file failures are reported but still exit 0; only a fatal error
/// (bad source root, output collision, unreadable config, unusable output
/// root) exits non-zero.
pub fn run_generator_from<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match GeneratorCli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => return exit_for_clap_error(e),
    };

    if !cli.quiet {
        init_tracing(DEFAULT_LOG_FILTER);
    }

    let reporter: Arc<dyn ProgressReporter> = if cli.quiet {
        Arc::new(NullProgress::new())
    } else {
        Arc::new(ConsoleProgress::new().with_verbose(true))
    };

    let (mut config, _) = match load_project(None) {
        Ok(loaded) => loaded,
        Err(e) => {
            reporter.report(ProgressEvent::Error { target_id: None, message: e.to_string() });
            return ExitCode::from(EXIT_ERROR);
        }
    };

    // Directories come from the command line, relative to where we were started
    config.project.src = cli.inputdir;
    config.project.out = cli.outputdir;
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            reporter.report(ProgressEvent::Error { target_id: None, message: e.to_string() });
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let compiler = Arc::new(LesscCompiler::from_config(&config.compiler));
    let pipeline = BuildPipeline::new(BuildContext::new(config, cwd), compiler)
        .with_reporter(Arc::clone(&reporter));

    match pipeline.build() {
        Ok(result) => {
            tracing::debug!("{}", result.summary());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            reporter.report(ProgressEvent::Error { target_id: None, message: e.to_string() });
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_defaults() {
        let cli = GeneratorCli::try_parse_from(["stylegen"]).unwrap();
        assert_eq!(cli.inputdir, PathBuf::from("../src"));
        assert_eq!(cli.outputdir, PathBuf::from("../dist"));
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli_short_and_long_flags() {
        let cli = GeneratorCli::try_parse_from([
            "stylegen",
            "-i",
            "styles",
            "--outputdir",
            "public/css",
            "-q",
        ])
        .unwrap();
        assert_eq!(cli.inputdir, PathBuf::from("styles"));
        assert_eq!(cli.outputdir, PathBuf::from("public/css"));
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_rejects_unknown_flags() {
        assert!(GeneratorCli::try_parse_from(["stylegen", "--watch"]).is_err());
        assert!(GeneratorCli::try_parse_from(["stylegen", "--version"]).is_err());
    }

    #[test]
    fn test_cli_help_exits_successfully() {
        let err = GeneratorCli::try_parse_from(["stylegen", "-h"]).unwrap_err();
        assert!(!err.use_stderr());
        GeneratorCli::command().debug_assert();
    }
}
