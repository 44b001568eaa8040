//! Style compiler interface.
//!
//! The preprocessor grammar is not implemented here. The build hands the
//! source text and the include search paths to a [`StyleCompiler`] and gets
//! CSS back. [`LesscCompiler`] drives an external `lessc` process.

use crate::build::SearchPathSet;
use crate::config::CompilerConfig;
use std::ffi::OsString;
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Failure to turn one source into CSS.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler process could not be started
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// Talking to the running compiler failed
    #[error("lost contact with '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The compiler rejected the source
    #[error("{}", failure_message(.status, .stderr))]
    Failed { status: Option<i32>, stderr: String },
    /// The compiler produced output that is not UTF-8
    #[error("compiler output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// Any other compiler-specific error
    #[error("{0}")]
    Message(String),
}

fn failure_message(status: &Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    match (status, stderr.is_empty()) {
        (Some(code), true) => format!("compiler exited with status {}", code),
        (None, true) => "compiler terminated by signal".to_string(),
        (_, false) => stderr.to_string(),
    }
}

impl CompileError {
    fn from_status(status: ExitStatus, stderr: &[u8]) -> Self {
        CompileError::Failed {
            status: status.code(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }
}

/// Turns preprocessor source into CSS.
///
/// Implementations must be shareable across the build's worker threads.
pub trait StyleCompiler: Send + Sync {
    /// Compile `source`, resolving imports against `search_paths` in order.
    fn compile(&self, source: &str, search_paths: &SearchPathSet) -> Result<String, CompileError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "compiler"
    }
}

/// Runs an external `lessc`-compatible program.
///
/// The program is invoked as `<program> <args>... --include-path=<dirs> -`,
/// reading the source from stdin and writing CSS to stdout.
#[derive(Debug, Clone)]
pub struct LesscCompiler {
    program: String,
    args: Vec<String>,
}

impl LesscCompiler {
    /// Create a compiler running `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    /// Build from the `[compiler]` config section.
    pub fn from_config(config: &CompilerConfig) -> Self {
        Self { program: config.program.clone(), args: config.args.clone() }
    }

    /// Add extra arguments placed before the include path.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// The full argument list for one invocation.
    pub fn command_args(&self, search_paths: &SearchPathSet) -> Vec<OsString> {
        let mut include = OsString::from("--include-path=");
        include.push(search_paths.joined());

        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push(include);
        args.push(OsString::from("-"));
        args
    }
}

impl Default for LesscCompiler {
    fn default() -> Self {
        Self::from_config(&CompilerConfig::default())
    }
}

impl StyleCompiler for LesscCompiler {
    fn compile(&self, source: &str, search_paths: &SearchPathSet) -> Result<String, CompileError> {
        let mut child = Command::new(&self.program)
            .args(self.command_args(search_paths))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CompileError::Spawn { program: self.program.clone(), source: e })?;

        // Feed stdin from a separate thread so a large stdout can't deadlock us
        let stdin = child.stdin.take();
        let output = std::thread::scope(|s| {
            if let Some(mut stdin) = stdin {
                s.spawn(move || {
                    if let Err(e) = stdin.write_all(source.as_bytes()) {
                        tracing::debug!(error = %e, "compiler closed stdin early");
                    }
                });
            }
            child.wait_with_output()
        })
        .map_err(|e| CompileError::Io { program: self.program.clone(), source: e })?;

        if !output.status.success() {
            return Err(CompileError::from_status(output.status, &output.stderr));
        }

        Ok(String::from_utf8(output.stdout)?)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Prefix generated CSS with a banner line.
pub fn apply_banner(css: &str, banner: Option<&str>) -> String {
    match banner {
        Some(banner) if !banner.is_empty() => {
            let mut out = String::with_capacity(banner.len() + css.len() + 1);
            out.push_str(banner);
            if !banner.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(css);
            out
        }
        _ => css.to_string(),
    }
}
