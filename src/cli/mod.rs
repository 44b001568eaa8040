//! Command-line interface implementation
//!
//! Two front ends share the build pipeline: the `stylegen` generator, which
//! only compiles, and the `stylegen-tasks` runner with clean and lint steps.

mod generate;
mod tasks;

pub use generate::{run_generator, GeneratorCli};
pub use tasks::{run_tasks, TasksCli};

use crate::config::loader::{default_config, find_config, load_config, project_root};
use crate::config::{ConfigError, StylegenConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Default tracing filter when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "stylegen=warn";

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Installing twice is a no-op.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Turn a clap parse failure into an exit code, printing usage or help.
fn exit_for_clap_error(e: clap::Error) -> ExitCode {
    let _ = e.print();
    if e.use_stderr() {
        ExitCode::from(EXIT_INVALID_ARGS)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

/// Load `stylegen.toml` and the directory its relative paths are resolved against.
///
/// With an explicit path the file must exist. Otherwise the file is searched
/// for upwards from the working directory, and built-in defaults are used
/// when none is found.
fn load_project(explicit: Option<&Path>) -> Result<(StylegenConfig, PathBuf), ConfigError> {
    let cwd = std::env::current_dir()?;
    let config_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(path) => {
            tracing::debug!(config = %path.display(), "using config");
            let config = load_config(Some(&path))?;
            let root = project_root(&path)
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| cwd.join(p))
                .unwrap_or(cwd);
            Ok((config, root))
        }
        None => {
            tracing::debug!("no stylegen.toml found, using defaults");
            Ok((default_config(), cwd))
        }
    }
}
