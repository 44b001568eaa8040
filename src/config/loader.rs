//! Configuration loading and discovery for `stylegen.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{
    CompileConfig, CompilerConfig, LintConfig, ProjectConfig, StylegenConfig,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "stylegen.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse stylegen.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", bullet_list(.0))]
    Validation(Vec<String>),
    /// Lint rule file (JSON) could not be parsed
    #[error("Failed to parse lint rule file {}: {source}", path.display())]
    LintRc {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn bullet_list(errors: &[String]) -> String {
    errors.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n")
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override source directory
    pub src: Option<PathBuf>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
}

/// Find stylegen.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find stylegen.toml by walking up from a specific directory.
///
/// This is the internal implementation that allows specifying the start directory,
/// useful for testing.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a stylegen.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns a default
/// configuration.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("skin/stylegen.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<StylegenConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<StylegenConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: StylegenConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Create a default configuration when no stylegen.toml is found.
///
/// The project name is taken from the current directory name.
pub fn default_config() -> StylegenConfig {
    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unnamed".to_string());

    StylegenConfig {
        project: ProjectConfig {
            name: project_name,
            version: "0.1.0".to_string(),
            src: PathBuf::from("src"),
            out: PathBuf::from("dist"),
        },
        compile: CompileConfig::default(),
        compiler: CompilerConfig::default(),
        lint: LintConfig::default(),
    }
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut StylegenConfig, overrides: &CliOverrides) {
    if let Some(ref out) = overrides.out {
        config.project.out = out.clone();
    }

    if let Some(ref src) = overrides.src {
        config.project.src = src.clone();
    }

    if let Some(jobs) = overrides.jobs {
        config.compile.jobs = jobs;
    }
}

/// Get the project root directory from a config file path.
///
/// Returns the parent directory of the stylegen.toml file.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
