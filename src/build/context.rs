//! Build context containing configuration and state for a build.

use crate::config::{CollisionPolicy, StylegenConfig};
use std::path::{Path, PathBuf};

/// Default number of parallel jobs (uses available parallelism).
fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Build context containing configuration and paths for a build operation.
///
/// Relative `src` and `out` paths from the configuration are resolved
/// against the project root (the directory holding `stylegen.toml`, or the
/// working directory for the standalone generator).
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: StylegenConfig,
    /// Directory relative paths are resolved against
    project_root: PathBuf,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: StylegenConfig, project_root: PathBuf) -> Self {
        Self { config, project_root }
    }

    /// Get the configuration.
    pub fn config(&self) -> &StylegenConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the source root (resolved against the project root).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// Get the output root (resolved against the project root).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.out)
    }

    /// Style-source extension, without the dot.
    pub fn extension(&self) -> &str {
        &self.config.compile.extension
    }

    /// Banner for generated files, placeholders substituted.
    pub fn banner(&self) -> Option<String> {
        self.config.rendered_banner()
    }

    /// Worker count, resolving 0 to the available parallelism.
    pub fn jobs(&self) -> usize {
        match self.config.compile.jobs {
            0 => default_jobs(),
            n => n,
        }
    }

    /// How output name collisions are handled.
    pub fn collision_policy(&self) -> CollisionPolicy {
        self.config.compile.on_collision
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        crate::config::loader::resolve_path(&self.project_root, path)
    }
}
