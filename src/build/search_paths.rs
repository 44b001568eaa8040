//! Include search paths handed to the style compiler.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Ordered set of directories used to resolve `@import` statements.
///
/// The source root always comes first, followed by every directory beneath
/// it exactly once, parent before children. Entry files can therefore import
/// partials that live in sibling or cousin component folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPathSet {
    paths: Vec<PathBuf>,
}

impl SearchPathSet {
    /// Assemble a set from a root and the directories found beneath it.
    ///
    /// Duplicates (and repeats of the root) are dropped, keeping the first
    /// occurrence.
    pub fn from_parts(root: PathBuf, directories: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for path in std::iter::once(root).chain(directories) {
            if seen.insert(path.clone()) {
                paths.push(path);
            }
        }
        Self { paths }
    }

    /// All directories in search order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of directories, including the root.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always false: the root is always present.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Join the directories with the platform path-list separator
    /// (`:` on Unix, `;` on Windows), as compilers expect for include paths.
    pub fn joined(&self) -> OsString {
        std::env::join_paths(&self.paths).unwrap_or_else(|_| {
            // A path containing the separator itself; fall back to lossy joining
            let sep = if cfg!(windows) { ";" } else { ":" };
            let parts: Vec<_> = self.paths.iter().map(|p| p.to_string_lossy()).collect();
            OsString::from(parts.join(sep))
        })
    }

    /// Find the first directory containing `relative`.
    pub fn resolve(&self, relative: &Path) -> Option<PathBuf> {
        self.paths.iter().map(|dir| dir.join(relative)).find(|candidate| candidate.is_file())
    }
}
