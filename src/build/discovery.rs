//! Source file discovery for the build system.
//!
//! Walks a source root once and classifies every style-source file as either
//! an entry point (compiled to its own output) or an include (only reachable
//! through `@import`). A file is an entry point when it sits directly in the
//! root, or when its base name matches the directory that contains it:
//!
//! ```text
//! src/
//! ├── core.less            entry   (directly in root)
//! └── button/
//!     ├── button.less      entry   (matches "button")
//!     ├── _mixins.less     include
//!     └── icon/
//!         └── sprite.less  include (does not match "icon")
//! ```
//!
//! The same walk produces the [`SearchPathSet`] used to resolve imports.

use crate::build::SearchPathSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Fatal error during source discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The source root does not exist
    #[error("Invalid input path {}: not found", .0.display())]
    NotFound(PathBuf),
    /// The source root is a file or something else that cannot be walked
    #[error("Invalid input path {}: not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// The source root exists but cannot be listed
    #[error("Invalid input path {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Kind of a traversed file-system entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// One file-system entry seen during a discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNode {
    /// Full path to the entry
    pub path: PathBuf,
    /// Path relative to the source root
    pub relative: PathBuf,
    /// File or directory
    pub kind: NodeKind,
    /// Extension for files, without the dot
    pub extension: Option<String>,
}

impl SourceNode {
    fn new(root: &Path, path: &Path, kind: NodeKind) -> Self {
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        let extension = match kind {
            NodeKind::File => path.extension().map(|e| e.to_string_lossy().into_owned()),
            NodeKind::Directory => None,
        };
        Self { path: path.to_path_buf(), relative, kind, extension }
    }

    /// Whether this node is a file with the given style-source extension.
    pub fn is_style_source(&self, extension: &str) -> bool {
        self.kind == NodeKind::File && self.extension.as_deref() == Some(extension)
    }
}

/// How a style-source file takes part in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Compiled to a standalone output
    Entry,
    /// Only reachable through the search path
    Include,
}

/// A style-source file compiled to its own output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFile {
    /// Full path to the source file
    pub source: PathBuf,
    /// Directory of the file relative to the root (empty for files in the root)
    pub relative_dir: PathBuf,
    /// File name without the extension
    pub base_name: String,
}

impl EntryFile {
    /// Identifier used in progress output and results (path relative to the root).
    pub fn id(&self) -> String {
        let file_name = self.source.file_name().map(|n| n.to_string_lossy().into_owned());
        match file_name {
            Some(name) => self.relative_dir.join(name).to_string_lossy().replace('\\', "/"),
            None => self.base_name.clone(),
        }
    }
}

/// A style-source file that is never compiled on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeFile {
    /// Full path to the source file
    pub source: PathBuf,
    /// Path relative to the root
    pub relative: PathBuf,
}

/// A recoverable problem met below the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryWarning {
    /// Path that could not be read, if known
    pub path: Option<PathBuf>,
    /// What went wrong
    pub message: String,
}

impl std::fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Everything one discovery pass found under a source root.
///
/// Built once, before any compile work starts, and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    root: PathBuf,
    entries: Vec<EntryFile>,
    includes: Vec<IncludeFile>,
    search_paths: SearchPathSet,
    warnings: Vec<DiscoveryWarning>,
}

impl SourceCatalog {
    /// Walk `root` and classify every file with the given extension.
    ///
    /// Directories are visited in pre-order, siblings in file-name order, so
    /// repeated scans of an unchanged tree give identical catalogs. Symbolic
    /// links are followed; loops are reported as warnings.
    ///
    /// # Errors
    /// Returns [`DiscoveryError`] when the root itself is missing, not a
    /// directory, or cannot be listed. Problems further down are collected in
    /// [`SourceCatalog::warnings`] and the walk continues.
    pub fn scan(root: &Path, extension: &str) -> Result<Self, DiscoveryError> {
        check_root(root)?;

        let mut entries = Vec::new();
        let mut includes = Vec::new();
        let mut directories = Vec::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(root).follow_links(true).sort_by_file_name();
        for item in walker {
            let dir_entry = match item {
                Ok(e) => e,
                Err(e) => {
                    if e.depth() == 0 {
                        let path = root.to_path_buf();
                        let source = e.into_io_error().unwrap_or_else(|| {
                            io::Error::new(io::ErrorKind::Other, "cannot walk source root")
                        });
                        return Err(DiscoveryError::Unreadable { path, source });
                    }
                    tracing::warn!(error = %e, "skipping unreadable path during discovery");
                    warnings.push(DiscoveryWarning {
                        path: e.path().map(Path::to_path_buf),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let file_type = dir_entry.file_type();
            if file_type.is_dir() {
                if dir_entry.depth() > 0 {
                    tracing::debug!(dir = %dir_entry.path().display(), "found directory");
                    directories.push(dir_entry.path().to_path_buf());
                }
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let node = SourceNode::new(root, dir_entry.path(), NodeKind::File);
            if !node.is_style_source(extension) {
                continue;
            }

            match classify(root, &node.path) {
                Classification::Entry => {
                    tracing::debug!(file = %node.relative.display(), "entry file");
                    entries.push(entry_file(node));
                }
                Classification::Include => {
                    tracing::debug!(file = %node.relative.display(), "include file");
                    includes.push(IncludeFile { source: node.path, relative: node.relative });
                }
            }
        }

        Ok(Self {
            root: root.to_path_buf(),
            entries,
            includes,
            search_paths: SearchPathSet::from_parts(root.to_path_buf(), directories),
            warnings,
        })
    }

    /// The source root this catalog was built from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entry files in discovery order.
    pub fn entries(&self) -> &[EntryFile] {
        &self.entries
    }

    /// Include files in discovery order.
    pub fn includes(&self) -> &[IncludeFile] {
        &self.includes
    }

    /// Directories to search when resolving imports.
    pub fn search_paths(&self) -> &SearchPathSet {
        &self.search_paths
    }

    /// Recoverable problems met below the root.
    pub fn warnings(&self) -> &[DiscoveryWarning] {
        &self.warnings
    }
}

/// Make sure the source root can be walked at all.
fn check_root(root: &Path) -> Result<(), DiscoveryError> {
    let metadata = match fs::metadata(root) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DiscoveryError::NotFound(root.to_path_buf()));
        }
        Err(e) => return Err(DiscoveryError::Unreadable { path: root.to_path_buf(), source: e }),
    };

    if !metadata.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    fs::read_dir(root)
        .map(|_| ())
        .map_err(|e| DiscoveryError::Unreadable { path: root.to_path_buf(), source: e })
}

/// Classify a style-source file found under `root`.
///
/// Only the innermost containing directory is compared against the file's
/// base name; grandparents are never considered.
pub fn classify(root: &Path, file: &Path) -> Classification {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let parent = match relative.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Classification::Entry,
    };

    let dir_name = parent.file_name();
    let base_name = file.file_stem();
    match (dir_name, base_name) {
        (Some(dir), Some(base)) if dir == base => Classification::Entry,
        _ => Classification::Include,
    }
}

fn entry_file(node: SourceNode) -> EntryFile {
    let relative_dir = node.relative.parent().map(Path::to_path_buf).unwrap_or_default();
    let base_name = node
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    EntryFile { source: node.path, relative_dir, base_name }
}
