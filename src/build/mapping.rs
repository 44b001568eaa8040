//! Output mapping for entry files.
//!
//! Every entry file compiles to `<out>/<base>.css`, whatever its depth under
//! the source root. Because the directory part is dropped, two entries with
//! the same base name claim the same output; [`OutputPlan`] detects that up
//! front and applies the configured [`CollisionPolicy`].

use crate::build::EntryFile;
use crate::config::CollisionPolicy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of generated files.
pub const OUTPUT_EXTENSION: &str = "css";

/// Fatal output mapping error.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Two entry files map to the same output
    #[error(
        "Output {} is claimed by both {} and {} (rename one, or set compile.on_collision)",
        output.display(), first.display(), second.display()
    )]
    Collision { output: PathBuf, first: PathBuf, second: PathBuf },
}

/// Destination of one entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Full destination path
    pub path: PathBuf,
    /// Destination file name (`<base>.css`)
    pub file_name: String,
}

/// Compute the destination of an entry file under `out_dir`.
pub fn map_output(entry: &EntryFile, out_dir: &Path) -> OutputTarget {
    let file_name = format!("{}.{}", entry.base_name, OUTPUT_EXTENSION);
    OutputTarget { path: out_dir.join(&file_name), file_name }
}

/// One unit of compile work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOutput {
    pub entry: EntryFile,
    pub target: OutputTarget,
}

/// The entry files that will be compiled, each with a distinct destination.
#[derive(Debug, Clone, Default)]
pub struct OutputPlan {
    outputs: Vec<PlannedOutput>,
    warnings: Vec<String>,
}

impl OutputPlan {
    /// Map every entry to its destination and resolve name collisions.
    ///
    /// Entries keep their discovery order. Under [`CollisionPolicy::Warn`] the
    /// first claimant of a name wins; under [`CollisionPolicy::Overwrite`] the
    /// last one does. Either way a warning naming both sources is recorded.
    pub fn new(
        entries: &[EntryFile],
        out_dir: &Path,
        policy: CollisionPolicy,
    ) -> Result<Self, MappingError> {
        let mut claims: HashMap<String, usize> = HashMap::new();
        let mut slots: Vec<Option<PlannedOutput>> = Vec::with_capacity(entries.len());
        let mut warnings = Vec::new();

        for entry in entries {
            let target = map_output(entry, out_dir);
            let planned = PlannedOutput { entry: entry.clone(), target };

            let Some(&index) = claims.get(&planned.target.file_name) else {
                claims.insert(planned.target.file_name.clone(), slots.len());
                slots.push(Some(planned));
                continue;
            };

            let previous =
                slots[index].as_ref().map(|p| p.entry.source.clone()).unwrap_or_default();
            match policy {
                CollisionPolicy::Error => {
                    return Err(MappingError::Collision {
                        output: planned.target.path,
                        first: previous,
                        second: planned.entry.source,
                    });
                }
                CollisionPolicy::Warn => {
                    warnings.push(format!(
                        "{} already produced by {}; skipping {}",
                        planned.target.file_name,
                        previous.display(),
                        planned.entry.source.display()
                    ));
                }
                CollisionPolicy::Overwrite => {
                    warnings.push(format!(
                        "{} from {} replaced by {}",
                        planned.target.file_name,
                        previous.display(),
                        planned.entry.source.display()
                    ));
                    slots[index] = None;
                    claims.insert(planned.target.file_name.clone(), slots.len());
                    slots.push(Some(planned));
                }
            }
        }

        Ok(Self { outputs: slots.into_iter().flatten().collect(), warnings })
    }

    /// Planned outputs in discovery order.
    pub fn outputs(&self) -> &[PlannedOutput] {
        &self.outputs
    }

    /// Collision warnings.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> EntryFile {
        let source = PathBuf::from(path);
        let relative = source.strip_prefix("/src").unwrap().to_path_buf();
        EntryFile {
            base_name: source.file_stem().unwrap().to_string_lossy().into_owned(),
            relative_dir: relative.parent().map(Path::to_path_buf).unwrap_or_default(),
            source,
        }
    }

    #[test]
    fn test_map_output_flattens_depth() {
        let out = Path::new("/dist");
        assert_eq!(map_output(&entry("/src/a.less"), out).path, PathBuf::from("/dist/a.css"));
        assert_eq!(
            map_output(&entry("/src/widget/widget.less"), out).path,
            PathBuf::from("/dist/widget.css")
        );
        let deep = map_output(&entry("/src/x/y/z/z.less"), out);
        assert_eq!(deep.path, PathBuf::from("/dist/z.css"));
        assert_eq!(deep.file_name, "z.css");
    }

    #[test]
    fn test_plan_without_collisions_keeps_order() {
        let entries = vec![entry("/src/b.less"), entry("/src/a/a.less")];
        let plan = OutputPlan::new(&entries, Path::new("/dist"), CollisionPolicy::Error).unwrap();
        let names: Vec<_> = plan.outputs().iter().map(|o| o.target.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.css", "a.css"]);
        assert!(plan.warnings().is_empty());
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_plan_collision_error() {
        let entries = vec![entry("/src/button.less"), entry("/src/button/button.less")];
        let err =
            OutputPlan::new(&entries, Path::new("/dist"), CollisionPolicy::Error).unwrap_err();
        let MappingError::Collision { output, first, second } = err;
        assert_eq!(output, PathBuf::from("/dist/button.css"));
        assert_eq!(first, PathBuf::from("/src/button.less"));
        assert_eq!(second, PathBuf::from("/src/button/button.less"));
    }

    #[test]
    fn test_plan_collision_warn_keeps_first() {
        let entries = vec![
            entry("/src/button.less"),
            entry("/src/card.less"),
            entry("/src/button/button.less"),
        ];
        let plan = OutputPlan::new(&entries, Path::new("/dist"), CollisionPolicy::Warn).unwrap();
        let sources: Vec<_> = plan.outputs().iter().map(|o| o.entry.source.clone()).collect();
        assert_eq!(
            sources,
            vec![PathBuf::from("/src/button.less"), PathBuf::from("/src/card.less")]
        );
        assert_eq!(plan.warnings().len(), 1);
        assert!(plan.warnings()[0].contains("button.css"));
    }

    #[test]
    fn test_plan_collision_overwrite_keeps_last() {
        let entries = vec![
            entry("/src/button.less"),
            entry("/src/card.less"),
            entry("/src/button/button.less"),
            entry("/src/x/button/button.less"),
        ];
        let plan =
            OutputPlan::new(&entries, Path::new("/dist"), CollisionPolicy::Overwrite).unwrap();
        let sources: Vec<_> = plan.outputs().iter().map(|o| o.entry.source.clone()).collect();
        assert_eq!(
            sources,
            vec![PathBuf::from("/src/card.less"), PathBuf::from("/src/x/button/button.less")]
        );
        assert_eq!(plan.warnings().len(), 2);
    }

    #[test]
    fn test_plan_empty() {
        let plan = OutputPlan::new(&[], Path::new("/dist"), CollisionPolicy::Error).unwrap();
        assert!(plan.is_empty());
    }
}
