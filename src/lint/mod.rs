//! Lint checks over generated CSS
//!
//! Every `.css` file under the output root is parsed with lightningcss and
//! run through a small set of rules (see [`rules`]). Which rules run is
//! layered: the built-in defaults, then the optional JSON rule file, then
//! `[lint.rules]` from `stylegen.toml`. Files matched by a
//! `[[lint.overrides]]` group then get that group's rules switched on or
//! off, and excluded files are never read.

pub mod rules;

pub use rules::{Rule, PARSE_ERROR, RULE_NAMES};

use crate::config::{ConfigError, LintConfig};
use glob::{MatchOptions, Pattern};
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// A file that could not be linted. Recorded in the report, not fatal.
#[derive(Debug, Error)]
pub enum LintError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One rule hit in one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Rule name, or `parse-error`
    pub rule: String,
    /// 1-based line, when known
    pub line: Option<usize>,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: [{}] {}", line, self.rule, self.message),
            None => write!(f, "[{}] {}", self.rule, self.message),
        }
    }
}

/// Lint outcome for one file
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Path relative to the output root, `/`-separated
    pub name: String,
    pub violations: Vec<Violation>,
}

impl FileReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Lint outcome for a whole output root
#[derive(Debug, Default)]
pub struct LintReport {
    /// Checked files, in file-name order
    pub files: Vec<FileReport>,
    /// Files matched by an exclude pattern
    pub excluded: Vec<String>,
    /// Files that could not be read
    pub errors: Vec<LintError>,
}

impl LintReport {
    /// Total violations across all files.
    pub fn violation_count(&self) -> usize {
        self.files.iter().map(|f| f.violations.len()).sum()
    }

    /// No violations and no unreadable files.
    pub fn is_clean(&self) -> bool {
        self.violation_count() == 0 && self.errors.is_empty()
    }

}

/// The set of enabled rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    enabled: HashSet<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl RuleSet {
    /// Every rule on.
    pub fn all() -> Self {
        Self { enabled: Rule::ALL.into_iter().collect() }
    }

    /// The rules that are on unless configured otherwise.
    pub fn defaults() -> Self {
        let mut set = Self::all();
        for rule in Rule::ALL.into_iter().filter(|r| !r.on_by_default()) {
            set.set(rule, false);
        }
        set
    }

    /// Switch one rule on or off.
    pub fn set(&mut self, rule: Rule, on: bool) {
        if on {
            self.enabled.insert(rule);
        } else {
            self.enabled.remove(&rule);
        }
    }

    /// Apply name toggles on top of the current set. Unknown names are ignored.
    pub fn apply<'a>(&mut self, toggles: impl IntoIterator<Item = (&'a String, &'a bool)>) {
        for (name, on) in toggles {
            match Rule::from_name(name) {
                Some(rule) => self.set(rule, *on),
                None => tracing::debug!(rule = %name, "ignoring unknown lint rule"),
            }
        }
    }

    /// A copy with the `enable` rules switched on, then the `disable` rules off.
    pub fn overridden(&self, enable: &[String], disable: &[String]) -> Self {
        let mut set = self.clone();
        for rule in enable.iter().filter_map(|n| Rule::from_name(n)) {
            set.set(rule, true);
        }
        for rule in disable.iter().filter_map(|n| Rule::from_name(n)) {
            set.set(rule, false);
        }
        set
    }

    pub fn is_enabled(&self, rule: Rule) -> bool {
        self.enabled.contains(&rule)
    }

    /// Enabled rules, in [`Rule::ALL`] order.
    pub fn enabled(&self) -> Vec<Rule> {
        Rule::ALL.into_iter().filter(|r| self.enabled.contains(r)).collect()
    }
}

/// Load a JSON rule file (`{"rule-name": true|false|0|1|2}`).
///
/// Numbers are treated as "on" unless zero. Names of rules this crate does
/// not implement are kept; [`RuleSet::apply`] skips them.
pub fn load_rc(path: &Path) -> Result<BTreeMap<String, bool>, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let raw: BTreeMap<String, Value> = serde_json::from_str(&contents)
        .map_err(|e| ConfigError::LintRc { path: path.to_path_buf(), source: e })?;

    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| {
            let on = match value {
                Value::Bool(b) => b,
                Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
                other => {
                    tracing::warn!(
                        rule = %name,
                        value = %other,
                        "ignoring non-boolean lint rule value"
                    );
                    return None;
                }
            };
            Some((name, on))
        })
        .collect())
}

/// Lint a single stylesheet's source text.
pub fn lint_css(filename: &str, code: &str, rule_set: &RuleSet) -> Vec<Violation> {
    let options = ParserOptions { filename: filename.to_string(), ..ParserOptions::default() };
    let sheet = match StyleSheet::parse(code, options) {
        Ok(sheet) => sheet,
        Err(e) => {
            return vec![Violation {
                rule: PARSE_ERROR.to_string(),
                line: e.loc.as_ref().map(|loc| loc.line as usize + 1),
                message: e.kind.to_string(),
            }];
        }
    };

    let mut findings = Vec::new();
    rules::check_rules(&sheet.rules.0, rule_set, &mut findings);
    findings.sort_by_key(|f| f.line);

    findings
        .into_iter()
        .map(|f| Violation {
            rule: f.rule.name().to_string(),
            line: Some(f.line),
            message: f.message,
        })
        .collect()
}

/// A rule override with its patterns compiled
#[derive(Debug, Clone)]
struct OverrideGroup {
    files: Vec<Pattern>,
    enable: Vec<String>,
    disable: Vec<String>,
}

/// File names match patterns regardless of case.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Lints every CSS file under an output root
#[derive(Debug, Clone)]
pub struct Linter {
    rules: RuleSet,
    exclude: Vec<Pattern>,
    overrides: Vec<OverrideGroup>,
}

impl Default for Linter {
    fn default() -> Self {
        Self { rules: RuleSet::defaults(), exclude: Vec::new(), overrides: Vec::new() }
    }
}

impl Linter {
    /// Build a linter from the `[lint]` section.
    ///
    /// The rule file, if any, is resolved against `project_root`.
    pub fn from_config(config: &LintConfig, project_root: &Path) -> Result<Self, ConfigError> {
        let mut rules = RuleSet::defaults();
        if let Some(rc) = &config.rc {
            let path = crate::config::loader::resolve_path(project_root, rc);
            rules.apply(&load_rc(&path)?);
        }
        rules.apply(&config.rules);

        let exclude = compile_patterns("lint.exclude", &config.exclude)?;
        let overrides = config
            .overrides
            .iter()
            .map(|group| {
                Ok(OverrideGroup {
                    files: compile_patterns("lint.overrides.files", &group.files)?,
                    enable: group.enable.clone(),
                    disable: group.disable.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { rules, exclude, overrides })
    }

    /// Whether a relative file name is excluded.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|p| p.matches_with(name, MATCH_OPTIONS))
    }

    /// The rules that apply to a relative file name.
    pub fn rules_for(&self, name: &str) -> RuleSet {
        let set = self
            .overrides
            .iter()
            .filter(|group| group.files.iter().any(|p| p.matches_with(name, MATCH_OPTIONS)))
            .fold(self.rules.clone(), |set, group| set.overridden(&group.enable, &group.disable));
        tracing::debug!(file = %name, rules = ?set.enabled(), "lint rules");
        set
    }

    /// Lint every `.css` file under `root`, recursively, in file-name order.
    pub fn lint_dir(&self, root: &Path) -> LintReport {
        let mut report = LintReport::default();

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path =
                        e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    report.errors.push(LintError::Io { path, source: e.into() });
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_css(entry.path()) {
                continue;
            }

            let name = relative_name(root, entry.path());
            if self.is_excluded(&name) {
                tracing::debug!(file = %name, "excluded from lint");
                report.excluded.push(name);
                continue;
            }

            match fs::read_to_string(entry.path()) {
                Ok(code) => {
                    let violations = lint_css(&name, &code, &self.rules_for(&name));
                    report.files.push(FileReport { name, violations });
                }
                Err(e) => {
                    let path = entry.path().to_path_buf();
                    report.errors.push(LintError::Io { path, source: e });
                }
            }
        }

        report
    }
}

fn compile_patterns(field: &str, patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| {
                ConfigError::Validation(vec![format!(
                    "stylegen.toml: '{}' has invalid pattern '{}': {}",
                    field, p, e
                )])
            })
        })
        .collect()
}

fn is_css(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("css"))
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}
