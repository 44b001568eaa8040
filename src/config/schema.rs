//! Configuration schema types for `stylegen.toml`
//!
//! Defines the structure and validation rules for stylegen project configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::lint::RULE_NAMES;

/// What to do when two entry files map to the same output name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Refuse to build
    #[default]
    Error,
    /// Keep the first claimant, drop later ones with a warning
    Warn,
    /// Keep the last claimant, drop earlier ones with a warning
    Overwrite,
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollisionPolicy::Error => write!(f, "error"),
            CollisionPolicy::Warn => write!(f, "warn"),
            CollisionPolicy::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Project version, available to the banner as `{version}`
    #[serde(default = "default_version")]
    pub version: String,
    /// Source root for preprocessor files
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Output root for generated CSS
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_out() -> PathBuf {
    PathBuf::from("dist")
}

/// Compile step settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Style-source extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Banner prepended to every generated file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    /// Worker count, 0 means available parallelism
    #[serde(default)]
    pub jobs: usize,
    /// Output name collision handling
    #[serde(default)]
    pub on_collision: CollisionPolicy,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            banner: None,
            jobs: 0,
            on_collision: CollisionPolicy::default(),
        }
    }
}

fn default_extension() -> String {
    "less".to_string()
}

/// External compiler invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Program to run
    #[serde(default = "default_program")]
    pub program: String,
    /// Extra arguments placed before the include path and stdin marker
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { program: default_program(), args: Vec::new() }
    }
}

fn default_program() -> String {
    "lessc".to_string()
}

/// Rule changes for a group of files, on top of the base rule set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOverride {
    /// File name patterns (glob syntax, case-insensitive, matched against the
    /// name relative to the output root)
    pub files: Vec<String>,
    /// Rules switched on for these files
    #[serde(default)]
    pub enable: Vec<String>,
    /// Rules switched off for these files
    #[serde(default)]
    pub disable: Vec<String>,
}

/// Lint step settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    /// Whether the lint task does anything
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Optional JSON rule file (`{"rule-name": true|false}`), relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rc: Option<PathBuf>,
    /// File name patterns never linted
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Rule toggles, applied after the rc file
    #[serde(default)]
    pub rules: BTreeMap<String, bool>,
    /// Per-file rule changes, applied in order
    #[serde(default = "default_overrides")]
    pub overrides: Vec<RuleOverride>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rc: None,
            exclude: default_exclude(),
            rules: BTreeMap::new(),
            overrides: default_overrides(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_exclude() -> Vec<String> {
    vec!["skin.css".to_string()]
}

fn default_overrides() -> Vec<RuleOverride> {
    // core.css carries normalize.css, which trips the first two on purpose.
    // Everything else ships prefixed fallbacks for old browsers.
    vec![RuleOverride {
        files: vec!["core.css".to_string()],
        enable: vec!["vendor-prefix".to_string()],
        disable: vec!["outline-none".to_string(), "box-sizing".to_string()],
    }]
}

/// Complete stylegen.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylegenConfig {
    /// Project metadata (required)
    pub project: ProjectConfig,
    /// Compile settings
    #[serde(default)]
    pub compile: CompileConfig,
    /// External compiler
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Lint settings
    #[serde(default)]
    pub lint: LintConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "compile.extension")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stylegen.toml: '{}' {}", self.field, self.message)
    }
}

impl StylegenConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.project.name.is_empty() {
            errors.push(ConfigValidationError {
                field: "project.name".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.compile.extension.is_empty() {
            errors.push(ConfigValidationError {
                field: "compile.extension".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        } else if self.compile.extension.starts_with('.') {
            errors.push(ConfigValidationError {
                field: "compile.extension".to_string(),
                message: "must not start with a dot".to_string(),
            });
        }

        if self.compiler.program.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "compiler.program".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        for name in self.lint.rules.keys() {
            if !RULE_NAMES.contains(&name.as_str()) {
                errors.push(ConfigValidationError {
                    field: format!("lint.rules.{}", name),
                    message: format!(
                        "is not a known rule (expected one of: {})",
                        RULE_NAMES.join(", ")
                    ),
                });
            }
        }

        for (i, group) in self.lint.overrides.iter().enumerate() {
            if group.files.is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("lint.overrides[{}].files", i),
                    message: "must contain at least one pattern".to_string(),
                });
            }
            let toggles = group.enable.iter().map(|n| ("enable", n));
            for (key, name) in toggles.chain(group.disable.iter().map(|n| ("disable", n))) {
                if !RULE_NAMES.contains(&name.as_str()) {
                    errors.push(ConfigValidationError {
                        field: format!("lint.overrides[{}].{}", i, key),
                        message: format!("'{}' is not a known rule", name),
                    });
                }
            }
        }

        let override_files = self.lint.overrides.iter().flat_map(|o| o.files.iter());
        for pattern in self.lint.exclude.iter().chain(override_files) {
            if let Err(e) = glob::Pattern::new(pattern) {
                errors.push(ConfigValidationError {
                    field: "lint".to_string(),
                    message: format!("invalid file pattern '{}': {}", pattern, e),
                });
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Banner text with `{name}` and `{version}` substituted, if configured.
    pub fn rendered_banner(&self) -> Option<String> {
        self.compile.banner.as_ref().map(|banner| {
            banner.replace("{name}", &self.project.name).replace("{version}", &self.project.version)
        })
    }
}
