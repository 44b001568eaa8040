//! Build result types.
//!
//! Contains types for representing the outcome of a compile run.

use std::path::PathBuf;
use std::time::Duration;

/// Status of a single entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// Compiled and written
    Success,
    /// Planned but not built (dry run)
    Skipped,
    /// Read, compile or write failed
    Failed(String),
}

impl BuildStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Skipped)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, BuildStatus::Failed(_))
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Success => write!(f, "success"),
            BuildStatus::Skipped => write!(f, "skipped"),
            BuildStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of compiling one entry file.
#[derive(Debug, Clone)]
pub struct TargetResult {
    /// Entry file id (path relative to the source root)
    pub target_id: String,
    /// Build status
    pub status: BuildStatus,
    /// Files written
    pub outputs: Vec<PathBuf>,
    /// Time spent on this file
    pub duration: Duration,
}

impl TargetResult {
    /// Create a successful result.
    pub fn success(target_id: String, outputs: Vec<PathBuf>, duration: Duration) -> Self {
        Self { target_id, status: BuildStatus::Success, outputs, duration }
    }

    /// Create a skipped result.
    pub fn skipped(target_id: String) -> Self {
        Self { target_id, status: BuildStatus::Skipped, outputs: vec![], duration: Duration::ZERO }
    }

    /// Create a failed result.
    pub fn failed(target_id: String, error: String, duration: Duration) -> Self {
        Self { target_id, status: BuildStatus::Failed(error), outputs: vec![], duration }
    }

    /// Check if this result is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete compile run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Results for each entry file, in discovery order
    pub targets: Vec<TargetResult>,
    /// Run-level warnings (unreadable subdirectories, output collisions)
    pub warnings: Vec<String>,
    /// Total build duration
    pub total_duration: Duration,
}

impl BuildResult {
    /// Create a new empty build result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target result.
    pub fn add_result(&mut self, result: TargetResult) {
        self.targets.push(result);
    }

    /// Add a run-level warning.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Set the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    /// Get the number of successful targets.
    pub fn success_count(&self) -> usize {
        self.targets.iter().filter(|r| matches!(r.status, BuildStatus::Success)).count()
    }

    /// Get the number of skipped targets.
    pub fn skipped_count(&self) -> usize {
        self.targets.iter().filter(|r| matches!(r.status, BuildStatus::Skipped)).count()
    }

    /// Get the number of failed targets.
    pub fn failed_count(&self) -> usize {
        self.targets.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Check if every target succeeded.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get failed target results.
    pub fn failures(&self) -> Vec<&TargetResult> {
        self.targets.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Format a summary of the build result.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let success = self.success_count();
        let skipped = self.skipped_count();
        let failed = self.failed_count();
        let total = self.targets.len();

        if failed > 0 {
            lines.push(format!(
                "Compile finished with errors: {} succeeded, {} skipped, {} failed ({} total)",
                success, skipped, failed, total
            ));
            for target in self.failures() {
                lines.push(format!("  - {}: {}", target.target_id, target.status));
            }
        } else {
            lines.push(format!(
                "Compile succeeded: {} written, {} skipped ({} total) in {:?}",
                success, skipped, total, self.total_duration
            ));
        }

        if !self.warnings.is_empty() {
            lines.push(format!("Warnings ({}):", self.warnings.len()));
            for warning in self.warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if self.warnings.len() > 5 {
                lines.push(format!("  ... and {} more", self.warnings.len() - 5));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_status_display() {
        assert_eq!(BuildStatus::Success.to_string(), "success");
        assert_eq!(BuildStatus::Skipped.to_string(), "skipped");
        assert_eq!(BuildStatus::Failed("error".to_string()).to_string(), "failed: error");
    }

    #[test]
    fn test_build_status_is_success() {
        assert!(BuildStatus::Success.is_success());
        assert!(BuildStatus::Skipped.is_success());
        assert!(!BuildStatus::Failed("error".to_string()).is_success());
    }

    #[test]
    fn test_target_result_failed() {
        let result = TargetResult::failed(
            "widget/widget.less".to_string(),
            "Error reading file".to_string(),
            Duration::from_millis(50),
        );

        assert!(!result.is_success());
        assert!(result.outputs.is_empty());
    }

    #[test]
    fn test_build_result_counts() {
        let mut result = BuildResult::new();
        result.add_result(TargetResult::success("a".to_string(), vec![], Duration::ZERO));
        result.add_result(TargetResult::skipped("b".to_string()));
        result.add_result(TargetResult::failed(
            "c".to_string(),
            "error".to_string(),
            Duration::ZERO,
        ));

        assert_eq!(result.success_count(), 1);
        assert_eq!(result.skipped_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.is_success());
        assert_eq!(result.failures()[0].target_id, "c");
    }

    #[test]
    fn test_build_result_summary_success() {
        let mut result = BuildResult::new();
        result.add_result(TargetResult::success("a.less".to_string(), vec![], Duration::ZERO));

        let summary = result.with_duration(Duration::from_millis(100)).summary();
        assert!(summary.contains("Compile succeeded"));
        assert!(summary.contains("1 written"));
    }

    #[test]
    fn test_build_result_summary_lists_failures_and_warnings() {
        let mut result = BuildResult::new();
        result.add_result(TargetResult::failed(
            "b.less".to_string(),
            "bad".to_string(),
            Duration::ZERO,
        ));
        for i in 0..7 {
            result.add_warning(format!("warning {}", i));
        }

        let summary = result.summary();
        assert!(summary.contains("1 failed"));
        assert!(summary.contains("  - b.less: failed: bad"));
        assert!(summary.contains("Warnings (7):"));
        assert!(summary.contains("... and 2 more"));
    }
}
