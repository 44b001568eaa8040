//! Build progress reporting.
//!
//! Everything the generator and the task runner tell the user goes through a
//! [`ProgressReporter`]. `--quiet` swaps in [`NullProgress`].
//!
//! # Example
//!
//! ```ignore
//! use stylegen::build::progress::{ConsoleProgress, ProgressEvent, ProgressReporter, TargetStatus};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::BuildStarted { total_targets: 2 });
//! reporter.report(ProgressEvent::TargetCompleted {
//!     target_id: "widget/widget.less".to_string(),
//!     status: TargetStatus::Success,
//!     duration_ms: 12,
//! });
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Status of a target in progress events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// Target compiled and written
    Success,
    /// Target planned but not built (dry run)
    Skipped,
    /// Target failed
    Failed(String),
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetStatus::Success => write!(f, "success"),
            TargetStatus::Skipped => write!(f, "skipped"),
            TargetStatus::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Events that can be reported during a build.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Informational line (phase changes, paths being processed)
    Message {
        message: String,
    },
    /// Compilation is about to start
    BuildStarted {
        /// Number of entry files to compile
        total_targets: usize,
    },
    /// An entry file is being compiled
    TargetStarted {
        target_id: String,
    },
    /// An entry file finished
    TargetCompleted {
        target_id: String,
        status: TargetStatus,
        duration_ms: u64,
    },
    /// All entry files finished
    BuildCompleted {
        success: bool,
        duration_ms: u64,
        succeeded: usize,
        skipped: usize,
        failed: usize,
    },
    /// A warning was generated
    Warning {
        /// Target that generated the warning (if applicable)
        target_id: Option<String>,
        message: String,
    },
    /// An error occurred
    Error {
        /// Target that generated the error (if applicable)
        target_id: Option<String>,
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    /// Create a new null progress reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show per-target start lines
    verbose: bool,
    /// Completed target count
    current: AtomicUsize,
    /// Total target count
    total: AtomicUsize,
    /// Output writer (for testing)
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("current", &self.current)
            .field("total", &self.total)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console reporter on stderr, colored when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Message { message } => {
                self.writeln(&format!("{} {}", self.cyan("[stylegen]"), message));
            }
            ProgressEvent::BuildStarted { total_targets } => {
                self.total.store(total_targets, Ordering::SeqCst);
                self.current.store(0, Ordering::SeqCst);
                self.writeln(&format!(
                    "{} Compiling {} file{}...",
                    self.cyan("[compile]"),
                    total_targets,
                    if total_targets == 1 { "" } else { "s" }
                ));
            }
            ProgressEvent::TargetStarted { target_id } => {
                if self.verbose {
                    let prefix = self.cyan("[compile]");
                    self.writeln(&format!("{} Processing file {}", prefix, target_id));
                }
            }
            ProgressEvent::TargetCompleted { target_id, status, duration_ms } => {
                let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                let total = self.total.load(Ordering::SeqCst);

                let status_str = match &status {
                    TargetStatus::Success => self.green("ok"),
                    TargetStatus::Skipped => self.yellow("skipped"),
                    TargetStatus::Failed(_) => self.red("FAILED"),
                };

                self.writeln(&format!(
                    "{} [{}/{}] {} {} ({})",
                    self.cyan("[compile]"),
                    current,
                    total,
                    status_str,
                    target_id,
                    format_duration(duration_ms)
                ));

                if let TargetStatus::Failed(err) = status {
                    self.writeln(&format!("        {}", self.red(&err)));
                }
            }
            ProgressEvent::BuildCompleted { success, duration_ms, succeeded, skipped, failed } => {
                let duration_str = format_duration(duration_ms);
                if success {
                    self.writeln(&format!(
                        "{} {} compiled, {} skipped in {}",
                        self.green("[done]"),
                        succeeded,
                        skipped,
                        duration_str
                    ));
                } else {
                    self.writeln(&format!(
                        "{} {} compiled, {} skipped, {} {} in {}",
                        self.red("[done]"),
                        succeeded,
                        skipped,
                        failed,
                        if failed == 1 { "failure" } else { "failures" },
                        duration_str
                    ));
                }
            }
            ProgressEvent::Warning { target_id, message } => {
                let prefix = target_id.map(|id| format!("{}: ", id)).unwrap_or_default();
                self.writeln(&format!("{} {}{}", self.yellow("[warn]"), prefix, message));
            }
            ProgressEvent::Error { target_id, message } => {
                let prefix = target_id.map(|id| format!("{}: ", id)).unwrap_or_default();
                self.writeln(&format!("{} {}{}", self.red("[error]"), prefix, message));
            }
        }
    }
}

/// Format a duration in milliseconds to a human-readable string.
pub(crate) fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct TestWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture() -> (Arc<Mutex<Vec<u8>>>, ConsoleProgress) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let progress = ConsoleProgress::with_output(TestWriter(Arc::clone(&buffer)));
        (buffer, progress)
    }

    fn text(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn test_target_status_display() {
        assert_eq!(TargetStatus::Success.to_string(), "success");
        assert_eq!(TargetStatus::Skipped.to_string(), "skipped");
        assert_eq!(TargetStatus::Failed("boom".to_string()).to_string(), "failed: boom");
    }

    #[test]
    fn test_console_progress_counts_completions() {
        let (buffer, progress) = capture();
        progress.report(ProgressEvent::BuildStarted { total_targets: 2 });
        progress.report(ProgressEvent::TargetCompleted {
            target_id: "a.less".to_string(),
            status: TargetStatus::Success,
            duration_ms: 5,
        });
        progress.report(ProgressEvent::TargetCompleted {
            target_id: "widget/widget.less".to_string(),
            status: TargetStatus::Failed("parse error".to_string()),
            duration_ms: 1500,
        });

        let out = text(&buffer);
        assert!(out.contains("Compiling 2 files..."));
        assert!(out.contains("[1/2] ok a.less (5ms)"));
        assert!(out.contains("[2/2] FAILED widget/widget.less (1.5s)"));
        assert!(out.contains("parse error"));
    }

    #[test]
    fn test_console_progress_started_only_when_verbose() {
        let (buffer, progress) = capture();
        progress.report(ProgressEvent::TargetStarted { target_id: "a.less".to_string() });
        assert!(text(&buffer).is_empty());

        let (buffer, progress) = capture();
        let progress = progress.with_verbose(true);
        progress.report(ProgressEvent::TargetStarted { target_id: "a.less".to_string() });
        assert!(text(&buffer).contains("Processing file a.less"));
    }

    #[test]
    fn test_console_progress_warning_and_error() {
        let (buffer, progress) = capture();
        progress.report(ProgressEvent::Warning {
            target_id: Some("b.less".to_string()),
            message: "collision".to_string(),
        });
        progress.report(ProgressEvent::Error { target_id: None, message: "bad root".to_string() });

        let out = text(&buffer);
        assert!(out.contains("[warn] b.less: collision"));
        assert!(out.contains("[error] bad root"));
    }

    #[test]
    fn test_console_progress_build_completed() {
        let (buffer, progress) = capture();
        progress.report(ProgressEvent::BuildCompleted {
            success: false,
            duration_ms: 61_000,
            succeeded: 3,
            skipped: 0,
            failed: 1,
        });
        assert!(text(&buffer).contains("3 compiled, 0 skipped, 1 failure in 1m 1s"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0ms");
        assert_eq!(format_duration(999), "999ms");
        assert_eq!(format_duration(2500), "2.5s");
        assert_eq!(format_duration(125_000), "2m 5s");
    }
}
