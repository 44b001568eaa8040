//! Command-line tests for the `stylegen` and `stylegen-tasks` binaries.
//!
//! No real `lessc` is assumed. Projects point the compiler at `cat` through
//! `sh`, or at a program that does not exist.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn stylegen(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stylegen"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run stylegen")
}

fn stylegen_tasks(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stylegen-tasks"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run stylegen-tasks")
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const MISSING_COMPILER_CONFIG: &str =
    "[project]\nname = \"skin\"\n\n[compiler]\nprogram = \"stylegen-no-such-compiler\"\n";

/// A project whose compiler echoes the source back.
fn cat_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "stylegen.toml",
        r#"
[project]
name = "skin"
version = "1.2.3"

[compile]
banner = "/*! {name} v{version} */"

[compiler]
program = "sh"
args = ["-c", "cat"]
"#,
    );
    write(temp.path(), "src/a.less", ".a { color: red; }\n");
    write(temp.path(), "src/widget/widget.less", ".widget { margin: 0; }\n");
    write(temp.path(), "src/widget/_mixins.less", ".mixin { padding: 1px; }\n");
    fs::create_dir_all(temp.path().join("build")).unwrap();
    temp
}

// ============================================================================
// stylegen
// ============================================================================

#[test]
fn test_help_exits_zero_without_creating_output() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("build")).unwrap();

    let output = stylegen(&temp.path().join("build"), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--inputdir"));
    assert!(stdout.contains("--outputdir"));
    assert!(stdout.contains("--quiet"));
    assert!(!temp.path().join("dist").exists());
}

#[test]
fn test_missing_input_root_exits_nonzero() {
    let temp = TempDir::new().unwrap();
    let output = stylegen(temp.path(), &["-i", "nowhere", "-o", "out"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid input path"));
    assert!(!temp.path().join("out").exists());
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let output = stylegen(temp.path(), &["--watch"]);
    assert_eq!(output.status.code(), Some(2));
}

#[cfg(unix)]
#[test]
fn test_default_paths_are_relative_to_working_directory() {
    let temp = cat_project();

    let output = stylegen(&temp.path().join("build"), &[]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(temp.path().join("dist/a.css")).unwrap(),
        "/*! skin v1.2.3 */\n.a { color: red; }\n"
    );
    assert!(temp.path().join("dist/widget.css").exists());
    assert!(!temp.path().join("dist/_mixins.css").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Processing paths..."));
    assert!(stderr.contains("Processing file a.less"));
}

#[cfg(unix)]
#[test]
fn test_quiet_prints_nothing() {
    let temp = cat_project();

    let output = stylegen(temp.path(), &["-q", "-i", "src", "-o", "public"]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
    assert!(temp.path().join("public/a.css").exists());
}

#[test]
fn test_unrunnable_compiler_still_exits_zero() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "stylegen.toml", MISSING_COMPILER_CONFIG);
    write(temp.path(), "src/a.less", ".a {}\n");

    let output = stylegen(temp.path(), &["-i", "src", "-o", "dist"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("stylegen-no-such-compiler"));
    assert!(temp.path().join("dist").is_dir());
    assert!(!temp.path().join("dist/a.css").exists());
}

#[test]
fn test_invalid_config_exits_nonzero() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "stylegen.toml", "[project]\nname = \"\"\n");
    fs::create_dir_all(temp.path().join("src")).unwrap();

    let output = stylegen(temp.path(), &["-i", "src"]);
    assert!(!output.status.success());
}

// ============================================================================
// stylegen-tasks
// ============================================================================

#[cfg(unix)]
#[test]
fn test_tasks_default_cleans_compiles_and_lints() {
    let temp = cat_project();
    write(temp.path(), "dist/stale.css", ".stale {}\n");

    let output = stylegen_tasks(temp.path(), &[]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(!temp.path().join("dist/stale.css").exists());
    assert!(temp.path().join("dist/a.css").exists());
    assert!(temp.path().join("dist/widget.css").exists());
}

#[cfg(unix)]
#[test]
fn test_tasks_lint_violation_exits_one() {
    let temp = cat_project();
    write(temp.path(), "src/loud/loud.less", ".loud { color: red !important; }\n");

    let output = stylegen_tasks(temp.path(), &["build", "test"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loud.css"));
    assert!(stderr.contains("[important]"));
}

#[cfg(unix)]
#[test]
fn test_tasks_allow_prefixed_fallbacks_outside_core() {
    let temp = cat_project();
    let prefixed = ".r { -webkit-border-radius: 3px; }\n";
    write(temp.path(), "src/round/round.less", prefixed);

    let output = stylegen_tasks(temp.path(), &[]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    write(temp.path(), "src/core.less", prefixed);
    let output = stylegen_tasks(temp.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("core.css"));
    assert!(stderr.contains("[vendor-prefix]"));
}

#[cfg(unix)]
#[test]
fn test_tasks_out_flag_overrides_config() {
    let temp = cat_project();

    let output = stylegen_tasks(temp.path(), &["compile", "--out", "public"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(temp.path().join("public/a.css").exists());
    assert!(!temp.path().join("dist").exists());
}

#[test]
fn test_tasks_compile_failure_exits_one() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "stylegen.toml", MISSING_COMPILER_CONFIG);
    write(temp.path(), "src/a.less", ".a {}\n");

    let output = stylegen_tasks(temp.path(), &["compile"]);
    assert_eq!(output.status.code(), Some(1));
}

#[cfg(unix)]
#[test]
fn test_tasks_explicit_config_from_elsewhere() {
    let temp = cat_project();
    let elsewhere = TempDir::new().unwrap();

    let config = temp.path().join("stylegen.toml");
    let output =
        stylegen_tasks(elsewhere.path(), &["compile", "--config", config.to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(temp.path().join("dist/a.css").exists());
    assert!(!elsewhere.path().join("dist").exists());
}

#[test]
fn test_tasks_dry_run_changes_nothing() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "stylegen.toml", "[project]\nname = \"skin\"\n");
    write(temp.path(), "src/a.less", ".a {}\n");
    write(temp.path(), "dist/old.css", ".old {}\n");

    let output = stylegen_tasks(temp.path(), &["--dry-run"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(temp.path().join("dist/old.css").exists());
    assert!(!temp.path().join("dist/a.css").exists());
}

#[test]
fn test_tasks_unknown_task_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let output = stylegen_tasks(temp.path(), &["deploy"]);
    assert_eq!(output.status.code(), Some(2));
}
