//! Stylegen task runner - clean, compile and lint a stylesheet project

use std::process::ExitCode;

use stylegen::cli;

fn main() -> ExitCode {
    cli::run_tasks()
}
