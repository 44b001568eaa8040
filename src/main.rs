//! Stylegen - compile a tree of preprocessor stylesheets into flat CSS

use std::process::ExitCode;

use stylegen::cli;

fn main() -> ExitCode {
    cli::run_generator()
}
