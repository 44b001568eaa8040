//! Stylegen - compile a tree of preprocessor stylesheets into flat CSS
//!
//! This library provides functionality to:
//! - Discover entry stylesheets and include directories in a source tree
//! - Compile every entry through an external compiler into one flat output directory
//! - Lint the generated CSS
//! - Run clean/compile/lint tasks driven by `stylegen.toml`

pub mod build;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod lint;
pub mod tasks;
