//! Build pipeline for stylegen
//!
//! Turns a tree of preprocessor sources into a flat directory of CSS files.
//!
//! # Overview
//!
//! The build pipeline consists of:
//! - **Discovery**: Walk the source root once, classify files as entries or
//!   includes and collect the include search paths
//! - **Planning**: Map every entry to `<out>/<base>.css` and resolve name
//!   collisions
//! - **Execution**: Compile entries on a worker pool and write the results
//!
//! # Example
//!
//! ```ignore
//! use stylegen::build::{BuildContext, BuildPipeline};
//! use stylegen::compiler::LesscCompiler;
//! use stylegen::config::load_config;
//!
//! let config = load_config(None)?;
//! let compiler = Arc::new(LesscCompiler::from_config(&config.compiler));
//! let pipeline = BuildPipeline::new(BuildContext::new(config, project_root), compiler);
//!
//! let result = pipeline.build()?;
//! println!("Wrote {} files", result.success_count());
//! ```

pub mod context;
pub mod discovery;
pub mod mapping;
pub mod pipeline;
pub mod progress;
pub mod result;
pub mod search_paths;

pub use context::*;
pub use discovery::*;
pub use mapping::*;
pub use pipeline::*;
pub use result::*;
pub use search_paths::*;
