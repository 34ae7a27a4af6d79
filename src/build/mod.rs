//! Build pipeline module for assetpipe
//!
//! Provides the task orchestration: discovery of asset inputs from the
//! configured globs, the clean-then-parallel default pipeline, and the
//! per-task result types.
//!
//! # Overview
//!
//! - **Discovery**: expand input globs; group scripts into bundles
//! - **Execution**: clean first, then scripts/lint/styles/svgs/copy in
//!   parallel
//! - **Results**: per-task status, outputs, and a build summary

pub mod context;
pub mod discovery;
pub mod pipeline;
pub mod result;

pub use context::*;
pub use discovery::*;
pub use pipeline::*;
pub use result::*;
