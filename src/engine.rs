//! Source discovery and recipe execution

pub mod executor;
pub mod file_walker;

pub use executor::{ExecutionResult, FileOutcome, FileResult, RewriteEngine, SourceRewrite};
pub use file_walker::{FileEntry, FileWalker, FileWalkerError};
