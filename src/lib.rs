#![forbid(unsafe_code)]

//! Rewrites: type-aware Java source rewriting
//!
//! Recipes match methods by signature against type-attributed syntax trees
//! and rewrite declarations and call sites in place, printing every untouched
//! byte of the source as it was. Built-in recipes migrate client code to
//! Spring Batch 5 and Spring Security 7; more recipes can be declared in
//! TOML.

pub mod classpath;
pub mod config;
pub mod engine;
pub mod error;
pub mod imports;
pub mod output;
pub mod parse;
pub mod recipes;
pub mod search;
pub mod template;
pub mod tree;
pub mod types;
pub mod visit;

// Re-export error types for convenient access
pub use error::{ConfigError, ParseError, RecipeError, RewriteError, TemplateError};

// Re-export core domain types for convenient access
pub use types::{GlobPattern, RecipeName};
