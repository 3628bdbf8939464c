//! Error types for rewrites
//!
//! This module defines the error types used throughout the crate, following
//! a hierarchical structure with specific error variants for different
//! error categories. Rewriting itself never fails: shapes a recipe cannot
//! handle are left unchanged. These errors cover loading configuration,
//! recipes and classpaths, and parsing sources.

use std::path::PathBuf;

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid TOML syntax, missing field or field of the wrong type
    #[error("Invalid configuration syntax: {0}")]
    InvalidSyntax(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// The configuration parses but is not usable
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Recipe-related errors
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    /// Invalid recipe definition
    #[error("Invalid recipe definition: {0}")]
    InvalidDefinition(String),

    /// Recipe not found
    #[error("Recipe not found: {0}")]
    NotFound(String),

    /// Invalid method pattern
    #[error("Invalid method pattern '{pattern}': {message}")]
    InvalidMethodPattern { pattern: String, message: String },

    /// Invalid type name in a recipe option
    #[error("Invalid type name '{0}'")]
    InvalidTypeName(String),
}

/// Errors raised while applying a code template
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The expanded template is not valid Java
    #[error("Template does not parse: {0}")]
    Parse(String),

    /// The number of arguments does not match the placeholders
    #[error("Template expects {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    /// A placeholder expected a different kind of argument
    #[error("Template argument {index} has the wrong kind, expected {expected}")]
    ArgumentKind { index: usize, expected: &'static str },

    /// The template produced no node of the requested kind
    #[error("Template produced no {0}")]
    MissingNode(&'static str),
}

/// Errors raised by the Java front end
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The tree-sitter grammar could not be loaded
    #[error("Failed to load Java grammar: {0}")]
    Grammar(String),

    /// tree-sitter produced no tree
    #[error("Parser produced no syntax tree")]
    NoTree,

    /// The source contains syntax errors
    #[error("Syntax error at {line}:{column}")]
    Syntax { line: usize, column: usize },
}

/// Top-level error type for rewrites
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Recipe error
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Template error
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Parse error in source file
    #[error("Parse error in {file}: {source}")]
    Parse {
        file: PathBuf,
        #[source]
        source: ParseError,
    },

    /// Source discovery error
    #[error("File walk error: {0}")]
    Walk(#[from] crate::engine::FileWalkerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
