#![forbid(unsafe_code)]

//! Sequential execution engine applying recipes to Java sources
//!
//! Each file is read, run through every selected recipe in order, and
//! (optionally) written back. A file that cannot be read, parsed or written
//! is reported as failed; it does not stop the run.

use crate::classpath::{TypeEnv, TypeTable};
use crate::engine::file_walker::FileEntry;
use crate::error::{ParseError, RecipeError};
use crate::recipes::{Recipe, RecipeRegistry, run_recipe};
use crate::types::RecipeName;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// The rewritten text of one source and the recipes that changed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRewrite {
    pub output: String,
    pub changed_by: Vec<RecipeName>,
}

impl SourceRewrite {
    pub fn is_changed(&self) -> bool {
        !self.changed_by.is_empty()
    }
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Changed { recipes: Vec<RecipeName> },
    Unchanged,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Result of running the selected recipes over a set of files
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// One entry per file, in the order the files were given
    pub files: Vec<FileResult>,
    /// Number of recipes selected for the run
    pub recipes_executed: usize,
}

impl ExecutionResult {
    pub fn files_checked(&self) -> usize {
        self.files.len()
    }

    pub fn changed(&self) -> impl Iterator<Item = &FileResult> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Changed { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileResult> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed { .. }))
    }
}

/// Runs a fixed list of recipes over Java sources
///
/// The engine:
/// - Resolves the selected recipe names against the registry up front
/// - Processes files one at a time, each with a fresh type environment over
///   the shared classpath
/// - Writes changed files back only when asked to
pub struct RewriteEngine {
    registry: RecipeRegistry,
    selected: Vec<RecipeName>,
    classpath: Arc<TypeTable>,
    write: bool,
}

impl RewriteEngine {
    /// Creates an engine running `selected` recipes, in order
    ///
    /// # Errors
    ///
    /// Returns `RecipeError::NotFound` if a selected name is not registered
    pub fn new(registry: RecipeRegistry, selected: Vec<RecipeName>, classpath: Arc<TypeTable>) -> Result<Self, RecipeError> {
        registry.resolve(&selected)?;
        Ok(Self {
            registry,
            selected,
            classpath,
            write: false,
        })
    }

    /// Write changed sources back to disk (off by default)
    pub fn with_write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    fn recipes(&self) -> Vec<&dyn Recipe> {
        self.selected
            .iter()
            .filter_map(|name| self.registry.get(name))
            .collect()
    }

    /// Applies the selected recipes to one source text
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the source (or a recipe's output) does not
    /// parse
    pub fn rewrite_source(&self, source: &str) -> Result<SourceRewrite, ParseError> {
        let mut env = TypeEnv::new(Arc::clone(&self.classpath));
        let mut current = source.to_string();
        let mut changed_by = Vec::new();
        for recipe in self.recipes() {
            let next = run_recipe(recipe, &current, &mut env)?;
            if next != current {
                tracing::debug!(recipe = %recipe.name(), "recipe changed source");
                changed_by.push(recipe.name().clone());
                current = next;
            }
        }
        Ok(SourceRewrite {
            output: current,
            changed_by,
        })
    }

    /// Runs the selected recipes against every file
    pub fn execute(&self, files: Vec<FileEntry>) -> ExecutionResult {
        let files = files
            .into_iter()
            .map(|file| {
                let outcome = self.execute_file(&file);
                FileResult {
                    path: file.path,
                    outcome,
                }
            })
            .collect();
        ExecutionResult {
            files,
            recipes_executed: self.selected.len(),
        }
    }

    fn execute_file(&self, file: &FileEntry) -> FileOutcome {
        let content = match fs::read_to_string(&file.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %file.path.display(), error = %e, "failed to read file, skipping");
                return FileOutcome::Failed { message: e.to_string() };
            }
        };

        let rewrite = match self.rewrite_source(&content) {
            Ok(rewrite) => rewrite,
            Err(e) => {
                tracing::warn!(path = %file.path.display(), error = %e, "failed to parse file, skipping");
                return FileOutcome::Failed { message: e.to_string() };
            }
        };

        if !rewrite.is_changed() {
            return FileOutcome::Unchanged;
        }
        if self.write
            && let Err(e) = fs::write(&file.path, &rewrite.output)
        {
            tracing::warn!(path = %file.path.display(), error = %e, "failed to write file");
            return FileOutcome::Failed { message: e.to_string() };
        }
        tracing::info!(
            path = %file.path.display(),
            recipes = ?rewrite.changed_by.iter().map(RecipeName::as_str).collect::<Vec<_>>(),
            written = self.write,
            "rewrote file"
        );
        FileOutcome::Changed {
            recipes: rewrite.changed_by,
        }
    }
}
