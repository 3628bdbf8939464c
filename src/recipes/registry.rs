#![forbid(unsafe_code)]

//! Recipe registry for managing and loading recipes
//!
//! The RecipeRegistry is responsible for:
//! - Holding the built-in recipes
//! - Loading declarative recipes from configured directories
//! - Resolving the recipe names a run asks for

use crate::error::RecipeError;
use crate::recipes::{DeclarativeRecipe, Recipe, builtin};
use crate::types::RecipeName;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Registry for storing and managing all recipes, keyed by name
pub struct RecipeRegistry {
    recipes: BTreeMap<RecipeName, Box<dyn Recipe>>,
}

impl RecipeRegistry {
    /// Create a new empty RecipeRegistry
    pub fn new() -> Self {
        Self {
            recipes: BTreeMap::new(),
        }
    }

    /// Create a registry holding every built-in recipe
    ///
    /// # Errors
    ///
    /// Returns `RecipeError` if an embedded recipe definition is invalid
    pub fn with_builtins() -> Result<Self, RecipeError> {
        let mut registry = Self::new();
        for recipe in builtin::load_builtin_recipes()? {
            registry.register(recipe)?;
        }
        Ok(registry)
    }

    /// Add a recipe
    ///
    /// # Errors
    ///
    /// Returns `RecipeError::InvalidDefinition` if a recipe with the same
    /// name is already registered
    pub fn register(&mut self, recipe: Box<dyn Recipe>) -> Result<(), RecipeError> {
        let name = recipe.name().clone();
        if self.recipes.contains_key(&name) {
            return Err(RecipeError::InvalidDefinition(format!(
                "Duplicate recipe name '{}'",
                name
            )));
        }
        self.recipes.insert(name, recipe);
        Ok(())
    }

    /// Load declarative recipes from every `.toml` file in `dir`
    ///
    /// A missing directory is logged and skipped. Subdirectories and other
    /// files are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RecipeError` if:
    /// - The path is not a directory or cannot be read
    /// - A TOML file cannot be parsed
    /// - A recipe definition is invalid or its name is already taken
    pub fn load_declarative_dir(&mut self, dir: &Path) -> Result<(), RecipeError> {
        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "recipe directory does not exist");
            return Ok(());
        }

        if !dir.is_dir() {
            return Err(RecipeError::InvalidDefinition(format!(
                "Path is not a directory: {}",
                dir.display()
            )));
        }

        let entries = fs::read_dir(dir).map_err(|e| {
            RecipeError::InvalidDefinition(format!(
                "Failed to read directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                RecipeError::InvalidDefinition(format!(
                    "Failed to read directory entry in {}: {}",
                    dir.display(),
                    e
                ))
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let recipe = DeclarativeRecipe::from_path(&path)?;
            tracing::debug!(recipe = %recipe.name(), file = %path.display(), "loaded declarative recipe");
            self.register(Box::new(recipe)).map_err(|e| {
                RecipeError::InvalidDefinition(format!("{} in file {}", e, path.display()))
            })?;
        }

        Ok(())
    }

    /// Get a recipe by its name
    pub fn get(&self, name: &RecipeName) -> Option<&dyn Recipe> {
        self.recipes.get(name).map(|boxed| boxed.as_ref())
    }

    /// Look up every name, in the given order
    ///
    /// # Errors
    ///
    /// Returns `RecipeError::NotFound` for the first unknown name
    pub fn resolve(&self, names: &[RecipeName]) -> Result<Vec<&dyn Recipe>, RecipeError> {
        names
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| RecipeError::NotFound(name.to_string()))
            })
            .collect()
    }

    /// Iterate over all recipes, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &dyn Recipe> {
        self.recipes.values().map(|boxed| boxed.as_ref())
    }

    /// Get the number of recipes in the registry
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl Default for RecipeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // Helper to create a declarative recipe file
    fn create_recipe_file(dir: &Path, filename: &str, name: &str) -> PathBuf {
        let toml_content = format!(
            r#"
[recipe]
name = "{}"
display_name = "Rename foo"
description = "Renames foo to bar."

[[steps]]
type = "change-method-name"
method_pattern = "com.example.Foo foo(..)"
new_name = "bar"
"#,
            name
        );

        let file_path = dir.join(filename);
        fs::write(&file_path, toml_content).unwrap();
        file_path
    }

    fn name(s: &str) -> RecipeName {
        RecipeName::new(s).unwrap()
    }

    #[test]
    fn test_new_registry() {
        let registry = RecipeRegistry::new();
        assert_eq!(registry.len(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_default_registry() {
        let registry = RecipeRegistry::default();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_with_builtins() {
        let registry = RecipeRegistry::with_builtins().unwrap();
        for builtin in [
            "spring.batch.MigrateItemWriterWrite",
            "spring.batch.MigrateItemWriterWriteInvocation",
            "spring.batch.MigrateSimpleStepBuilderProcessor",
            "spring.security7.ReplaceAuthorizationManagerCheck",
        ] {
            assert!(registry.get(&name(builtin)).is_some(), "{}", builtin);
        }
    }

    #[test]
    fn test_load_missing_dir() {
        let mut registry = RecipeRegistry::new();
        let result = registry.load_declarative_dir(Path::new("/nonexistent/recipes"));
        assert!(result.is_ok());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_multiple_recipes() {
        let temp_dir = TempDir::new().unwrap();
        create_recipe_file(temp_dir.path(), "a.toml", "custom.A");
        create_recipe_file(temp_dir.path(), "b.toml", "custom.B");
        fs::write(temp_dir.path().join("README.md"), "not a recipe").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        create_recipe_file(&temp_dir.path().join("nested"), "c.toml", "custom.C");

        let mut registry = RecipeRegistry::new();
        registry.load_declarative_dir(temp_dir.path()).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&name("custom.A")).is_some());
        assert!(registry.get(&name("custom.B")).is_some());
        assert!(registry.get(&name("custom.C")).is_none());
    }

    #[test]
    fn test_load_duplicate_recipe_name() {
        let temp_dir = TempDir::new().unwrap();
        create_recipe_file(temp_dir.path(), "a.toml", "custom.Same");
        create_recipe_file(temp_dir.path(), "b.toml", "custom.Same");

        let mut registry = RecipeRegistry::new();
        let result = registry.load_declarative_dir(temp_dir.path());
        match result {
            Err(RecipeError::InvalidDefinition(message)) => {
                assert!(message.contains("Duplicate recipe name"));
            }
            other => panic!("expected duplicate error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_load_file_path_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_recipe_file(temp_dir.path(), "a.toml", "custom.A");
        let mut registry = RecipeRegistry::new();
        assert!(registry.load_declarative_dir(&file).is_err());
    }

    #[test]
    fn test_resolve_keeps_order_and_reports_missing() {
        let registry = RecipeRegistry::with_builtins().unwrap();
        let resolved = registry
            .resolve(&[
                name("spring.security7.ReplaceAuthorizationManagerCheck"),
                name("spring.batch.MigrateItemWriterWrite"),
            ])
            .unwrap();
        assert_eq!(
            resolved[0].name().as_str(),
            "spring.security7.ReplaceAuthorizationManagerCheck"
        );
        assert_eq!(resolved[1].name().as_str(), "spring.batch.MigrateItemWriterWrite");

        match registry.resolve(&[name("does.not.Exist")]) {
            Err(RecipeError::NotFound(missing)) => assert_eq!(missing, "does.not.Exist"),
            other => panic!("expected not found, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_iter_is_ordered_by_name() {
        let registry = RecipeRegistry::with_builtins().unwrap();
        let names: Vec<&str> = registry.iter().map(|r| r.name().as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
