#![forbid(unsafe_code)]

//! Recipes declared in TOML as an ordered list of primitive steps
//!
//! ```toml
//! [recipe]
//! name = "example.RenameFoo"
//! display_name = "Rename foo"
//! description = "Renames Foo.foo to bar."
//!
//! [[steps]]
//! type = "change-method-name"
//! method_pattern = "com.example.Foo foo(..)"
//! match_overrides = true
//! new_name = "bar"
//! ```

use crate::error::RecipeError;
use crate::recipes::Recipe;
use crate::recipes::java::{ChangeMethodName, ChangeMethodReturnType, ChangeParameterType};
use crate::types::RecipeName;
use serde::Deserialize;
use std::path::Path;

/// TOML structure for declarative recipe definitions
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecipeDefinition {
    recipe: RecipeSection,
    #[serde(default)]
    steps: Vec<StepDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecipeSection {
    name: String,
    display_name: String,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum StepDefinition {
    ChangeMethodName {
        method_pattern: String,
        #[serde(default)]
        match_overrides: bool,
        new_name: String,
    },
    ChangeMethodReturnType {
        method_pattern: String,
        #[serde(default)]
        match_overrides: bool,
        new_return_type: String,
    },
    ChangeParameterType {
        method_pattern: String,
        #[serde(default)]
        match_overrides: bool,
        index: usize,
        new_type: String,
    },
}

impl StepDefinition {
    fn build(self) -> Result<Box<dyn Recipe>, RecipeError> {
        Ok(match self {
            StepDefinition::ChangeMethodName {
                method_pattern,
                match_overrides,
                new_name,
            } => Box::new(ChangeMethodName::new(&method_pattern, match_overrides, &new_name)?),
            StepDefinition::ChangeMethodReturnType {
                method_pattern,
                match_overrides,
                new_return_type,
            } => Box::new(ChangeMethodReturnType::new(
                &method_pattern,
                match_overrides,
                &new_return_type,
            )?),
            StepDefinition::ChangeParameterType {
                method_pattern,
                match_overrides,
                index,
                new_type,
            } => Box::new(ChangeParameterType::new(
                &method_pattern,
                match_overrides,
                index,
                &new_type,
            )?),
        })
    }
}

/// A composite recipe running its steps in order
pub struct DeclarativeRecipe {
    name: RecipeName,
    display_name: String,
    description: String,
    steps: Vec<Box<dyn Recipe>>,
}

impl std::fmt::Debug for DeclarativeRecipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclarativeRecipe")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field(
                "steps",
                &self.steps.iter().map(|s| s.name().as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl DeclarativeRecipe {
    /// Parse a DeclarativeRecipe from TOML content
    ///
    /// # Errors
    ///
    /// Returns `RecipeError` if:
    /// - TOML syntax is invalid or a field is missing
    /// - The recipe name is invalid
    /// - The recipe has no steps
    /// - A step has an invalid method pattern, method name or type name
    pub fn from_toml(content: &str) -> Result<Self, RecipeError> {
        let def: RecipeDefinition = toml::from_str(content)
            .map_err(|e| RecipeError::InvalidDefinition(format!("Failed to parse TOML: {}", e)))?;

        let name = RecipeName::new(def.recipe.name.clone()).ok_or_else(|| {
            RecipeError::InvalidDefinition(format!("Invalid recipe name: {}", def.recipe.name))
        })?;

        if def.steps.is_empty() {
            return Err(RecipeError::InvalidDefinition(format!(
                "Recipe '{}' has no steps",
                name
            )));
        }

        let steps = def
            .steps
            .into_iter()
            .map(StepDefinition::build)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DeclarativeRecipe {
            name,
            display_name: def.recipe.display_name,
            description: def.recipe.description,
            steps,
        })
    }

    /// Parse a DeclarativeRecipe from a TOML file path
    ///
    /// # Errors
    ///
    /// Returns `RecipeError` if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, RecipeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecipeError::InvalidDefinition(format!("Failed to read file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }
}

impl Recipe for DeclarativeRecipe {
    fn name(&self) -> &RecipeName {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn recipe_list(&self) -> &[Box<dyn Recipe>] {
        &self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::{TypeEnv, TypeTable};
    use crate::recipes::run_recipe;
    use std::sync::Arc;

    const RENAME: &str = r#"
[recipe]
name = "test.RenameRun"
display_name = "Rename run"
description = "Renames Runnable.run to go."

[[steps]]
type = "change-method-name"
method_pattern = "java.lang.Runnable run()"
match_overrides = true
new_name = "go"
"#;

    #[test]
    fn test_parse_valid_recipe() {
        let recipe = DeclarativeRecipe::from_toml(RENAME).unwrap();
        assert_eq!(recipe.name().as_str(), "test.RenameRun");
        assert_eq!(recipe.display_name(), "Rename run");
        assert_eq!(recipe.recipe_list().len(), 1);
        assert_eq!(recipe.recipe_list()[0].name().as_str(), "java.ChangeMethodName");
    }

    #[test]
    fn test_steps_run_through_the_composite() {
        let recipe = DeclarativeRecipe::from_toml(RENAME).unwrap();
        let mut env = TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()));
        let out = run_recipe(&recipe, "class A { void m(Runnable r) { r.run(); } }", &mut env).unwrap();
        assert_eq!(out, "class A { void m(Runnable r) { r.go(); } }");
    }

    #[test]
    fn test_invalid_definitions() {
        let cases = [
            // Missing steps
            "[recipe]\nname = \"a.B\"\ndisplay_name = \"x\"\ndescription = \"x\"\n",
            // Invalid name
            "[recipe]\nname = \"a..B\"\ndisplay_name = \"x\"\ndescription = \"x\"\n[[steps]]\ntype = \"change-method-name\"\nmethod_pattern = \"a.B c()\"\nnew_name = \"d\"\n",
            // Unknown step type
            "[recipe]\nname = \"a.B\"\ndisplay_name = \"x\"\ndescription = \"x\"\n[[steps]]\ntype = \"delete-everything\"\n",
            // Missing step field
            "[recipe]\nname = \"a.B\"\ndisplay_name = \"x\"\ndescription = \"x\"\n[[steps]]\ntype = \"change-parameter-type\"\nmethod_pattern = \"a.B c(..)\"\nnew_type = \"a.C\"\n",
            // Not TOML
            "recipe = [",
        ];
        for case in cases {
            assert!(
                matches!(DeclarativeRecipe::from_toml(case), Err(RecipeError::InvalidDefinition(_))),
                "{}",
                case
            );
        }
    }

    #[test]
    fn test_invalid_step_options_surface_their_error() {
        let bad_pattern = "[recipe]\nname = \"a.B\"\ndisplay_name = \"x\"\ndescription = \"x\"\n[[steps]]\ntype = \"change-method-name\"\nmethod_pattern = \"nonsense\"\nnew_name = \"d\"\n";
        assert!(matches!(
            DeclarativeRecipe::from_toml(bad_pattern),
            Err(RecipeError::InvalidMethodPattern { .. })
        ));

        let bad_type = "[recipe]\nname = \"a.B\"\ndisplay_name = \"x\"\ndescription = \"x\"\n[[steps]]\ntype = \"change-method-return-type\"\nmethod_pattern = \"a.B c()\"\nnew_return_type = \"a.C<\"\n";
        assert!(matches!(
            DeclarativeRecipe::from_toml(bad_type),
            Err(RecipeError::InvalidTypeName(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rename.toml");
        std::fs::write(&path, RENAME).unwrap();
        assert!(DeclarativeRecipe::from_path(&path).is_ok());
        assert!(DeclarativeRecipe::from_path(&dir.path().join("missing.toml")).is_err());
    }
}
