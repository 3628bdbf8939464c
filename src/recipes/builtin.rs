#![forbid(unsafe_code)]

//! Built-in recipes
//!
//! The Spring Batch recipes are implemented in code. Declarative built-in
//! recipes are embedded at compile time using `include_str!`, so the library
//! needs no external recipe files.

use crate::error::RecipeError;
use crate::recipes::batch::{
    MigrateItemWriterWrite, MigrateItemWriterWriteInvocation, MigrateSimpleStepBuilderProcessor,
};
use crate::recipes::{DeclarativeRecipe, Recipe};

/// Embedded built-in declarative recipe files
const BUILTIN_DECLARATIVE_RECIPES: &[(&str, &str)] = &[(
    "spring-security-7",
    include_str!("../../builtin-recipes/spring-security-7.toml"),
)];

/// Load every built-in recipe
///
/// # Errors
///
/// Returns `RecipeError` if an embedded definition is invalid
pub fn load_builtin_recipes() -> Result<Vec<Box<dyn Recipe>>, RecipeError> {
    let mut recipes: Vec<Box<dyn Recipe>> = vec![
        Box::new(MigrateItemWriterWrite::new()?),
        Box::new(MigrateItemWriterWriteInvocation::new()?),
        Box::new(MigrateSimpleStepBuilderProcessor::new()?),
    ];

    for (file_name, toml_content) in BUILTIN_DECLARATIVE_RECIPES {
        let recipe = DeclarativeRecipe::from_toml(toml_content).map_err(|e| {
            RecipeError::InvalidDefinition(format!(
                "Failed to parse built-in recipe '{}': {}",
                file_name, e
            ))
        })?;
        recipes.push(Box::new(recipe));
    }

    Ok(recipes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_recipes_load() {
        let recipes = load_builtin_recipes().unwrap();
        let names: Vec<&str> = recipes.iter().map(|r| r.name().as_str()).collect();
        assert_eq!(
            names,
            vec![
                "spring.batch.MigrateItemWriterWrite",
                "spring.batch.MigrateItemWriterWriteInvocation",
                "spring.batch.MigrateSimpleStepBuilderProcessor",
                "spring.security7.ReplaceAuthorizationManagerCheck",
            ]
        );
    }

    #[test]
    fn test_builtin_recipes_are_documented() {
        for recipe in load_builtin_recipes().unwrap() {
            assert!(!recipe.display_name().is_empty(), "{}", recipe.name());
            assert!(!recipe.description().is_empty(), "{}", recipe.name());
        }
    }

    #[test]
    fn test_security_recipe_steps_in_order() {
        let recipes = load_builtin_recipes().unwrap();
        let security = recipes
            .iter()
            .find(|r| r.name().as_str() == "spring.security7.ReplaceAuthorizationManagerCheck")
            .unwrap();
        let steps: Vec<&str> = security.recipe_list().iter().map(|s| s.name().as_str()).collect();
        assert_eq!(
            steps,
            vec![
                "java.ChangeMethodReturnType",
                "java.ChangeParameterType",
                "java.ChangeMethodName"
            ]
        );
    }
}
