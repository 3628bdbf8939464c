#![forbid(unsafe_code)]

//! Recipe definitions and registry

pub mod batch;
pub mod builtin;
pub mod declarative;
pub mod java;
pub mod registry;
mod recipe;

// Re-export core types
pub use declarative::DeclarativeRecipe;
pub use recipe::{Recipe, run_recipe, run_recipes};
pub use registry::RecipeRegistry;
