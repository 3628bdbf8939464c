#![forbid(unsafe_code)]

//! Core Recipe trait and the driver applying recipes to sources

use crate::classpath::TypeEnv;
use crate::error::ParseError;
use crate::imports;
use crate::parse::parse_unit;
use crate::search::Precondition;
use crate::tree::print;
use crate::types::RecipeName;
use crate::visit::{NoopVisitor, VisitContext, Visitor};

/// Trait that all recipes must implement
///
/// A recipe is either a leaf, contributing a precondition and a visitor, or a
/// composite listing sub-recipes that run in order. The trait is
/// `Send + Sync` so registries can be shared.
pub trait Recipe: Send + Sync {
    /// Returns the unique name of this recipe
    fn name(&self) -> &RecipeName;

    /// Returns a short human-readable title
    fn display_name(&self) -> &str;

    /// Returns a description of what this recipe changes
    fn description(&self) -> &str;

    /// Cheap check deciding whether the visitor needs to run on a unit
    fn precondition(&self) -> Precondition {
        Precondition::Always
    }

    /// Returns a fresh visitor for one unit
    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(NoopVisitor)
    }

    /// Sub-recipes run in order, for composite recipes
    fn recipe_list(&self) -> &[Box<dyn Recipe>] {
        &[]
    }
}

/// Applies `recipe` (and its sub-recipes) to `source`, returning the
/// rewritten source
///
/// Each leaf recipe sees the source as left by the previous one, freshly
/// parsed and attributed. A leaf whose precondition fails leaves the source
/// untouched.
pub fn run_recipe(recipe: &dyn Recipe, source: &str, env: &mut TypeEnv) -> Result<String, ParseError> {
    let sub_recipes = recipe.recipe_list();
    if !sub_recipes.is_empty() {
        let mut current = source.to_string();
        for sub_recipe in sub_recipes {
            current = run_recipe(sub_recipe.as_ref(), &current, env)?;
        }
        return Ok(current);
    }

    let unit = parse_unit(source, env)?;
    if !recipe.precondition().check(&unit, env) {
        tracing::debug!(recipe = %recipe.name(), "precondition not met, skipping");
        return Ok(source.to_string());
    }

    let mut visitor = recipe.visitor();
    let mut ctx = VisitContext::new(&unit, env);
    let unit = visitor.visit_unit(unit, &mut ctx);
    let effects = ctx.into_effects();
    let unit = imports::finalize(unit, &effects);
    Ok(print(&unit))
}

/// Applies each recipe in turn
pub fn run_recipes(recipes: &[&dyn Recipe], source: &str, env: &mut TypeEnv) -> Result<String, ParseError> {
    let mut current = source.to_string();
    for recipe in recipes {
        current = run_recipe(*recipe, &current, env)?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::TypeTable;
    use crate::tree::{Expression, MethodInvocation};
    use crate::visit::walk_method_invocation;
    use std::sync::Arc;

    struct RenameRun {
        name: RecipeName,
    }

    struct RenameRunVisitor;

    impl Visitor for RenameRunVisitor {
        fn visit_method_invocation(&mut self, call: MethodInvocation, ctx: &mut VisitContext<'_>) -> Expression {
            let mut call = walk_method_invocation(self, call, ctx);
            if call.name.name == "run" {
                let mut name = crate::tree::Identifier::synthetic("start");
                name.meta = crate::tree::Meta::replacing(&call.name.meta);
                call.name = name;
            }
            Expression::MethodInvocation(call)
        }
    }

    impl Recipe for RenameRun {
        fn name(&self) -> &RecipeName {
            &self.name
        }

        fn display_name(&self) -> &str {
            "Rename run"
        }

        fn description(&self) -> &str {
            "Renames calls to run."
        }

        fn visitor(&self) -> Box<dyn Visitor + '_> {
            Box::new(RenameRunVisitor)
        }
    }

    struct Twice {
        name: RecipeName,
        list: Vec<Box<dyn Recipe>>,
    }

    impl Recipe for Twice {
        fn name(&self) -> &RecipeName {
            &self.name
        }

        fn display_name(&self) -> &str {
            "Twice"
        }

        fn description(&self) -> &str {
            "Runs its sub-recipes."
        }

        fn recipe_list(&self) -> &[Box<dyn Recipe>] {
            &self.list
        }
    }

    fn env() -> TypeEnv {
        TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()))
    }

    fn rename() -> RenameRun {
        RenameRun {
            name: RecipeName::new("test.RenameRun").unwrap(),
        }
    }

    #[test]
    fn test_leaf_recipe_rewrites() {
        let source = "class A { void m(Runnable r) { r.run(); } }";
        let out = run_recipe(&rename(), source, &mut env()).unwrap();
        assert_eq!(out, "class A { void m(Runnable r) { r.start(); } }");
    }

    #[test]
    fn test_composite_runs_sub_recipes_in_order() {
        let composite = Twice {
            name: RecipeName::new("test.Twice").unwrap(),
            list: vec![Box::new(rename()), Box::new(rename())],
        };
        let source = "class A { void m(Runnable r) { r.run(); } }";
        let out = run_recipe(&composite, source, &mut env()).unwrap();
        assert_eq!(out, "class A { void m(Runnable r) { r.start(); } }");
    }

    #[test]
    fn test_syntax_error_is_reported() {
        assert!(run_recipe(&rename(), "class A { void m( }", &mut env()).is_err());
    }

    #[test]
    fn test_recipe_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Box<dyn Recipe>>();
        assert_sync::<Box<dyn Recipe>>();
    }
}
