//! Test utilities for rewrites integration tests

#![allow(dead_code)]

use rewrites::RecipeName;
use rewrites::classpath::{TypeEnv, TypeTable};
use rewrites::recipes::{Recipe, RecipeRegistry, run_recipe};
use std::sync::Arc;

/// Result type alias for tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Extract Ok value or panic with context
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Extract Some value or panic with context
#[macro_export]
macro_rules! assert_some {
    ($expr:expr) => {
        match $expr {
            Some(v) => v,
            None => panic!("assertion failed: expected Some, got None"),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Some(v) => v,
            None => panic!("{}: got None", $msg),
        }
    };
}

/// Runs the built-in recipe `name` over `source` with the built-in stubs
pub fn rewrite_run(name: &str, source: &str) -> TestResult<String> {
    let registry = RecipeRegistry::with_builtins()?;
    let name = RecipeName::new(name).ok_or("invalid recipe name")?;
    let recipe: &dyn Recipe = registry.get(&name).ok_or("unknown recipe")?;
    let mut env = TypeEnv::new(Arc::new(TypeTable::builtin()?));
    Ok(run_recipe(recipe, source, &mut env)?)
}

/// Asserts that `name` turns `before` into `after`, and that running it
/// again changes nothing
pub fn assert_rewrite(name: &str, before: &str, after: &str) {
    let once = assert_ok!(rewrite_run(name, before));
    assert_eq!(once, after);
    let twice = assert_ok!(rewrite_run(name, &once));
    assert_eq!(twice, after, "second run changed the output");
}

/// Asserts that `name` leaves `source` unchanged
pub fn assert_unchanged(name: &str, source: &str) {
    let out = assert_ok!(rewrite_run(name, source));
    assert_eq!(out, source);
}
