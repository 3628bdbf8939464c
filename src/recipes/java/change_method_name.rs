use crate::error::RecipeError;
use crate::recipes::Recipe;
use crate::search::{MethodMatcher, Precondition};
use crate::tree::{Expression, Identifier, Meta, MethodDecl, MethodInvocation};
use crate::types::RecipeName;
use crate::visit::{VisitContext, Visitor, walk_method, walk_method_invocation};

/// Renames matching method declarations and invocations
pub struct ChangeMethodName {
    name: RecipeName,
    matcher: MethodMatcher,
    new_name: String,
}

impl ChangeMethodName {
    pub fn new(method_pattern: &str, match_overrides: bool, new_name: &str) -> Result<Self, RecipeError> {
        if !is_identifier(new_name) {
            return Err(RecipeError::InvalidDefinition(format!(
                "Invalid method name '{}'",
                new_name
            )));
        }
        Ok(ChangeMethodName {
            name: RecipeName::new("java.ChangeMethodName")
                .ok_or_else(|| RecipeError::InvalidDefinition("java.ChangeMethodName".to_string()))?,
            matcher: MethodMatcher::new(method_pattern, match_overrides)?,
            new_name: new_name.to_string(),
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl Recipe for ChangeMethodName {
    fn name(&self) -> &RecipeName {
        &self.name
    }

    fn display_name(&self) -> &str {
        "Change method name"
    }

    fn description(&self) -> &str {
        "Renames a method in its declarations and at every call site."
    }

    fn precondition(&self) -> Precondition {
        Precondition::any([
            Precondition::DeclaresMethod(self.matcher.clone()),
            Precondition::UsesMethod(self.matcher.clone()),
        ])
    }

    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(RenameVisitor { recipe: self })
    }
}

struct RenameVisitor<'r> {
    recipe: &'r ChangeMethodName,
}

impl RenameVisitor<'_> {
    fn renamed(&self, old: &Identifier) -> Identifier {
        let mut name = Identifier::synthetic(self.recipe.new_name.as_str());
        name.meta = Meta::replacing(&old.meta);
        name
    }
}

impl Visitor for RenameVisitor<'_> {
    fn visit_method(&mut self, method: MethodDecl, ctx: &mut VisitContext<'_>) -> MethodDecl {
        let mut method = walk_method(self, method, ctx);
        if method.name.name != self.recipe.new_name && self.recipe.matcher.matches_declaration(&method, ctx.env()) {
            tracing::debug!(from = %method.name.name, to = %self.recipe.new_name, "renaming method declaration");
            method.name = self.renamed(&method.name);
        }
        method
    }

    fn visit_method_invocation(&mut self, call: MethodInvocation, ctx: &mut VisitContext<'_>) -> Expression {
        let mut call = walk_method_invocation(self, call, ctx);
        if call.name.name != self.recipe.new_name && self.recipe.matcher.matches_invocation(&call, ctx.env()) {
            call.name = self.renamed(&call.name);
        }
        Expression::MethodInvocation(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::{TypeEnv, TypeTable};
    use crate::recipes::run_recipe;
    use std::sync::Arc;

    fn run(recipe: &ChangeMethodName, source: &str) -> String {
        let mut env = TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()));
        run_recipe(recipe, source, &mut env).unwrap()
    }

    #[test]
    fn test_renames_declarations_and_calls() {
        let recipe = ChangeMethodName::new("java.lang.Runnable run()", true, "go").unwrap();
        let source = "class Task implements Runnable {\n  public void run() {}\n  void start(Runnable other) { other.run(); this.run(); }\n}\n";
        assert_eq!(
            run(&recipe, source),
            "class Task implements Runnable {\n  public void go() {}\n  void start(Runnable other) { other.go(); this.go(); }\n}\n"
        );
    }

    #[test]
    fn test_without_overrides_only_declaring_type_matches() {
        let recipe = ChangeMethodName::new("java.lang.Runnable run()", false, "go").unwrap();
        let source = "class Task implements Runnable {\n  public void run() {}\n  void start(Runnable other) { other.run(); }\n}\n";
        assert_eq!(
            run(&recipe, source),
            "class Task implements Runnable {\n  public void run() {}\n  void start(Runnable other) { other.go(); }\n}\n"
        );
    }

    #[test]
    fn test_unrelated_methods_untouched() {
        let recipe = ChangeMethodName::new("java.lang.Runnable run()", true, "go").unwrap();
        let source = "class Other {\n  void run() {}\n  void run(int times) {}\n}\n";
        assert_eq!(run(&recipe, source), source);
    }

    #[test]
    fn test_invalid_new_name() {
        assert!(ChangeMethodName::new("java.lang.Runnable run()", true, "2go").is_err());
        assert!(ChangeMethodName::new("java.lang.Runnable run()", true, "").is_err());
        assert!(ChangeMethodName::new("not a pattern", true, "go").is_err());
    }
}
