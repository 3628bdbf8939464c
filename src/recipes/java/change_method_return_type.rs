use super::{TypeName, retype};
use crate::error::RecipeError;
use crate::recipes::Recipe;
use crate::search::{MethodMatcher, Precondition};
use crate::tree::MethodDecl;
use crate::types::RecipeName;
use crate::visit::{VisitContext, Visitor, walk_method};

/// Changes the declared return type of matching methods
pub struct ChangeMethodReturnType {
    name: RecipeName,
    matcher: MethodMatcher,
    new_type: TypeName,
}

impl ChangeMethodReturnType {
    /// `new_return_type` is fully qualified, type arguments included
    pub fn new(method_pattern: &str, match_overrides: bool, new_return_type: &str) -> Result<Self, RecipeError> {
        Ok(ChangeMethodReturnType {
            name: RecipeName::new("java.ChangeMethodReturnType")
                .ok_or_else(|| RecipeError::InvalidDefinition("java.ChangeMethodReturnType".to_string()))?,
            matcher: MethodMatcher::new(method_pattern, match_overrides)?,
            new_type: TypeName::parse(new_return_type)?,
        })
    }
}

impl Recipe for ChangeMethodReturnType {
    fn name(&self) -> &RecipeName {
        &self.name
    }

    fn display_name(&self) -> &str {
        "Change method return type"
    }

    fn description(&self) -> &str {
        "Changes the return type of matching method declarations."
    }

    fn precondition(&self) -> Precondition {
        Precondition::DeclaresMethod(self.matcher.clone())
    }

    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(ReturnTypeVisitor { recipe: self })
    }
}

struct ReturnTypeVisitor<'r> {
    recipe: &'r ChangeMethodReturnType,
}

impl Visitor for ReturnTypeVisitor<'_> {
    fn visit_method(&mut self, method: MethodDecl, ctx: &mut VisitContext<'_>) -> MethodDecl {
        let mut method = walk_method(self, method, ctx);
        if !self.recipe.matcher.matches_declaration(&method, ctx.env()) {
            return method;
        }
        let Some(old) = &method.return_type else {
            return method;
        };
        if old.ty.as_ref() == Some(&self.recipe.new_type.ty) {
            return method;
        }
        tracing::debug!(method = %method.name.name, to = %self.recipe.new_type.ty, "changing return type");
        method.return_type = Some(retype(old, &self.recipe.new_type, ctx));
        method
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::{TypeEnv, TypeTable};
    use crate::recipes::run_recipe;
    use std::sync::Arc;

    fn run(recipe: &ChangeMethodReturnType, source: &str) -> String {
        let mut env = TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()));
        run_recipe(recipe, source, &mut env).unwrap()
    }

    #[test]
    fn test_changes_return_type_and_imports() {
        let recipe = ChangeMethodReturnType::new(
            "java.util.function.Supplier get()",
            true,
            "java.util.Optional<java.lang.String>",
        )
        .unwrap();
        let source = "import java.util.List;\nimport java.util.function.Supplier;\n\nclass S implements Supplier<List<String>> {\n  public List<String> get() { return null; }\n}\n";
        assert_eq!(
            run(&recipe, source),
            "import java.util.List;\nimport java.util.Optional;\nimport java.util.function.Supplier;\n\nclass S implements Supplier<List<String>> {\n  public Optional<String> get() { return null; }\n}\n"
        );
    }

    #[test]
    fn test_already_changed_is_untouched() {
        let recipe = ChangeMethodReturnType::new("java.util.function.Supplier get()", true, "java.lang.Object").unwrap();
        let source = "import java.util.function.Supplier;\n\nclass S implements Supplier {\n  public Object get() { return null; }\n}\n";
        assert_eq!(run(&recipe, source), source);
    }

    #[test]
    fn test_invalid_type_is_rejected() {
        assert!(matches!(
            ChangeMethodReturnType::new("java.util.function.Supplier get()", true, "java.util.List<"),
            Err(RecipeError::InvalidTypeName(_))
        ));
    }
}
