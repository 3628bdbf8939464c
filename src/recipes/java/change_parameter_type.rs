use super::{TypeName, retype};
use crate::error::RecipeError;
use crate::recipes::Recipe;
use crate::search::{MethodMatcher, Precondition};
use crate::tree::MethodDecl;
use crate::types::RecipeName;
use crate::visit::{VisitContext, Visitor, walk_method};

/// Changes the declared type of one parameter of matching methods
pub struct ChangeParameterType {
    name: RecipeName,
    matcher: MethodMatcher,
    index: usize,
    new_type: TypeName,
}

impl ChangeParameterType {
    /// `index` is zero-based; `new_type` is fully qualified
    pub fn new(method_pattern: &str, match_overrides: bool, index: usize, new_type: &str) -> Result<Self, RecipeError> {
        Ok(ChangeParameterType {
            name: RecipeName::new("java.ChangeParameterType")
                .ok_or_else(|| RecipeError::InvalidDefinition("java.ChangeParameterType".to_string()))?,
            matcher: MethodMatcher::new(method_pattern, match_overrides)?,
            index,
            new_type: TypeName::parse(new_type)?,
        })
    }
}

impl Recipe for ChangeParameterType {
    fn name(&self) -> &RecipeName {
        &self.name
    }

    fn display_name(&self) -> &str {
        "Change parameter type"
    }

    fn description(&self) -> &str {
        "Changes the type of one parameter of matching method declarations."
    }

    fn precondition(&self) -> Precondition {
        Precondition::DeclaresMethod(self.matcher.clone())
    }

    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(ParameterTypeVisitor { recipe: self })
    }
}

struct ParameterTypeVisitor<'r> {
    recipe: &'r ChangeParameterType,
}

impl Visitor for ParameterTypeVisitor<'_> {
    fn visit_method(&mut self, method: MethodDecl, ctx: &mut VisitContext<'_>) -> MethodDecl {
        let mut method = walk_method(self, method, ctx);
        if !self.recipe.matcher.matches_declaration(&method, ctx.env()) {
            return method;
        }
        let new_type = &self.recipe.new_type;
        let Some(param) = method.params.get_mut(self.recipe.index) else {
            return method;
        };
        let Some(old) = &param.type_expr else {
            return method;
        };
        if param.varargs || old.ty.as_ref() == Some(&new_type.ty) {
            return method;
        }
        param.type_expr = Some(retype(old, new_type, ctx));
        method
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::{TypeEnv, TypeTable};
    use crate::recipes::run_recipe;
    use std::sync::Arc;

    fn run(recipe: &ChangeParameterType, source: &str) -> String {
        let mut env = TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()));
        run_recipe(recipe, source, &mut env).unwrap()
    }

    const SOURCE: &str = "import java.util.List;\nimport java.util.function.Function;\n\nclass F implements Function<List<String>, Integer> {\n  public Integer apply(final List<String> items) { return items.size(); }\n}\n";

    #[test]
    fn test_changes_parameter_type_keeping_modifiers_and_name() {
        let recipe = ChangeParameterType::new(
            "java.util.function.Function apply(*)",
            true,
            0,
            "java.util.Collection<? extends java.lang.String>",
        )
        .unwrap();
        assert_eq!(
            run(&recipe, SOURCE),
            "import java.util.Collection;\nimport java.util.List;\nimport java.util.function.Function;\n\nclass F implements Function<List<String>, Integer> {\n  public Integer apply(final Collection<? extends String> items) { return items.size(); }\n}\n"
        );
    }

    #[test]
    fn test_index_out_of_range_is_untouched() {
        let recipe = ChangeParameterType::new("java.util.function.Function apply(*)", true, 3, "java.lang.Object").unwrap();
        assert_eq!(run(&recipe, SOURCE), SOURCE);
    }
}
