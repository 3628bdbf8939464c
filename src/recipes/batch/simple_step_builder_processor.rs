use super::log_template_error;
use crate::error::RecipeError;
use crate::recipes::Recipe;
use crate::search::{MethodMatcher, Precondition};
use crate::template::Template;
use crate::tree::{Expression, MethodInvocation};
use crate::types::RecipeName;
use crate::visit::{VisitContext, Visitor, walk_method_invocation};

const PROCESSOR_FUNCTION: &str =
    "org.springframework.batch.core.step.builder.SimpleStepBuilder processor(java.util.function.Function)";

/// Moves `SimpleStepBuilder.processor(Function)` calls to the
/// `ItemProcessor` overload by passing `function::apply`
pub struct MigrateSimpleStepBuilderProcessor {
    name: RecipeName,
    processor: MethodMatcher,
}

impl MigrateSimpleStepBuilderProcessor {
    pub fn new() -> Result<Self, RecipeError> {
        Ok(MigrateSimpleStepBuilderProcessor {
            name: RecipeName::new("spring.batch.MigrateSimpleStepBuilderProcessor").ok_or_else(|| {
                RecipeError::InvalidDefinition("spring.batch.MigrateSimpleStepBuilderProcessor".to_string())
            })?,
            processor: MethodMatcher::new(PROCESSOR_FUNCTION, true)?,
        })
    }
}

impl Recipe for MigrateSimpleStepBuilderProcessor {
    fn name(&self) -> &RecipeName {
        &self.name
    }

    fn display_name(&self) -> &str {
        "Migrate `SimpleStepBuilder.processor()`"
    }

    fn description(&self) -> &str {
        "`SimpleStepBuilder.processor(Function)` is removed in spring-batch 5.x. Passes the function as an `ItemProcessor` method reference instead."
    }

    fn precondition(&self) -> Precondition {
        Precondition::UsesMethod(self.processor.clone())
    }

    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(ProcessorVisitor {
            processor: &self.processor,
        })
    }
}

struct ProcessorVisitor<'r> {
    processor: &'r MethodMatcher,
}

/// Arguments that can be the target of a method reference as they are
fn is_named_value(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::Identifier(_) | Expression::FieldAccess(_) | Expression::MethodInvocation(_)
    )
}

impl Visitor for ProcessorVisitor<'_> {
    fn visit_method_invocation(&mut self, call: MethodInvocation, ctx: &mut VisitContext<'_>) -> Expression {
        let mut call = walk_method_invocation(self, call, ctx);
        if call.args.len() != 1 || !is_named_value(&call.args[0]) || !self.processor.matches_invocation(&call, ctx.env())
        {
            return Expression::MethodInvocation(call);
        }

        let arg = call.args.remove(0);
        let at = arg.meta().clone();
        let replacement = match Template::new("#{any()}::apply").apply_expression(ctx, &at, vec![arg.clone().into()]) {
            Ok(reference) => reference,
            Err(error) => {
                log_template_error(&error);
                arg
            }
        };
        call.args.insert(0, replacement);
        Expression::MethodInvocation(call)
    }
}
