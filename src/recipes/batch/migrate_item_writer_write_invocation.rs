use super::{ITEM_WRITER_WRITE, is_chunk, wrap_in_chunk};
use crate::error::RecipeError;
use crate::recipes::Recipe;
use crate::search::{MethodMatcher, Precondition};
use crate::tree::{Expression, MethodInvocation};
use crate::types::RecipeName;
use crate::visit::{VisitContext, Visitor, walk_method_invocation};

/// Wraps the argument of `ItemWriter.write(List)` calls in `new Chunk<>(...)`
///
/// Any argument whose type is resolved and is not already a `Chunk` is
/// wrapped, `null` included.
pub struct MigrateItemWriterWriteInvocation {
    name: RecipeName,
    write: MethodMatcher,
}

impl MigrateItemWriterWriteInvocation {
    pub fn new() -> Result<Self, RecipeError> {
        Ok(MigrateItemWriterWriteInvocation {
            name: RecipeName::new("spring.batch.MigrateItemWriterWriteInvocation").ok_or_else(|| {
                RecipeError::InvalidDefinition("spring.batch.MigrateItemWriterWriteInvocation".to_string())
            })?,
            write: MethodMatcher::new(ITEM_WRITER_WRITE, true)?,
        })
    }
}

impl Recipe for MigrateItemWriterWriteInvocation {
    fn name(&self) -> &RecipeName {
        &self.name
    }

    fn display_name(&self) -> &str {
        "Migrate `ItemWriter.write()` invocations"
    }

    fn description(&self) -> &str {
        "`ItemWriter.write()` takes a `Chunk` instead of a `List` in spring-batch 5.x. Wraps the argument of existing calls in a new `Chunk`."
    }

    fn precondition(&self) -> Precondition {
        Precondition::UsesMethod(self.write.clone())
    }

    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(WriteInvocationVisitor { write: &self.write })
    }
}

struct WriteInvocationVisitor<'r> {
    write: &'r MethodMatcher,
}

impl Visitor for WriteInvocationVisitor<'_> {
    fn visit_method_invocation(&mut self, call: MethodInvocation, ctx: &mut VisitContext<'_>) -> Expression {
        let mut call = walk_method_invocation(self, call, ctx);
        if !self.write.matches_invocation(&call, ctx.env()) {
            return Expression::MethodInvocation(call);
        }
        let wrap = call.args.first().and_then(Expression::ty).is_some_and(|ty| !is_chunk(ty));
        if wrap {
            let arg = call.args.remove(0);
            call.args.insert(0, wrap_in_chunk(arg, ctx));
        }
        Expression::MethodInvocation(call)
    }
}
