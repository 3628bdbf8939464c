//! Keeps a migrated `write` parameter usable where a `List` is still needed
//!
//! Once the parameter of `write` becomes a `Chunk`, every use that relied on
//! it being a `List` goes through `getItems()` instead:
//!
//! - `items.size()` and other `Collection`/`List` members become
//!   `items.getItems().size()`;
//! - `items` passed where the formal parameter type is neither `Iterable` nor
//!   `Chunk` becomes `items.getItems()`, except as the argument of another
//!   `write`;
//! - `items` assigned or used to initialize a variable of any other type
//!   becomes `items.getItems()`.
//!
//! `Iterable` is the only type `List` and `Chunk` have in common, so an
//! `Object` slot still gets the list: `toString` and `equals` keep seeing
//! the same value. Uses whose types are not resolved are left alone.

use super::{ITEM_WRITER_WRITE, is_chunk};
use crate::error::RecipeError;
use crate::search::MethodMatcher;
use crate::tree::{
    Assignment, Expression, Identifier, JavaType, Meta, MethodInvocation, MethodType, NamedVariable, NewClass, NodeId,
};
use crate::visit::{VisitContext, Visitor, walk_assignment, walk_method_invocation, walk_new_class, walk_variable};

const ITERABLE_FQN: &str = "java.lang.Iterable";

/// Rewrites the uses of one parameter inside one method declaration
pub(crate) struct ChunkAdapter {
    /// Declaring node of the parameter
    param: NodeId,
    collection: MethodMatcher,
    list: MethodMatcher,
    write: MethodMatcher,
}

impl ChunkAdapter {
    pub(crate) fn new(param: NodeId) -> Result<Self, RecipeError> {
        Ok(ChunkAdapter {
            param,
            collection: MethodMatcher::new("java.util.Collection *(..)", true)?,
            list: MethodMatcher::new("java.util.List *(..)", true)?,
            write: MethodMatcher::new(ITEM_WRITER_WRITE, true)?,
        })
    }

    fn is_param(&self, expr: &Expression) -> bool {
        expr.as_variable()
            .is_some_and(|variable| variable.decl == Some(self.param))
    }

    fn adapt_args(&self, args: Vec<Expression>, method: Option<&MethodType>) -> Vec<Expression> {
        let Some(method) = method else {
            return args;
        };
        args.into_iter()
            .enumerate()
            .map(|(i, arg)| {
                if self.is_param(&arg) && needs_items(method.parameter_type_at(i).as_ref()) {
                    get_items(arg)
                } else {
                    arg
                }
            })
            .collect()
    }
}

/// Whether a slot of type `target` needs the list rather than the chunk.
/// `None` and `Unknown` mean the slot is unresolved.
fn needs_items(target: Option<&JavaType>) -> bool {
    target.is_some_and(|ty| *ty != JavaType::Unknown && !ty.is_of_class_type(ITERABLE_FQN) && !is_chunk(ty))
}

/// `expr.getItems()`, taking the place of `expr`
fn get_items(expr: Expression) -> Expression {
    Expression::MethodInvocation(MethodInvocation {
        meta: Meta::replacing(expr.meta()),
        select: Some(Box::new(expr)),
        type_args: Vec::new(),
        name: Identifier::synthetic("getItems"),
        args: Vec::new(),
        method_type: None,
        ty: None,
    })
}

impl Visitor for ChunkAdapter {
    fn visit_method_invocation(&mut self, call: MethodInvocation, ctx: &mut VisitContext<'_>) -> Expression {
        let mut call = walk_method_invocation(self, call, ctx);
        let env = ctx.env();

        let receiver_is_param = call.select.as_deref().is_some_and(|select| self.is_param(select));
        if receiver_is_param
            && (self.collection.matches_invocation(&call, env) || self.list.matches_invocation(&call, env))
            && let Some(select) = call.select.take()
        {
            call.select = Some(Box::new(get_items(*select)));
        }

        if !self.write.matches_invocation(&call, env) {
            let args = std::mem::take(&mut call.args);
            call.args = self.adapt_args(args, call.method_type.as_ref());
        }
        Expression::MethodInvocation(call)
    }

    fn visit_new_class(&mut self, new_class: NewClass, ctx: &mut VisitContext<'_>) -> Expression {
        let mut new_class = walk_new_class(self, new_class, ctx);
        let args = std::mem::take(&mut new_class.args);
        new_class.args = self.adapt_args(args, new_class.constructor_type.as_ref());
        Expression::NewClass(new_class)
    }

    fn visit_variable(&mut self, var: NamedVariable, ctx: &mut VisitContext<'_>) -> NamedVariable {
        let mut var = walk_variable(self, var, ctx);
        let wrap = var
            .initializer
            .as_ref()
            .is_some_and(|init| self.is_param(init) && needs_items(var.ty()));
        if wrap {
            var.initializer = var.initializer.take().map(get_items);
        }
        var
    }

    fn visit_assignment(&mut self, assignment: Assignment, ctx: &mut VisitContext<'_>) -> Expression {
        let mut assignment = walk_assignment(self, assignment, ctx);
        if assignment.operator == "="
            && self.is_param(&assignment.value)
            && needs_items(assignment.target.ty())
        {
            assignment.value = Box::new(get_items(*assignment.value));
        }
        Expression::Assignment(assignment)
    }
}
