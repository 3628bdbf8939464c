#![forbid(unsafe_code)]

//! Spring Batch 4 to 5 migrations
//!
//! Spring Batch 5 changed `ItemWriter.write(List<? extends T>)` into
//! `ItemWriter.write(Chunk<? extends T>)` and dropped the
//! `SimpleStepBuilder.processor(Function)` overload.

mod adapter;
mod migrate_item_writer_write;
mod migrate_item_writer_write_invocation;
mod simple_step_builder_processor;

pub use migrate_item_writer_write::MigrateItemWriterWrite;
pub use migrate_item_writer_write_invocation::MigrateItemWriterWriteInvocation;
pub use simple_step_builder_processor::MigrateSimpleStepBuilderProcessor;

use crate::error::TemplateError;
use crate::template::Template;
use crate::tree::{Expression, JavaType};
use crate::visit::VisitContext;

pub(crate) const ITEM_WRITER_WRITE: &str = "org.springframework.batch.item.ItemWriter write(java.util.List)";
pub(crate) const CHUNK_FQN: &str = "org.springframework.batch.item.Chunk";
pub(crate) const LIST_FQN: &str = "java.util.List";

/// Wraps `arg` as `new Chunk<>(arg)` and registers the Chunk import. If the
/// template fails, `arg` is returned as it was.
pub(crate) fn wrap_in_chunk(arg: Expression, ctx: &mut VisitContext<'_>) -> Expression {
    let at = arg.meta().clone();
    let template = Template::new("new Chunk<>(#{any()})").with_import(CHUNK_FQN);
    match template.apply_expression(ctx, &at, vec![arg.clone().into()]) {
        Ok(wrapped) => {
            ctx.add_import(CHUNK_FQN);
            wrapped
        }
        Err(error) => {
            log_template_error(&error);
            arg
        }
    }
}

pub(crate) fn log_template_error(error: &TemplateError) {
    tracing::debug!(%error, "template failed, leaving node unchanged");
}

pub(crate) fn is_chunk(ty: &JavaType) -> bool {
    ty.is_of_class_type(CHUNK_FQN)
}
