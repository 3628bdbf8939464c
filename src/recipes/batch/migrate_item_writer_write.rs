use super::adapter::ChunkAdapter;
use super::{CHUNK_FQN, ITEM_WRITER_WRITE, LIST_FQN, is_chunk, log_template_error, wrap_in_chunk};
use crate::error::RecipeError;
use crate::recipes::Recipe;
use crate::search::{MethodMatcher, Precondition};
use crate::template::{Template, TemplateArg};
use crate::tree::{Expression, JavaType, MethodDecl, MethodInvocation, Modifier, NodeRef, Slice, TypeTreeKind, print};
use crate::types::RecipeName;
use crate::visit::{VisitContext, Visitor, walk_method, walk_method_invocation};

/// Migrates `ItemWriter.write(List)` implementations and calls to `Chunk`
///
/// Implementations get their declaration rewritten to
/// `write(Chunk<T> items) throws Exception`, with `@Override` added and uses
/// of the parameter adapted (see the `adapter` module). Calls passing a
/// `List` get it wrapped in `new Chunk<>(...)`.
pub struct MigrateItemWriterWrite {
    name: RecipeName,
    write: MethodMatcher,
}

impl MigrateItemWriterWrite {
    pub fn new() -> Result<Self, RecipeError> {
        Ok(MigrateItemWriterWrite {
            name: RecipeName::new("spring.batch.MigrateItemWriterWrite").ok_or_else(|| {
                RecipeError::InvalidDefinition("spring.batch.MigrateItemWriterWrite".to_string())
            })?,
            write: MethodMatcher::new(ITEM_WRITER_WRITE, true)?,
        })
    }
}

impl Recipe for MigrateItemWriterWrite {
    fn name(&self) -> &RecipeName {
        &self.name
    }

    fn display_name(&self) -> &str {
        "Migrate `ItemWriter`"
    }

    fn description(&self) -> &str {
        "In `ItemWriter` the signature of the `write()` method has changed in spring-batch 5.x."
    }

    fn precondition(&self) -> Precondition {
        Precondition::any([
            Precondition::DeclaresMethod(self.write.clone()),
            Precondition::UsesMethod(self.write.clone()),
        ])
    }

    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(ItemWriterWriteVisitor { write: &self.write })
    }
}

struct ItemWriterWriteVisitor<'r> {
    write: &'r MethodMatcher,
}

impl ItemWriterWriteVisitor<'_> {
    fn migrate_declaration(&self, method: MethodDecl, ctx: &mut VisitContext<'_>) -> MethodDecl {
        let Some(param) = method.params.first() else {
            return method;
        };
        let (Some(type_expr), Some(var)) = (&param.type_expr, param.vars.first()) else {
            return method;
        };
        let TypeTreeKind::Parameterized { args, .. } = &type_expr.kind else {
            return method;
        };
        let Some(item_type) = args.first() else {
            return method;
        };
        let item_type = print(item_type);
        let param_name = var.name.name.clone();
        let param_id = var.meta.id;
        let param_modifiers = join_modifiers(param.modifiers.iter());

        let slot = method.meta.slot.as_ref();
        let indent = slot.map(Slice::line_indent).unwrap_or_default();
        let newline = slot.map(Slice::line_ending).unwrap_or("\n");
        let mut annotations: Vec<String> = method
            .modifiers
            .iter()
            .filter(|m| matches!(m, Modifier::Annotation(_)))
            .map(|m| print(NodeRef::Modifier(m)))
            .collect();
        if !annotations.iter().any(|a| a == "@Override") {
            annotations.push("@Override".to_string());
        }
        let separator = format!("{}{}", newline, indent);
        let annotations = format!("{}{}", annotations.join(&separator), separator);
        let modifiers = join_modifiers(
            method
                .modifiers
                .iter()
                .filter(|m| matches!(m, Modifier::Keyword { .. })),
        );

        let mut adapter = match ChunkAdapter::new(param_id) {
            Ok(adapter) => adapter,
            Err(error) => {
                tracing::debug!(%error, "cannot build parameter adapter");
                return method;
            }
        };
        let adapted = adapter.visit_method(method.clone(), ctx);
        let body = match &adapted.body {
            Some(body) => format!(" {}", print(body)),
            None => ";".to_string(),
        };

        let template = Template::new("#{}#{}void write(#{}Chunk<#{}> #{}) throws Exception#{}").with_import(CHUNK_FQN);
        let args: Vec<TemplateArg> = vec![
            annotations.into(),
            modifiers.into(),
            param_modifiers.into(),
            item_type.into(),
            param_name.into(),
            body.into(),
        ];
        match template.apply_method(ctx, &method.meta, args) {
            Ok(migrated) => {
                tracing::debug!(class = ?ctx.enclosing_class(), "migrated ItemWriter.write declaration");
                ctx.add_import(CHUNK_FQN);
                ctx.remove_import(LIST_FQN);
                migrated
            }
            Err(error) => {
                log_template_error(&error);
                method
            }
        }
    }

    fn migrate_invocation(&self, mut call: MethodInvocation, ctx: &mut VisitContext<'_>) -> MethodInvocation {
        if call.args.len() != 1 {
            return call;
        }
        let arg_type = match call.args[0].ty() {
            Some(JavaType::Null) => call.method_type.as_ref().and_then(|m| m.parameter_type_at(0)),
            other => other.cloned(),
        };
        let Some(arg_type) = arg_type else {
            return call;
        };
        if is_chunk(&arg_type) || ctx.env().as_super(&arg_type, LIST_FQN).is_none() {
            return call;
        }
        if let Some(arg) = call.args.pop() {
            call.args.push(wrap_in_chunk(arg, ctx));
        }
        call
    }
}

fn join_modifiers<'a>(modifiers: impl Iterator<Item = &'a Modifier>) -> String {
    modifiers
        .map(|m| format!("{} ", print(NodeRef::Modifier(m))))
        .collect()
}

impl Visitor for ItemWriterWriteVisitor<'_> {
    fn visit_method(&mut self, method: MethodDecl, ctx: &mut VisitContext<'_>) -> MethodDecl {
        let method = walk_method(self, method, ctx);
        if !self.write.matches_declaration(&method, ctx.env()) {
            return method;
        }
        self.migrate_declaration(method, ctx)
    }

    fn visit_method_invocation(&mut self, call: MethodInvocation, ctx: &mut VisitContext<'_>) -> Expression {
        let call = walk_method_invocation(self, call, ctx);
        if !self.write.matches_invocation(&call, ctx.env()) {
            return Expression::MethodInvocation(call);
        }
        Expression::MethodInvocation(self.migrate_invocation(call, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::{TypeEnv, TypeTable};
    use crate::recipes::run_recipe;
    use std::sync::Arc;

    fn run(source: &str) -> String {
        let mut env = TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()));
        run_recipe(&MigrateItemWriterWrite::new().unwrap(), source, &mut env).unwrap()
    }

    #[test]
    fn test_existing_override_kept_once() {
        let source = "import java.util.List;\nimport org.springframework.batch.item.ItemWriter;\n\nclass W implements ItemWriter<String> {\n    @Override\n    @Deprecated\n    public synchronized void write(List<? extends String> items) throws java.io.IOException {\n    }\n}\n";
        let out = run(source);
        assert!(
            out.contains("    @Override\n    @Deprecated\n    public synchronized void write(Chunk<? extends String> items) throws Exception {\n    }"),
            "{}",
            out
        );
        assert_eq!(out.matches("@Override").count(), 1);
    }

    #[test]
    fn test_invocation_with_list_wrapped() {
        let source = "import java.util.ArrayList;\nimport org.springframework.batch.item.ItemWriter;\n\nclass U {\n    void run(ItemWriter<String> w) throws Exception {\n        w.write(new ArrayList<>());\n    }\n}\n";
        assert_eq!(
            run(source),
            "import java.util.ArrayList;\nimport org.springframework.batch.item.Chunk;\nimport org.springframework.batch.item.ItemWriter;\n\nclass U {\n    void run(ItemWriter<String> w) throws Exception {\n        w.write(new Chunk<>(new ArrayList<>()));\n    }\n}\n"
        );
    }

    #[test]
    fn test_declaration_migrated() {
        let source = "import java.util.List;\nimport org.springframework.batch.item.ItemWriter;\n\nclass W implements ItemWriter<String> {\n    public void write(final List<? extends String> items) {\n        System.out.println(items.size());\n    }\n}\n";
        assert_eq!(
            run(source),
            "import org.springframework.batch.item.Chunk;\nimport org.springframework.batch.item.ItemWriter;\n\nclass W implements ItemWriter<String> {\n    @Override\n    public void write(final Chunk<? extends String> items) throws Exception {\n        System.out.println(items.getItems().size());\n    }\n}\n"
        );
    }

    #[test]
    fn test_raw_parameter_untouched() {
        let source = "import java.util.List;\nimport org.springframework.batch.item.ItemWriter;\n\nclass W implements ItemWriter {\n    public void write(List items) {}\n}\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_chunk_argument_untouched() {
        let source = "import org.springframework.batch.item.Chunk;\nimport org.springframework.batch.item.ItemWriter;\n\nclass U {\n    void run(ItemWriter<String> w, Chunk<String> c) throws Exception {\n        w.write(c);\n    }\n}\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_crlf_line_endings_preserved() {
        let source = "import java.util.List;\r\nimport org.springframework.batch.item.ItemWriter;\r\n\r\nclass W implements ItemWriter<String> {\r\n    @SuppressWarnings(\"unchecked\")\r\n    public void write(List<? extends String> items) {\r\n        System.out.println(items.size());\r\n    }\r\n}\r\n";
        let out = run(source);
        assert_eq!(
            out,
            "import org.springframework.batch.item.Chunk;\r\nimport org.springframework.batch.item.ItemWriter;\r\n\r\nclass W implements ItemWriter<String> {\r\n    @SuppressWarnings(\"unchecked\")\r\n    @Override\r\n    public void write(Chunk<? extends String> items) throws Exception {\r\n        System.out.println(items.getItems().size());\r\n    }\r\n}\r\n"
        );
        assert!(!out.replace("\r\n", "").contains('\n'), "{:?}", out);
    }
}
