#![forbid(unsafe_code)]

//! Code templates parsed in the context of the node they replace
//!
//! A template is Java source with two kinds of placeholders:
//!
//! - `#{}` is replaced by literal text, e.g. printed modifiers;
//! - `#{any()}` is replaced by an existing expression. The template is parsed
//!   with a typed stand-in variable in that position, so the surrounding code
//!   is attributed with the argument's type, and the expression itself is put
//!   back afterwards, keeping its original text.
//!
//! Templates are parsed as members of the class enclosing the replaced node,
//! with the unit's imports plus the template's own imports in scope.

use crate::error::TemplateError;
use crate::parse::parse_snippet;
use crate::tree::{Expression, Member, Meta, MethodDecl, VarKind, VariableRef};
use crate::visit::{VisitContext, Visitor, walk_expression};
use std::collections::HashMap;

const PLACEHOLDER_PREFIX: &str = "__tpl";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Code(String),
    Text,
    Tree,
}

/// A value for a template placeholder
#[derive(Debug, Clone)]
pub enum TemplateArg {
    Text(String),
    Tree(Expression),
}

impl From<String> for TemplateArg {
    fn from(text: String) -> Self {
        TemplateArg::Text(text)
    }
}

impl From<&str> for TemplateArg {
    fn from(text: &str) -> Self {
        TemplateArg::Text(text.to_string())
    }
}

impl From<Expression> for TemplateArg {
    fn from(expr: Expression) -> Self {
        TemplateArg::Tree(expr)
    }
}

/// A parameterized Java snippet
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
    imports: Vec<String>,
}

impl Template {
    pub fn new(code: &str) -> Self {
        Template {
            segments: split(code),
            imports: Vec::new(),
        }
    }

    /// Makes `fqn` visible to the template's code
    pub fn with_import(mut self, fqn: impl Into<String>) -> Self {
        self.imports.push(fqn.into());
        self
    }

    fn placeholders(&self) -> usize {
        self.segments.iter().filter(|s| !matches!(s, Segment::Code(_))).count()
    }

    /// Fills in the placeholders. Tree arguments are replaced by stand-in
    /// variables, returned with the expressions they stand for.
    fn expand(&self, args: Vec<TemplateArg>) -> Result<(String, Expansion), TemplateError> {
        let expected = self.placeholders();
        if args.len() != expected {
            return Err(TemplateError::ArgumentCount {
                expected,
                actual: args.len(),
            });
        }
        let mut code = String::new();
        let mut expansion = Expansion::default();
        let mut args = args.into_iter().enumerate();
        for segment in &self.segments {
            let (index, arg) = match segment {
                Segment::Code(text) => {
                    code.push_str(text);
                    continue;
                }
                Segment::Text | Segment::Tree => args.next().ok_or(TemplateError::ArgumentCount {
                    expected,
                    actual: 0,
                })?,
            };
            match (segment, arg) {
                (Segment::Text, TemplateArg::Text(text)) => code.push_str(&text),
                (Segment::Tree, TemplateArg::Tree(expr)) => {
                    let name = format!("{}{}", PLACEHOLDER_PREFIX, index);
                    code.push_str(&name);
                    expansion.bindings.push((
                        name.clone(),
                        VariableRef {
                            name: name.clone(),
                            kind: VarKind::Local,
                            ty: expr.ty().cloned(),
                            decl: None,
                        },
                    ));
                    expansion.trees.insert(name, expr);
                }
                (Segment::Text, _) => {
                    return Err(TemplateError::ArgumentKind { index, expected: "text" });
                }
                _ => {
                    return Err(TemplateError::ArgumentKind { index, expected: "expression" });
                }
            }
        }
        Ok((code, expansion))
    }

    /// Builds an expression from the template, taking the place of the node
    /// described by `at`
    pub fn apply_expression(
        &self,
        ctx: &mut VisitContext<'_>,
        at: &Meta,
        args: Vec<TemplateArg>,
    ) -> Result<Expression, TemplateError> {
        let (code, expansion) = self.expand(args)?;
        let source = format!("class __Template {{ Object __value = {}; }}", code);
        let snippet = ctx.snippet_context(&self.imports, expansion.bindings.clone());
        let unit = parse_snippet(&source, &snippet, ctx.env_mut()).map_err(|e| TemplateError::Parse(e.to_string()))?;

        let expr = unit
            .types
            .into_iter()
            .find_map(|member| match member {
                Member::Class(class) => class.body.members.into_iter().find_map(|member| match member {
                    Member::Field(field) => field.vars.into_iter().next().and_then(|var| var.initializer),
                    _ => None,
                }),
                _ => None,
            })
            .ok_or(TemplateError::MissingNode("expression"))?;

        let mut substitute = Substitute { trees: expansion.trees };
        let mut expr = substitute.visit_expression(expr, ctx);
        substitute.finish()?;
        let meta = expr.meta().clone().moved_to(at);
        *expr.meta_mut() = meta;
        Ok(expr)
    }

    /// Builds a method declaration from the template, taking the place of the
    /// declaration described by `at`
    pub fn apply_method(
        &self,
        ctx: &mut VisitContext<'_>,
        at: &Meta,
        args: Vec<TemplateArg>,
    ) -> Result<MethodDecl, TemplateError> {
        let (code, expansion) = self.expand(args)?;
        let source = format!("class __Template {{\n{}\n}}", code);
        let snippet = ctx.snippet_context(&self.imports, expansion.bindings.clone());
        let unit = parse_snippet(&source, &snippet, ctx.env_mut()).map_err(|e| TemplateError::Parse(e.to_string()))?;

        let method = unit
            .types
            .into_iter()
            .find_map(|member| match member {
                Member::Class(class) => class.body.members.into_iter().find_map(|member| match member {
                    Member::Method(method) => Some(method),
                    _ => None,
                }),
                _ => None,
            })
            .ok_or(TemplateError::MissingNode("method declaration"))?;

        let mut substitute = Substitute { trees: expansion.trees };
        let mut method = substitute.visit_method(method, ctx);
        substitute.finish()?;
        method.meta = method.meta.moved_to(at);
        Ok(method)
    }
}

#[derive(Default)]
struct Expansion {
    bindings: Vec<(String, VariableRef)>,
    trees: HashMap<String, Expression>,
}

/// Puts argument expressions back in place of their stand-in variables
struct Substitute {
    trees: HashMap<String, Expression>,
}

impl Substitute {
    fn finish(self) -> Result<(), TemplateError> {
        if self.trees.is_empty() {
            Ok(())
        } else {
            Err(TemplateError::MissingNode("placeholder"))
        }
    }
}

impl Visitor for Substitute {
    fn visit_expression(&mut self, expr: Expression, ctx: &mut VisitContext<'_>) -> Expression {
        if let Expression::Identifier(ident) = &expr
            && let Some(mut tree) = self.trees.remove(&ident.name)
        {
            let meta = tree.meta().clone().moved_to(&ident.meta);
            *tree.meta_mut() = meta;
            return tree;
        }
        walk_expression(self, expr, ctx)
    }
}

fn split(code: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = code;
    while let Some(start) = rest.find("#{") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        if start > 0 {
            segments.push(Segment::Code(rest[..start].to_string()));
        }
        let inner = rest[start + 2..start + len].trim();
        segments.push(if inner.is_empty() { Segment::Text } else { Segment::Tree });
        rest = &rest[start + len + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Code(rest.to_string()));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::{TypeEnv, TypeTable};
    use crate::parse::parse_unit;
    use crate::tree::{JavaType, MethodInvocation, print};
    use crate::visit::walk_method_invocation;
    use std::sync::Arc;

    #[test]
    fn test_split_placeholders() {
        assert_eq!(
            split("new Chunk<>(#{any()})"),
            vec![
                Segment::Code("new Chunk<>(".to_string()),
                Segment::Tree,
                Segment::Code(")".to_string()),
            ]
        );
        assert_eq!(split("#{}void #{}"), vec![
            Segment::Text,
            Segment::Code("void ".to_string()),
            Segment::Text
        ]);
    }

    #[test]
    fn test_argument_count_and_kind_are_checked() {
        let template = Template::new("new Chunk<>(#{any()})");
        assert!(matches!(
            template.expand(vec![]),
            Err(TemplateError::ArgumentCount { expected: 1, actual: 0 })
        ));
        assert!(matches!(
            template.expand(vec!["text".into()]),
            Err(TemplateError::ArgumentKind { index: 0, .. })
        ));
    }

    /// Wraps every argument of `write` calls with the template
    struct WrapArgs {
        template: Template,
        types: Vec<Option<JavaType>>,
    }

    impl Visitor for WrapArgs {
        fn visit_method_invocation(&mut self, call: MethodInvocation, ctx: &mut VisitContext<'_>) -> Expression {
            let mut call = walk_method_invocation(self, call, ctx);
            if call.name.name == "write" {
                let arg = call.args.remove(0);
                let at = arg.meta().clone();
                let wrapped = self.template.apply_expression(ctx, &at, vec![arg.into()]).unwrap();
                self.types.push(wrapped.ty().cloned());
                call.args.insert(0, wrapped);
            }
            Expression::MethodInvocation(call)
        }
    }

    #[test]
    fn test_expression_template_keeps_argument_text_and_attributes_types() {
        let source = "import java.util.*;\nimport org.springframework.batch.item.ItemWriter;\nclass A {\n  void m(ItemWriter<String> w, List<String> items) throws Exception {\n    w.write(items /* all */);\n  }\n}\n";
        let mut env = TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()));
        let unit = parse_unit(source, &mut env).unwrap();
        let mut ctx = VisitContext::new(&unit, &mut env);
        let mut visitor = WrapArgs {
            template: Template::new("new Chunk<>(#{any()})").with_import("org.springframework.batch.item.Chunk"),
            types: Vec::new(),
        };
        let unit = visitor.visit_unit(unit, &mut ctx);
        assert_eq!(
            print(&unit),
            "import java.util.*;\nimport org.springframework.batch.item.ItemWriter;\nclass A {\n  void m(ItemWriter<String> w, List<String> items) throws Exception {\n    w.write(new Chunk<>(items) /* all */);\n  }\n}\n"
        );
        assert_eq!(
            visitor.types[0].as_ref().and_then(JavaType::fqn),
            Some("org.springframework.batch.item.Chunk")
        );
    }
}
