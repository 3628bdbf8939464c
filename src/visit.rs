#![forbid(unsafe_code)]

//! Fold-style traversal of the syntax tree
//!
//! A [`Visitor`] consumes nodes and returns (possibly new) nodes. Each
//! `visit_*` method defaults to the matching `walk_*` function, which visits
//! the children and rebuilds the node around them. Implementations override
//! the node kinds they care about and call `walk_*` to keep descending.
//!
//! The [`VisitContext`] travels alongside: it knows which classes enclose the
//! current node, gives access to the type environment and collects the import
//! effects that are applied after the traversal.

use crate::classpath::TypeEnv;
use crate::imports::ImportEffect;
use crate::parse::{ImportHeader, SnippetContext};
use crate::tree::{
    Assignment, Block, ClassBody, ClassDecl, CompilationUnit, Expression, LambdaBody, Member,
    MethodDecl, MethodInvocation, NamedVariable, NewClass, Opaque, Statement, Tree, VariableDecls,
    VariableRef,
};

/// Per-unit state shared by the visitors of one recipe run
pub struct VisitContext<'e> {
    env: &'e mut TypeEnv,
    package: String,
    imports: Vec<ImportHeader>,
    /// Binary names of the enclosing classes, outermost first
    classes: Vec<String>,
    effects: Vec<ImportEffect>,
}

impl<'e> VisitContext<'e> {
    pub fn new(unit: &CompilationUnit, env: &'e mut TypeEnv) -> Self {
        let imports = unit
            .imports
            .iter()
            .map(|import| ImportHeader {
                name: import.name.clone(),
                is_static: import.is_static,
                wildcard: import.wildcard,
            })
            .collect();
        VisitContext {
            env,
            package: unit.package_name().to_string(),
            imports,
            classes: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn env(&self) -> &TypeEnv {
        &*self.env
    }

    pub fn env_mut(&mut self) -> &mut TypeEnv {
        &mut *self.env
    }

    /// The innermost class enclosing the current node
    pub fn enclosing_class(&self) -> Option<&str> {
        self.classes.last().map(String::as_str)
    }

    pub fn enter_class(&mut self, fqn: &str) {
        self.classes.push(fqn.to_string());
    }

    pub fn exit_class(&mut self) {
        self.classes.pop();
    }

    /// Requests an import of `fqn`, added after the traversal if the unit
    /// refers to the type and does not import it yet
    pub fn add_import(&mut self, fqn: impl Into<String>) {
        let effect = ImportEffect::Add(fqn.into());
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
    }

    /// Requests removal of the import of `fqn`, done after the traversal if
    /// the unit no longer refers to the type
    pub fn remove_import(&mut self, fqn: impl Into<String>) {
        let effect = ImportEffect::Remove(fqn.into());
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
    }

    pub fn effects(&self) -> &[ImportEffect] {
        &self.effects
    }

    pub fn into_effects(self) -> Vec<ImportEffect> {
        self.effects
    }

    /// Naming context for parsing a snippet at the current position, with
    /// `extra_imports` visible in addition to the unit's imports
    pub fn snippet_context(&self, extra_imports: &[String], bindings: Vec<(String, VariableRef)>) -> SnippetContext {
        let mut imports = self.imports.clone();
        imports.extend(extra_imports.iter().map(ImportHeader::single));
        SnippetContext {
            package: self.package.clone(),
            imports,
            enclosing: self.classes.clone(),
            bindings,
        }
    }
}

/// A tree transformation, dispatched by node kind
pub trait Visitor {
    fn visit_unit(&mut self, unit: CompilationUnit, ctx: &mut VisitContext<'_>) -> CompilationUnit {
        walk_unit(self, unit, ctx)
    }

    fn visit_member(&mut self, member: Member, ctx: &mut VisitContext<'_>) -> Member {
        walk_member(self, member, ctx)
    }

    fn visit_class(&mut self, class: ClassDecl, ctx: &mut VisitContext<'_>) -> ClassDecl {
        walk_class(self, class, ctx)
    }

    fn visit_class_body(&mut self, body: ClassBody, ctx: &mut VisitContext<'_>) -> ClassBody {
        walk_class_body(self, body, ctx)
    }

    fn visit_method(&mut self, method: MethodDecl, ctx: &mut VisitContext<'_>) -> MethodDecl {
        walk_method(self, method, ctx)
    }

    fn visit_variable_decls(&mut self, decls: VariableDecls, ctx: &mut VisitContext<'_>) -> VariableDecls {
        walk_variable_decls(self, decls, ctx)
    }

    fn visit_variable(&mut self, var: NamedVariable, ctx: &mut VisitContext<'_>) -> NamedVariable {
        walk_variable(self, var, ctx)
    }

    fn visit_block(&mut self, block: Block, ctx: &mut VisitContext<'_>) -> Block {
        walk_block(self, block, ctx)
    }

    fn visit_statement(&mut self, statement: Statement, ctx: &mut VisitContext<'_>) -> Statement {
        walk_statement(self, statement, ctx)
    }

    fn visit_expression(&mut self, expr: Expression, ctx: &mut VisitContext<'_>) -> Expression {
        walk_expression(self, expr, ctx)
    }

    fn visit_method_invocation(&mut self, call: MethodInvocation, ctx: &mut VisitContext<'_>) -> Expression {
        Expression::MethodInvocation(walk_method_invocation(self, call, ctx))
    }

    fn visit_new_class(&mut self, new_class: NewClass, ctx: &mut VisitContext<'_>) -> Expression {
        Expression::NewClass(walk_new_class(self, new_class, ctx))
    }

    fn visit_assignment(&mut self, assignment: Assignment, ctx: &mut VisitContext<'_>) -> Expression {
        Expression::Assignment(walk_assignment(self, assignment, ctx))
    }

    fn visit_opaque(&mut self, opaque: Opaque, ctx: &mut VisitContext<'_>) -> Opaque {
        walk_opaque(self, opaque, ctx)
    }
}

/// A visitor that changes nothing
pub struct NoopVisitor;

impl Visitor for NoopVisitor {
    fn visit_unit(&mut self, unit: CompilationUnit, _ctx: &mut VisitContext<'_>) -> CompilationUnit {
        unit
    }
}

pub fn walk_unit<V: Visitor + ?Sized>(v: &mut V, mut unit: CompilationUnit, ctx: &mut VisitContext<'_>) -> CompilationUnit {
    unit.types = unit.types.into_iter().map(|member| v.visit_member(member, ctx)).collect();
    unit
}

pub fn walk_member<V: Visitor + ?Sized>(v: &mut V, member: Member, ctx: &mut VisitContext<'_>) -> Member {
    match member {
        Member::Method(method) => Member::Method(v.visit_method(method, ctx)),
        Member::Field(field) => Member::Field(v.visit_variable_decls(field, ctx)),
        Member::Class(class) => Member::Class(v.visit_class(class, ctx)),
        Member::Other(opaque) => Member::Other(v.visit_opaque(opaque, ctx)),
    }
}

pub fn walk_class<V: Visitor + ?Sized>(v: &mut V, mut class: ClassDecl, ctx: &mut VisitContext<'_>) -> ClassDecl {
    ctx.enter_class(&class.fqn);
    class.body = v.visit_class_body(class.body, ctx);
    ctx.exit_class();
    class
}

pub fn walk_class_body<V: Visitor + ?Sized>(v: &mut V, mut body: ClassBody, ctx: &mut VisitContext<'_>) -> ClassBody {
    body.members = body.members.into_iter().map(|member| v.visit_member(member, ctx)).collect();
    body
}

pub fn walk_method<V: Visitor + ?Sized>(v: &mut V, mut method: MethodDecl, ctx: &mut VisitContext<'_>) -> MethodDecl {
    method.params = method
        .params
        .into_iter()
        .map(|param| v.visit_variable_decls(param, ctx))
        .collect();
    method.body = method.body.map(|body| v.visit_block(body, ctx));
    method
}

pub fn walk_variable_decls<V: Visitor + ?Sized>(
    v: &mut V,
    mut decls: VariableDecls,
    ctx: &mut VisitContext<'_>,
) -> VariableDecls {
    decls.vars = decls.vars.into_iter().map(|var| v.visit_variable(var, ctx)).collect();
    decls
}

pub fn walk_variable<V: Visitor + ?Sized>(v: &mut V, mut var: NamedVariable, ctx: &mut VisitContext<'_>) -> NamedVariable {
    var.initializer = var.initializer.map(|init| v.visit_expression(init, ctx));
    var
}

pub fn walk_block<V: Visitor + ?Sized>(v: &mut V, mut block: Block, ctx: &mut VisitContext<'_>) -> Block {
    block.statements = block
        .statements
        .into_iter()
        .map(|statement| v.visit_statement(statement, ctx))
        .collect();
    block
}

pub fn walk_statement<V: Visitor + ?Sized>(v: &mut V, statement: Statement, ctx: &mut VisitContext<'_>) -> Statement {
    match statement {
        Statement::Block(block) => Statement::Block(v.visit_block(block, ctx)),
        Statement::LocalVars(decls) => Statement::LocalVars(v.visit_variable_decls(decls, ctx)),
        Statement::Expression(expr) => Statement::Expression(v.visit_expression(expr, ctx)),
        Statement::Class(class) => Statement::Class(v.visit_class(class, ctx)),
        Statement::Other(opaque) => Statement::Other(v.visit_opaque(opaque, ctx)),
    }
}

/// Dispatches to the kind-specific `visit_*` methods, and walks the children
/// of the remaining expression kinds
pub fn walk_expression<V: Visitor + ?Sized>(v: &mut V, expr: Expression, ctx: &mut VisitContext<'_>) -> Expression {
    match expr {
        Expression::MethodInvocation(call) => v.visit_method_invocation(call, ctx),
        Expression::NewClass(new_class) => v.visit_new_class(new_class, ctx),
        Expression::Assignment(assignment) => v.visit_assignment(assignment, ctx),
        Expression::FieldAccess(mut access) => {
            access.target = Box::new(v.visit_expression(*access.target, ctx));
            Expression::FieldAccess(access)
        }
        Expression::Lambda(mut lambda) => {
            lambda.params = v.visit_opaque(lambda.params, ctx);
            lambda.body = match lambda.body {
                LambdaBody::Expression(body) => LambdaBody::Expression(Box::new(v.visit_expression(*body, ctx))),
                LambdaBody::Block(body) => LambdaBody::Block(v.visit_block(body, ctx)),
            };
            Expression::Lambda(lambda)
        }
        Expression::MemberReference(mut reference) => {
            reference.target = Box::new(v.visit_expression(*reference.target, ctx));
            Expression::MemberReference(reference)
        }
        Expression::TypeCast(mut cast) => {
            cast.expr = Box::new(v.visit_expression(*cast.expr, ctx));
            Expression::TypeCast(cast)
        }
        Expression::Parens(mut parens) => {
            parens.inner = Box::new(v.visit_expression(*parens.inner, ctx));
            Expression::Parens(parens)
        }
        Expression::Other(opaque) => Expression::Other(v.visit_opaque(opaque, ctx)),
        leaf @ (Expression::Identifier(_) | Expression::Literal(_)) => leaf,
    }
}

pub fn walk_method_invocation<V: Visitor + ?Sized>(
    v: &mut V,
    mut call: MethodInvocation,
    ctx: &mut VisitContext<'_>,
) -> MethodInvocation {
    call.select = call.select.map(|select| Box::new(v.visit_expression(*select, ctx)));
    call.args = call.args.into_iter().map(|arg| v.visit_expression(arg, ctx)).collect();
    call
}

pub fn walk_new_class<V: Visitor + ?Sized>(v: &mut V, mut new_class: NewClass, ctx: &mut VisitContext<'_>) -> NewClass {
    new_class.args = new_class.args.into_iter().map(|arg| v.visit_expression(arg, ctx)).collect();
    if let Some(body) = new_class.body.take() {
        let anonymous = new_class.anonymous.clone();
        if let Some(fqn) = &anonymous {
            ctx.enter_class(fqn);
        }
        new_class.body = Some(v.visit_class_body(body, ctx));
        if anonymous.is_some() {
            ctx.exit_class();
        }
    }
    new_class
}

pub fn walk_assignment<V: Visitor + ?Sized>(
    v: &mut V,
    mut assignment: Assignment,
    ctx: &mut VisitContext<'_>,
) -> Assignment {
    assignment.target = Box::new(v.visit_expression(*assignment.target, ctx));
    assignment.value = Box::new(v.visit_expression(*assignment.value, ctx));
    assignment
}

pub fn walk_opaque<V: Visitor + ?Sized>(v: &mut V, mut opaque: Opaque, ctx: &mut VisitContext<'_>) -> Opaque {
    opaque.children = opaque
        .children
        .into_iter()
        .map(|child| match child {
            Tree::Statement(statement) => Tree::Statement(v.visit_statement(statement, ctx)),
            Tree::Expression(expr) => Tree::Expression(v.visit_expression(expr, ctx)),
            Tree::Opaque(inner) => Tree::Opaque(v.visit_opaque(inner, ctx)),
            ty @ Tree::Type(_) => ty,
        })
        .collect();
    opaque
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::TypeTable;
    use crate::parse::parse_unit;
    use crate::tree::{Identifier, Meta, print};
    use std::sync::Arc;

    fn env() -> TypeEnv {
        TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()))
    }

    /// Renames every call of `from` to `to`, recording the classes it was
    /// found in
    struct RenameCalls {
        from: &'static str,
        to: &'static str,
        seen_in: Vec<String>,
    }

    impl Visitor for RenameCalls {
        fn visit_method_invocation(&mut self, call: MethodInvocation, ctx: &mut VisitContext<'_>) -> Expression {
            let mut call = walk_method_invocation(self, call, ctx);
            if call.name.name == self.from {
                self.seen_in.push(ctx.enclosing_class().unwrap_or_default().to_string());
                call.name = Identifier {
                    meta: Meta::replacing(&call.name.meta),
                    ..Identifier::synthetic(self.to)
                };
            }
            Expression::MethodInvocation(call)
        }
    }

    fn rename(source: &str) -> (String, Vec<String>) {
        let mut env = env();
        let unit = parse_unit(source, &mut env).unwrap();
        let mut ctx = VisitContext::new(&unit, &mut env);
        let mut visitor = RenameCalls {
            from: "run",
            to: "start",
            seen_in: Vec::new(),
        };
        let unit = visitor.visit_unit(unit, &mut ctx);
        (print(&unit), visitor.seen_in)
    }

    #[test]
    fn test_rename_reaches_nested_statements_and_lambdas() {
        let source = "class A {\n  void m(Runnable r) {\n    if (r != null) { r.run(); }\n    for (int i = 0; i < 2; i++) r.run();\n    Runnable q = () -> r.run();\n  }\n}\n";
        let (printed, seen) = rename(source);
        assert_eq!(
            printed,
            "class A {\n  void m(Runnable r) {\n    if (r != null) { r.start(); }\n    for (int i = 0; i < 2; i++) r.start();\n    Runnable q = () -> r.start();\n  }\n}\n"
        );
        assert_eq!(seen, vec!["A", "A", "A"]);
    }

    #[test]
    fn test_cursor_tracks_anonymous_and_nested_classes() {
        let source = "class A {\n  class B { void m(Runnable r) { r.run(); } }\n  Runnable f = new Runnable() { public void run() { this.run(); } };\n}\n";
        let (_, seen) = rename(source);
        assert_eq!(seen, vec!["A$B", "A$1"]);
    }

    #[test]
    fn test_import_effects_are_deduplicated() {
        let mut env = env();
        let unit = parse_unit("class A {}", &mut env).unwrap();
        let mut ctx = VisitContext::new(&unit, &mut env);
        ctx.add_import("java.util.List");
        ctx.add_import("java.util.List");
        ctx.remove_import("java.util.Set");
        assert_eq!(
            ctx.into_effects(),
            vec![
                ImportEffect::Add("java.util.List".to_string()),
                ImportEffect::Remove("java.util.Set".to_string()),
            ]
        );
    }

    #[test]
    fn test_noop_visitor_prints_verbatim() {
        let source = "class A { void m() { System.out.println(1); } }\n";
        let mut env = env();
        let unit = parse_unit(source, &mut env).unwrap();
        let mut ctx = VisitContext::new(&unit, &mut env);
        let unit = NoopVisitor.visit_unit(unit, &mut ctx);
        assert_eq!(print(&unit), source);
    }
}
