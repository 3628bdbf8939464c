//! Lowering of tree-sitter nodes into typed syntax nodes

use super::declare::{self, is_type_declaration};
use super::names::{NameScope, Resolver, child_of_kind, is_comment, is_type_kind, named_children, qualify};
use crate::classpath::TypeEnv;
use crate::tree::java_type::OBJECT;
use crate::tree::{
    Annotation, Assignment, Block, ClassBody, ClassDecl, ClassKind, CompilationUnit, Expression,
    FieldAccess, Identifier, Import, JavaType, Lambda, LambdaBody, Literal, Member, MemberReference,
    Meta, MethodDecl, MethodInvocation, MethodType, Modifier, NamedVariable, NewClass, Opaque,
    PackageDecl, Parens, Primitive, Slice, Statement, Tree, TypeCast, TypeTree, TypeTreeKind,
    VarKind, VariableDecls, VariableRef,
};
use std::collections::HashMap;
use std::sync::Arc;
use tree_sitter::Node;

const STATEMENT_KINDS: &[&str] = &[
    "block",
    "local_variable_declaration",
    "expression_statement",
    "if_statement",
    "while_statement",
    "for_statement",
    "enhanced_for_statement",
    "do_statement",
    "try_statement",
    "try_with_resources_statement",
    "return_statement",
    "throw_statement",
    "break_statement",
    "continue_statement",
    "synchronized_statement",
    "labeled_statement",
    "assert_statement",
    "yield_statement",
    "switch_statement",
    "explicit_constructor_invocation",
];

const EXPRESSION_KINDS: &[&str] = &[
    "identifier",
    "this",
    "super",
    "field_access",
    "method_invocation",
    "object_creation_expression",
    "lambda_expression",
    "method_reference",
    "assignment_expression",
    "cast_expression",
    "parenthesized_expression",
    "binary_expression",
    "unary_expression",
    "update_expression",
    "ternary_expression",
    "instanceof_expression",
    "array_access",
    "array_creation_expression",
    "array_initializer",
    "switch_expression",
    "class_literal",
    "decimal_integer_literal",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
    "decimal_floating_point_literal",
    "hex_floating_point_literal",
    "true",
    "false",
    "character_literal",
    "string_literal",
    "text_block",
    "null_literal",
];

/// Constructs that open a scope for local variables
const SCOPE_KINDS: &[&str] = &[
    "block",
    "static_initializer",
    "for_statement",
    "enhanced_for_statement",
    "catch_clause",
    "try_with_resources_statement",
    "switch_block",
    "switch_rule",
    "if_statement",
    "while_statement",
    "do_statement",
];

/// Builds typed nodes from one parsed source
pub(crate) struct Lowerer<'e> {
    source: Arc<str>,
    env: &'e mut TypeEnv,
    scope: NameScope,
    /// Enclosing classes, outermost first
    classes: Vec<String>,
    type_vars: Vec<String>,
    locals: Vec<HashMap<String, VariableRef>>,
    /// Anonymous classes declared so far, per enclosing class
    anonymous: HashMap<String, usize>,
    /// The next class lowered stands in for the innermost enclosing class
    transparent_wrapper: bool,
}

impl<'e> Lowerer<'e> {
    pub fn new(source: Arc<str>, env: &'e mut TypeEnv, scope: NameScope) -> Self {
        Lowerer {
            source,
            env,
            scope,
            classes: Vec::new(),
            type_vars: Vec::new(),
            locals: vec![HashMap::new()],
            anonymous: HashMap::new(),
            transparent_wrapper: false,
        }
    }

    /// Places the lowerer inside `enclosing` with `bindings` in scope
    pub fn enter_snippet(&mut self, enclosing: &[String], bindings: &[(String, VariableRef)]) {
        let env: &TypeEnv = self.env;
        self.type_vars = enclosing
            .iter()
            .filter_map(|fqn| env.class(fqn))
            .flat_map(|info| info.type_params.iter().cloned())
            .collect();
        self.classes = enclosing.to_vec();
        self.locals = vec![bindings.iter().cloned().collect()];
        self.transparent_wrapper = !enclosing.is_empty();
    }

    fn meta(&self, node: Node<'_>) -> Meta {
        Meta::parsed(Slice::new(Arc::clone(&self.source), node.byte_range()))
    }

    fn span_meta(&self, start: usize, end: usize) -> Meta {
        Meta::parsed(Slice::new(Arc::clone(&self.source), start..end))
    }

    fn text(&self, node: Node<'_>) -> String {
        self.source[node.byte_range()].to_string()
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver {
            scope: &self.scope,
            classes: &self.classes,
            type_vars: &self.type_vars,
            known: &*self.env,
        }
    }

    fn type_tree(&self, node: Node<'_>) -> Option<TypeTree> {
        self.resolver().type_tree(node, &self.source)
    }

    fn type_tree_or_text(&self, node: Node<'_>) -> TypeTree {
        self.type_tree(node).unwrap_or_else(|| TypeTree {
            meta: self.meta(node),
            kind: TypeTreeKind::Named(self.text(node)),
            ty: None,
        })
    }

    fn identifier(&self, node: Node<'_>) -> Identifier {
        Identifier {
            meta: self.meta(node),
            name: self.text(node),
            ty: None,
            variable: None,
        }
    }

    fn leaf(&self, node: Node<'_>) -> Opaque {
        Opaque {
            meta: self.meta(node),
            kind: node.kind().to_string(),
            children: Vec::new(),
        }
    }

    fn self_type(&self, fqn: &str) -> JavaType {
        self.env
            .class(fqn)
            .map(|info| info.self_type())
            .unwrap_or_else(|| JavaType::class(fqn))
    }

    fn declare_local(&mut self, variable: VariableRef) {
        if let Some(frame) = self.locals.last_mut() {
            frame.insert(variable.name.clone(), variable);
        }
    }

    fn lookup_local(&self, name: &str) -> Option<&VariableRef> {
        self.locals.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Registers a class declared inside a method or another local class
    fn declare_class(&mut self, fqn: &str, node: Node<'_>) {
        if self.env.contains(fqn) {
            return;
        }
        let mut classes = self.classes.clone();
        classes.push(fqn.to_string());
        let mut type_vars = self.type_vars.clone();
        type_vars.extend(declare::type_param_names(node, &self.source));
        let info = {
            let resolver = Resolver {
                scope: &self.scope,
                classes: &classes,
                type_vars: &type_vars,
                known: &*self.env,
            };
            declare::local_class_info(fqn, node, &resolver, &self.source)
        };
        self.env.declare(info);
    }

    pub fn unit(&mut self, root: Node<'_>) -> CompilationUnit {
        let mut package = None;
        let mut imports = Vec::new();
        let mut types = Vec::new();
        for child in named_children(root) {
            match child.kind() {
                "package_declaration" => {
                    package = named_children(child)
                        .into_iter()
                        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
                        .map(|name| PackageDecl {
                            meta: self.meta(child),
                            name: self.text(name),
                        });
                }
                "import_declaration" => {
                    if let Some(name) = named_children(child)
                        .into_iter()
                        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
                    {
                        imports.push(Import {
                            meta: self.meta(child),
                            name: self.text(name),
                            is_static: child_of_kind(child, "static").is_some(),
                            wildcard: child_of_kind(child, "asterisk").is_some(),
                        });
                    }
                }
                kind if is_type_declaration(kind) => {
                    let name = declare::simple_name(child, &self.source).unwrap_or_default();
                    let fqn = qualify(self.scope.package(), &name);
                    types.push(Member::Class(self.class(child, fqn)));
                }
                _ => {}
            }
        }
        CompilationUnit {
            meta: Meta::parsed(Slice::whole(Arc::clone(&self.source))),
            package,
            imports,
            types,
        }
    }

    fn class(&mut self, node: Node<'_>, fqn: String) -> ClassDecl {
        let transparent = std::mem::take(&mut self.transparent_wrapper);
        let fqn = match (transparent, self.classes.last()) {
            (true, Some(enclosing)) => enclosing.clone(),
            _ => fqn,
        };
        let saved_vars = self.type_vars.len();
        if !transparent {
            self.classes.push(fqn.clone());
            self.type_vars.extend(declare::type_param_names(node, &self.source));
        }

        let modifiers = self.modifiers(node);
        let kind = match node.kind() {
            "interface_declaration" | "annotation_type_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            "record_declaration" => ClassKind::Record,
            _ => ClassKind::Class,
        };
        let name = node
            .child_by_field_name("name")
            .map(|n| self.identifier(n))
            .unwrap_or_else(|| Identifier::synthetic(""));
        let type_params = node.child_by_field_name("type_parameters").map(|n| self.leaf(n));

        let mut extends = Vec::new();
        let mut implements = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "superclass" | "extends_interfaces" => extends.extend(self.type_list(child)),
                "super_interfaces" => implements.extend(self.type_list(child)),
                _ => {}
            }
        }

        let body = match node.child_by_field_name("body") {
            Some(body) => self.class_body(body),
            None => ClassBody {
                meta: Meta::synthetic(),
                members: Vec::new(),
            },
        };

        if !transparent {
            self.classes.pop();
        }
        self.type_vars.truncate(saved_vars);

        ClassDecl {
            meta: self.meta(node),
            modifiers,
            kind,
            name,
            type_params,
            extends,
            implements,
            body,
            fqn,
        }
    }

    fn type_list(&self, node: Node<'_>) -> Vec<TypeTree> {
        let list = child_of_kind(node, "type_list").unwrap_or(node);
        named_children(list)
            .into_iter()
            .filter(|c| is_type_kind(c.kind()))
            .map(|c| self.type_tree_or_text(c))
            .collect()
    }

    fn class_body(&mut self, node: Node<'_>) -> ClassBody {
        let members = declare::body_members(node)
            .into_iter()
            .map(|member| self.member(member))
            .collect();
        ClassBody {
            meta: self.meta(node),
            members,
        }
    }

    fn member(&mut self, node: Node<'_>) -> Member {
        match node.kind() {
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                Member::Method(self.method(node))
            }
            "field_declaration" | "constant_declaration" => Member::Field(self.var_decls(node, VarKind::Field)),
            kind if is_type_declaration(kind) => {
                let name = declare::simple_name(node, &self.source).unwrap_or_default();
                let fqn = match self.classes.last() {
                    Some(outer) => format!("{}${}", outer, name),
                    None => qualify(self.scope.package(), &name),
                };
                self.declare_class(&fqn, node);
                Member::Class(self.class(node, fqn))
            }
            _ => Member::Other(self.opaque(node)),
        }
    }

    fn modifiers(&mut self, node: Node<'_>) -> Vec<Modifier> {
        let Some(mods) = child_of_kind(node, "modifiers") else {
            return Vec::new();
        };
        (0..mods.child_count())
            .filter_map(|i| mods.child(i))
            .filter(|c| !is_comment(c.kind()))
            .map(|c| match c.kind() {
                "marker_annotation" | "annotation" => Modifier::Annotation(self.annotation(c)),
                _ => Modifier::Keyword {
                    meta: self.meta(c),
                    keyword: self.text(c),
                },
            })
            .collect()
    }

    fn annotation(&mut self, node: Node<'_>) -> Annotation {
        let name = node.child_by_field_name("name").map(|n| self.text(n)).unwrap_or_default();
        let ty = self
            .scope
            .resolve(&name, &self.classes, &*self.env)
            .filter(|fqn| self.env.contains(fqn))
            .map(JavaType::Class);
        let arguments = node.child_by_field_name("arguments").map(|args| self.opaque(args));
        Annotation {
            meta: self.meta(node),
            name,
            arguments,
            ty,
        }
    }

    fn method(&mut self, node: Node<'_>) -> MethodDecl {
        let saved_vars = self.type_vars.len();
        self.type_vars.extend(declare::type_param_names(node, &self.source));
        self.locals.push(HashMap::new());

        let modifiers = self.modifiers(node);
        let type_params = node.child_by_field_name("type_parameters").map(|n| self.leaf(n));
        let return_type = if node.kind() == "method_declaration" {
            node.child_by_field_name("type").map(|t| self.type_tree_or_text(t))
        } else {
            None
        };
        let name = node
            .child_by_field_name("name")
            .map(|n| self.identifier(n))
            .unwrap_or_else(|| Identifier::synthetic(""));
        let params: Vec<VariableDecls> = node
            .child_by_field_name("parameters")
            .map(|list| {
                named_children(list)
                    .into_iter()
                    .filter(|p| matches!(p.kind(), "formal_parameter" | "spread_parameter"))
                    .map(|p| self.parameter(p))
                    .collect()
            })
            .unwrap_or_default();
        let throws = child_of_kind(node, "throws")
            .map(|t| self.type_list(t))
            .unwrap_or_default();
        let body = node.child_by_field_name("body").map(|b| self.block(b));

        let method_type = MethodType {
            declaring_type: self.classes.last().cloned().unwrap_or_default(),
            name: if return_type.is_some() {
                name.name.clone()
            } else {
                "<init>".to_string()
            },
            parameter_types: params
                .iter()
                .map(|p| p.vars.first().and_then(NamedVariable::ty).cloned().unwrap_or(JavaType::Unknown))
                .collect(),
            return_type: match &return_type {
                Some(tree) => tree.ty.clone().unwrap_or(JavaType::Unknown),
                None => JavaType::Primitive(Primitive::Void),
            },
            varargs: params.last().is_some_and(|p| p.varargs),
        };

        self.locals.pop();
        self.type_vars.truncate(saved_vars);

        MethodDecl {
            meta: self.meta(node),
            modifiers,
            type_params,
            return_type,
            name,
            params,
            throws,
            body,
            method_type: Some(method_type),
        }
    }

    /// A formal or variable arity parameter, declared as a local
    fn parameter(&mut self, node: Node<'_>) -> VariableDecls {
        let modifiers = self.modifiers(node);
        if node.kind() == "spread_parameter" {
            let type_expr = named_children(node)
                .into_iter()
                .find(|c| is_type_kind(c.kind()))
                .map(|t| self.type_tree_or_text(t));
            let ty = type_expr
                .as_ref()
                .and_then(|t| t.ty.clone())
                .map(|t| JavaType::Array(Box::new(t)));
            let vars = child_of_kind(node, "variable_declarator")
                .map(|d| self.declarator(d, ty, false, VarKind::Parameter))
                .into_iter()
                .collect();
            return VariableDecls {
                meta: self.meta(node),
                modifiers,
                type_expr,
                varargs: true,
                vars,
            };
        }

        let type_expr = node.child_by_field_name("type").map(|t| self.type_tree_or_text(t));
        let mut ty = type_expr.as_ref().and_then(|t| t.ty.clone());
        if let Some(dims) = node.child_by_field_name("dimensions") {
            ty = ty.map(|t| array_of(t, self.source[dims.byte_range()].matches('[').count()));
        }
        let vars = match node.child_by_field_name("name") {
            Some(name) => {
                let var = self.named_variable(name, node.end_byte(), ty, VarKind::Parameter, None);
                vec![var]
            }
            None => Vec::new(),
        };
        VariableDecls {
            meta: self.meta(node),
            modifiers,
            type_expr,
            varargs: false,
            vars,
        }
    }

    /// A variable whose node spans from `name` to `end`
    fn named_variable(
        &mut self,
        name: Node<'_>,
        end: usize,
        ty: Option<JavaType>,
        kind: VarKind,
        initializer: Option<Expression>,
    ) -> NamedVariable {
        let meta = self.span_meta(name.start_byte(), end);
        let name = self.identifier(name);
        let variable = VariableRef {
            name: name.name.clone(),
            kind,
            ty,
            decl: Some(meta.id),
        };
        if kind != VarKind::Field {
            self.declare_local(variable.clone());
        }
        NamedVariable {
            meta,
            name,
            initializer,
            variable: Some(variable),
        }
    }

    fn declarator(&mut self, node: Node<'_>, declared: Option<JavaType>, inferred: bool, kind: VarKind) -> NamedVariable {
        let mut ty = declared;
        if let Some(dims) = node.child_by_field_name("dimensions") {
            ty = ty.map(|t| array_of(t, self.source[dims.byte_range()].matches('[').count()));
        }
        let initializer = node.child_by_field_name("value").map(|v| self.expression(v));
        if inferred {
            ty = initializer.as_ref().and_then(Expression::ty).cloned();
        }
        let meta = self.meta(node);
        let name = match node.child_by_field_name("name") {
            Some(name) => self.identifier(name),
            None => Identifier::synthetic(""),
        };
        let variable = VariableRef {
            name: name.name.clone(),
            kind,
            ty,
            decl: Some(meta.id),
        };
        if kind != VarKind::Field {
            self.declare_local(variable.clone());
        }
        NamedVariable {
            meta,
            name,
            initializer,
            variable: Some(variable),
        }
    }

    /// Fields and local variable declarations
    fn var_decls(&mut self, node: Node<'_>, kind: VarKind) -> VariableDecls {
        let modifiers = self.modifiers(node);
        let type_node = node.child_by_field_name("type");
        let inferred = type_node.is_some_and(|t| &self.source[t.byte_range()] == "var");
        let type_expr = match type_node {
            Some(t) if !inferred => Some(self.type_tree_or_text(t)),
            _ => None,
        };
        let declared = type_expr.as_ref().and_then(|t| t.ty.clone());
        let vars = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "variable_declarator")
            .map(|d| self.declarator(d, declared.clone(), inferred, kind))
            .collect();
        VariableDecls {
            meta: self.meta(node),
            modifiers,
            type_expr,
            varargs: false,
            vars,
        }
    }

    fn block(&mut self, node: Node<'_>) -> Block {
        self.locals.push(HashMap::new());
        let statements = named_children(node)
            .into_iter()
            .map(|s| self.statement(s))
            .collect();
        self.locals.pop();
        Block {
            meta: self.meta(node),
            statements,
        }
    }

    fn statement(&mut self, node: Node<'_>) -> Statement {
        match node.kind() {
            "block" => Statement::Block(self.block(node)),
            "local_variable_declaration" => Statement::LocalVars(self.var_decls(node, VarKind::Local)),
            "expression_statement" => match named_children(node).first() {
                Some(expr) => Statement::Expression(self.expression(*expr)),
                None => Statement::Other(self.opaque(node)),
            },
            kind if is_type_declaration(kind) => {
                let name = declare::simple_name(node, &self.source).unwrap_or_default();
                let outer = self.classes.last().cloned().unwrap_or_default();
                let fqn = format!("{}$1{}", outer, name);
                self.declare_class(&fqn, node);
                Statement::Class(self.class(node, fqn))
            }
            _ => Statement::Other(self.opaque(node)),
        }
    }

    fn tree(&mut self, node: Node<'_>) -> Tree {
        let kind = node.kind();
        if STATEMENT_KINDS.contains(&kind) || is_type_declaration(kind) {
            return Tree::Statement(self.statement(node));
        }
        if matches!(kind, "resource" | "catch_formal_parameter")
            && let Some(decls) = self.declared_resource(node)
        {
            return Tree::Statement(Statement::LocalVars(decls));
        }
        if is_type_kind(kind)
            && let Some(tree) = self.type_tree(node)
        {
            return Tree::Type(tree);
        }
        if EXPRESSION_KINDS.contains(&kind) {
            return Tree::Expression(self.expression(node));
        }
        Tree::Opaque(self.opaque(node))
    }

    /// Variables declared by a try resource or a catch parameter
    fn declared_resource(&mut self, node: Node<'_>) -> Option<VariableDecls> {
        let name = node.child_by_field_name("name")?;
        let modifiers = self.modifiers(node);
        let (type_expr, ty) = if node.kind() == "catch_formal_parameter" {
            let types: Vec<Node<'_>> = child_of_kind(node, "catch_type")
                .map(|c| named_children(c).into_iter().filter(|t| is_type_kind(t.kind())).collect())
                .unwrap_or_default();
            match types.as_slice() {
                [single] => {
                    let tree = self.type_tree_or_text(*single);
                    let ty = tree.ty.clone();
                    (Some(tree), ty)
                }
                _ => (None, Some(JavaType::class("java.lang.Throwable"))),
            }
        } else {
            let tree = node.child_by_field_name("type").map(|t| self.type_tree_or_text(t))?;
            let ty = tree.ty.clone();
            (Some(tree), ty)
        };
        let initializer = node.child_by_field_name("value").map(|v| self.expression(v));
        let end = node
            .child_by_field_name("value")
            .map(|v| v.end_byte())
            .unwrap_or(node.end_byte());
        let var = self.named_variable(name, end, ty, VarKind::Local, initializer);
        Some(VariableDecls {
            meta: self.meta(node),
            modifiers,
            type_expr,
            varargs: false,
            vars: vec![var],
        })
    }

    fn opaque(&mut self, node: Node<'_>) -> Opaque {
        let scoped = SCOPE_KINDS.contains(&node.kind());
        if scoped {
            self.locals.push(HashMap::new());
        }
        let children = match node.kind() {
            "enhanced_for_statement" => self.enhanced_for(node),
            _ => named_children(node).into_iter().map(|c| self.tree(c)).collect(),
        };
        if scoped {
            self.locals.pop();
        }

        // Pattern variables stay visible in the enclosing statement
        if node.kind() == "instanceof_expression"
            && let Some(name) = node.child_by_field_name("name")
        {
            let ty = node
                .child_by_field_name("right")
                .and_then(|t| self.type_tree(t))
                .and_then(|t| t.ty);
            self.declare_local(VariableRef {
                name: self.text(name),
                kind: VarKind::Local,
                ty,
                decl: None,
            });
        }

        Opaque {
            meta: self.meta(node),
            kind: node.kind().to_string(),
            children,
        }
    }

    fn enhanced_for(&mut self, node: Node<'_>) -> Vec<Tree> {
        let (Some(type_node), Some(name), Some(value)) = (
            node.child_by_field_name("type"),
            node.child_by_field_name("name"),
            node.child_by_field_name("value"),
        ) else {
            return named_children(node).into_iter().map(|c| self.tree(c)).collect();
        };

        let iterable = self.expression(value);
        let inferred = &self.source[type_node.byte_range()] == "var";
        let type_expr = (!inferred).then(|| self.type_tree_or_text(type_node));
        let ty = match &type_expr {
            Some(tree) => tree.ty.clone(),
            None => iterable.ty().and_then(|ty| self.element_type(ty)),
        };

        let start = child_of_kind(node, "modifiers")
            .map(|m| m.start_byte())
            .unwrap_or(type_node.start_byte());
        let end = node
            .child_by_field_name("dimensions")
            .map(|d| d.end_byte())
            .unwrap_or(name.end_byte());
        let modifiers = self.modifiers(node);
        let var = self.named_variable(name, end, ty, VarKind::Local, None);
        let decls = VariableDecls {
            meta: self.span_meta(start, end),
            modifiers,
            type_expr,
            varargs: false,
            vars: vec![var],
        };

        let mut children = vec![
            Tree::Statement(Statement::LocalVars(decls)),
            Tree::Expression(iterable),
        ];
        if let Some(body) = node.child_by_field_name("body") {
            children.push(self.tree(body));
        }
        children
    }

    /// Element type when iterating over a value of type `ty`
    fn element_type(&self, ty: &JavaType) -> Option<JavaType> {
        if let JavaType::Array(component) = ty {
            return Some((**component).clone());
        }
        let iterable = self.env.as_super(ty, "java.lang.Iterable")?;
        iterable.type_args().first().map(|arg| arg.upper_bound().clone())
    }

    fn expression(&mut self, node: Node<'_>) -> Expression {
        match node.kind() {
            "identifier" => Expression::Identifier(self.name_expression(node)),
            "this" => {
                let ty = self.classes.last().map(|fqn| self.self_type(fqn));
                Expression::Identifier(Identifier {
                    ty,
                    ..self.identifier(node)
                })
            }
            "super" => {
                let ty = self.classes.last().map(|fqn| {
                    self.env
                        .class(fqn)
                        .and_then(|info| info.superclass.clone())
                        .unwrap_or_else(|| JavaType::class(OBJECT))
                });
                Expression::Identifier(Identifier {
                    ty,
                    ..self.identifier(node)
                })
            }
            "field_access" => self.field_access(node),
            "method_invocation" => Expression::MethodInvocation(self.method_invocation(node)),
            "object_creation_expression" => Expression::NewClass(self.new_class(node)),
            "lambda_expression" => Expression::Lambda(self.lambda(node)),
            "method_reference" => Expression::MemberReference(self.member_reference(node)),
            "assignment_expression" => {
                let (Some(left), Some(right)) =
                    (node.child_by_field_name("left"), node.child_by_field_name("right"))
                else {
                    return Expression::Other(self.opaque(node));
                };
                let target = self.expression(left);
                let value = self.expression(right);
                let operator = node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op))
                    .unwrap_or_else(|| "=".to_string());
                Expression::Assignment(Assignment {
                    meta: self.meta(node),
                    ty: target.ty().cloned(),
                    target: Box::new(target),
                    operator,
                    value: Box::new(value),
                })
            }
            "cast_expression" => {
                let (Some(class), Some(value)) =
                    (node.child_by_field_name("type"), node.child_by_field_name("value"))
                else {
                    return Expression::Other(self.opaque(node));
                };
                let class = self.type_tree_or_text(class);
                let expr = self.expression(value);
                Expression::TypeCast(TypeCast {
                    meta: self.meta(node),
                    ty: class.ty.clone(),
                    class,
                    expr: Box::new(expr),
                })
            }
            "parenthesized_expression" => match named_children(node).first() {
                Some(inner) => {
                    let inner = self.expression(*inner);
                    Expression::Parens(Parens {
                        meta: self.meta(node),
                        inner: Box::new(inner),
                    })
                }
                None => Expression::Other(self.opaque(node)),
            },
            _ => match self.literal(node) {
                Some(literal) => Expression::Literal(literal),
                None => Expression::Other(self.opaque(node)),
            },
        }
    }

    fn literal(&self, node: Node<'_>) -> Option<Literal> {
        let value = self.text(node);
        let ty = match node.kind() {
            "decimal_integer_literal" | "hex_integer_literal" | "octal_integer_literal" | "binary_integer_literal" => {
                if value.ends_with(['l', 'L']) {
                    JavaType::Primitive(Primitive::Long)
                } else {
                    JavaType::Primitive(Primitive::Int)
                }
            }
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                if value.ends_with(['f', 'F']) {
                    JavaType::Primitive(Primitive::Float)
                } else {
                    JavaType::Primitive(Primitive::Double)
                }
            }
            "true" | "false" => JavaType::Primitive(Primitive::Boolean),
            "character_literal" => JavaType::Primitive(Primitive::Char),
            "string_literal" | "text_block" => JavaType::class("java.lang.String"),
            "null_literal" => JavaType::Null,
            "class_literal" => {
                let class = named_children(node)
                    .into_iter()
                    .find(|c| is_type_kind(c.kind()))
                    .and_then(|c| self.type_tree(c))
                    .and_then(|t| t.ty)
                    .map(|ty| match ty {
                        JavaType::Primitive(p) => p.boxed().map(JavaType::class).unwrap_or(JavaType::Unknown),
                        other => other,
                    })
                    .unwrap_or(JavaType::Unknown);
                JavaType::Parameterized {
                    fqn: "java.lang.Class".to_string(),
                    args: vec![class],
                }
            }
            _ => return None,
        };
        Some(Literal {
            meta: self.meta(node),
            value,
            ty: Some(ty),
        })
    }

    /// A simple name used as an expression: a local, a field, a statically
    /// imported field or a type
    fn name_expression(&self, node: Node<'_>) -> Identifier {
        let ident = self.identifier(node);
        if let Some(variable) = self.lookup_local(&ident.name) {
            return Identifier {
                ty: variable.ty.clone(),
                variable: Some(variable.clone()),
                ..ident
            };
        }

        let owners = self
            .classes
            .iter()
            .rev()
            .map(|fqn| self.self_type(fqn))
            .chain(self.scope.static_owners(&ident.name).into_iter().map(JavaType::Class));
        for owner in owners {
            if let Some((field, _)) = self.env.find_field(&owner, &ident.name) {
                let variable = VariableRef {
                    name: ident.name.clone(),
                    kind: VarKind::Field,
                    ty: Some(field.ty.clone()),
                    decl: None,
                };
                return Identifier {
                    ty: Some(field.ty),
                    variable: Some(variable),
                    ..ident
                };
            }
        }

        let ty = self.type_reference(&ident.name);
        Identifier { ty, ..ident }
    }

    /// The class named by `name`, if it is known
    fn type_reference(&self, name: &str) -> Option<JavaType> {
        self.scope
            .resolve(name, &self.classes, &*self.env)
            .filter(|fqn| self.env.contains(fqn))
            .map(JavaType::Class)
    }

    fn field_access(&mut self, node: Node<'_>) -> Expression {
        let (Some(object), Some(field)) = (node.child_by_field_name("object"), node.child_by_field_name("field")) else {
            return Expression::Other(self.opaque(node));
        };
        let target = self.expression(object);
        let name = self.identifier(field);

        let mut ty = None;
        if let Some(target_ty) = target.ty() {
            if field.kind() == "this" {
                ty = Some(target_ty.clone());
            } else if let Some((info, _)) = self.env.find_field(target_ty, &name.name) {
                ty = Some(info.ty);
            } else if let Some(fqn) = target_ty.fqn() {
                let nested = format!("{}${}", fqn, name.name);
                if target.as_variable().is_none() && self.env.contains(&nested) {
                    ty = Some(JavaType::Class(nested));
                }
            }
        } else {
            let dotted: String = self.text(node).chars().filter(|c| !c.is_whitespace()).collect();
            ty = self.type_reference(&dotted);
        }

        Expression::FieldAccess(FieldAccess {
            meta: self.meta(node),
            target: Box::new(target),
            name,
            ty,
        })
    }

    fn arguments(&mut self, node: Node<'_>) -> Vec<Expression> {
        node.child_by_field_name("arguments")
            .map(|args| {
                named_children(args)
                    .into_iter()
                    .map(|arg| self.expression(arg))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn method_invocation(&mut self, node: Node<'_>) -> MethodInvocation {
        let select = node
            .child_by_field_name("object")
            .map(|object| Box::new(self.expression(object)));
        let type_args: Vec<TypeTree> = node
            .child_by_field_name("type_arguments")
            .map(|list| {
                named_children(list)
                    .into_iter()
                    .filter_map(|arg| self.type_tree(arg))
                    .collect()
            })
            .unwrap_or_default();
        let name = match node.child_by_field_name("name") {
            Some(name) => self.identifier(name),
            None => Identifier::synthetic(""),
        };
        let args = self.arguments(node);

        let explicit: Vec<JavaType> = type_args
            .iter()
            .map(|t| t.ty.clone().unwrap_or(JavaType::Unknown))
            .collect();
        let method_type = self.resolve_call(select.as_deref(), &name.name, &argument_types(&args), &explicit);
        if method_type.is_none() {
            tracing::trace!(method = %name.name, "unresolved method invocation");
        }
        MethodInvocation {
            meta: self.meta(node),
            select,
            type_args,
            ty: method_type.as_ref().map(|m| m.return_type.clone()),
            name,
            args,
            method_type,
        }
    }

    fn resolve_call(
        &self,
        select: Option<&Expression>,
        name: &str,
        args: &[Option<JavaType>],
        explicit: &[JavaType],
    ) -> Option<MethodType> {
        if let Some(select) = select {
            return self.env.find_method(select.ty()?, name, args, explicit);
        }
        for fqn in self.classes.iter().rev() {
            let owner = self.self_type(fqn);
            if self.env.has_method(&owner, name) {
                return self.env.find_method(&owner, name, args, explicit);
            }
        }
        self.scope
            .static_owners(name)
            .into_iter()
            .find_map(|owner| self.env.find_method(&JavaType::Class(owner), name, args, explicit))
    }

    fn new_class(&mut self, node: Node<'_>) -> NewClass {
        let type_node = node.child_by_field_name("type");
        let class = match type_node {
            Some(t) => self.type_tree_or_text(t),
            None => TypeTree {
                meta: Meta::synthetic(),
                kind: TypeTreeKind::Named(String::new()),
                ty: None,
            },
        };
        let diamond = type_node.is_some_and(|t| {
            t.kind() == "generic_type"
                && child_of_kind(t, "type_arguments").is_some_and(|args| named_children(args).is_empty())
        });
        let args = self.arguments(node);
        let arg_types = argument_types(&args);

        let Some(body_node) = child_of_kind(node, "class_body") else {
            let resolved = class
                .ty
                .as_ref()
                .and_then(|ty| self.env.find_constructor(ty, &arg_types, diamond));
            let (constructor_type, created) = resolved.unzip();
            let ty = created.or_else(|| class.ty.clone().filter(|_| !diamond));
            return NewClass {
                meta: self.meta(node),
                class,
                args,
                body: None,
                anonymous: None,
                constructor_type,
                ty,
            };
        };

        let outer = self.classes.last().cloned().unwrap_or_default();
        let index = {
            let count = self.anonymous.entry(outer.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let fqn = format!("{}${}", outer, index);
        let supertype = class.ty.clone();
        let is_interface = supertype
            .as_ref()
            .and_then(JavaType::fqn)
            .is_some_and(|sup| self.env.is_interface(sup));
        let info = {
            let mut classes = self.classes.clone();
            classes.push(fqn.clone());
            let resolver = Resolver {
                scope: &self.scope,
                classes: &classes,
                type_vars: &self.type_vars,
                known: &*self.env,
            };
            declare::anonymous_info(&fqn, supertype.clone(), is_interface, body_node, &resolver, &self.source)
        };
        self.env.declare(info);

        let constructor_type = match &supertype {
            Some(sup) if !is_interface => self
                .env
                .find_constructor(sup, &arg_types, diamond)
                .map(|(constructor, _)| constructor),
            _ => None,
        };

        self.classes.push(fqn.clone());
        let body = self.class_body(body_node);
        self.classes.pop();

        NewClass {
            meta: self.meta(node),
            class,
            args,
            body: Some(body),
            anonymous: Some(fqn.clone()),
            constructor_type,
            ty: Some(JavaType::Class(fqn)),
        }
    }

    fn lambda(&mut self, node: Node<'_>) -> Lambda {
        self.locals.push(HashMap::new());
        let params = match node.child_by_field_name("parameters") {
            Some(params) => self.lambda_params(params),
            None => Opaque {
                meta: Meta::synthetic(),
                kind: "inferred_parameters".to_string(),
                children: Vec::new(),
            },
        };
        let body = match node.child_by_field_name("body") {
            Some(body) if body.kind() == "block" => LambdaBody::Block(self.block(body)),
            Some(body) => LambdaBody::Expression(Box::new(self.expression(body))),
            None => LambdaBody::Block(Block {
                meta: Meta::synthetic(),
                statements: Vec::new(),
            }),
        };
        self.locals.pop();
        Lambda {
            meta: self.meta(node),
            params,
            body,
        }
    }

    fn lambda_params(&mut self, node: Node<'_>) -> Opaque {
        let names: Vec<Node<'_>> = match node.kind() {
            "identifier" => vec![node],
            "inferred_parameters" => named_children(node)
                .into_iter()
                .filter(|c| c.kind() == "identifier")
                .collect(),
            _ => Vec::new(),
        };
        let children = if node.kind() == "formal_parameters" {
            named_children(node)
                .into_iter()
                .filter(|p| matches!(p.kind(), "formal_parameter" | "spread_parameter"))
                .map(|p| Tree::Statement(Statement::LocalVars(self.parameter(p))))
                .collect()
        } else {
            names
                .into_iter()
                .map(|name| {
                    let var = self.named_variable(name, name.end_byte(), None, VarKind::Parameter, None);
                    Tree::Statement(Statement::LocalVars(VariableDecls {
                        meta: self.meta(name),
                        modifiers: Vec::new(),
                        type_expr: None,
                        varargs: false,
                        vars: vec![var],
                    }))
                })
                .collect()
        };
        Opaque {
            meta: self.meta(node),
            kind: node.kind().to_string(),
            children,
        }
    }

    fn member_reference(&mut self, node: Node<'_>) -> MemberReference {
        let children = named_children(node);
        let target = match children.first() {
            Some(first) if is_type_kind(first.kind()) && first.kind() != "identifier" => {
                let tree = self.type_tree_or_text(*first);
                Expression::Other(Opaque {
                    meta: self.meta(*first),
                    kind: "type".to_string(),
                    children: vec![Tree::Type(tree)],
                })
            }
            Some(first) => self.expression(*first),
            None => Expression::Other(self.leaf(node)),
        };
        let name = children
            .iter()
            .skip(1)
            .rfind(|c| c.kind() == "identifier")
            .map(|c| self.identifier(*c));
        MemberReference {
            meta: self.meta(node),
            target: Box::new(target),
            name,
        }
    }
}

fn array_of(mut ty: JavaType, depth: usize) -> JavaType {
    for _ in 0..depth {
        ty = JavaType::Array(Box::new(ty));
    }
    ty
}

/// Static argument types for overload resolution. Lambdas and method
/// references have no standalone type.
pub(crate) fn argument_types(args: &[Expression]) -> Vec<Option<JavaType>> {
    args.iter()
        .map(|arg| match arg {
            Expression::Lambda(_) | Expression::MemberReference(_) => None,
            other => other.ty().cloned(),
        })
        .collect()
}
