//! Read-only node references and the lossless printer

use super::Meta;
use super::node::*;

/// A borrowed reference to any node of the tree
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Unit(&'a CompilationUnit),
    Package(&'a PackageDecl),
    Import(&'a Import),
    Class(&'a ClassDecl),
    ClassBody(&'a ClassBody),
    Method(&'a MethodDecl),
    Modifier(&'a Modifier),
    VariableDecls(&'a VariableDecls),
    Variable(&'a NamedVariable),
    Block(&'a Block),
    Expression(&'a Expression),
    Identifier(&'a Identifier),
    Type(&'a TypeTree),
    Opaque(&'a Opaque),
}

impl<'a> NodeRef<'a> {
    pub fn meta(self) -> &'a Meta {
        match self {
            NodeRef::Unit(n) => &n.meta,
            NodeRef::Package(n) => &n.meta,
            NodeRef::Import(n) => &n.meta,
            NodeRef::Class(n) => &n.meta,
            NodeRef::ClassBody(n) => &n.meta,
            NodeRef::Method(n) => &n.meta,
            NodeRef::Modifier(n) => n.meta(),
            NodeRef::VariableDecls(n) => &n.meta,
            NodeRef::Variable(n) => &n.meta,
            NodeRef::Block(n) => &n.meta,
            NodeRef::Expression(n) => n.meta(),
            NodeRef::Identifier(n) => &n.meta,
            NodeRef::Type(n) => &n.meta,
            NodeRef::Opaque(n) => &n.meta,
        }
    }

    /// Direct children in source order
    pub fn children(self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        match self {
            NodeRef::Unit(unit) => {
                out.extend(unit.package.as_ref().map(NodeRef::Package));
                out.extend(unit.imports.iter().map(NodeRef::Import));
                out.extend(unit.types.iter().map(NodeRef::from));
            }
            NodeRef::Package(_) | NodeRef::Import(_) | NodeRef::Identifier(_) => {}
            NodeRef::Class(class) => {
                out.extend(class.modifiers.iter().map(NodeRef::Modifier));
                out.push(NodeRef::Identifier(&class.name));
                out.extend(class.type_params.as_ref().map(NodeRef::Opaque));
                out.extend(class.extends.iter().map(NodeRef::Type));
                out.extend(class.implements.iter().map(NodeRef::Type));
                out.push(NodeRef::ClassBody(&class.body));
            }
            NodeRef::ClassBody(body) => out.extend(body.members.iter().map(NodeRef::from)),
            NodeRef::Method(method) => {
                out.extend(method.modifiers.iter().map(NodeRef::Modifier));
                out.extend(method.type_params.as_ref().map(NodeRef::Opaque));
                out.extend(method.return_type.as_ref().map(NodeRef::Type));
                out.push(NodeRef::Identifier(&method.name));
                out.extend(method.params.iter().map(NodeRef::VariableDecls));
                out.extend(method.throws.iter().map(NodeRef::Type));
                out.extend(method.body.as_ref().map(NodeRef::Block));
            }
            NodeRef::Modifier(Modifier::Keyword { .. }) => {}
            NodeRef::Modifier(Modifier::Annotation(annotation)) => {
                out.extend(annotation.arguments.as_ref().map(NodeRef::Opaque));
            }
            NodeRef::VariableDecls(decls) => {
                out.extend(decls.modifiers.iter().map(NodeRef::Modifier));
                out.extend(decls.type_expr.as_ref().map(NodeRef::Type));
                out.extend(decls.vars.iter().map(NodeRef::Variable));
            }
            NodeRef::Variable(var) => {
                out.push(NodeRef::Identifier(&var.name));
                out.extend(var.initializer.as_ref().map(NodeRef::Expression));
            }
            NodeRef::Block(block) => out.extend(block.statements.iter().map(NodeRef::from)),
            NodeRef::Expression(expr) => expression_children(expr, &mut out),
            NodeRef::Type(ty) => match &ty.kind {
                TypeTreeKind::Named(_) | TypeTreeKind::Primitive(_) | TypeTreeKind::Wildcard(None) => {}
                TypeTreeKind::Parameterized { base, args } => {
                    out.push(NodeRef::Type(base));
                    out.extend(args.iter().map(NodeRef::Type));
                }
                TypeTreeKind::Wildcard(Some((_, bound))) => out.push(NodeRef::Type(bound)),
                TypeTreeKind::Array(elem) => out.push(NodeRef::Type(elem)),
            },
            NodeRef::Opaque(opaque) => out.extend(opaque.children.iter().map(NodeRef::from)),
        }
        out
    }

    /// This node and all nodes below it, in pre-order
    pub fn descendants(self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut children = node.children();
            children.reverse();
            stack.extend(children);
        }
        out
    }
}

fn expression_children<'a>(expr: &'a Expression, out: &mut Vec<NodeRef<'a>>) {
    match expr {
        Expression::Identifier(_) | Expression::Literal(_) => {}
        Expression::FieldAccess(access) => {
            out.push(NodeRef::Expression(&access.target));
            out.push(NodeRef::Identifier(&access.name));
        }
        Expression::MethodInvocation(call) => {
            out.extend(call.select.as_deref().map(NodeRef::Expression));
            out.extend(call.type_args.iter().map(NodeRef::Type));
            out.push(NodeRef::Identifier(&call.name));
            out.extend(call.args.iter().map(NodeRef::Expression));
        }
        Expression::NewClass(new_class) => {
            out.push(NodeRef::Type(&new_class.class));
            out.extend(new_class.args.iter().map(NodeRef::Expression));
            out.extend(new_class.body.as_ref().map(NodeRef::ClassBody));
        }
        Expression::Lambda(lambda) => {
            out.push(NodeRef::Opaque(&lambda.params));
            match &lambda.body {
                LambdaBody::Expression(body) => out.push(NodeRef::Expression(body)),
                LambdaBody::Block(body) => out.push(NodeRef::Block(body)),
            }
        }
        Expression::MemberReference(reference) => {
            out.push(NodeRef::Expression(&reference.target));
            out.extend(reference.name.as_ref().map(NodeRef::Identifier));
        }
        Expression::Assignment(assignment) => {
            out.push(NodeRef::Expression(&assignment.target));
            out.push(NodeRef::Expression(&assignment.value));
        }
        Expression::TypeCast(cast) => {
            out.push(NodeRef::Type(&cast.class));
            out.push(NodeRef::Expression(&cast.expr));
        }
        Expression::Parens(parens) => out.push(NodeRef::Expression(&parens.inner)),
        Expression::Other(opaque) => out.extend(opaque.children.iter().map(NodeRef::from)),
    }
}

impl<'a> From<&'a CompilationUnit> for NodeRef<'a> {
    fn from(node: &'a CompilationUnit) -> Self {
        NodeRef::Unit(node)
    }
}

impl<'a> From<&'a Import> for NodeRef<'a> {
    fn from(node: &'a Import) -> Self {
        NodeRef::Import(node)
    }
}

impl<'a> From<&'a ClassDecl> for NodeRef<'a> {
    fn from(node: &'a ClassDecl) -> Self {
        NodeRef::Class(node)
    }
}

impl<'a> From<&'a ClassBody> for NodeRef<'a> {
    fn from(node: &'a ClassBody) -> Self {
        NodeRef::ClassBody(node)
    }
}

impl<'a> From<&'a MethodDecl> for NodeRef<'a> {
    fn from(node: &'a MethodDecl) -> Self {
        NodeRef::Method(node)
    }
}

impl<'a> From<&'a Modifier> for NodeRef<'a> {
    fn from(node: &'a Modifier) -> Self {
        NodeRef::Modifier(node)
    }
}

impl<'a> From<&'a VariableDecls> for NodeRef<'a> {
    fn from(node: &'a VariableDecls) -> Self {
        NodeRef::VariableDecls(node)
    }
}

impl<'a> From<&'a NamedVariable> for NodeRef<'a> {
    fn from(node: &'a NamedVariable) -> Self {
        NodeRef::Variable(node)
    }
}

impl<'a> From<&'a Block> for NodeRef<'a> {
    fn from(node: &'a Block) -> Self {
        NodeRef::Block(node)
    }
}

impl<'a> From<&'a Expression> for NodeRef<'a> {
    fn from(node: &'a Expression) -> Self {
        NodeRef::Expression(node)
    }
}

impl<'a> From<&'a Identifier> for NodeRef<'a> {
    fn from(node: &'a Identifier) -> Self {
        NodeRef::Identifier(node)
    }
}

impl<'a> From<&'a TypeTree> for NodeRef<'a> {
    fn from(node: &'a TypeTree) -> Self {
        NodeRef::Type(node)
    }
}

impl<'a> From<&'a Opaque> for NodeRef<'a> {
    fn from(node: &'a Opaque) -> Self {
        NodeRef::Opaque(node)
    }
}

impl<'a> From<&'a Member> for NodeRef<'a> {
    fn from(member: &'a Member) -> Self {
        match member {
            Member::Method(m) => NodeRef::Method(m),
            Member::Field(f) => NodeRef::VariableDecls(f),
            Member::Class(c) => NodeRef::Class(c),
            Member::Other(o) => NodeRef::Opaque(o),
        }
    }
}

impl<'a> From<&'a Statement> for NodeRef<'a> {
    fn from(statement: &'a Statement) -> Self {
        match statement {
            Statement::Block(b) => NodeRef::Block(b),
            Statement::LocalVars(v) => NodeRef::VariableDecls(v),
            Statement::Expression(e) => NodeRef::Expression(e),
            Statement::Class(c) => NodeRef::Class(c),
            Statement::Other(o) => NodeRef::Opaque(o),
        }
    }
}

impl<'a> From<&'a Tree> for NodeRef<'a> {
    fn from(tree: &'a Tree) -> Self {
        match tree {
            Tree::Statement(s) => NodeRef::from(s),
            Tree::Expression(e) => NodeRef::Expression(e),
            Tree::Type(t) => NodeRef::Type(t),
            Tree::Opaque(o) => NodeRef::Opaque(o),
        }
    }
}

/// Prints a node back to Java source
///
/// Nodes that still carry their parsed text are reproduced byte for byte, with
/// changed children spliced into the slots they occupy. Synthesized nodes are
/// printed from their structure.
pub fn print<'a>(node: impl Into<NodeRef<'a>>) -> String {
    let mut out = String::new();
    print_into(node.into(), &mut out);
    out
}

fn print_into(node: NodeRef<'_>, out: &mut String) {
    let meta = node.meta();
    out.push_str(&meta.leading);
    match splice(node, meta) {
        Some(text) => out.push_str(&text),
        None => print_structure(node, out),
    }
    out.push_str(&meta.trailing);
}

/// Reproduces the node's text with each child printed into its slot. Returns
/// `None` if some child does not fit the text, e.g. a synthesized child with
/// no slot.
fn splice(node: NodeRef<'_>, meta: &Meta) -> Option<String> {
    let text = meta.text.as_ref()?;
    let source = text.source();
    let mut out = String::new();
    let mut cursor = text.start();
    for child in node.children() {
        let slot = child.meta().slot.as_ref()?;
        if !text.contains(slot) || slot.start() < cursor {
            return None;
        }
        push_gap(&mut out, source, cursor, slot.start(), &meta.elided);
        print_into(child, &mut out);
        cursor = slot.end();
    }
    push_gap(&mut out, source, cursor, text.end(), &meta.elided);
    Some(out)
}

fn push_gap(out: &mut String, source: &str, from: usize, to: usize, elided: &[std::ops::Range<usize>]) {
    let mut pos = from;
    let mut skipped: Vec<_> = elided
        .iter()
        .filter(|range| range.start < to && range.end > from)
        .collect();
    skipped.sort_by_key(|range| range.start);
    for range in skipped {
        if range.start > pos {
            out.push_str(&source[pos..range.start]);
        }
        pos = pos.max(range.end);
    }
    if pos < to {
        out.push_str(&source[pos..to]);
    }
}

fn join<'a, T: 'a>(out: &mut String, items: impl IntoIterator<Item = &'a T>, separator: &str)
where
    &'a T: Into<NodeRef<'a>>,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        print_into(item.into(), out);
    }
}

fn print_modifiers(out: &mut String, modifiers: &[Modifier]) {
    for modifier in modifiers {
        print_into(NodeRef::Modifier(modifier), out);
        out.push(' ');
    }
}

fn print_structure(node: NodeRef<'_>, out: &mut String) {
    match node {
        NodeRef::Unit(unit) => {
            if let Some(package) = &unit.package {
                print_into(NodeRef::Package(package), out);
                out.push_str("\n\n");
            }
            if !unit.imports.is_empty() {
                join(out, &unit.imports, "\n");
                out.push_str("\n\n");
            }
            join(out, &unit.types, "\n\n");
            out.push('\n');
        }
        NodeRef::Package(package) => {
            out.push_str("package ");
            out.push_str(&package.name);
            out.push(';');
        }
        NodeRef::Import(import) => {
            out.push_str("import ");
            if import.is_static {
                out.push_str("static ");
            }
            out.push_str(&import.name);
            if import.wildcard {
                out.push_str(".*");
            }
            out.push(';');
        }
        NodeRef::Class(class) => {
            print_modifiers(out, &class.modifiers);
            out.push_str(class.kind.keyword());
            out.push(' ');
            print_into(NodeRef::Identifier(&class.name), out);
            if let Some(type_params) = &class.type_params {
                print_into(NodeRef::Opaque(type_params), out);
            }
            if !class.extends.is_empty() {
                out.push_str(" extends ");
                join(out, &class.extends, ", ");
            }
            if !class.implements.is_empty() {
                out.push_str(" implements ");
                join(out, &class.implements, ", ");
            }
            out.push(' ');
            print_into(NodeRef::ClassBody(&class.body), out);
        }
        NodeRef::ClassBody(body) => {
            out.push_str("{\n");
            for member in &body.members {
                print_into(member.into(), out);
                out.push('\n');
            }
            out.push('}');
        }
        NodeRef::Method(method) => {
            print_modifiers(out, &method.modifiers);
            if let Some(type_params) = &method.type_params {
                print_into(NodeRef::Opaque(type_params), out);
                out.push(' ');
            }
            if let Some(return_type) = &method.return_type {
                print_into(NodeRef::Type(return_type), out);
                out.push(' ');
            }
            print_into(NodeRef::Identifier(&method.name), out);
            out.push('(');
            join(out, &method.params, ", ");
            out.push(')');
            if !method.throws.is_empty() {
                out.push_str(" throws ");
                join(out, &method.throws, ", ");
            }
            match &method.body {
                Some(body) => {
                    out.push(' ');
                    print_into(NodeRef::Block(body), out);
                }
                None => out.push(';'),
            }
        }
        NodeRef::Modifier(Modifier::Keyword { keyword, .. }) => out.push_str(keyword),
        NodeRef::Modifier(Modifier::Annotation(annotation)) => {
            out.push('@');
            out.push_str(&annotation.name);
            if let Some(arguments) = &annotation.arguments {
                print_into(NodeRef::Opaque(arguments), out);
            }
        }
        NodeRef::VariableDecls(decls) => {
            print_modifiers(out, &decls.modifiers);
            match &decls.type_expr {
                Some(type_expr) => print_into(NodeRef::Type(type_expr), out),
                None => out.push_str("var"),
            }
            if decls.varargs {
                out.push_str("...");
            }
            out.push(' ');
            join(out, &decls.vars, ", ");
        }
        NodeRef::Variable(var) => {
            print_into(NodeRef::Identifier(&var.name), out);
            if let Some(initializer) = &var.initializer {
                out.push_str(" = ");
                print_into(NodeRef::Expression(initializer), out);
            }
        }
        NodeRef::Block(block) => {
            out.push_str("{\n");
            for statement in &block.statements {
                let start = out.len();
                print_into(statement.into(), out);
                let terminated = out[start..].trim_end().ends_with([';', '}']);
                if matches!(statement, Statement::Expression(_) | Statement::LocalVars(_)) && !terminated {
                    out.push(';');
                }
                out.push('\n');
            }
            out.push('}');
        }
        NodeRef::Expression(expr) => print_expression(expr, out),
        NodeRef::Identifier(ident) => out.push_str(&ident.name),
        NodeRef::Type(ty) => match &ty.kind {
            TypeTreeKind::Named(name) => out.push_str(name),
            TypeTreeKind::Parameterized { base, args } => {
                print_into(NodeRef::Type(base), out);
                out.push('<');
                join(out, args, ", ");
                out.push('>');
            }
            TypeTreeKind::Wildcard(None) => out.push('?'),
            TypeTreeKind::Wildcard(Some((kind, bound))) => {
                out.push_str(match kind {
                    crate::tree::BoundKind::Extends => "? extends ",
                    crate::tree::BoundKind::Super => "? super ",
                });
                print_into(NodeRef::Type(bound), out);
            }
            TypeTreeKind::Array(elem) => {
                print_into(NodeRef::Type(elem), out);
                out.push_str("[]");
            }
            TypeTreeKind::Primitive(p) => out.push_str(p.keyword()),
        },
        NodeRef::Opaque(opaque) => join(out, &opaque.children, " "),
    }
}

fn print_expression(expr: &Expression, out: &mut String) {
    match expr {
        Expression::Identifier(ident) => out.push_str(&ident.name),
        Expression::Literal(literal) => out.push_str(&literal.value),
        Expression::FieldAccess(access) => {
            print_into(NodeRef::Expression(&access.target), out);
            out.push('.');
            print_into(NodeRef::Identifier(&access.name), out);
        }
        Expression::MethodInvocation(call) => {
            if let Some(select) = &call.select {
                print_into(NodeRef::Expression(select), out);
                out.push('.');
            }
            if !call.type_args.is_empty() {
                out.push('<');
                join(out, &call.type_args, ", ");
                out.push('>');
            }
            print_into(NodeRef::Identifier(&call.name), out);
            out.push('(');
            join(out, &call.args, ", ");
            out.push(')');
        }
        Expression::NewClass(new_class) => {
            out.push_str("new ");
            print_into(NodeRef::Type(&new_class.class), out);
            out.push('(');
            join(out, &new_class.args, ", ");
            out.push(')');
            if let Some(body) = &new_class.body {
                out.push(' ');
                print_into(NodeRef::ClassBody(body), out);
            }
        }
        Expression::Lambda(lambda) => {
            print_into(NodeRef::Opaque(&lambda.params), out);
            out.push_str(" -> ");
            match &lambda.body {
                LambdaBody::Expression(body) => print_into(NodeRef::Expression(body), out),
                LambdaBody::Block(body) => print_into(NodeRef::Block(body), out),
            }
        }
        Expression::MemberReference(reference) => {
            print_into(NodeRef::Expression(&reference.target), out);
            out.push_str("::");
            match &reference.name {
                Some(name) => print_into(NodeRef::Identifier(name), out),
                None => out.push_str("new"),
            }
        }
        Expression::Assignment(assignment) => {
            print_into(NodeRef::Expression(&assignment.target), out);
            out.push(' ');
            out.push_str(&assignment.operator);
            out.push(' ');
            print_into(NodeRef::Expression(&assignment.value), out);
        }
        Expression::TypeCast(cast) => {
            out.push('(');
            print_into(NodeRef::Type(&cast.class), out);
            out.push_str(") ");
            print_into(NodeRef::Expression(&cast.expr), out);
        }
        Expression::Parens(parens) => {
            out.push('(');
            print_into(NodeRef::Expression(&parens.inner), out);
            out.push(')');
        }
        Expression::Other(opaque) => join(out, &opaque.children, " "),
    }
}
