//! Node types of the Java syntax tree
//!
//! Only the shapes recipes look into are modelled precisely. Everything else
//! is kept as an [`Opaque`] node that still exposes its typed children, so
//! visitors and scanners reach expressions nested in loops, conditionals and
//! other statements the model does not spell out.

use super::java_type::{BoundKind, JavaType, MethodType, Primitive, VariableRef};
use super::{Meta, NodeId};

/// A parsed `.java` file
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub meta: Meta,
    pub package: Option<PackageDecl>,
    pub imports: Vec<Import>,
    /// Top-level type declarations
    pub types: Vec<Member>,
}

impl CompilationUnit {
    pub fn package_name(&self) -> &str {
        self.package.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }

    /// Top-level and nested classes, depth first
    pub fn classes(&self) -> Vec<&ClassDecl> {
        fn collect<'a>(members: &'a [Member], out: &mut Vec<&'a ClassDecl>) {
            for member in members {
                if let Member::Class(class) = member {
                    out.push(class);
                    collect(&class.body.members, out);
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.types, &mut out);
        out
    }
}

#[derive(Debug, Clone)]
pub struct PackageDecl {
    pub meta: Meta,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Import {
    pub meta: Meta,
    /// Qualified name without the trailing `.*`
    pub name: String,
    pub is_static: bool,
    pub wildcard: bool,
}

impl Import {
    /// Simple name brought into scope by a single-type import
    pub fn simple_name(&self) -> Option<&str> {
        if self.wildcard {
            return None;
        }
        self.name.rsplit('.').next()
    }

    /// Package (or outer type) part of the imported name
    pub fn package(&self) -> &str {
        if self.wildcard {
            return &self.name;
        }
        self.name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Record,
}

impl ClassKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Record => "record",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub meta: Meta,
    pub modifiers: Vec<Modifier>,
    pub kind: ClassKind,
    pub name: Identifier,
    pub type_params: Option<Opaque>,
    pub extends: Vec<TypeTree>,
    pub implements: Vec<TypeTree>,
    pub body: ClassBody,
    /// Binary name, `Outer$Inner` for nested classes
    pub fqn: String,
}

#[derive(Debug, Clone)]
pub struct ClassBody {
    pub meta: Meta,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone)]
pub enum Member {
    Method(MethodDecl),
    Field(VariableDecls),
    Class(ClassDecl),
    Other(Opaque),
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub meta: Meta,
    pub modifiers: Vec<Modifier>,
    pub type_params: Option<Opaque>,
    /// `None` for constructors
    pub return_type: Option<TypeTree>,
    pub name: Identifier,
    pub params: Vec<VariableDecls>,
    pub throws: Vec<TypeTree>,
    pub body: Option<Block>,
    pub method_type: Option<MethodType>,
}

impl MethodDecl {
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.modifiers.iter().filter_map(|m| match m {
            Modifier::Annotation(a) => Some(a),
            Modifier::Keyword { .. } => None,
        })
    }

    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }
}

#[derive(Debug, Clone)]
pub enum Modifier {
    Keyword { meta: Meta, keyword: String },
    Annotation(Annotation),
}

impl Modifier {
    pub fn meta(&self) -> &Meta {
        match self {
            Modifier::Keyword { meta, .. } => meta,
            Modifier::Annotation(a) => &a.meta,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub meta: Meta,
    /// Name as written, e.g. `Override` or `org.junit.Test`
    pub name: String,
    /// Annotation arguments, kept as written
    pub arguments: Option<Opaque>,
    pub ty: Option<JavaType>,
}

/// Declaration of one or more variables sharing a type: fields, locals and
/// method parameters
#[derive(Debug, Clone)]
pub struct VariableDecls {
    pub meta: Meta,
    pub modifiers: Vec<Modifier>,
    /// `None` for `var` and implicitly typed lambda parameters
    pub type_expr: Option<TypeTree>,
    pub varargs: bool,
    pub vars: Vec<NamedVariable>,
}

#[derive(Debug, Clone)]
pub struct NamedVariable {
    pub meta: Meta,
    pub name: Identifier,
    pub initializer: Option<Expression>,
    pub variable: Option<VariableRef>,
}

impl NamedVariable {
    pub fn ty(&self) -> Option<&JavaType> {
        self.variable.as_ref().and_then(|v| v.ty.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub meta: Meta,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Block(Block),
    LocalVars(VariableDecls),
    Expression(Expression),
    Class(ClassDecl),
    Other(Opaque),
}

impl Statement {
    pub fn meta(&self) -> &Meta {
        match self {
            Statement::Block(b) => &b.meta,
            Statement::LocalVars(v) => &v.meta,
            Statement::Expression(e) => e.meta(),
            Statement::Class(c) => &c.meta,
            Statement::Other(o) => &o.meta,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    Identifier(Identifier),
    Literal(Literal),
    FieldAccess(FieldAccess),
    MethodInvocation(MethodInvocation),
    NewClass(NewClass),
    Lambda(Lambda),
    MemberReference(MemberReference),
    Assignment(Assignment),
    TypeCast(TypeCast),
    Parens(Parens),
    Other(Opaque),
}

impl Expression {
    pub fn meta(&self) -> &Meta {
        match self {
            Expression::Identifier(e) => &e.meta,
            Expression::Literal(e) => &e.meta,
            Expression::FieldAccess(e) => &e.meta,
            Expression::MethodInvocation(e) => &e.meta,
            Expression::NewClass(e) => &e.meta,
            Expression::Lambda(e) => &e.meta,
            Expression::MemberReference(e) => &e.meta,
            Expression::Assignment(e) => &e.meta,
            Expression::TypeCast(e) => &e.meta,
            Expression::Parens(e) => &e.meta,
            Expression::Other(e) => &e.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        match self {
            Expression::Identifier(e) => &mut e.meta,
            Expression::Literal(e) => &mut e.meta,
            Expression::FieldAccess(e) => &mut e.meta,
            Expression::MethodInvocation(e) => &mut e.meta,
            Expression::NewClass(e) => &mut e.meta,
            Expression::Lambda(e) => &mut e.meta,
            Expression::MemberReference(e) => &mut e.meta,
            Expression::Assignment(e) => &mut e.meta,
            Expression::TypeCast(e) => &mut e.meta,
            Expression::Parens(e) => &mut e.meta,
            Expression::Other(e) => &mut e.meta,
        }
    }

    pub fn id(&self) -> NodeId {
        self.meta().id
    }

    /// Static type of the expression, `None` when unresolved
    pub fn ty(&self) -> Option<&JavaType> {
        match self {
            Expression::Identifier(e) => e.ty.as_ref(),
            Expression::Literal(e) => e.ty.as_ref(),
            Expression::FieldAccess(e) => e.ty.as_ref(),
            Expression::MethodInvocation(e) => e.ty.as_ref(),
            Expression::NewClass(e) => e.ty.as_ref(),
            Expression::Assignment(e) => e.ty.as_ref(),
            Expression::TypeCast(e) => e.ty.as_ref(),
            Expression::Parens(e) => e.inner.ty(),
            Expression::Lambda(_) | Expression::MemberReference(_) | Expression::Other(_) => None,
        }
    }

    /// The variable an identifier refers to, if any
    pub fn as_variable(&self) -> Option<&VariableRef> {
        match self {
            Expression::Identifier(ident) => ident.variable.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub meta: Meta,
    pub name: String,
    pub ty: Option<JavaType>,
    /// Set when the identifier names a variable
    pub variable: Option<VariableRef>,
}

impl Identifier {
    /// A new identifier with no source position
    pub fn synthetic(name: impl Into<String>) -> Self {
        Identifier {
            meta: Meta::synthetic(),
            name: name.into(),
            ty: None,
            variable: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub meta: Meta,
    /// Literal as written in source
    pub value: String,
    pub ty: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub struct FieldAccess {
    pub meta: Meta,
    pub target: Box<Expression>,
    pub name: Identifier,
    pub ty: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub struct MethodInvocation {
    pub meta: Meta,
    pub select: Option<Box<Expression>>,
    /// Explicit type arguments, as in `Collections.<String>emptyList()`
    pub type_args: Vec<TypeTree>,
    pub name: Identifier,
    pub args: Vec<Expression>,
    pub method_type: Option<MethodType>,
    pub ty: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub struct NewClass {
    pub meta: Meta,
    pub class: TypeTree,
    pub args: Vec<Expression>,
    pub body: Option<ClassBody>,
    /// Binary name of the anonymous class declared by `body`
    pub anonymous: Option<String>,
    pub constructor_type: Option<MethodType>,
    pub ty: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub struct Lambda {
    pub meta: Meta,
    pub params: Opaque,
    pub body: LambdaBody,
}

#[derive(Debug, Clone)]
pub enum LambdaBody {
    Expression(Box<Expression>),
    Block(Block),
}

#[derive(Debug, Clone)]
pub struct MemberReference {
    pub meta: Meta,
    pub target: Box<Expression>,
    /// `None` for `Type::new`
    pub name: Option<Identifier>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub meta: Meta,
    pub target: Box<Expression>,
    pub operator: String,
    pub value: Box<Expression>,
    pub ty: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub struct TypeCast {
    pub meta: Meta,
    pub class: TypeTree,
    pub expr: Box<Expression>,
    pub ty: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub struct Parens {
    pub meta: Meta,
    pub inner: Box<Expression>,
}

/// A construct with no dedicated node type, keeping its typed children
#[derive(Debug, Clone)]
pub struct Opaque {
    pub meta: Meta,
    /// tree-sitter node kind, e.g. `if_statement`
    pub kind: String,
    pub children: Vec<Tree>,
}

/// Child of an [`Opaque`] node
#[derive(Debug, Clone)]
pub enum Tree {
    Statement(Statement),
    Expression(Expression),
    Type(TypeTree),
    Opaque(Opaque),
}

/// A type as written in source
#[derive(Debug, Clone)]
pub struct TypeTree {
    pub meta: Meta,
    pub kind: TypeTreeKind,
    pub ty: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub enum TypeTreeKind {
    /// Simple or qualified name, e.g. `List` or `java.util.List`
    Named(String),
    Parameterized {
        base: Box<TypeTree>,
        args: Vec<TypeTree>,
    },
    Wildcard(Option<(BoundKind, Box<TypeTree>)>),
    Array(Box<TypeTree>),
    Primitive(Primitive),
}

impl TypeTree {
    /// Type arguments written on a parameterized type, empty otherwise
    pub fn type_args(&self) -> &[TypeTree] {
        match &self.kind {
            TypeTreeKind::Parameterized { args, .. } => args,
            _ => &[],
        }
    }

    /// Every name written in this type expression, outermost first
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            TypeTreeKind::Named(name) => out.push(name),
            TypeTreeKind::Parameterized { base, args } => {
                base.collect_names(out);
                for arg in args {
                    arg.collect_names(out);
                }
            }
            TypeTreeKind::Wildcard(Some((_, bound))) => bound.collect_names(out),
            TypeTreeKind::Array(elem) => elem.collect_names(out),
            TypeTreeKind::Wildcard(None) | TypeTreeKind::Primitive(_) => {}
        }
    }
}
