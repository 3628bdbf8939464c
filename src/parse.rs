#![forbid(unsafe_code)]

//! Java front end
//!
//! Source text is parsed with tree-sitter and lowered into the typed syntax
//! tree of [`crate::tree`]. Lowering runs in two phases: the class
//! declarations of the unit are collected and registered in the [`TypeEnv`]
//! first, then every node is built with its type attributed against the
//! classpath and those declarations.

mod declare;
mod lower;
pub(crate) mod names;

pub use names::{ImportHeader, KnownTypes, NameScope};

use crate::classpath::{ClassInfo, TypeEnv};
use crate::error::ParseError;
use crate::tree::{CompilationUnit, VariableRef};
use declare::{DeclContext, TypeDecl};
use lower::Lowerer;
use names::Either;
use std::collections::HashSet;
use std::sync::Arc;
use tree_sitter::{Node, Tree};

/// A tree-sitter parser configured for Java
pub struct JavaParser {
    parser: tree_sitter::Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .map_err(|e| ParseError::Grammar(e.to_string()))?;
        Ok(JavaParser { parser })
    }

    /// Parses `source` into a concrete syntax tree, which may contain error
    /// nodes
    pub fn parse(&mut self, source: &str) -> Result<Tree, ParseError> {
        self.parser.parse(source, None).ok_or(ParseError::NoTree)
    }

    /// Parses `source`, rejecting trees with syntax errors
    pub fn parse_strict(&mut self, source: &str) -> Result<Tree, ParseError> {
        let tree = self.parse(source)?;
        if let Some(error) = first_error(tree.root_node()) {
            let position = error.start_position();
            return Err(ParseError::Syntax {
                line: position.row + 1,
                column: position.column + 1,
            });
        }
        Ok(tree)
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .find_map(first_error)
        .or(Some(node))
}

/// Parses a compilation unit and attributes its types
///
/// Classes declared by the unit are registered in `env`, replacing those of
/// the previously parsed unit.
pub fn parse_unit(source: &str, env: &mut TypeEnv) -> Result<CompilationUnit, ParseError> {
    let source: Arc<str> = Arc::from(source);
    let tree = JavaParser::new()?.parse_strict(&source)?;
    let root = tree.root_node();

    env.clear_local();
    let header = declare::read_header(root, &source);
    let scope = NameScope::new(&header.package, &header.imports);
    let decls = declare::collect_types(root, &source, &header.package);
    let names: HashSet<String> = decls.iter().map(|decl| decl.fqn.clone()).collect();
    let infos = build_infos(&decls, &scope, &Either(&names, &*env), &source);
    for info in infos {
        env.declare(info);
    }

    let mut lowerer = Lowerer::new(Arc::clone(&source), env, scope);
    Ok(lowerer.unit(root))
}

fn build_infos(
    decls: &[TypeDecl<'_>],
    scope: &NameScope,
    known: &dyn KnownTypes,
    source: &Arc<str>,
) -> Vec<ClassInfo> {
    let ctx = DeclContext { scope, known, source };
    decls.iter().map(|decl| declare::class_info(decl, &ctx)).collect()
}

/// Collects the class declarations of stub sources given as
/// `(file name, source)` pairs
pub fn declare_stubs(sources: &[(String, String)]) -> Result<Vec<ClassInfo>, ParseError> {
    declare_stubs_with(sources, &HashSet::new())
}

/// Like [`declare_stubs`], resolving names against `known` classes as well
///
/// Stub files with syntax errors are declared as far as they parse.
pub fn declare_stubs_with(
    sources: &[(String, String)],
    known: &dyn KnownTypes,
) -> Result<Vec<ClassInfo>, ParseError> {
    let mut parser = JavaParser::new()?;
    let mut parsed = Vec::with_capacity(sources.len());
    for (name, text) in sources {
        let tree = parser.parse(text)?;
        if tree.root_node().has_error() {
            tracing::debug!(file = %name, "stub source has syntax errors");
        }
        parsed.push((Arc::<str>::from(text.as_str()), tree));
    }

    let mut files = Vec::with_capacity(parsed.len());
    let mut names = HashSet::new();
    for (source, tree) in &parsed {
        let root = tree.root_node();
        let header = declare::read_header(root, source);
        let decls = declare::collect_types(root, source, &header.package);
        names.extend(decls.iter().map(|decl| decl.fqn.clone()));
        files.push((NameScope::new(&header.package, &header.imports), decls, source));
    }

    let known = Either(&names, known);
    Ok(files
        .iter()
        .flat_map(|(scope, decls, source)| build_infos(decls, scope, &known, source))
        .collect())
}

/// Naming context a snippet is parsed in
#[derive(Debug, Clone, Default)]
pub struct SnippetContext {
    pub package: String,
    pub imports: Vec<ImportHeader>,
    /// Binary names of the classes the snippet is placed in, outermost first
    pub enclosing: Vec<String>,
    /// Variables visible to the snippet
    pub bindings: Vec<(String, VariableRef)>,
}

/// Parses a snippet wrapped in a single class declaration
///
/// The wrapper class stands in for the innermost enclosing class: members
/// declared in it belong to that class, and `this` has its type. Classes in
/// `env` are left as they are, apart from anonymous and local classes the
/// snippet declares.
pub(crate) fn parse_snippet(
    source: &str,
    ctx: &SnippetContext,
    env: &mut TypeEnv,
) -> Result<CompilationUnit, ParseError> {
    let source: Arc<str> = Arc::from(source);
    let tree = JavaParser::new()?.parse_strict(&source)?;
    let mut scope = NameScope::new(&ctx.package, &[]);
    for import in &ctx.imports {
        scope.add_import(import);
    }
    let mut lowerer = Lowerer::new(Arc::clone(&source), env, scope);
    lowerer.enter_snippet(&ctx.enclosing, &ctx.bindings);
    Ok(lowerer.unit(tree.root_node()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::TypeTable;
    use crate::tree::{Expression, JavaType, Member, NodeRef, Statement, print};

    fn env() -> TypeEnv {
        TypeEnv::new(Arc::new(TypeTable::builtin().unwrap()))
    }

    fn calls(unit: &CompilationUnit) -> Vec<&crate::tree::MethodInvocation> {
        NodeRef::Unit(unit)
            .descendants()
            .into_iter()
            .filter_map(|node| match node {
                NodeRef::Expression(Expression::MethodInvocation(call)) => Some(call),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_unit_prints_verbatim() {
        let source = "package a;\n\nimport java.util.List;\n\n// comment\nclass A {\n    int x = 1 + 2; /* trailing */\n    void m(List<String> items) { for (String s : items) { System.out.println(s); } }\n}\n";
        let mut env = env();
        let unit = parse_unit(source, &mut env).unwrap();
        assert_eq!(print(&unit), source);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let mut env = env();
        let err = parse_unit("class A { void m( }", &mut env).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_invocation_types_are_attributed() {
        let source = "import java.util.*;\nclass A {\n  void m(List<String> items) {\n    items.add(\"x\");\n    String first = items.get(0);\n    List<Integer> nums = List.of(1, 2);\n  }\n}\n";
        let mut env = env();
        let unit = parse_unit(source, &mut env).unwrap();
        let calls = calls(&unit);

        let add = calls[0].method_type.as_ref().unwrap();
        assert_eq!(add.declaring_type, "java.util.List");
        assert_eq!(add.parameter_types[0], JavaType::class("java.lang.String"));

        assert_eq!(calls[1].ty, Some(JavaType::class("java.lang.String")));
        assert_eq!(calls[2].ty.as_ref().unwrap().to_string(), "java.util.List<java.lang.Integer>");
    }

    #[test]
    fn test_parameters_resolve_to_their_declaration() {
        let source = "import java.util.List;\nclass A {\n  void m(List<String> items) { items.size(); }\n}\n";
        let mut env = env();
        let unit = parse_unit(source, &mut env).unwrap();
        let Member::Class(class) = &unit.types[0] else { panic!() };
        let Member::Method(method) = &class.body.members[0] else { panic!() };
        let param_id = method.params[0].vars[0].meta.id;

        let body = method.body.as_ref().unwrap();
        let Statement::Expression(Expression::MethodInvocation(call)) = &body.statements[0] else {
            panic!()
        };
        let receiver = call.select.as_deref().and_then(Expression::as_variable).unwrap();
        assert_eq!(receiver.decl, Some(param_id));
        assert_eq!(method.method_type.as_ref().unwrap().declaring_type, "A");
    }

    #[test]
    fn test_unit_classes_are_declared() {
        let source = "package p;\nimport org.springframework.batch.item.ItemWriter;\nimport java.util.List;\nclass W implements ItemWriter<String> {\n  public void write(List<? extends String> items) {}\n}\n";
        let mut env = env();
        parse_unit(source, &mut env).unwrap();
        assert!(env.is_subtype("p.W", "org.springframework.batch.item.ItemWriter"));
    }

    #[test]
    fn test_anonymous_class_is_declared() {
        let source = "import org.springframework.batch.item.*;\nimport java.util.List;\nclass A {\n  ItemWriter<String> w = new ItemWriter<String>() {\n    public void write(List<? extends String> items) {}\n  };\n}\n";
        let mut env = env();
        let unit = parse_unit(source, &mut env).unwrap();
        let Member::Class(class) = &unit.types[0] else { panic!() };
        let Member::Field(field) = &class.body.members[0] else { panic!() };
        let Some(Expression::NewClass(new_class)) = &field.vars[0].initializer else { panic!() };
        assert_eq!(new_class.anonymous.as_deref(), Some("A$1"));
        assert!(env.is_subtype("A$1", "org.springframework.batch.item.ItemWriter"));
    }

    #[test]
    fn test_snippet_sees_bindings_and_enclosing_class() {
        let mut env = env();
        parse_unit("class Host { java.util.List<String> names; }", &mut env).unwrap();
        let ctx = SnippetContext {
            enclosing: vec!["Host".to_string()],
            bindings: vec![(
                "__tpl0".to_string(),
                VariableRef {
                    name: "__tpl0".to_string(),
                    kind: crate::tree::VarKind::Local,
                    ty: Some(JavaType::class("java.lang.String")),
                    decl: None,
                },
            )],
            ..Default::default()
        };
        let unit = parse_snippet(
            "class __Template { Object __value = names.add(__tpl0); }",
            &ctx,
            &mut env,
        )
        .unwrap();
        let call = calls(&unit)[0];
        assert_eq!(call.ty, Some(JavaType::Primitive(crate::tree::Primitive::Boolean)));
    }

    #[test]
    fn test_stubs_may_reference_each_other_across_files() {
        let sources = vec![
            ("b.java".to_string(), "package b; public class B extends a.A {}".to_string()),
            ("a.java".to_string(), "package a; public class A {}".to_string()),
        ];
        let infos = declare_stubs(&sources).unwrap();
        let b = infos.iter().find(|info| info.fqn == "b.B").unwrap();
        assert_eq!(b.superclass, Some(JavaType::class("a.A")));
    }
}
