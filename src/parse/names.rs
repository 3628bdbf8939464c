//! Resolution of type names written in source

use crate::classpath::TypeEnv;
use crate::tree::{BoundKind, JavaType, Meta, NodeId, Primitive, Slice, TypeTree, TypeTreeKind};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tree_sitter::Node;

/// Answers whether a binary class name exists
pub trait KnownTypes {
    fn is_known(&self, fqn: &str) -> bool;
}

impl KnownTypes for HashSet<String> {
    fn is_known(&self, fqn: &str) -> bool {
        self.contains(fqn)
    }
}

impl KnownTypes for TypeEnv {
    fn is_known(&self, fqn: &str) -> bool {
        self.contains(fqn)
    }
}

/// Names known to either of two sources
pub(crate) struct Either<'a>(pub &'a dyn KnownTypes, pub &'a dyn KnownTypes);

impl KnownTypes for Either<'_> {
    fn is_known(&self, fqn: &str) -> bool {
        self.0.is_known(fqn) || self.1.is_known(fqn)
    }
}

/// An import as read from a file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportHeader {
    pub name: String,
    pub is_static: bool,
    pub wildcard: bool,
}

impl ImportHeader {
    pub fn single(name: impl Into<String>) -> Self {
        ImportHeader {
            name: name.into(),
            is_static: false,
            wildcard: false,
        }
    }
}

/// Names visible in a compilation unit through its package and imports
#[derive(Debug, Clone, Default)]
pub struct NameScope {
    package: String,
    single: HashMap<String, String>,
    on_demand: Vec<String>,
    static_single: HashMap<String, String>,
    static_on_demand: Vec<String>,
}

pub(crate) fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package, name)
    }
}

impl NameScope {
    pub fn new(package: &str, imports: &[ImportHeader]) -> Self {
        let mut scope = NameScope {
            package: package.to_string(),
            ..Default::default()
        };
        for import in imports {
            scope.add_import(import);
        }
        scope
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn add_import(&mut self, import: &ImportHeader) {
        match (import.is_static, import.wildcard) {
            (false, false) => {
                let simple = import.name.rsplit('.').next().unwrap_or(&import.name);
                self.single.insert(simple.to_string(), import.name.clone());
            }
            (false, true) => self.on_demand.push(import.name.clone()),
            (true, false) => {
                if let Some((owner, member)) = import.name.rsplit_once('.') {
                    self.static_single.insert(member.to_string(), owner.to_string());
                }
            }
            (true, true) => self.static_on_demand.push(import.name.clone()),
        }
    }

    /// Classes that may own a statically imported member `name`
    pub fn static_owners(&self, name: &str) -> Vec<String> {
        self.static_single
            .get(name)
            .into_iter()
            .chain(self.static_on_demand.iter())
            .cloned()
            .collect()
    }

    /// Resolves a simple or qualified class name to its binary name
    ///
    /// `enclosing` lists the binary names of the enclosing classes, outermost
    /// first. Qualified names that are not known but look like fully qualified
    /// names are returned as written.
    pub fn resolve(&self, name: &str, enclosing: &[String], known: &dyn KnownTypes) -> Option<String> {
        let Some((first, rest)) = name.split_once('.') else {
            return self.resolve_simple(name, enclosing, known);
        };

        if let Some(outer) = self.resolve_simple(first, enclosing, known) {
            let nested = format!("{}${}", outer, rest.replace('.', "$"));
            if known.is_known(&nested) {
                return Some(nested);
            }
        }

        let segments: Vec<&str> = name.split('.').collect();
        for split in 1..segments.len() {
            let candidate = format!("{}.{}", segments[..split].join("."), segments[split..].join("$"));
            if known.is_known(&candidate) {
                return Some(candidate);
            }
        }

        if first.starts_with(|c: char| c.is_ascii_lowercase()) {
            Some(name.to_string())
        } else {
            None
        }
    }

    fn resolve_simple(&self, name: &str, enclosing: &[String], known: &dyn KnownTypes) -> Option<String> {
        for class in enclosing.iter().rev() {
            let nested = format!("{}${}", class, name);
            if known.is_known(&nested) {
                return Some(nested);
            }
        }

        if let Some(fqn) = self.single.get(name) {
            return Some(binary_name(fqn, known));
        }

        let same_package = qualify(&self.package, name);
        if known.is_known(&same_package) {
            return Some(same_package);
        }

        for prefix in &self.on_demand {
            for candidate in [format!("{}.{}", prefix, name), format!("{}${}", prefix, name)] {
                if known.is_known(&candidate) {
                    return Some(candidate);
                }
            }
        }

        let lang = format!("java.lang.{}", name);
        if known.is_known(&lang) {
            return Some(lang);
        }
        None
    }
}

/// Maps a dotted name like `java.util.Map.Entry` to the binary name
/// `java.util.Map$Entry` when only the latter is known
fn binary_name(fqn: &str, known: &dyn KnownTypes) -> String {
    if known.is_known(fqn) {
        return fqn.to_string();
    }
    let segments: Vec<&str> = fqn.split('.').collect();
    for split in (1..segments.len()).rev() {
        let candidate = format!("{}.{}", segments[..split].join("."), segments[split..].join("$"));
        if known.is_known(&candidate) {
            return candidate;
        }
    }
    fqn.to_string()
}

/// Turns type nodes of the concrete syntax tree into [`TypeTree`]s and
/// [`JavaType`]s in one naming context
pub(crate) struct Resolver<'a> {
    pub scope: &'a NameScope,
    pub classes: &'a [String],
    pub type_vars: &'a [String],
    pub known: &'a dyn KnownTypes,
}

pub(crate) const TYPE_KINDS: &[&str] = &[
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "void_type",
    "annotated_type",
    "wildcard",
];

pub(crate) fn is_type_kind(kind: &str) -> bool {
    TYPE_KINDS.contains(&kind)
}

pub(crate) fn is_comment(kind: &str) -> bool {
    matches!(kind, "line_comment" | "block_comment" | "comment")
}

/// Named children, skipping comments
pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    (0..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .filter(|child| !is_comment(child.kind()))
        .collect()
}

/// First direct child of the given kind, named or not
pub(crate) fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .find(|child| child.kind() == kind)
}

impl Resolver<'_> {
    /// Resolves a name used as a type: a type variable or a class
    pub fn named(&self, name: &str) -> Option<JavaType> {
        if self.type_vars.iter().any(|v| v == name) {
            return Some(JavaType::TypeVar(name.to_string()));
        }
        self.scope
            .resolve(name, self.classes, self.known)
            .map(JavaType::Class)
    }

    /// The resolved type of a type node
    pub fn java_type(&self, node: Node<'_>, source: &Arc<str>) -> Option<JavaType> {
        self.type_tree(node, source).and_then(|tree| tree.ty)
    }

    /// Lowers a type node. Returns `None` for nodes that are not types.
    pub fn type_tree(&self, node: Node<'_>, source: &Arc<str>) -> Option<TypeTree> {
        let meta = Meta::parsed(Slice::new(Arc::clone(source), node.byte_range()));
        let text = &source[node.byte_range()];
        let tree = match node.kind() {
            "type_identifier" | "identifier" => TypeTree {
                meta,
                ty: self.named(text),
                kind: TypeTreeKind::Named(text.to_string()),
            },
            "scoped_type_identifier" | "scoped_identifier" => {
                let name: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                TypeTree {
                    meta,
                    ty: self.named(&strip_type_args(&name)),
                    kind: TypeTreeKind::Named(name),
                }
            }
            "generic_type" => {
                let children = named_children(node);
                let base = children
                    .iter()
                    .find(|c| c.kind() != "type_arguments")
                    .and_then(|c| self.type_tree(*c, source))?;
                let args: Vec<TypeTree> = children
                    .iter()
                    .find(|c| c.kind() == "type_arguments")
                    .map(|list| {
                        named_children(*list)
                            .into_iter()
                            .filter_map(|arg| self.type_tree(arg, source))
                            .collect()
                    })
                    .unwrap_or_default();
                let ty = match base.ty.as_ref().and_then(JavaType::fqn) {
                    Some(fqn) if !args.is_empty() => Some(JavaType::Parameterized {
                        fqn: fqn.to_string(),
                        args: args
                            .iter()
                            .map(|a| a.ty.clone().unwrap_or(JavaType::Unknown))
                            .collect(),
                    }),
                    _ => base.ty.clone(),
                };
                TypeTree {
                    meta,
                    ty,
                    kind: TypeTreeKind::Parameterized {
                        base: Box::new(base),
                        args,
                    },
                }
            }
            "wildcard" => {
                let bound_kind = if child_of_kind(node, "super").is_some() {
                    BoundKind::Super
                } else {
                    BoundKind::Extends
                };
                let bound = named_children(node)
                    .into_iter()
                    .filter(|c| is_type_kind(c.kind()))
                    .find_map(|c| self.type_tree(c, source));
                let ty = match &bound {
                    Some(b) => JavaType::Wildcard(Some((
                        bound_kind,
                        Box::new(b.ty.clone().unwrap_or(JavaType::Unknown)),
                    ))),
                    None => JavaType::Wildcard(None),
                };
                TypeTree {
                    meta,
                    ty: Some(ty),
                    kind: TypeTreeKind::Wildcard(bound.map(|b| (bound_kind, Box::new(b)))),
                }
            }
            "array_type" => {
                let element = node
                    .child_by_field_name("element")
                    .and_then(|e| self.type_tree(e, source))?;
                let depth = node
                    .child_by_field_name("dimensions")
                    .map(|d| source[d.byte_range()].matches('[').count())
                    .unwrap_or(1)
                    .max(1);
                let mut tree = element;
                for _ in 0..depth {
                    let level = Meta {
                        id: NodeId::fresh(),
                        ..meta.clone()
                    };
                    tree = TypeTree {
                        meta: level,
                        ty: tree.ty.clone().map(|t| JavaType::Array(Box::new(t))),
                        kind: TypeTreeKind::Array(Box::new(tree)),
                    };
                }
                tree
            }
            "integral_type" | "floating_point_type" | "boolean_type" | "void_type" => {
                let primitive = Primitive::from_keyword(text.trim())?;
                TypeTree {
                    meta,
                    ty: Some(JavaType::Primitive(primitive)),
                    kind: TypeTreeKind::Primitive(primitive),
                }
            }
            "annotated_type" => {
                let inner = named_children(node)
                    .into_iter()
                    .filter(|c| is_type_kind(c.kind()))
                    .last()?;
                return self.type_tree(inner, source);
            }
            _ => return None,
        };
        Some(tree)
    }
}

/// `Outer<String>.Inner` becomes `Outer.Inner`
fn strip_type_args(name: &str) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}
