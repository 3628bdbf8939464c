//! Collects class declarations into [`ClassInfo`]s
//!
//! Runs before lowering so that a unit's own classes, and stub classes that
//! reference each other, are known while types are attributed.

use super::names::{ImportHeader, KnownTypes, NameScope, Resolver, child_of_kind, is_type_kind, named_children, qualify};
use crate::classpath::{ClassInfo, FieldInfo, MethodInfo, TypeKind};
use crate::tree::{JavaType, Primitive};
use std::sync::Arc;
use tree_sitter::Node;

pub(crate) const TYPE_DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

pub(crate) fn is_type_declaration(kind: &str) -> bool {
    TYPE_DECLARATION_KINDS.contains(&kind)
}

/// Package and imports of a file
#[derive(Debug, Clone, Default)]
pub(crate) struct Header {
    pub package: String,
    pub imports: Vec<ImportHeader>,
}

pub(crate) fn read_header(root: Node<'_>, source: &str) -> Header {
    let mut header = Header::default();
    for child in named_children(root) {
        match child.kind() {
            "package_declaration" => {
                if let Some(name) = named_children(child)
                    .into_iter()
                    .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
                {
                    header.package = source[name.byte_range()].to_string();
                }
            }
            "import_declaration" => {
                let Some(name) = named_children(child)
                    .into_iter()
                    .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
                else {
                    continue;
                };
                header.imports.push(ImportHeader {
                    name: source[name.byte_range()].to_string(),
                    is_static: child_of_kind(child, "static").is_some(),
                    wildcard: child_of_kind(child, "asterisk").is_some(),
                });
            }
            _ => {}
        }
    }
    header
}

/// A type declaration found in a file, with its naming context
pub(crate) struct TypeDecl<'t> {
    pub fqn: String,
    pub node: Node<'t>,
    /// Binary names of the enclosing classes, outermost first
    pub enclosing: Vec<String>,
    /// Type variables of the enclosing classes
    pub outer_type_vars: Vec<String>,
}

pub(crate) fn simple_name(node: Node<'_>, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .map(|name| source[name.byte_range()].to_string())
}

/// Names of the type parameters declared on `node`
pub(crate) fn type_param_names(node: Node<'_>, source: &str) -> Vec<String> {
    let Some(params) = node.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    named_children(params)
        .into_iter()
        .filter(|p| p.kind() == "type_parameter")
        .filter_map(|p| {
            named_children(p)
                .into_iter()
                .find(|c| matches!(c.kind(), "identifier" | "type_identifier"))
                .map(|c| source[c.byte_range()].to_string())
        })
        .collect()
}

/// Members of a class, interface, enum or annotation body, flattening enum
/// body declarations
pub(crate) fn body_members<'t>(body: Node<'t>) -> Vec<Node<'t>> {
    let mut members = Vec::new();
    for child in named_children(body) {
        if child.kind() == "enum_body_declarations" {
            members.extend(named_children(child));
        } else {
            members.push(child);
        }
    }
    members
}

/// Every named type declaration in the file, nested ones included, in
/// source order. Local and anonymous classes are found during lowering.
pub(crate) fn collect_types<'t>(root: Node<'t>, source: &str, package: &str) -> Vec<TypeDecl<'t>> {
    let mut out = Vec::new();
    for child in named_children(root) {
        if is_type_declaration(child.kind()) {
            collect_nested(child, source, package, None, &[], &[], &mut out);
        }
    }
    out
}

fn collect_nested<'t>(
    node: Node<'t>,
    source: &str,
    package: &str,
    parent: Option<&str>,
    enclosing: &[String],
    outer_type_vars: &[String],
    out: &mut Vec<TypeDecl<'t>>,
) {
    let Some(name) = simple_name(node, source) else {
        return;
    };
    let fqn = match parent {
        Some(parent) => format!("{}${}", parent, name),
        None => qualify(package, &name),
    };
    out.push(TypeDecl {
        fqn: fqn.clone(),
        node,
        enclosing: enclosing.to_vec(),
        outer_type_vars: outer_type_vars.to_vec(),
    });

    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    let mut inner_enclosing = enclosing.to_vec();
    inner_enclosing.push(fqn.clone());
    let mut inner_vars = outer_type_vars.to_vec();
    inner_vars.extend(type_param_names(node, source));
    for member in body_members(body) {
        if is_type_declaration(member.kind()) {
            collect_nested(member, source, package, Some(&fqn), &inner_enclosing, &inner_vars, out);
        }
    }
}

/// Naming context for building one class's info
pub(crate) struct DeclContext<'a> {
    pub scope: &'a NameScope,
    pub known: &'a dyn KnownTypes,
    pub source: &'a Arc<str>,
}

fn has_modifier(node: Node<'_>, keyword: &str) -> bool {
    child_of_kind(node, "modifiers").is_some_and(|mods| child_of_kind(mods, keyword).is_some())
}

/// Builds the info of a named class declaration
pub(crate) fn class_info(decl: &TypeDecl<'_>, ctx: &DeclContext<'_>) -> ClassInfo {
    let node = decl.node;
    let source = ctx.source.as_ref();
    let kind = match node.kind() {
        "interface_declaration" | "annotation_type_declaration" => TypeKind::Interface,
        _ => TypeKind::Class,
    };
    let type_params = type_param_names(node, source);

    let mut classes = decl.enclosing.clone();
    classes.push(decl.fqn.clone());
    let mut type_vars = decl.outer_type_vars.clone();
    type_vars.extend(type_params.iter().cloned());
    let resolver = Resolver {
        scope: ctx.scope,
        classes: &classes,
        type_vars: &type_vars,
        known: ctx.known,
    };

    let mut info = ClassInfo::empty(decl.fqn.clone(), kind);
    info.type_params = type_params;
    let (superclass, interfaces) = supertypes(node, &resolver, ctx.source);
    info.superclass = superclass;
    info.interfaces = interfaces;

    if node.kind() == "record_declaration"
        && let Some(params) = node.child_by_field_name("parameters")
    {
        let components = parameters(params, &resolver, ctx.source);
        for (name, ty) in &components.params {
            info.fields.push(FieldInfo {
                name: name.clone(),
                ty: ty.clone(),
                is_static: false,
            });
            info.methods.push(MethodInfo {
                name: name.clone(),
                type_params: Vec::new(),
                params: Vec::new(),
                return_type: ty.clone(),
                varargs: false,
                is_static: false,
            });
        }
        info.constructors.push(MethodInfo {
            name: "<init>".to_string(),
            type_params: Vec::new(),
            params: components.params.into_iter().map(|(_, ty)| ty).collect(),
            return_type: JavaType::Primitive(Primitive::Void),
            varargs: components.varargs,
            is_static: false,
        });
    }

    if let Some(body) = node.child_by_field_name("body") {
        let self_type = info.self_type();
        add_members(&mut info, body, kind, &self_type, &resolver, ctx.source);
    }
    info
}

/// Builds the info of an anonymous class body extending or implementing
/// `supertype`
pub(crate) fn anonymous_info(
    fqn: &str,
    supertype: Option<JavaType>,
    supertype_is_interface: bool,
    body: Node<'_>,
    resolver: &Resolver<'_>,
    source: &Arc<str>,
) -> ClassInfo {
    let mut info = ClassInfo::empty(fqn, TypeKind::Class);
    match supertype {
        Some(ty) if supertype_is_interface => info.interfaces.push(ty),
        other => info.superclass = other,
    }
    let self_type = info.self_type();
    add_members(&mut info, body, TypeKind::Class, &self_type, resolver, source);
    info
}

/// Builds the info of a local class declared inside a method body
pub(crate) fn local_class_info(fqn: &str, node: Node<'_>, resolver: &Resolver<'_>, source: &Arc<str>) -> ClassInfo {
    let kind = match node.kind() {
        "interface_declaration" => TypeKind::Interface,
        _ => TypeKind::Class,
    };
    let mut info = ClassInfo::empty(fqn, kind);
    info.type_params = type_param_names(node, source);
    let (superclass, interfaces) = supertypes(node, resolver, source);
    info.superclass = superclass;
    info.interfaces = interfaces;
    if let Some(body) = node.child_by_field_name("body") {
        let self_type = info.self_type();
        add_members(&mut info, body, kind, &self_type, resolver, source);
    }
    info
}

fn supertypes(node: Node<'_>, resolver: &Resolver<'_>, source: &Arc<str>) -> (Option<JavaType>, Vec<JavaType>) {
    let mut superclass = None;
    let mut interfaces = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "superclass" => {
                superclass = named_children(child)
                    .into_iter()
                    .find(|c| is_type_kind(c.kind()))
                    .and_then(|c| resolver.java_type(c, source));
            }
            "super_interfaces" | "extends_interfaces" => {
                let list = child_of_kind(child, "type_list").unwrap_or(child);
                interfaces.extend(
                    named_children(list)
                        .into_iter()
                        .filter(|c| is_type_kind(c.kind()))
                        .filter_map(|c| resolver.java_type(c, source)),
                );
            }
            _ => {}
        }
    }
    (superclass, interfaces)
}

struct Parameters {
    params: Vec<(String, JavaType)>,
    varargs: bool,
}

fn parameters(node: Node<'_>, resolver: &Resolver<'_>, source: &Arc<str>) -> Parameters {
    let mut out = Parameters {
        params: Vec::new(),
        varargs: false,
    };
    for param in named_children(node) {
        match param.kind() {
            "formal_parameter" => {
                let name = simple_name(param, source).unwrap_or_default();
                let mut ty = param
                    .child_by_field_name("type")
                    .and_then(|t| resolver.java_type(t, source))
                    .unwrap_or(JavaType::Unknown);
                if let Some(dims) = param.child_by_field_name("dimensions") {
                    for _ in 0..source[dims.byte_range()].matches('[').count() {
                        ty = JavaType::Array(Box::new(ty));
                    }
                }
                out.params.push((name, ty));
            }
            "spread_parameter" => {
                let ty = named_children(param)
                    .into_iter()
                    .find(|c| is_type_kind(c.kind()))
                    .and_then(|t| resolver.java_type(t, source))
                    .unwrap_or(JavaType::Unknown);
                let name = child_of_kind(param, "variable_declarator")
                    .and_then(|d| simple_name(d, source))
                    .unwrap_or_default();
                out.params.push((name, JavaType::Array(Box::new(ty))));
                out.varargs = true;
            }
            _ => {}
        }
    }
    out
}

fn add_members(
    info: &mut ClassInfo,
    body: Node<'_>,
    kind: TypeKind,
    self_type: &JavaType,
    resolver: &Resolver<'_>,
    source: &Arc<str>,
) {
    let in_interface = kind == TypeKind::Interface;
    for member in body_members(body) {
        match member.kind() {
            "method_declaration" | "constructor_declaration" | "annotation_type_element_declaration" => {
                let method_vars = type_param_names(member, source);
                let mut type_vars = resolver.type_vars.to_vec();
                type_vars.extend(method_vars.iter().cloned());
                let inner = Resolver {
                    scope: resolver.scope,
                    classes: resolver.classes,
                    type_vars: &type_vars,
                    known: resolver.known,
                };
                let params = member
                    .child_by_field_name("parameters")
                    .map(|p| parameters(p, &inner, source))
                    .unwrap_or(Parameters {
                        params: Vec::new(),
                        varargs: false,
                    });
                let is_constructor = member.kind() == "constructor_declaration";
                let return_type = if is_constructor {
                    JavaType::Primitive(Primitive::Void)
                } else {
                    member
                        .child_by_field_name("type")
                        .and_then(|t| inner.java_type(t, source))
                        .unwrap_or(JavaType::Unknown)
                };
                let method = MethodInfo {
                    name: if is_constructor {
                        "<init>".to_string()
                    } else {
                        simple_name(member, source).unwrap_or_default()
                    },
                    type_params: method_vars,
                    params: params.params.into_iter().map(|(_, ty)| ty).collect(),
                    return_type,
                    varargs: params.varargs,
                    is_static: has_modifier(member, "static"),
                };
                if is_constructor {
                    info.constructors.push(method);
                } else {
                    info.methods.push(method);
                }
            }
            "field_declaration" | "constant_declaration" => {
                let Some(base) = member
                    .child_by_field_name("type")
                    .and_then(|t| resolver.java_type(t, source))
                else {
                    continue;
                };
                let is_static = in_interface || has_modifier(member, "static");
                for declarator in named_children(member)
                    .into_iter()
                    .filter(|c| c.kind() == "variable_declarator")
                {
                    let Some(name) = simple_name(declarator, source) else {
                        continue;
                    };
                    let mut ty = base.clone();
                    if let Some(dims) = declarator.child_by_field_name("dimensions") {
                        for _ in 0..source[dims.byte_range()].matches('[').count() {
                            ty = JavaType::Array(Box::new(ty));
                        }
                    }
                    info.fields.push(FieldInfo { name, ty, is_static });
                }
            }
            "enum_constant" => {
                if let Some(name) = simple_name(member, source) {
                    info.fields.push(FieldInfo {
                        name,
                        ty: self_type.clone(),
                        is_static: true,
                    });
                }
            }
            _ => {}
        }
    }
}
