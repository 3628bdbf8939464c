#![forbid(unsafe_code)]

//! Resolved Java types attached to syntax nodes
//!
//! A missing annotation (`Option::None` on a node) means the front end could
//! not resolve the type at all. [`JavaType::Unknown`] only appears nested inside
//! an otherwise resolved type, e.g. `List<Unknown>` for `List<Missing>`.

use std::collections::HashMap;
use std::fmt;

/// Fully qualified name of `java.lang.Object`
pub const OBJECT: &str = "java.lang.Object";

/// Primitive types, including `void`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    /// Looks up a primitive by its Java keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let primitive = match keyword {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "char" => Primitive::Char,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "void" => Primitive::Void,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }

    /// The wrapper class used when this primitive is boxed
    pub fn boxed(self) -> Option<&'static str> {
        match self {
            Primitive::Boolean => Some("java.lang.Boolean"),
            Primitive::Byte => Some("java.lang.Byte"),
            Primitive::Char => Some("java.lang.Character"),
            Primitive::Short => Some("java.lang.Short"),
            Primitive::Int => Some("java.lang.Integer"),
            Primitive::Long => Some("java.lang.Long"),
            Primitive::Float => Some("java.lang.Float"),
            Primitive::Double => Some("java.lang.Double"),
            Primitive::Void => None,
        }
    }
}

/// Direction of a wildcard bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    Extends,
    Super,
}

/// A resolved Java type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JavaType {
    /// A class or interface used without type arguments
    Class(String),
    /// A generic class or interface with type arguments
    Parameterized { fqn: String, args: Vec<JavaType> },
    /// A type variable such as `T`
    TypeVar(String),
    /// `?`, `? extends X` or `? super X`
    Wildcard(Option<(BoundKind, Box<JavaType>)>),
    Array(Box<JavaType>),
    Primitive(Primitive),
    /// The type of the `null` literal
    Null,
    /// A nested component the front end could not resolve
    Unknown,
}

impl JavaType {
    pub fn class(fqn: impl Into<String>) -> Self {
        JavaType::Class(fqn.into())
    }

    /// Returns the fully qualified name of a class or parameterized type
    pub fn fqn(&self) -> Option<&str> {
        match self {
            JavaType::Class(fqn) | JavaType::Parameterized { fqn, .. } => Some(fqn),
            _ => None,
        }
    }

    /// Type arguments of a parameterized type (empty otherwise)
    pub fn type_args(&self) -> &[JavaType] {
        match self {
            JavaType::Parameterized { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, JavaType::Primitive(_))
    }

    /// True if this is exactly the given class, with or without type arguments
    pub fn is_of_class_type(&self, fqn: &str) -> bool {
        self.fqn() == Some(fqn)
    }

    /// Name of the erased type as used in method signatures, e.g. `java.util.List`
    /// or `int[]`. Type variables erase to `java.lang.Object`.
    pub fn erased_name(&self) -> Option<String> {
        match self {
            JavaType::Class(fqn) | JavaType::Parameterized { fqn, .. } => Some(fqn.clone()),
            JavaType::TypeVar(_) => Some(OBJECT.to_string()),
            JavaType::Wildcard(Some((BoundKind::Extends, bound))) => bound.erased_name(),
            JavaType::Wildcard(_) => Some(OBJECT.to_string()),
            JavaType::Array(elem) => elem.erased_name().map(|name| format!("{}[]", name)),
            JavaType::Primitive(p) => Some(p.keyword().to_string()),
            JavaType::Null | JavaType::Unknown => None,
        }
    }

    /// Replaces type variables bound in `bindings`
    pub fn substitute(&self, bindings: &HashMap<String, JavaType>) -> JavaType {
        if bindings.is_empty() {
            return self.clone();
        }
        match self {
            JavaType::TypeVar(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            JavaType::Parameterized { fqn, args } => JavaType::Parameterized {
                fqn: fqn.clone(),
                args: args.iter().map(|arg| arg.substitute(bindings)).collect(),
            },
            JavaType::Wildcard(Some((kind, bound))) => {
                JavaType::Wildcard(Some((*kind, Box::new(bound.substitute(bindings)))))
            }
            JavaType::Array(elem) => JavaType::Array(Box::new(elem.substitute(bindings))),
            other => other.clone(),
        }
    }

    /// The upper bound of a wildcard, or the type itself
    pub fn upper_bound(&self) -> &JavaType {
        match self {
            JavaType::Wildcard(Some((BoundKind::Extends, bound))) => bound.upper_bound(),
            other => other,
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Class(fqn) => write!(f, "{}", fqn),
            JavaType::Parameterized { fqn, args } => {
                write!(f, "{}<", fqn)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            JavaType::TypeVar(name) => write!(f, "{}", name),
            JavaType::Wildcard(None) => write!(f, "?"),
            JavaType::Wildcard(Some((BoundKind::Extends, bound))) => write!(f, "? extends {}", bound),
            JavaType::Wildcard(Some((BoundKind::Super, bound))) => write!(f, "? super {}", bound),
            JavaType::Array(elem) => write!(f, "{}[]", elem),
            JavaType::Primitive(p) => write!(f, "{}", p.keyword()),
            JavaType::Null => write!(f, "null"),
            JavaType::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// The resolved signature of a method or constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodType {
    /// Class that declares the method
    pub declaring_type: String,
    pub name: String,
    /// Parameter types after substitution of the receiver's type arguments
    pub parameter_types: Vec<JavaType>,
    pub return_type: JavaType,
    pub varargs: bool,
}

impl MethodType {
    /// Formal type for the argument at `index`, using the component type for
    /// trailing varargs positions
    pub fn parameter_type_at(&self, index: usize) -> Option<JavaType> {
        let last = self.parameter_types.len().checked_sub(1)?;
        let formal = &self.parameter_types[index.min(last)];
        if self.varargs
            && index >= last
            && let JavaType::Array(component) = formal
        {
            return Some((**component).clone());
        }
        Some(formal.clone())
    }
}

/// What kind of variable an identifier refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Field,
    Local,
    Parameter,
}

/// Resolved reference from an identifier to the variable it names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef {
    pub name: String,
    pub kind: VarKind,
    pub ty: Option<JavaType>,
    /// Node id of the declaring variable, when declared in the same unit
    pub decl: Option<crate::tree::NodeId>,
}
