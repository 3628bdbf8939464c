#![forbid(unsafe_code)]

//! Class declarations available to type attribution
//!
//! A [`TypeTable`] is built from Java *stub sources*: ordinary Java files of
//! which only the declarations matter. A built-in stub set for the JDK and the
//! migrated library APIs is embedded in the crate; more stub directories can
//! be loaded from disk.

mod env;

pub use env::TypeEnv;

use crate::error::ParseError;
use crate::tree::{JavaType, MethodType};
use std::collections::HashMap;
use std::path::Path;

/// Built-in stubs, one file per package
const BUILTIN_STUBS: &[(&str, &str)] = &[
    ("java/lang.java", include_str!("classpath/stubs/java/lang.java")),
    ("java/io.java", include_str!("classpath/stubs/java/io.java")),
    ("java/util.java", include_str!("classpath/stubs/java/util.java")),
    ("java/util/function.java", include_str!("classpath/stubs/java/util/function.java")),
    ("java/util/stream.java", include_str!("classpath/stubs/java/util/stream.java")),
    (
        "org/springframework/batch/item.java",
        include_str!("classpath/stubs/org/springframework/batch/item.java"),
    ),
    (
        "org/springframework/batch/item/support.java",
        include_str!("classpath/stubs/org/springframework/batch/item/support.java"),
    ),
    (
        "org/springframework/batch/core.java",
        include_str!("classpath/stubs/org/springframework/batch/core.java"),
    ),
    (
        "org/springframework/batch/core/configuration/annotation.java",
        include_str!("classpath/stubs/org/springframework/batch/core/configuration/annotation.java"),
    ),
    (
        "org/springframework/batch/core/step/builder.java",
        include_str!("classpath/stubs/org/springframework/batch/core/step/builder.java"),
    ),
    (
        "org/springframework/security/core.java",
        include_str!("classpath/stubs/org/springframework/security/core.java"),
    ),
    (
        "org/springframework/security/authorization.java",
        include_str!("classpath/stubs/org/springframework/security/authorization.java"),
    ),
    (
        "org/springframework/security/web/access/intercept.java",
        include_str!("classpath/stubs/org/springframework/security/web/access/intercept.java"),
    ),
];

/// Whether a declaration is a class or an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
}

/// Declared shape of a class or interface
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Binary name, `Outer$Inner` for nested classes
    pub fqn: String,
    pub kind: TypeKind,
    pub type_params: Vec<String>,
    pub superclass: Option<JavaType>,
    pub interfaces: Vec<JavaType>,
    pub methods: Vec<MethodInfo>,
    pub constructors: Vec<MethodInfo>,
    pub fields: Vec<FieldInfo>,
}

impl ClassInfo {
    /// A class with no members, extending `Object`
    pub fn empty(fqn: impl Into<String>, kind: TypeKind) -> Self {
        ClassInfo {
            fqn: fqn.into(),
            kind,
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// The type of `this` inside the class
    pub fn self_type(&self) -> JavaType {
        if self.type_params.is_empty() {
            JavaType::Class(self.fqn.clone())
        } else {
            JavaType::Parameterized {
                fqn: self.fqn.clone(),
                args: self
                    .type_params
                    .iter()
                    .map(|name| JavaType::TypeVar(name.clone()))
                    .collect(),
            }
        }
    }

    /// Direct supertypes as declared
    pub fn supertypes(&self) -> impl Iterator<Item = &JavaType> {
        self.superclass.iter().chain(self.interfaces.iter())
    }

    pub fn declares_method(&self, name: &str, arity: usize) -> bool {
        self.methods
            .iter()
            .any(|m| m.name == name && m.params.len() == arity)
    }
}

/// A declared method or constructor
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<JavaType>,
    pub return_type: JavaType,
    pub varargs: bool,
    pub is_static: bool,
}

impl MethodInfo {
    /// The signature with `bindings` applied, as seen from `declaring_type`
    pub fn method_type(&self, declaring_type: &str, bindings: &HashMap<String, JavaType>) -> MethodType {
        MethodType {
            declaring_type: declaring_type.to_string(),
            name: self.name.clone(),
            parameter_types: self.params.iter().map(|p| p.substitute(bindings)).collect(),
            return_type: self.return_type.substitute(bindings),
            varargs: self.varargs,
        }
    }
}

/// A declared field
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub ty: JavaType,
    pub is_static: bool,
}

/// All classes known to the classpath, by binary name
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    classes: HashMap<String, ClassInfo>,
}

impl TypeTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedded JDK and library stubs
    pub fn builtin() -> Result<Self, ParseError> {
        let sources: Vec<(String, String)> = BUILTIN_STUBS
            .iter()
            .map(|(name, source)| (name.to_string(), source.to_string()))
            .collect();
        Self::from_sources(&sources)
    }

    /// Builds a table from `(file name, stub source)` pairs
    ///
    /// The sources are declared together, so stubs may reference each other
    /// regardless of order.
    pub fn from_sources(sources: &[(String, String)]) -> Result<Self, ParseError> {
        let mut table = TypeTable::new();
        table.extend(crate::parse::declare_stubs(sources)?);
        Ok(table)
    }

    /// Loads every `.java` file under `dir` as a stub source, in addition to
    /// the classes already in the table
    pub fn load_dir(&mut self, dir: &Path) -> Result<(), crate::error::RewriteError> {
        let mut sources = Vec::new();
        for entry in ignore::WalkBuilder::new(dir).standard_filters(false).build() {
            let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "java") && path.is_file() {
                let source = std::fs::read_to_string(path)?;
                sources.push((path.display().to_string(), source));
            }
        }
        sources.sort_by(|a, b| a.0.cmp(&b.0));

        let known: std::collections::HashSet<String> = self.classes.keys().cloned().collect();
        let infos = crate::parse::declare_stubs_with(&sources, &known).map_err(|source| {
            crate::error::RewriteError::Parse {
                file: dir.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(dir = %dir.display(), classes = infos.len(), "loaded stub directory");
        self.extend(infos);
        Ok(())
    }

    pub fn insert(&mut self, info: ClassInfo) {
        self.classes.insert(info.fqn.clone(), info);
    }

    pub fn get(&self, fqn: &str) -> Option<&ClassInfo> {
        self.classes.get(fqn)
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.classes.contains_key(fqn)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

impl Extend<ClassInfo> for TypeTable {
    fn extend<I: IntoIterator<Item = ClassInfo>>(&mut self, iter: I) {
        for info in iter {
            self.insert(info);
        }
    }
}
