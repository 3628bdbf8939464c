//! Fully qualified type names given in recipe options
//!
//! `java.util.function.Supplier<? extends org.example.User>[]` is turned into
//! a type tree written with simple names (`Supplier<? extends User>[]`), its
//! resolved type, and the imports the simple names need. Nested classes are
//! written with `$`, e.g. `java.util.Map$Entry`, and printed as `Map.Entry`.

use crate::error::RecipeError;
use crate::tree::{BoundKind, JavaType, Meta, Primitive, TypeTree, TypeTreeKind};

/// A type parsed from a recipe option
#[derive(Debug, Clone)]
pub struct TypeName {
    /// Type tree using simple names, with no source position
    pub tree: TypeTree,
    pub ty: JavaType,
    /// Classes to import for the simple names
    pub imports: Vec<String>,
}

impl TypeName {
    pub fn parse(text: &str) -> Result<Self, RecipeError> {
        let mut parser = Parser {
            text,
            tokens: tokenize(text),
            pos: 0,
            imports: Vec::new(),
        };
        let (tree, ty) = parser.parse_type()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error());
        }
        Ok(TypeName {
            tree,
            ty,
            imports: parser.imports,
        })
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() || matches!(c, '_' | '$' | '.') {
            start.get_or_insert(i);
            continue;
        }
        if let Some(s) = start.take() {
            tokens.push(&text[s..i]);
        }
        if !c.is_whitespace() {
            tokens.push(&text[i..i + c.len_utf8()]);
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    tokens
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<&'a str>,
    pos: usize,
    imports: Vec<String>,
}

impl<'a> Parser<'a> {
    fn error(&self) -> RecipeError {
        RecipeError::InvalidTypeName(self.text.to_string())
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> Result<(TypeTree, JavaType), RecipeError> {
        let name = self.peek().ok_or_else(|| self.error())?;
        self.pos += 1;
        let (mut tree, mut ty) = if let Some(primitive) = Primitive::from_keyword(name) {
            (node(TypeTreeKind::Primitive(primitive)), JavaType::Primitive(primitive))
        } else {
            self.class_type(name)?
        };
        while self.eat("[") {
            if !self.eat("]") {
                return Err(self.error());
            }
            tree = node(TypeTreeKind::Array(Box::new(tree)));
            ty = JavaType::Array(Box::new(ty));
        }
        Ok((tree, ty))
    }

    fn class_type(&mut self, fqn: &str) -> Result<(TypeTree, JavaType), RecipeError> {
        let valid = fqn.split(['.', '$']).all(|segment| {
            segment
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_')
        });
        if !valid {
            return Err(self.error());
        }
        // Top-level class: everything before the first `$`
        let top_level = fqn.split('$').next().unwrap_or(fqn);
        let simple = top_level.rsplit('.').next().unwrap_or(top_level);
        let written = match fqn.split_once('$') {
            Some((_, nested)) => format!("{}.{}", simple, nested.replace('$', ".")),
            None => simple.to_string(),
        };
        if top_level.contains('.') && !self.imports.iter().any(|import| import == top_level) {
            self.imports.push(top_level.to_string());
        }
        let base = node(TypeTreeKind::Named(written));

        if !self.eat("<") {
            return Ok((base, JavaType::class(fqn)));
        }
        let mut trees = Vec::new();
        let mut types = Vec::new();
        loop {
            let (tree, ty) = self.type_argument()?;
            trees.push(tree);
            types.push(ty);
            if self.eat(">") {
                break;
            }
            if !self.eat(",") {
                return Err(self.error());
            }
        }
        Ok((
            node(TypeTreeKind::Parameterized {
                base: Box::new(base),
                args: trees,
            }),
            JavaType::Parameterized {
                fqn: fqn.to_string(),
                args: types,
            },
        ))
    }

    fn type_argument(&mut self) -> Result<(TypeTree, JavaType), RecipeError> {
        if !self.eat("?") {
            return self.parse_type();
        }
        let kind = if self.eat("extends") {
            BoundKind::Extends
        } else if self.eat("super") {
            BoundKind::Super
        } else {
            return Ok((node(TypeTreeKind::Wildcard(None)), JavaType::Wildcard(None)));
        };
        let (bound_tree, bound) = self.parse_type()?;
        Ok((
            node(TypeTreeKind::Wildcard(Some((kind, Box::new(bound_tree))))),
            JavaType::Wildcard(Some((kind, Box::new(bound)))),
        ))
    }
}

fn node(kind: TypeTreeKind) -> TypeTree {
    TypeTree {
        meta: Meta::synthetic(),
        kind,
        ty: None,
    }
}
