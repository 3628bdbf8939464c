#![forbid(unsafe_code)]

//! Immutable Java syntax tree, resolved types and the lossless printer
//!
//! Nodes remember the text they were parsed from (`text`) and the region of
//! their parent's text they occupy (`slot`). Printing copies untouched text
//! verbatim and splices rewritten children into their slots, so a rewrite only
//! changes the bytes it actually replaced.

pub mod java_type;
mod node;
mod print;

pub use java_type::{BoundKind, JavaType, MethodType, Primitive, VarKind, VariableRef};
pub use node::{
    Annotation, Assignment, Block, ClassBody, ClassDecl, ClassKind, CompilationUnit,
    Expression, FieldAccess, Identifier, Import, Lambda, LambdaBody, Literal, Member,
    MemberReference, MethodDecl, MethodInvocation, Modifier, NamedVariable, NewClass, Opaque,
    PackageDecl, Parens, Statement, Tree, TypeCast, TypeTree, TypeTreeKind, VariableDecls,
};
pub use print::{NodeRef, print};

use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a syntax node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocates a new, never before used id
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A byte range of a shared source text
#[derive(Clone)]
pub struct Slice {
    source: Arc<str>,
    range: Range<usize>,
}

impl Slice {
    pub fn new(source: Arc<str>, range: Range<usize>) -> Self {
        Slice { source, range }
    }

    /// Slice covering the whole source
    pub fn whole(source: Arc<str>) -> Self {
        let len = source.len();
        Slice {
            source,
            range: 0..len,
        }
    }

    /// The text covered by this slice
    pub fn as_str(&self) -> &str {
        &self.source[self.range.clone()]
    }

    /// The complete source this slice points into
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn shared_source(&self) -> &Arc<str> {
        &self.source
    }

    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn same_source(&self, other: &Slice) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }

    /// True if `other` lies within this slice of the same source
    pub fn contains(&self, other: &Slice) -> bool {
        self.same_source(other) && other.start() >= self.start() && other.end() <= self.end()
    }

    /// A zero-width slice at `pos` of the same source
    pub fn empty_at(&self, pos: usize) -> Slice {
        Slice {
            source: Arc::clone(&self.source),
            range: pos..pos,
        }
    }

    /// Line terminator of the source, taken from its first line break
    pub fn line_ending(&self) -> &'static str {
        match self.source.find('\n') {
            Some(i) if self.source[..i].ends_with('\r') => "\r\n",
            _ => "\n",
        }
    }

    /// Whitespace between the start of the line and the start of this slice
    pub fn line_indent(&self) -> String {
        let before = &self.source[..self.range.start];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        before[line_start..]
            .chars()
            .take_while(|c| c.is_whitespace())
            .collect()
    }
}

impl PartialEq for Slice {
    fn eq(&self, other: &Self) -> bool {
        self.same_source(other) && self.range == other.range
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.as_str(), self.range)
    }
}

/// Identity and source bookkeeping shared by every node
#[derive(Debug, Clone)]
pub struct Meta {
    pub id: NodeId,
    /// Text this node was parsed from, `None` for synthesized nodes
    pub text: Option<Slice>,
    /// Region of the parent's text this node occupies
    pub slot: Option<Slice>,
    /// Ranges of `text` left out when printing (removed children)
    pub elided: Vec<Range<usize>>,
    /// Printed before the node, used for nodes inserted at an empty slot
    pub leading: String,
    /// Printed after the node, used for nodes inserted at an empty slot
    pub trailing: String,
}

impl Meta {
    /// Metadata for a node parsed from `slice`
    pub fn parsed(slice: Slice) -> Self {
        Meta {
            id: NodeId::fresh(),
            text: Some(slice.clone()),
            slot: Some(slice),
            elided: Vec::new(),
            leading: String::new(),
            trailing: String::new(),
        }
    }

    /// Metadata for a node with no source position
    pub fn synthetic() -> Self {
        Meta {
            id: NodeId::fresh(),
            text: None,
            slot: None,
            elided: Vec::new(),
            leading: String::new(),
            trailing: String::new(),
        }
    }

    /// Metadata for a synthesized node taking the place of `old`
    pub fn replacing(old: &Meta) -> Self {
        Meta {
            slot: old.slot.clone(),
            ..Meta::synthetic()
        }
    }

    /// Keeps this node's own text but places it where `old` was
    pub fn moved_to(mut self, old: &Meta) -> Self {
        self.slot = old.slot.clone();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_unique() {
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn test_slice_containment() {
        let source: Arc<str> = Arc::from("class A { void m() {} }");
        let whole = Slice::whole(Arc::clone(&source));
        let inner = Slice::new(Arc::clone(&source), 10..21);
        assert!(whole.contains(&inner));
        assert!(!inner.contains(&whole));
        assert_eq!(inner.as_str(), "void m() {}");

        let other: Arc<str> = Arc::from("class A { void m() {} }");
        let foreign = Slice::new(other, 10..21);
        assert!(!whole.contains(&foreign));
    }

    #[test]
    fn test_line_indent() {
        let source: Arc<str> = Arc::from("class A {\n    void m() {}\n}");
        let method = Slice::new(Arc::clone(&source), 14..25);
        assert_eq!(method.as_str(), "void m() {}");
        assert_eq!(method.line_indent(), "    ");
    }

    #[test]
    fn test_replacing_keeps_slot_only() {
        let source: Arc<str> = Arc::from("foo(bar)");
        let parsed = Meta::parsed(Slice::new(source, 4..7));
        let replacement = Meta::replacing(&parsed);
        assert!(replacement.text.is_none());
        assert_eq!(replacement.slot, parsed.slot);
        assert_ne!(replacement.id, parsed.id);
    }
}
