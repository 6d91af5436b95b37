//! The AST context: a single arena owning every [`Node`] in a compilation.
//!
//! The AST is full of back-edges (a field points at its owning unit type; a
//! resolved operator points at the `Operator` it bound to), so nodes are
//! addressed by stable numeric handle rather than owning pointer. [`NodeId`]
//! is that handle: an index into [`AstContext`]'s arena. Resolution writes
//! `NodeId`s; dropping the context frees every node at once.
//!
//! `set<Field>`-style updates don't mutate a node in place — they allocate a
//! new slot with the field replaced and return the new `NodeId`. Anyone
//! still holding the old `NodeId` keeps seeing the old node, i.e. a
//! structurally-shared copy.

use crate::decl::Declaration;
use crate::expr::Expression;
use crate::module::Module;
use crate::scope::ScopeId;
use crate::stmt::Statement;
use crate::ty::QualifiedType;
use spicy_base::Span;
use std::collections::HashMap;

/// A stable handle into an [`AstContext`]'s node arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The tagged-union payload of a [`Node`]: a closed enum plus tag-indexed
/// functions replaces open-ended virtual inheritance.
pub enum NodeKind {
    Module(Module),
    Declaration(Declaration),
    Statement(Statement),
    Expression(Expression),
    Type(QualifiedType),
}

impl NodeKind {
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Module(_) => "module",
            NodeKind::Declaration(d) => d.tag(),
            NodeKind::Statement(s) => s.tag(),
            NodeKind::Expression(e) => e.tag(),
            NodeKind::Type(_) => "type",
        }
    }
}

/// A universal AST element: a tagged payload plus source location, lexical
/// scope and a bag of side-channel diagnostic properties.
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub scope: Option<ScopeId>,
    pub properties: HashMap<&'static str, String>,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Node {
            kind,
            span,
            scope: None,
            properties: HashMap::new(),
        }
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    pub fn set_property(&mut self, key: &'static str, value: impl Into<String>) {
        self.properties.insert(key, value.into());
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|s| s.as_str())
    }
}

/// Owns every [`Node`] produced while compiling one or more modules.
///
/// One context is shared across the whole pipeline: parsing allocates nodes
/// into it, the resolver rewrites declarations by allocating replacement
/// nodes and updating parent references, and code generation reads from it
/// without owning it.
#[derive(Default)]
pub struct AstContext {
    nodes: Vec<Node>,
}

impl AstContext {
    pub fn new() -> Self {
        AstContext { nodes: Vec::new() }
    }

    /// Allocates `node` a fresh slot and returns its handle.
    ///
    /// Unlike a deduplicating interner, every call allocates a fresh slot:
    /// AST nodes are identified by position in the parse/resolve pipeline,
    /// not by structural value, so two textually identical declarations at
    /// different source locations must keep distinct identities.
    pub fn create(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Replaces the node at `id`'s *logical* position with the result of
    /// `f`, but — matching the "structurally shared copy" contract — this
    /// allocates a brand-new slot and returns its id rather than mutating
    /// `id` in place. Callers that need the rewritten node to be visible
    /// through old references must store the new id back into whatever
    /// structure held `id`.
    pub fn set<F>(&mut self, id: NodeId, f: F) -> NodeId
    where
        F: FnOnce(&Node) -> Node,
    {
        let replacement = f(self.get(id));
        self.create(replacement)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expression;
    use crate::ty::{Constness, QualifiedType, Side, UnqualifiedType};

    fn dummy_type_node(ctx: &mut AstContext) -> NodeId {
        let qt = QualifiedType::new(UnqualifiedType::Void, Constness::Mutable, Side::Rhs);
        ctx.create(Node::new(NodeKind::Type(qt), Span::synthetic()))
    }

    #[test]
    fn create_returns_distinct_ids_for_identical_nodes() {
        let mut ctx = AstContext::new();
        let a = dummy_type_node(&mut ctx);
        let b = dummy_type_node(&mut ctx);
        assert_ne!(a, b);
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn set_allocates_a_new_node_leaving_the_old_one_intact() {
        let mut ctx = AstContext::new();
        let original = ctx.create(Node::new(
            NodeKind::Expression(Expression::Void),
            Span::synthetic(),
        ));
        let replaced = ctx.set(original, |n| Node::new(NodeKind::Expression(Expression::Null), n.span));
        assert_ne!(original, replaced);
        assert_eq!(ctx.get(original).tag(), "void");
        assert_eq!(ctx.get(replaced).tag(), "null");
    }

    #[test]
    fn property_round_trips() {
        let mut ctx = AstContext::new();
        let id = dummy_type_node(&mut ctx);
        ctx.get_mut(id).set_property("cxxname", "Foo::Bar");
        assert_eq!(ctx.get(id).property("cxxname"), Some("Foo::Bar"));
        assert_eq!(ctx.get(id).property("missing"), None);
    }
}
