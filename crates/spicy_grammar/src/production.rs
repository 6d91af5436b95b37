//! Production variants: the building blocks of an LL(1)-style unit grammar.
//!
//! Grounded on `original_source/spicy/toolchain/include/compiler/detail/
//! codegen/productions/while.h` and the sibling `literal.h`/`sequence.h`/
//! `switch_.h` headers in the same directory: one small type per
//! production kind rather than a single polymorphic visitor tree.
//!
//! Productions live in a [`Grammar`](crate::builder::Grammar)'s arena,
//! addressed by [`ProductionId`] rather than owned — the same stable-handle
//! pattern `spicy_ast::node` uses for [`spicy_ast::NodeId`], needed here for
//! the same reason: a [`ProductionKind::Resolved`] placeholder has to be
//! able to point at a production that doesn't exist yet when a cyclic unit
//! reference is first built.

use spicy_ast::{Expression, NodeId, UnqualifiedType};
use spicy_base::Id;

/// A stable handle into a [`crate::builder::Grammar`]'s production arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ProductionId(pub(crate) u32);

impl ProductionId {
    pub fn new(index: usize) -> Self {
        ProductionId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A concrete terminal: a byte/integer/regex literal, or a parse-type such
/// as `uint16` in a given byte order.
#[derive(Clone, Debug)]
pub enum Literal {
    /// An exact byte sequence that must match.
    Bytes(Vec<u8>),
    /// A regex literal. `pattern_id` is the compiled pattern's canonical
    /// id, assigned deterministically when the literal is built into a
    /// grammar so the same source pattern always gets the same id within
    /// one grammar.
    Regex { pattern_id: u32, source: String },
    /// A parse-type read without pattern matching against a concrete value
    /// (`uint16`, `bytes &size=n`, ...) — still a terminal in the grammar
    /// sense since it always consumes a fixed or field-computed amount of
    /// input without further branching.
    ParseType(UnqualifiedType),
}

/// The terminal symbol a [`Literal`] contributes to first/follow/look-ahead
/// set computation.
///
/// Distinct from [`Literal`] itself because set membership needs `Eq`/
/// `Hash`, which a `UnqualifiedType` embedding arbitrary nested types
/// doesn't cheaply provide; `Terminal::Type` instead keys on the owning
/// production so two `uint16` fields at different grammar positions are
/// still distinguishable look-ahead symbols (they can require different
/// look-ahead decisions depending on what follows each one).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Terminal {
    Bytes(Vec<u8>),
    Regex(u32),
    /// A parse-type terminal, keyed by the [`ProductionId`] of the
    /// [`ProductionKind::Literal`] it came from.
    Type(ProductionId),
    /// The symbol contributed by invoking another unit's parser, keyed by
    /// that unit's declaration. Grammar construction
    /// can't see inside another unit's own (possibly not-yet-built)
    /// grammar, so this is an opaque terminal rather than the sub-unit's
    /// actual first set — see `builder.rs` "Design notes" for why this is
    /// sound for disjointness checking.
    SubUnit(NodeId),
}

/// How a [`ProductionKind::While`] loop decides to keep iterating.
#[derive(Clone, Debug)]
pub enum LoopGate {
    /// `&until=expr` — stop once `expr` becomes true, checked after each
    /// iteration.
    Until(Expression),
    /// `&while=expr` — keep going only while `expr` holds, checked before
    /// each iteration.
    While(Expression),
    /// `&eod` — loop until end-of-data.
    Eod,
    /// A bare `: T[]` with no explicit bound: look-ahead on the loop body's
    /// own first set decides whether another iteration starts.
    Unbounded,
}

/// One branch of an [`ProductionKind::Alternative`]: `None` marks the
/// default (`*`) arm.
#[derive(Clone, Debug)]
pub struct AltBranch {
    pub guard: Option<Expression>,
    pub production: ProductionId,
}

/// The tagged-union payload of a [`Production`].
#[derive(Clone, Debug)]
pub enum ProductionKind {
    Literal(Literal),
    /// An ordered list of productions — the default for a unit body.
    Sequence(Vec<ProductionId>),
    /// An unordered set of branches, each with an explicit boolean guard
    /// (`switch` with explicit expressions).
    Alternative(Vec<AltBranch>),
    /// A branch selected purely by consulting the look-ahead set over the
    /// input stream — no explicit per-branch expression.
    LookAhead(Vec<ProductionId>),
    While { body: ProductionId, gate: LoopGate },
    /// A forward-declared placeholder, filled in once the referenced
    /// production becomes available, breaking cycles in recursive unit
    /// references. `None` until [`crate::builder::Grammar::resolve`] fills
    /// it.
    Resolved(Option<ProductionId>),
    /// Invocation of another unit's parser.
    Unit(NodeId),
    /// Assignment to a unit field with no input consumption.
    Variable(Expression),
    /// A scoped group inside a unit body (conditional/for-each sub-items).
    Block(Vec<ProductionId>),
}

impl ProductionKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ProductionKind::Literal(_) => "literal",
            ProductionKind::Sequence(_) => "sequence",
            ProductionKind::Alternative(_) => "alternative",
            ProductionKind::LookAhead(_) => "lookahead",
            ProductionKind::While { .. } => "while",
            ProductionKind::Resolved(_) => "resolved",
            ProductionKind::Unit(_) => "unit",
            ProductionKind::Variable(_) => "variable",
            ProductionKind::Block(_) => "block",
        }
    }
}

/// A named production node. `name` is `None` for anonymous/synthesized
/// productions (e.g. the body wrapped by a `While`).
#[derive(Clone, Debug)]
pub struct Production {
    pub name: Option<Id>,
    pub kind: ProductionKind,
}

impl Production {
    pub fn new(kind: ProductionKind) -> Self {
        Production { name: None, kind }
    }

    pub fn named(name: Id, kind: ProductionKind) -> Self {
        Production { name: Some(name), kind }
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_identify_kinds() {
        let p = Production::new(ProductionKind::Sequence(vec![]));
        assert_eq!(p.tag(), "sequence");
        let w = Production::new(ProductionKind::While {
            body: ProductionId::new(0),
            gate: LoopGate::Eod,
        });
        assert_eq!(w.tag(), "while");
    }

    #[test]
    fn resolved_placeholder_starts_empty() {
        let p = Production::new(ProductionKind::Resolved(None));
        assert!(matches!(p.kind, ProductionKind::Resolved(None)));
    }
}
