//! # spicy-sema
//!
//! Everything that turns a syntactically-parsed `spicy-ast` tree into a
//! fully-typed one: the operator registry, overload resolution, type
//! unification, and directed coercion (spec.md §4.4, §4.5).
//!
//! - [`operator::Registry`] — the global, two-phase (pending -> indexed)
//!   table of `Operator` definitions.
//! - [`overload`] — binds an `UnresolvedOperator` occurrence to exactly one
//!   registered `Operator`, coercing its operands along the way.
//! - [`unify`] — canonical string form for structural type equivalence,
//!   used instead of comparing `NodeId`s or raw `UnqualifiedType` values.
//! - [`coerce`] — directed, style-gated transformation from one type to
//!   another (const promotion, reference-kind shifts, integer widening,
//!   optional/result wrapping).
//! - [`validate`] — the final sweep over a resolved module, turning leftover
//!   unresolved placeholders and structurally invalid shapes into
//!   diagnostics instead of letting them reach code generation.
//!
//! This crate depends on `spicy-ast` for the node/type/expression shapes it
//! operates over, but `spicy-ast` never depends back on it — operator
//! occurrences only carry an opaque `OperatorId` handle; only `Registry`
//! knows what it means.

pub mod coerce;
pub mod operator;
pub mod overload;
pub mod unify;
pub mod validate;

pub use coerce::{coerce, CoercionStyle};
pub use operator::{Operator, OperatorIndex, Registry, ResultRule};
pub use overload::{resolve, resolve_by_name};
pub use unify::{types_equivalent, unify, CanonicalIds};
pub use validate::validate;

#[cfg(test)]
mod tests {
    use super::*;
    use spicy_ast::{Constness, Ctor, Expression, OperatorKind, QualifiedType, Side, UnqualifiedType};
    use spicy_base::Interner;

    #[test]
    fn end_to_end_resolves_and_validates_a_simple_addition() {
        let registry = Registry::with_builtins();
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let uint32 = QualifiedType::new(UnqualifiedType::UnsignedInteger(32), Constness::Mutable, Side::Rhs);
        let operands = vec![Expression::Ctor(Ctor::UnsignedInteger(1, 32)), Expression::Ctor(Ctor::UnsignedInteger(2, 32))];
        let types = vec![uint32.clone(), uint32];
        let resolved = resolve(
            &registry,
            OperatorKind::Add,
            operands,
            &types,
            CoercionStyle::ASSIGNMENT,
            &interner,
            &ids,
        )
        .unwrap();
        assert!(resolved.is_resolved());
    }
}
