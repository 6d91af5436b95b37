//! # spicy-grammar
//!
//! Turns a Spicy `unit` declaration into an LL(1)-style grammar of
//! [`production::Production`]s with look-ahead tables.
//!
//! - [`builder::build_unit_grammar`] — unit -> `Sequence`/`Alternative`/
//!   `While`/... construction.
//! - [`tables::finalize`] — nullable/first/follow fixed-point computation,
//!   look-ahead set assignment and the pairwise-disjointness check.
//! - [`builder::GrammarCache`] — per-unit grammar cache: grammars are
//!   cached on the unit type after first successful construction.
//!
//! This crate depends on `spicy-ast` for the unit/field/expression shapes
//! it walks, but knows nothing about code generation — `spicy-codegen`
//! depends on this crate, not the reverse.

pub mod builder;
pub mod production;
pub mod tables;

pub use builder::{build_unit_grammar, Grammar, GrammarCache};
pub use production::{AltBranch, Literal, LoopGate, Production, ProductionId, ProductionKind, Terminal};
pub use tables::{finalize, GrammarError, GrammarErrorKind, GrammarTables};

use spicy_ast::{Ctor, UnqualifiedType};

/// The fallback [`UnqualifiedType`] used when a field literal's ctor isn't
/// a byte/string/regex value: other literal forms still terminate parsing
/// deterministically, just by comparing a dynamically parsed value rather
/// than fixed text.
pub(crate) fn literal_ctor_fallback_type(ctor: &Ctor) -> UnqualifiedType {
    match ctor {
        Ctor::Bool(_) => UnqualifiedType::Bool,
        Ctor::SignedInteger(_, width) => UnqualifiedType::SignedInteger(*width),
        Ctor::UnsignedInteger(_, width) => UnqualifiedType::UnsignedInteger(*width),
        Ctor::Real(_) => UnqualifiedType::Real,
        Ctor::Tuple(_) | Ctor::Struct(..) | Ctor::Vector(..) | Ctor::List(..) | Ctor::Set(..) | Ctor::Map(..) => {
            UnqualifiedType::Unknown
        }
        Ctor::EnumLabel(_) | Ctor::Null => UnqualifiedType::Unknown,
        Ctor::Bytes(_) | Ctor::StringValue(_) | Ctor::Regexp(_) => unreachable!("handled before fallback"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spicy_ast::{FieldType, UnitDecl, UnitField};
    use spicy_base::{Id, Interner};

    #[test]
    fn single_unsigned_integer_field_grammar_has_one_literal_root_item() {
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        unit.fields.push(UnitField::new(
            Some(Id::parse(&mut interner, "value")),
            FieldType::Type(spicy_ast::QualifiedType::new(
                UnqualifiedType::UnsignedInteger(32),
                spicy_ast::Constness::Mutable,
                spicy_ast::Side::Rhs,
            )),
        ));
        let module = Id::parse(&mut interner, "Unpack");
        let mut grammar = build_unit_grammar(&unit, &module);
        finalize(&mut grammar).unwrap();
        let ProductionKind::Sequence(items) = &grammar.get(grammar.root).kind else { panic!() };
        assert_eq!(items.len(), 1);
        assert!(matches!(grammar.get(items[0]).kind, ProductionKind::Literal(Literal::ParseType(UnqualifiedType::UnsignedInteger(32)))));
    }
}
