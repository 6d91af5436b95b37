//! Exercises `spicy_grammar::GrammarCache` end to end against units built
//! from real `spicy_ast` declarations (spec.md §8 "For all unit types U
//! with grammar G: every LookAhead in G has pairwise disjoint LA sets").

use spicy_ast::{Ctor, FieldType, SwitchCase, SwitchField, UnitDecl, UnitField};
use spicy_base::{Id, Interner};
use spicy_grammar::{GrammarCache, GrammarErrorKind};

fn literal_field(interner: &mut Interner, name: &str, bytes: &[u8]) -> UnitField {
    UnitField::new(Some(Id::parse(interner, name)), FieldType::Literal(Ctor::Bytes(bytes.to_vec())))
}

#[test]
fn colliding_byte_literal_branches_are_rejected_as_ambiguous() {
    // Look-ahead terminals compare by exact byte value (spec.md §4.6
    // "Determinism rules"), so two branches only collide when their
    // leading literals are identical, not merely prefix-overlapping.
    let mut interner = Interner::new();
    let mut unit = UnitDecl::default();
    let cases = vec![
        SwitchCase { guard: None, field: Box::new(literal_field(&mut interner, "a", b"AX")) },
        SwitchCase { guard: None, field: Box::new(literal_field(&mut interner, "b", b"AX")) },
    ];
    unit.fields.push(UnitField::new(None, FieldType::Switch(SwitchField { discriminant: None, cases })));

    let module_name = Id::parse(&mut interner, "Ambiguous");
    let mut cache = GrammarCache::new();
    let err = cache.get_or_build(spicy_ast::NodeId::new(0), &unit, &module_name).unwrap_err();
    assert_eq!(err.kind, GrammarErrorKind::AmbiguousLookAhead);
}

#[test]
fn disjoint_byte_literal_branches_finalize_successfully() {
    // spec.md §8 scenario 2: `M = ( "A" X | "B" Y )`.
    let mut interner = Interner::new();
    let mut unit = UnitDecl::default();
    let cases = vec![
        SwitchCase { guard: None, field: Box::new(literal_field(&mut interner, "a", b"AX")) },
        SwitchCase { guard: None, field: Box::new(literal_field(&mut interner, "b", b"BY")) },
    ];
    unit.fields.push(UnitField::new(None, FieldType::Switch(SwitchField { discriminant: None, cases })));

    let module_name = Id::parse(&mut interner, "Disjoint");
    let mut cache = GrammarCache::new();
    let grammar = cache.get_or_build(spicy_ast::NodeId::new(0), &unit, &module_name).unwrap();
    assert!(grammar.tables.is_some());

    // The cache must not rebuild a grammar already finalized for the same
    // `NodeId` (spec.md §3 "Grammars are cached on the unit type after
    // first successful construction").
    let cached_again = cache.get(spicy_ast::NodeId::new(0));
    assert!(cached_again.is_some());
}
