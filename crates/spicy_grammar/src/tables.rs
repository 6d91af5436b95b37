//! Nullable/first/follow/look-ahead fixed-point computation and the
//! disjointness check.
//!
//! Grounded on `original_source/.../grammar.h`'s private
//! `_computeTables`/`_check` methods, kept here as the public contract of
//! [`finalize`] rather than hidden behind a member function, since this
//! codebase has no single `Grammar` god-object method set to hang it off.

use crate::builder::Grammar;
use crate::production::{Literal, LoopGate, ProductionId, ProductionKind, Terminal};
use std::collections::{HashMap, HashSet};

/// Why [`finalize`] rejected a grammar.
#[derive(Debug, Clone)]
pub struct GrammarError {
    pub kind: GrammarErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarErrorKind {
    /// Two or more branches of a look-ahead choice point share a terminal.
    AmbiguousLookAhead,
    /// A regex literal's empty-match branch was used as a look-ahead
    /// alternative.
    EmptyMatchLookAhead,
}

impl std::fmt::Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GrammarError {}

/// The cached per-production tables a finalized [`Grammar`] carries. A
/// grammar is finalized once a look-ahead set has been computed for every
/// alternative at which branching occurs.
#[derive(Default)]
pub struct GrammarTables {
    pub nullable: HashMap<ProductionId, bool>,
    pub first: HashMap<ProductionId, HashSet<Terminal>>,
    pub follow: HashMap<ProductionId, HashSet<Terminal>>,
    /// For every `LookAhead`/guard-free `Alternative` production, the LA
    /// set computed for each of its branches, in branch order.
    pub look_ahead: HashMap<ProductionId, Vec<HashSet<Terminal>>>,
}

const MAX_ITERATIONS: usize = 10_000;

fn terminal_of_literal(id: ProductionId, lit: &Literal) -> Terminal {
    match lit {
        Literal::Bytes(bytes) => Terminal::Bytes(bytes.clone()),
        Literal::Regex { pattern_id, .. } => Terminal::Regex(*pattern_id),
        Literal::ParseType(_) => Terminal::Type(id),
    }
}

fn compute_nullable(grammar: &Grammar) -> HashMap<ProductionId, bool> {
    let mut nullable: HashMap<ProductionId, bool> = HashMap::new();
    for i in 0..grammar.len() {
        nullable.insert(ProductionId::new(i), false);
    }

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for i in 0..grammar.len() {
            let id = ProductionId::new(i);
            let new_value = nullable_of(grammar, id, &nullable);
            if nullable[&id] != new_value {
                nullable.insert(id, new_value);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    nullable
}

fn nullable_of(grammar: &Grammar, id: ProductionId, nullable: &HashMap<ProductionId, bool>) -> bool {
    match &grammar.get(id).kind {
        ProductionKind::Literal(_) => false,
        ProductionKind::Sequence(items) | ProductionKind::Block(items) => items.iter().all(|i| nullable[i]),
        ProductionKind::Alternative(branches) => branches.iter().any(|b| nullable[&b.production]),
        ProductionKind::LookAhead(branches) => branches.iter().any(|b| nullable[b]),
        // A loop may run zero iterations regardless of gate.
        ProductionKind::While { .. } => true,
        ProductionKind::Resolved(Some(inner)) => nullable[inner],
        ProductionKind::Resolved(None) => false,
        // Another unit's parser always consumes at least the bytes that
        // unit's own grammar requires; we have no visibility into that
        // grammar here, so conservatively treat sub-unit invocation as
        // non-nullable (see builder.rs module docs).
        ProductionKind::Unit(_) => false,
        ProductionKind::Variable(_) => true,
    }
}

fn compute_first(grammar: &Grammar, nullable: &HashMap<ProductionId, bool>) -> HashMap<ProductionId, HashSet<Terminal>> {
    let mut first: HashMap<ProductionId, HashSet<Terminal>> = HashMap::new();
    for i in 0..grammar.len() {
        first.insert(ProductionId::new(i), HashSet::new());
    }

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for i in 0..grammar.len() {
            let id = ProductionId::new(i);
            let additions = first_additions(grammar, id, nullable, &first);
            let set = first.get_mut(&id).unwrap();
            for t in additions {
                if set.insert(t) {
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    first
}

fn first_additions(
    grammar: &Grammar,
    id: ProductionId,
    nullable: &HashMap<ProductionId, bool>,
    first: &HashMap<ProductionId, HashSet<Terminal>>,
) -> Vec<Terminal> {
    match &grammar.get(id).kind {
        ProductionKind::Literal(lit) => vec![terminal_of_literal(id, lit)],
        ProductionKind::Sequence(items) | ProductionKind::Block(items) => {
            let mut out = Vec::new();
            for item in items {
                out.extend(first[item].iter().cloned());
                if !nullable[item] {
                    break;
                }
            }
            out
        }
        ProductionKind::Alternative(branches) => branches.iter().flat_map(|b| first[&b.production].iter().cloned()).collect(),
        ProductionKind::LookAhead(branches) => branches.iter().flat_map(|b| first[b].iter().cloned()).collect(),
        ProductionKind::While { body, .. } => first[body].iter().cloned().collect(),
        ProductionKind::Resolved(Some(inner)) => first[inner].iter().cloned().collect(),
        ProductionKind::Resolved(None) => vec![],
        ProductionKind::Unit(node) => vec![Terminal::SubUnit(*node)],
        ProductionKind::Variable(_) => vec![],
    }
}

/// Propagates follow sets by walking each production's children once and
/// feeding back what comes after them. Seeded with an empty set at the
/// root, since nothing followed by a production at the very end of a
/// unit's grammar needs its own terminal.
fn compute_follow(
    grammar: &Grammar,
    nullable: &HashMap<ProductionId, bool>,
    first: &HashMap<ProductionId, HashSet<Terminal>>,
) -> HashMap<ProductionId, HashSet<Terminal>> {
    let mut follow: HashMap<ProductionId, HashSet<Terminal>> = HashMap::new();
    for i in 0..grammar.len() {
        follow.insert(ProductionId::new(i), HashSet::new());
    }

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for i in 0..grammar.len() {
            let id = ProductionId::new(i);
            let own_follow = follow[&id].clone();
            propagate_follow(grammar, id, &own_follow, nullable, first, &mut follow, &mut changed);
        }
        if !changed {
            break;
        }
    }
    follow
}

fn add_follow(
    follow: &mut HashMap<ProductionId, HashSet<Terminal>>,
    target: ProductionId,
    terms: &HashSet<Terminal>,
    changed: &mut bool,
) {
    let set = follow.get_mut(&target).unwrap();
    for t in terms {
        if set.insert(t.clone()) {
            *changed = true;
        }
    }
}

fn propagate_follow(
    grammar: &Grammar,
    id: ProductionId,
    own_follow: &HashSet<Terminal>,
    nullable: &HashMap<ProductionId, bool>,
    first: &HashMap<ProductionId, HashSet<Terminal>>,
    follow: &mut HashMap<ProductionId, HashSet<Terminal>>,
    changed: &mut bool,
) {
    match &grammar.get(id).kind {
        ProductionKind::Sequence(items) | ProductionKind::Block(items) => {
            for window in 0..items.len() {
                let current = items[window];
                if window + 1 < items.len() {
                    let next = items[window + 1];
                    add_follow(follow, current, &first[&next], changed);
                    if nullable[&next] {
                        let next_follow = follow[&next].clone();
                        add_follow(follow, current, &next_follow, changed);
                    }
                } else {
                    add_follow(follow, current, own_follow, changed);
                }
            }
        }
        ProductionKind::Alternative(branches) => {
            for b in branches {
                add_follow(follow, b.production, own_follow, changed);
            }
        }
        ProductionKind::LookAhead(branches) => {
            for &b in branches {
                add_follow(follow, b, own_follow, changed);
            }
        }
        ProductionKind::While { body, .. } => {
            // Another iteration feeds the body's own first set back in;
            // exiting the loop feeds this production's follow onward.
            let body_first = first[body].clone();
            add_follow(follow, *body, &body_first, changed);
            add_follow(follow, *body, own_follow, changed);
        }
        ProductionKind::Resolved(Some(inner)) => {
            add_follow(follow, *inner, own_follow, changed);
        }
        ProductionKind::Resolved(None) | ProductionKind::Literal(_) | ProductionKind::Unit(_) | ProductionKind::Variable(_) => {}
    }
}

/// For every `LookAhead` or guard-free `Alternative` choice point, computes
/// `LA(Bi) = first(Bi) ∪ (follow(LA) if nullable(Bi))` and checks pairwise
/// disjointness.
fn compute_look_ahead(
    grammar: &Grammar,
    nullable: &HashMap<ProductionId, bool>,
    first: &HashMap<ProductionId, HashSet<Terminal>>,
    follow: &HashMap<ProductionId, HashSet<Terminal>>,
) -> Result<HashMap<ProductionId, Vec<HashSet<Terminal>>>, GrammarError> {
    let mut tables = HashMap::new();

    for i in 0..grammar.len() {
        let id = ProductionId::new(i);
        let branch_ids: Vec<ProductionId> = match &grammar.get(id).kind {
            ProductionKind::LookAhead(branches) => branches.clone(),
            ProductionKind::Alternative(branches) if branches.iter().all(|b| b.guard.is_none()) => {
                branches.iter().map(|b| b.production).collect()
            }
            _ => continue,
        };

        let la_sets: Vec<HashSet<Terminal>> = branch_ids
            .iter()
            .map(|&b| {
                let mut set: HashSet<Terminal> = first[&b].clone();
                if nullable[&b] {
                    set.extend(follow[&id].iter().cloned());
                }
                set
            })
            .collect();

        for a in 0..la_sets.len() {
            for b in (a + 1)..la_sets.len() {
                let overlap: Vec<&Terminal> = la_sets[a].intersection(&la_sets[b]).collect();
                if !overlap.is_empty() {
                    return Err(GrammarError {
                        kind: GrammarErrorKind::AmbiguousLookAhead,
                        message: format!(
                            "look-ahead branches {a} and {b} of production #{} share {} overlapping terminal(s)",
                            id.index(),
                            overlap.len()
                        ),
                    });
                }
            }
        }

        tables.insert(id, la_sets);
    }
    Ok(tables)
}

fn check_no_empty_match_lookahead(grammar: &Grammar) -> Result<(), GrammarError> {
    for i in 0..grammar.len() {
        let id = ProductionId::new(i);
        if let ProductionKind::LookAhead(branches) = &grammar.get(id).kind {
            for &b in branches {
                if let ProductionKind::Literal(Literal::Regex { source, .. }) = &grammar.get(b).kind {
                    if source.is_empty() {
                        return Err(GrammarError {
                            kind: GrammarErrorKind::EmptyMatchLookAhead,
                            message: format!("production #{} uses an empty-match regex as a look-ahead alternative", id.index()),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Computes and caches every table on `grammar`, checking disjointness
/// along the way.
pub fn finalize(grammar: &mut Grammar) -> Result<(), GrammarError> {
    check_no_empty_match_lookahead(grammar)?;
    let nullable = compute_nullable(grammar);
    let first = compute_first(grammar, &nullable);
    let follow = compute_follow(grammar, &nullable, &first);
    let look_ahead = compute_look_ahead(grammar, &nullable, &first, &follow)?;
    grammar.tables = Some(GrammarTables { nullable, first, follow, look_ahead });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_unit_grammar;
    use spicy_ast::{Ctor, Expression, FieldType, SwitchCase, SwitchField, UnitDecl, UnitField};
    use spicy_base::{Id, Interner};

    fn literal_field(interner: &mut Interner, name: &str, bytes: &[u8]) -> UnitField {
        UnitField::new(Some(Id::parse(interner, name)), FieldType::Literal(Ctor::Bytes(bytes.to_vec())))
    }

    #[test]
    fn disjoint_look_ahead_branches_finalize_successfully() {
        // M = ( "A" X | "B" Y )
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        let cases = vec![
            SwitchCase { guard: None, field: Box::new(literal_field(&mut interner, "branch_a", b"A")) },
            SwitchCase { guard: None, field: Box::new(literal_field(&mut interner, "branch_b", b"B")) },
        ];
        unit.fields.push(UnitField::new(None, FieldType::Switch(SwitchField { discriminant: None, cases })));
        let module = Id::parse(&mut interner, "M");
        let mut grammar = build_unit_grammar(&unit, &module);
        assert!(finalize(&mut grammar).is_ok());
        let tables = grammar.tables.as_ref().unwrap();
        assert!(!tables.look_ahead.is_empty());
    }

    #[test]
    fn ambiguous_look_ahead_is_rejected() {
        // Two branches both starting with literal "A" — genuinely ambiguous.
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        let cases = vec![
            SwitchCase { guard: None, field: Box::new(literal_field(&mut interner, "one", b"A")) },
            SwitchCase { guard: None, field: Box::new(literal_field(&mut interner, "two", b"A")) },
        ];
        unit.fields.push(UnitField::new(None, FieldType::Switch(SwitchField { discriminant: None, cases })));
        let module = Id::parse(&mut interner, "M");
        let mut grammar = build_unit_grammar(&unit, &module);
        let err = finalize(&mut grammar).unwrap_err();
        assert_eq!(err.kind, GrammarErrorKind::AmbiguousLookAhead);
    }

    #[test]
    fn explicit_switch_with_guards_never_needs_look_ahead_disjointness() {
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        let cases = vec![
            SwitchCase { guard: Some(Expression::Ctor(Ctor::Bool(true))), field: Box::new(literal_field(&mut interner, "one", b"A")) },
            SwitchCase { guard: Some(Expression::Ctor(Ctor::Bool(false))), field: Box::new(literal_field(&mut interner, "two", b"A")) },
        ];
        unit.fields.push(UnitField::new(
            None,
            FieldType::Switch(SwitchField { discriminant: Some(Expression::Ctor(Ctor::Bool(true))), cases }),
        ));
        let module = Id::parse(&mut interner, "M");
        let mut grammar = build_unit_grammar(&unit, &module);
        assert!(finalize(&mut grammar).is_ok());
    }

    #[test]
    fn sequence_is_never_nullable_unless_all_elements_are() {
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        unit.fields.push(literal_field(&mut interner, "a", b"A"));
        let module = Id::parse(&mut interner, "M");
        let mut grammar = build_unit_grammar(&unit, &module);
        finalize(&mut grammar).unwrap();
        let tables = grammar.tables.as_ref().unwrap();
        assert!(!tables.nullable[&grammar.root]);
    }

    #[test]
    fn while_loop_body_is_always_nullable() {
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        let mut field = literal_field(&mut interner, "items", b"A");
        field.repeat = spicy_ast::Repeat::Eod;
        unit.fields.push(field);
        let module = Id::parse(&mut interner, "M");
        let mut grammar = build_unit_grammar(&unit, &module);
        finalize(&mut grammar).unwrap();
        let ProductionKind::Sequence(items) = &grammar.get(grammar.root).kind else { panic!() };
        let tables = grammar.tables.as_ref().unwrap();
        assert!(tables.nullable[&items[0]]);
    }
}
