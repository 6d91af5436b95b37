//! Unit-level procedure lowering (spec.md §4.7 "Parser code generation").
//!
//! [`build_unit_grammar`] produces a `root` that is always a `Sequence`
//! with exactly one production per top-level field, in declaration order
//! (see `spicy_grammar::builder`) — [`lower_unit`] walks the two in
//! lockstep and hands each pair to [`build_field_step`]. Switch fields are
//! the one place the walk recurses: the branch a `case` selects has its
//! own nested field, which needs its own [`FieldStep`] in turn.

use spicy_ast::{FieldType, UnitDecl, UnitField};
use spicy_base::{Id, Interner};
use spicy_grammar::{Grammar, ProductionId, ProductionKind};

use crate::field::{build_field_step, FieldStep};

/// The lowered form of a whole `unit` declaration: its fields in parse
/// order, already flattened through any switch branches, plus the
/// unit-level properties codegen cares about (spec.md §4.7, §4.1).
#[derive(Clone, Debug)]
pub struct Procedure {
    pub name: Id,
    pub steps: Vec<FieldStep>,
    /// `%random-access` (spec.md §4.7 "Random access").
    pub random_access: bool,
    /// Mirrors `UnitDecl::is_filter` (spec.md §4.1 "Filters").
    pub is_filter: bool,
}

/// Lowers `unit`'s finalized `grammar` into a [`Procedure`] named after
/// `module_name`. `grammar` must be the same one `build_unit_grammar`
/// produced for `unit` — callers are expected to pass the two through
/// together, the way `spicy_grammar`'s own tests do.
pub fn lower_unit(unit: &UnitDecl, grammar: &Grammar, module_name: &Id, interner: &mut Interner) -> Procedure {
    let ProductionKind::Sequence(items) = &grammar.get(grammar.root).kind else {
        panic!("a unit grammar's root is always a Sequence (see spicy_grammar::builder::build_unit_grammar)");
    };
    assert_eq!(
        items.len(),
        unit.fields.len(),
        "grammar root has {} items for {} top-level fields",
        items.len(),
        unit.fields.len()
    );

    let mut steps = Vec::new();
    for (field, &production) in unit.fields.iter().zip(items.iter()) {
        lower_field(field, production, grammar, &mut steps);
    }

    let random_access = unit.property(&Id::parse(interner, "random-access")).is_some();

    Procedure { name: module_name.clone(), steps, random_access, is_filter: unit.is_filter }
}

/// Appends `field`'s own step, then recurses into whichever nested field
/// a switch statement's branches carry — `&size`/`&parse-at`/repeat
/// wrapping around the switch doesn't change how many branches it has,
/// so the branch production is found by unwrapping those layers first.
fn lower_field(field: &UnitField, production: ProductionId, grammar: &Grammar, out: &mut Vec<FieldStep>) {
    out.push(build_field_step(field, production, grammar));

    if let FieldType::Switch(switch) = &field.field_type {
        let body = strip_repeat_and_condition(production, grammar);
        match &grammar.get(body).kind {
            ProductionKind::Alternative(branches) if branches.len() == switch.cases.len() => {
                for (case, branch) in switch.cases.iter().zip(branches) {
                    lower_field(&case.field, branch.production, grammar, out);
                }
            }
            ProductionKind::LookAhead(branch_ids) if branch_ids.len() == switch.cases.len() => {
                for (case, &branch) in switch.cases.iter().zip(branch_ids) {
                    lower_field(&case.field, branch, grammar, out);
                }
            }
            // The switch field carries a repeat/condition shape this
            // helper doesn't recognize; its branches stay un-lowered
            // rather than guessed at.
            _ => {}
        }
    }
}

/// Peels off the `While` a `repeat` wraps a field in and the epsilon
/// `Alternative` a `condition` wraps it in, to reach the production that
/// actually describes the field's own value (spec.md §4.6 "Construction").
fn strip_repeat_and_condition(mut production: ProductionId, grammar: &Grammar) -> ProductionId {
    loop {
        match &grammar.get(production).kind {
            ProductionKind::While { body, .. } => production = *body,
            ProductionKind::Alternative(branches) if branches.len() == 2 && branches[1].guard.is_none() => {
                if matches!(&grammar.get(branches[1].production).kind, ProductionKind::Sequence(items) if items.is_empty()) {
                    production = branches[0].production;
                    continue;
                }
                return production;
            }
            _ => return production,
        }
    }
}
