//! Per-field parse procedure lowering (spec.md §4.7 "Field parsing").
//!
//! Each [`UnitField`] becomes a [`FieldStep`] describing, in order, how
//! generated code acquires input for the field, applies its production,
//! assigns the result, and runs its hooks — the "internal per-field
//! helpers" spec.md §4.7 calls for when size/while/for-each decomposition
//! needs more than a single inline statement.

use spicy_ast::{Expression, FieldType, Hook, HookEvent, Repeat, UnitField};
use spicy_base::Id;
use spicy_grammar::{Grammar, ProductionId};

/// How a field's input window is established before its production runs
/// (spec.md §4.7 step 2 "Acquire input").
#[derive(Clone, Debug)]
pub enum Acquisition {
    /// No explicit bound; the production's own grammar decides how much
    /// to consume (a literal, a fixed-width parse-type, ...).
    Natural,
    /// `&size=n`: narrow the view to exactly `n` bytes first.
    Size(Expression),
    /// `&parse-at=pos`: reposition to an absolute offset first.
    ParseAt(Expression),
    /// `&parse-from=expr`: reposition relative to `expr` first.
    ParseFrom(Expression),
    /// A repeated field: loop, re-running the body's acquisition/
    /// production/assignment for each element.
    Loop(LoopPlan),
}

#[derive(Clone, Debug)]
pub enum LoopPlan {
    Vector,
    Until(Expression),
    While(Expression),
    Eod,
}

/// A hook attachment the lowered field still needs to run, carrying just
/// enough to order and dispatch it — the hook body itself stays in the
/// AST (`spicy_codegen` does not interpret statements; see the crate's
/// Non-goals).
#[derive(Clone, Debug)]
pub struct HookRef {
    pub event: HookEvent,
    pub priority: i32,
}

impl HookRef {
    fn from(hook: &Hook) -> Self {
        HookRef { event: hook.event.clone(), priority: hook.priority }
    }
}

/// The lowered form of one [`UnitField`] (spec.md §4.7 "Field parsing"
/// steps 1-6, in field-declaration order).
#[derive(Clone, Debug)]
pub struct FieldStep {
    pub name: Option<Id>,
    pub anonymous: bool,
    pub acquisition: Acquisition,
    pub production: ProductionId,
    pub pre_hooks: Vec<HookRef>,
    pub post_hooks: Vec<HookRef>,
    pub error_hooks: Vec<HookRef>,
    pub condition: Option<Expression>,
}

/// Builds a [`FieldStep`] for `field`, looking up the production the
/// grammar builder already assigned it. `production` must be the same
/// [`ProductionId`] [`spicy_grammar::build_unit_grammar`] allocated for
/// this field — callers walk both in lockstep (see
/// `parser::lower_unit`).
pub fn build_field_step(field: &UnitField, production: ProductionId, _grammar: &Grammar) -> FieldStep {
    let acquisition = match &field.repeat {
        Repeat::None => acquisition_for_attrs(field),
        Repeat::Vector => Acquisition::Loop(LoopPlan::Vector),
        Repeat::Until(e) => Acquisition::Loop(LoopPlan::Until(e.clone())),
        Repeat::While(e) => Acquisition::Loop(LoopPlan::While(e.clone())),
        Repeat::Eod => Acquisition::Loop(LoopPlan::Eod),
    };

    let mut pre_hooks = Vec::new();
    let mut post_hooks = Vec::new();
    let mut error_hooks = Vec::new();
    for hook in &field.hooks {
        match hook.event {
            HookEvent::Init => pre_hooks.push(HookRef::from(hook)),
            HookEvent::Done | HookEvent::Foreach | HookEvent::FieldDone => post_hooks.push(HookRef::from(hook)),
            HookEvent::Error => error_hooks.push(HookRef::from(hook)),
        }
    }
    // Higher priority runs first; equal priority keeps registration
    // order (spec.md §4.7 "Hooks"), so this sort must be stable.
    post_hooks.sort_by(|a, b| b.priority.cmp(&a.priority));
    pre_hooks.sort_by(|a, b| b.priority.cmp(&a.priority));

    FieldStep {
        name: field.name.clone(),
        anonymous: field.is_anonymous(),
        acquisition,
        production,
        pre_hooks,
        post_hooks,
        error_hooks,
        condition: field.condition.clone(),
    }
}

fn acquisition_for_attrs(field: &UnitField) -> Acquisition {
    if let FieldType::Variable(_) = field.field_type {
        return Acquisition::Natural;
    }
    if let Some(attr) = field.attributes.find("&size") {
        if let Some(spicy_ast::AttributeValue::Expr(e)) = &attr.value {
            return Acquisition::Size((**e).clone());
        }
    }
    if let Some(attr) = field.attributes.find("&parse-at") {
        if let Some(spicy_ast::AttributeValue::Expr(e)) = &attr.value {
            return Acquisition::ParseAt((**e).clone());
        }
    }
    if let Some(attr) = field.attributes.find("&parse-from") {
        if let Some(spicy_ast::AttributeValue::Expr(e)) = &attr.value {
            return Acquisition::ParseFrom((**e).clone());
        }
    }
    Acquisition::Natural
}

#[cfg(test)]
mod tests {
    use super::*;
    use spicy_ast::{Constness, QualifiedType, Side, UnqualifiedType};
    use spicy_base::Interner;

    fn int_field(name: &str, interner: &mut Interner) -> UnitField {
        UnitField::new(
            Some(Id::parse(interner, name)),
            FieldType::Type(QualifiedType::new(UnqualifiedType::UnsignedInteger(32), Constness::Mutable, Side::Rhs)),
        )
    }

    #[test]
    fn plain_field_has_natural_acquisition() {
        let mut interner = Interner::new();
        let field = int_field("x", &mut interner);
        let grammar = Grammar::new();
        let step = build_field_step(&field, ProductionId::new(0), &grammar);
        assert!(matches!(step.acquisition, Acquisition::Natural));
        assert!(!step.anonymous);
    }

    #[test]
    fn size_attribute_lowers_to_explicit_acquisition() {
        let mut interner = Interner::new();
        let mut field = int_field("x", &mut interner);
        field.attributes.push(spicy_ast::Attribute::expr("&size", Expression::Void));
        let grammar = Grammar::new();
        let step = build_field_step(&field, ProductionId::new(0), &grammar);
        assert!(matches!(step.acquisition, Acquisition::Size(_)));
    }

    #[test]
    fn vector_repeat_lowers_to_loop_plan() {
        let mut interner = Interner::new();
        let mut field = int_field("xs", &mut interner);
        field.repeat = Repeat::Vector;
        let grammar = Grammar::new();
        let step = build_field_step(&field, ProductionId::new(0), &grammar);
        assert!(matches!(step.acquisition, Acquisition::Loop(LoopPlan::Vector)));
    }

    #[test]
    fn hooks_sort_by_priority_descending() {
        let mut interner = Interner::new();
        let mut field = int_field("x", &mut interner);
        field.hooks.push(Hook { event: HookEvent::FieldDone, priority: 1, body: spicy_ast::Statement::Nop });
        field.hooks.push(Hook { event: HookEvent::FieldDone, priority: 5, body: spicy_ast::Statement::Nop });
        let grammar = Grammar::new();
        let step = build_field_step(&field, ProductionId::new(0), &grammar);
        assert_eq!(step.post_hooks[0].priority, 5);
        assert_eq!(step.post_hooks[1].priority, 1);
    }
}
