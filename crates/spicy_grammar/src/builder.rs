//! Converts a `unit` declaration into a [`Grammar`] of productions.
//!
//! Walking a unit top-down produces a `Sequence` whose elements correspond
//! to the unit's items, exactly as described: fields with branching
//! (`switch { ... }`) become `Alternative` (explicit guard expressions
//! present) or `LookAhead` (pure look-ahead disambiguation); vector fields
//! become `While`; sub-unit fields become `Unit`.

use crate::production::{AltBranch, Literal, LoopGate, Production, ProductionId, ProductionKind};
use spicy_ast::{Ctor, Expression, FieldType, Repeat, SwitchField, UnitDecl, UnitField};
use spicy_base::Id;
use std::collections::HashMap;

/// Owns every [`Production`] built for one unit, plus the cached tables
/// `finalize` computes.
///
/// Grammars are cached on the unit type after first successful
/// construction; callers that build a grammar for the same unit
/// repeatedly should hold onto this value (or use [`GrammarCache`])
/// rather than re-running [`build_unit_grammar`].
pub struct Grammar {
    productions: Vec<Production>,
    pub root: ProductionId,
    pub tables: Option<crate::tables::GrammarTables>,
    next_regex_id: u32,
}

impl Grammar {
    pub fn new() -> Self {
        Grammar {
            productions: Vec::new(),
            root: ProductionId::new(0),
            tables: None,
            next_regex_id: 0,
        }
    }

    pub fn alloc(&mut self, p: Production) -> ProductionId {
        let id = ProductionId::new(self.productions.len());
        self.productions.push(p);
        id
    }

    pub fn get(&self, id: ProductionId) -> &Production {
        &self.productions[id.index()]
    }

    pub fn get_mut(&mut self, id: ProductionId) -> &mut Production {
        &mut self.productions[id.index()]
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Allocates an empty `Resolved` placeholder a caller can reference
    /// before the production it stands for is built — this is how
    /// recursive unit references break construction cycles.
    pub fn alloc_placeholder(&mut self) -> ProductionId {
        self.alloc(Production::new(ProductionKind::Resolved(None)))
    }

    /// Fills a placeholder allocated by [`Grammar::alloc_placeholder`] with
    /// the production it was standing in for.
    pub fn resolve(&mut self, placeholder: ProductionId, target: ProductionId) {
        self.productions[placeholder.index()].kind = ProductionKind::Resolved(Some(target));
    }

    fn next_regex_pattern_id(&mut self) -> u32 {
        let id = self.next_regex_id;
        self.next_regex_id += 1;
        id
    }
}

/// Builds a [`Grammar`] for `unit`'s body.
///
/// `module_name` qualifies any synthesized production names so two units of
/// the same field-shape in different modules don't collide in diagnostics.
pub fn build_unit_grammar(unit: &UnitDecl, module_name: &Id) -> Grammar {
    let mut grammar = Grammar::new();
    let items: Vec<ProductionId> = unit.fields.iter().map(|f| build_field(&mut grammar, f)).collect();
    let root = grammar.alloc(Production::named(module_name.clone(), ProductionKind::Sequence(items)));
    grammar.root = root;
    grammar
}

fn build_field(grammar: &mut Grammar, field: &UnitField) -> ProductionId {
    let base = build_field_type(grammar, &field.field_type);
    let repeated = match &field.repeat {
        Repeat::None => base,
        Repeat::Vector => wrap_while(grammar, base, LoopGate::Unbounded),
        Repeat::Until(expr) => wrap_while(grammar, base, LoopGate::Until(expr.clone())),
        Repeat::While(expr) => wrap_while(grammar, base, LoopGate::While(expr.clone())),
        Repeat::Eod => wrap_while(grammar, base, LoopGate::Eod),
    };

    match &field.condition {
        // `if (cond) field;`: explicit boolean guard selects between parsing
        // the field and an empty (epsilon) alternative — an `Alternative`.
        Some(cond) => {
            let epsilon = grammar.alloc(Production::new(ProductionKind::Sequence(vec![])));
            grammar.alloc(Production::new(ProductionKind::Alternative(vec![
                AltBranch { guard: Some(cond.clone()), production: repeated },
                AltBranch { guard: None, production: epsilon },
            ])))
        }
        None => repeated,
    }
}

fn wrap_while(grammar: &mut Grammar, body: ProductionId, gate: LoopGate) -> ProductionId {
    grammar.alloc(Production::new(ProductionKind::While { body, gate }))
}

fn build_field_type(grammar: &mut Grammar, field_type: &FieldType) -> ProductionId {
    match field_type {
        FieldType::Type(qt) => grammar.alloc(Production::new(ProductionKind::Literal(Literal::ParseType(qt.ty.clone())))),
        FieldType::Literal(ctor) => build_literal_ctor(grammar, ctor),
        FieldType::Unit(node) => grammar.alloc(Production::new(ProductionKind::Unit(*node))),
        FieldType::Switch(switch) => build_switch(grammar, switch),
        // A sink doesn't itself parse bytes out of the owning unit's input
        // stream — data is fed to it explicitly (`sink.write(...)`) from
        // hook code, so it contributes nothing to the grammar beyond the
        // field assignment itself.
        FieldType::Sink => grammar.alloc(Production::new(ProductionKind::Variable(Expression::Void))),
        FieldType::Variable(expr) => grammar.alloc(Production::new(ProductionKind::Variable(expr.clone()))),
    }
}

fn build_literal_ctor(grammar: &mut Grammar, ctor: &Ctor) -> ProductionId {
    let literal = match ctor {
        Ctor::Bytes(bytes) => Literal::Bytes(bytes.clone()),
        Ctor::StringValue(s) => Literal::Bytes(s.as_bytes().to_vec()),
        Ctor::Regexp(pattern) => Literal::Regex { pattern_id: grammar.next_regex_pattern_id(), source: pattern.clone() },
        // Any other ctor used as a field literal (integers, bools, ...) is
        // matched as its canonical byte encoding's *type*, not a concrete
        // byte sequence — treated the same as a parse-type terminal since
        // the comparison value is computed at parse time, not fixed text.
        other => return grammar.alloc(Production::new(ProductionKind::Literal(Literal::ParseType(
            crate::literal_ctor_fallback_type(other),
        )))),
    };
    grammar.alloc(Production::new(ProductionKind::Literal(literal)))
}

fn build_switch(grammar: &mut Grammar, switch: &SwitchField) -> ProductionId {
    let explicit = switch.discriminant.is_some() || switch.cases.iter().any(|c| c.guard.is_some());
    let branch_ids: Vec<(Option<Expression>, ProductionId)> = switch
        .cases
        .iter()
        .map(|case| (case.guard.clone(), build_field(grammar, &case.field)))
        .collect();

    if explicit {
        let branches = branch_ids
            .into_iter()
            .map(|(guard, production)| AltBranch { guard, production })
            .collect();
        grammar.alloc(Production::new(ProductionKind::Alternative(branches)))
    } else {
        let branches = branch_ids.into_iter().map(|(_, production)| production).collect();
        grammar.alloc(Production::new(ProductionKind::LookAhead(branches)))
    }
}

/// A `GrammarCache` caches grammars on the unit type after first
/// successful construction: callers key by the unit declaration's
/// [`spicy_ast::NodeId`] and avoid rebuilding a grammar that's already
/// finalized.
#[derive(Default)]
pub struct GrammarCache {
    grammars: HashMap<spicy_ast::NodeId, Grammar>,
}

impl GrammarCache {
    pub fn new() -> Self {
        GrammarCache::default()
    }

    pub fn get(&self, unit: spicy_ast::NodeId) -> Option<&Grammar> {
        self.grammars.get(&unit)
    }

    /// Builds (or returns the cached) grammar for `unit`, running
    /// [`crate::tables::finalize`] on first construction only.
    pub fn get_or_build(
        &mut self,
        unit: spicy_ast::NodeId,
        decl: &UnitDecl,
        module_name: &Id,
    ) -> Result<&Grammar, crate::tables::GrammarError> {
        if !self.grammars.contains_key(&unit) {
            let mut grammar = build_unit_grammar(decl, module_name);
            crate::tables::finalize(&mut grammar)?;
            self.grammars.insert(unit, grammar);
        }
        Ok(self.grammars.get(&unit).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spicy_ast::{Constness, QualifiedType, Side, UnqualifiedType};
    use spicy_base::Interner;

    fn uint8_field(name: &str, interner: &mut Interner) -> UnitField {
        UnitField::new(
            Some(Id::parse(interner, name)),
            FieldType::Type(QualifiedType::new(UnqualifiedType::UnsignedInteger(8), Constness::Mutable, Side::Rhs)),
        )
    }

    #[test]
    fn sequence_of_fields_builds_a_sequence_root() {
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        unit.fields.push(uint8_field("a", &mut interner));
        unit.fields.push(uint8_field("b", &mut interner));
        let module = Id::parse(&mut interner, "M");
        let grammar = build_unit_grammar(&unit, &module);
        assert!(matches!(grammar.get(grammar.root).kind, ProductionKind::Sequence(ref items) if items.len() == 2));
    }

    #[test]
    fn vector_field_wraps_in_while() {
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        let mut field = uint8_field("items", &mut interner);
        field.repeat = Repeat::Eod;
        unit.fields.push(field);
        let module = Id::parse(&mut interner, "M");
        let grammar = build_unit_grammar(&unit, &module);
        let ProductionKind::Sequence(items) = &grammar.get(grammar.root).kind else { panic!() };
        assert!(matches!(grammar.get(items[0]).kind, ProductionKind::While { .. }));
    }

    #[test]
    fn switch_with_discriminant_builds_alternative() {
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        let cases = vec![
            spicy_ast::SwitchCase { guard: Some(Expression::Ctor(Ctor::Bool(true))), field: Box::new(uint8_field("a", &mut interner)) },
            spicy_ast::SwitchCase { guard: None, field: Box::new(uint8_field("b", &mut interner)) },
        ];
        unit.fields.push(UnitField::new(
            None,
            FieldType::Switch(SwitchField { discriminant: Some(Expression::Ctor(Ctor::Bool(true))), cases }),
        ));
        let module = Id::parse(&mut interner, "M");
        let grammar = build_unit_grammar(&unit, &module);
        let ProductionKind::Sequence(items) = &grammar.get(grammar.root).kind else { panic!() };
        assert!(matches!(grammar.get(items[0]).kind, ProductionKind::Alternative(_)));
    }

    #[test]
    fn bare_alternation_without_guards_builds_lookahead() {
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        let cases = vec![
            spicy_ast::SwitchCase { guard: None, field: Box::new(build_literal_field(&mut interner, b"A")) },
            spicy_ast::SwitchCase { guard: None, field: Box::new(build_literal_field(&mut interner, b"B")) },
        ];
        unit.fields.push(UnitField::new(None, FieldType::Switch(SwitchField { discriminant: None, cases })));
        let module = Id::parse(&mut interner, "M");
        let grammar = build_unit_grammar(&unit, &module);
        let ProductionKind::Sequence(items) = &grammar.get(grammar.root).kind else { panic!() };
        assert!(matches!(grammar.get(items[0]).kind, ProductionKind::LookAhead(_)));
    }

    fn build_literal_field(interner: &mut Interner, bytes: &[u8]) -> UnitField {
        UnitField::new(Some(Id::parse(interner, "lit")), FieldType::Literal(Ctor::Bytes(bytes.to_vec())))
    }

    #[test]
    fn conditional_field_builds_alternative_with_epsilon_default() {
        let mut interner = Interner::new();
        let mut unit = UnitDecl::default();
        let mut field = uint8_field("maybe", &mut interner);
        field.condition = Some(Expression::Ctor(Ctor::Bool(true)));
        unit.fields.push(field);
        let module = Id::parse(&mut interner, "M");
        let grammar = build_unit_grammar(&unit, &module);
        let ProductionKind::Sequence(items) = &grammar.get(grammar.root).kind else { panic!() };
        let ProductionKind::Alternative(branches) = &grammar.get(items[0]).kind else { panic!("expected alternative") };
        assert_eq!(branches.len(), 2);
        assert!(branches[1].guard.is_none());
    }

    #[test]
    fn placeholder_round_trips_through_resolve() {
        let mut grammar = Grammar::new();
        let placeholder = grammar.alloc_placeholder();
        let target = grammar.alloc(Production::new(ProductionKind::Sequence(vec![])));
        grammar.resolve(placeholder, target);
        assert!(matches!(grammar.get(placeholder).kind, ProductionKind::Resolved(Some(t)) if t == target));
    }
}
