//! The operator table: a type-indexed registry of `Operator` definitions
//! (spec.md §4.4 "Operator", "Registration").
//!
//! Grounded on `original_source/hilti/toolchain/include/ast/operator-registry.h`:
//! operators are appended to a pending list at registration time, then
//! drained into `by_kind`/`by_name`/`by_member` indices once the registry
//! initializes — the two-phase split that lets built-in operators be
//! declared as simple static data (module-load order independent) while
//! still supporting operators whose operand types aren't resolvable yet.

use spicy_ast::{OperatorKind, QualifiedType, UnqualifiedType};
use std::collections::HashMap;

/// A handle into a `Registry`'s operator table, stable across a resolution
/// session. Distinct from `spicy_ast::expr::OperatorId` only in that this
/// one is a plain index a `Registry` hands out and interprets; `expr`'s
/// version is the opaque `u32` an AST node stores (they're numerically the
/// same value, kept as separate types so `spicy_ast` never needs to name
/// `Registry`).
pub type OperatorIndex = usize;

/// A predicate an operand must satisfy to bind to a given `Operator`'s
/// signature slot. A plain function pointer (not a closure) so operators
/// can be declared as `const`/`static` data without capturing anything.
pub type OperandPredicate = fn(&QualifiedType) -> bool;

/// How an `Operator`'s result type is computed from its (already coerced)
/// operands.
#[derive(Clone)]
pub enum ResultRule {
    /// Always this type, independent of operands.
    Fixed(UnqualifiedType),
    /// The type of operand `n`, unchanged.
    SameAsOperand(usize),
    /// The element type of operand `n`'s container/optional/result/reference.
    ElementOfOperand(usize),
    /// Computed by a function of the (already-coerced) operand types.
    Computed(fn(&[QualifiedType]) -> QualifiedType),
}

/// One operator definition: a kind, an operand signature, and a result
/// rule (spec.md §4.4 "Operator": "a triple (kind, operand-list signature,
/// result-type rule)").
#[derive(Clone)]
pub struct Operator {
    pub kind: OperatorKind,
    /// Set for built-ins looked up by name (`Call`/`MemberCall`); `None`
    /// for operators matched purely by kind + operand types.
    pub name: Option<&'static str>,
    pub operands: Vec<OperandPredicate>,
    pub result: ResultRule,
    /// Higher wins when multiple candidates all coerce successfully
    /// (spec.md §4.4 step 3: "its own priority beats other matches").
    pub priority: i32,
}

impl Operator {
    pub fn new(kind: OperatorKind, operands: Vec<OperandPredicate>, result: ResultRule) -> Self {
        Operator { kind, name: None, operands, result, priority: 0 }
    }

    pub fn named(kind: OperatorKind, name: &'static str, operands: Vec<OperandPredicate>, result: ResultRule) -> Self {
        Operator { kind, name: Some(name), operands, result, priority: 0 }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// `true` iff every operand type satisfies the corresponding signature
    /// slot. Arity mismatch is always a non-match.
    pub fn accepts(&self, operand_types: &[QualifiedType]) -> bool {
        self.operands.len() == operand_types.len()
            && self.operands.iter().zip(operand_types).all(|(pred, ty)| pred(ty))
    }

    pub fn result_type(&self, operand_types: &[QualifiedType]) -> QualifiedType {
        match &self.result {
            ResultRule::Fixed(t) => QualifiedType::rhs_mutable(t.clone()),
            ResultRule::SameAsOperand(n) => operand_types[*n].clone(),
            ResultRule::ElementOfOperand(n) => operand_types[*n]
                .value_type()
                .unwrap_or_else(|| QualifiedType::rhs_mutable(UnqualifiedType::Unknown)),
            ResultRule::Computed(f) => f(operand_types),
        }
    }
}

/// The global operator table (spec.md §4.4 "Registration": "Operators are
/// registered globally at process start; the registry initializes them
/// lazily once all argument types they reference can be resolved").
#[derive(Default)]
pub struct Registry {
    operators: Vec<Operator>,
    pending: Vec<Operator>,
    by_kind: HashMap<OperatorKind, Vec<OperatorIndex>>,
    by_name: HashMap<&'static str, Vec<OperatorIndex>>,
    initialized: bool,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Builds a registry pre-loaded with the built-in arithmetic,
    /// comparison, bitwise, logical, dereference, index, member, cast and
    /// sum operators, already initialized. Most call sites want this
    /// rather than building a `Registry` by hand.
    pub fn with_builtins() -> Self {
        let mut registry = Registry::new();
        for op in builtins::all() {
            registry.register(op);
        }
        registry.initialize();
        registry
    }

    /// Appends a pending operator. Does not become visible to `by_kind`/
    /// `by_name` lookups until the next [`Registry::initialize`] call
    /// (spec.md §4.4: "static registration appends to a pending list").
    pub fn register(&mut self, op: Operator) {
        self.pending.push(op);
    }

    /// Drains every pending operator into the index tables. Safe to call
    /// repeatedly (e.g. once per driver pass, after synthesized operators
    /// are registered) — already-indexed operators are untouched, and
    /// operators are append-only across calls.
    pub fn initialize(&mut self) {
        for op in self.pending.drain(..) {
            let idx = self.operators.len();
            self.by_kind.entry(op.kind).or_default().push(idx);
            if let Some(name) = op.name {
                self.by_name.entry(name).or_default().push(idx);
            }
            self.operators.push(op);
        }
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized && self.pending.is_empty()
    }

    pub fn get(&self, idx: OperatorIndex) -> &Operator {
        &self.operators[idx]
    }

    /// All registered indices for `kind` (spec.md §4.4 step 1: "For other
    /// kinds, consult `byKind(K)`").
    pub fn by_kind(&self, kind: OperatorKind) -> &[OperatorIndex] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All registered indices for built-in function/method `name`
    /// (spec.md §4.4 step 1: "consult the built-in function name index
    /// first").
    pub fn by_name(&self, name: &str) -> &[OperatorIndex] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

/// The built-in operator table: arithmetic/comparison/bitwise on scalar
/// types, plus index/member/deref shapes generic enough to match any
/// container. Kept deliberately small and structural — a cast or
/// user-declared custom operator is registered the same way by a caller
/// that has a concrete named type to bind, not hard-coded here.
mod builtins {
    use super::*;

    fn is_integer(t: &QualifiedType) -> bool {
        t.ty.is_integer()
    }

    fn is_bool(t: &QualifiedType) -> bool {
        matches!(t.ty, UnqualifiedType::Bool)
    }

    fn is_any(_t: &QualifiedType) -> bool {
        true
    }

    fn is_indexable(t: &QualifiedType) -> bool {
        matches!(
            t.ty,
            UnqualifiedType::Vector(_) | UnqualifiedType::List(_) | UnqualifiedType::Map(..) | UnqualifiedType::Bytes
        )
    }

    pub fn all() -> Vec<Operator> {
        use OperatorKind::*;
        use ResultRule::*;
        vec![
            Operator::new(Add, vec![is_integer, is_integer], SameAsOperand(0)),
            Operator::new(Sub, vec![is_integer, is_integer], SameAsOperand(0)),
            Operator::new(Mul, vec![is_integer, is_integer], SameAsOperand(0)),
            Operator::new(Div, vec![is_integer, is_integer], SameAsOperand(0)),
            Operator::new(Mod, vec![is_integer, is_integer], SameAsOperand(0)),
            Operator::new(BitAnd, vec![is_integer, is_integer], SameAsOperand(0)),
            Operator::new(BitOr, vec![is_integer, is_integer], SameAsOperand(0)),
            Operator::new(BitXor, vec![is_integer, is_integer], SameAsOperand(0)),
            Operator::new(Shl, vec![is_integer, is_integer], SameAsOperand(0)),
            Operator::new(Shr, vec![is_integer, is_integer], SameAsOperand(0)),
            Operator::new(Eq, vec![is_any, is_any], Fixed(UnqualifiedType::Bool)),
            Operator::new(Ne, vec![is_any, is_any], Fixed(UnqualifiedType::Bool)),
            Operator::new(Lt, vec![is_integer, is_integer], Fixed(UnqualifiedType::Bool)),
            Operator::new(Le, vec![is_integer, is_integer], Fixed(UnqualifiedType::Bool)),
            Operator::new(Gt, vec![is_integer, is_integer], Fixed(UnqualifiedType::Bool)),
            Operator::new(Ge, vec![is_integer, is_integer], Fixed(UnqualifiedType::Bool)),
            Operator::new(LogicalAnd, vec![is_bool, is_bool], Fixed(UnqualifiedType::Bool)),
            Operator::new(LogicalOr, vec![is_bool, is_bool], Fixed(UnqualifiedType::Bool)),
            Operator::new(Not, vec![is_bool], Fixed(UnqualifiedType::Bool)),
            Operator::new(Index, vec![is_indexable, is_integer], ElementOfOperand(0)),
            Operator::new(Deref, vec![is_any], ElementOfOperand(0)),
        ]
    }
}
