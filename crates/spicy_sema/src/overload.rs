//! Overload resolution: turns an `UnresolvedOperator` occurrence into a
//! `ResolvedOperator` bound to exactly one `Operator` definition (spec.md
//! §4.4 "Resolution").

use crate::coerce::{coerce, CoercionStyle};
use crate::operator::{OperatorIndex, Registry};
use crate::unify::CanonicalIds;
use spicy_ast::{Expression, OperatorId, OperatorKind, QualifiedType};
use spicy_base::{Diagnostic, Interner, Span};

/// A fully-coerced candidate: the operator it bound to, the coerced
/// operand list, and the computed result type. Kept around between
/// "find candidates" and "pick the winner" so overload resolution can
/// report every tied candidate on ambiguity.
struct Candidate {
    index: OperatorIndex,
    operands: Vec<Expression>,
    result_type: QualifiedType,
    priority: i32,
}

/// Resolves `kind(operands)` against `registry`, coercing each operand
/// under `style` (spec.md §4.4 steps 1-4).
///
/// `operand_types` gives each operand's *current* type (the resolver has
/// already resolved the operands themselves by the time an operator
/// occurrence over them is considered, since operator resolution runs
/// bottom-up over the expression tree).
pub fn resolve(
    registry: &Registry,
    kind: OperatorKind,
    operands: Vec<Expression>,
    operand_types: &[QualifiedType],
    style: CoercionStyle,
    interner: &Interner,
    ids: &CanonicalIds,
) -> Result<Expression, Diagnostic> {
    let candidate_indices = registry.by_kind(kind);
    resolve_candidates(registry, candidate_indices, kind, operands, operand_types, style, interner, ids)
}

/// As [`resolve`], but for `Call`/`MemberCall` occurrences where candidates
/// come from the built-in name index rather than `by_kind` (spec.md §4.4
/// step 1: "for `Call`, consult the built-in function name index first").
pub fn resolve_by_name(
    registry: &Registry,
    kind: OperatorKind,
    name: &str,
    operands: Vec<Expression>,
    operand_types: &[QualifiedType],
    style: CoercionStyle,
    interner: &Interner,
    ids: &CanonicalIds,
) -> Result<Expression, Diagnostic> {
    let candidate_indices = registry.by_name(name);
    resolve_candidates(registry, candidate_indices, kind, operands, operand_types, style, interner, ids)
}

fn resolve_candidates(
    registry: &Registry,
    candidate_indices: &[OperatorIndex],
    kind: OperatorKind,
    operands: Vec<Expression>,
    operand_types: &[QualifiedType],
    style: CoercionStyle,
    interner: &Interner,
    ids: &CanonicalIds,
) -> Result<Expression, Diagnostic> {
    if operand_types.iter().any(|t| !t.is_resolved()) {
        // spec.md §4.4/§7: operand types still unresolved defers to the
        // next driver pass rather than being an immediate error.
        return Err(Diagnostic::error(
            "operator-pending",
            "operand types not yet resolved",
            Span::synthetic(),
        ));
    }

    let mut candidates = Vec::new();
    for &idx in candidate_indices {
        let op = registry.get(idx);
        if op.operands.len() != operand_types.len() {
            continue;
        }
        let mut coerced_operands = Vec::with_capacity(operands.len());
        let mut coerced_types = Vec::with_capacity(operand_types.len());
        let mut all_coerce = true;
        for (i, operand_ty) in operand_types.iter().enumerate() {
            // Each formal slot is itself a type the operand's actual type
            // must coerce to; built-in operators describe their slots as
            // predicates rather than concrete types, so we coerce against
            // the operand's own type when the predicate already accepts it
            // (no transformation needed) and otherwise reject the candidate.
            if (op.operands[i])(operand_ty) {
                match coerce(operands[i].clone(), operand_ty, operand_ty, style, interner, ids) {
                    Ok(coerced) => {
                        coerced_operands.push(coerced);
                        coerced_types.push(operand_ty.clone());
                    }
                    Err(_) => {
                        all_coerce = false;
                        break;
                    }
                }
            } else {
                all_coerce = false;
                break;
            }
        }
        if !all_coerce {
            continue;
        }
        let result_type = op.result_type(&coerced_types);
        candidates.push(Candidate { index: idx, operands: coerced_operands, result_type, priority: op.priority });
    }

    if candidates.is_empty() {
        return Err(Diagnostic::error(
            "no-matching-operator",
            format!("no operator of kind {kind:?} accepts the given operand types"),
            Span::synthetic(),
        ));
    }

    let best_priority = candidates.iter().map(|c| c.priority).max().unwrap();
    let mut winners: Vec<Candidate> = candidates.into_iter().filter(|c| c.priority == best_priority).collect();

    if winners.len() > 1 {
        return Err(Diagnostic::error(
            "ambiguous-operator",
            format!("{} candidates of kind {kind:?} all match with equal priority", winners.len()),
            Span::synthetic(),
        ));
    }

    let winner = winners.pop().unwrap();
    Ok(Expression::ResolvedOperator {
        kind,
        operator: OperatorId(winner.index as u32),
        operands: winner.operands,
        result_type: winner.result_type,
    })
}
