//! Expressions, including the unresolved/resolved operator-occurrence nodes
//! the overload resolver works over.
//!
//! `spicy_ast` only knows the *shape* of an operator occurrence — its
//! [`OperatorKind`] and operand list — plus an opaque [`OperatorId`] handle
//! once resolved. The actual `Operator` definitions the handle indexes into
//! live in `spicy_sema::operator`, one layer up; `spicy_ast` must not depend
//! on it.

use crate::ctor::Ctor;
use crate::node::NodeId;
use crate::ty::QualifiedType;
use spicy_base::Id;

/// The kind of operator an occurrence invokes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    BitAnd,
    BitOr,
    BitXor,
    LogicalAnd,
    LogicalOr,
    Not,
    Shl,
    Shr,
    Deref,
    Index,
    Member,
    MemberCall,
    Call,
    HasMember,
    Cast,
    Sum,
    Custom,
}

/// A handle into whatever registry resolved this operator occurrence.
/// Opaque at the `spicy_ast` layer; `spicy_sema::operator::Registry` owns
/// the mapping back to a concrete `Operator` definition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OperatorId(pub u32);

#[derive(Clone, Debug)]
pub enum Expression {
    Void,
    Null,
    Ctor(Ctor),
    /// An identifier occurrence not yet bound to a declaration.
    Name(Id),
    /// An identifier occurrence resolved to a specific declaration.
    ResolvedId(NodeId, Id),
    /// An operator occurrence awaiting resolution.
    UnresolvedOperator { kind: OperatorKind, operands: Vec<Expression> },
    /// An operator occurrence bound to exactly one `Operator` definition,
    /// operands already coerced to its formal types.
    ResolvedOperator {
        kind: OperatorKind,
        operator: OperatorId,
        operands: Vec<Expression>,
        result_type: QualifiedType,
    },
    Ternary(Box<Expression>, Box<Expression>, Box<Expression>),
    /// `$$`, the value bound inside a field hook.
    DollarDollar,
    /// `self`, the in-progress unit instance inside unit-scoped code.
    SelfValue,
}

impl Expression {
    pub fn tag(&self) -> &'static str {
        match self {
            Expression::Void => "void",
            Expression::Null => "null",
            Expression::Ctor(c) => c.tag(),
            Expression::Name(_) => "name",
            Expression::ResolvedId(..) => "resolved-id",
            Expression::UnresolvedOperator { .. } => "unresolved-operator",
            Expression::ResolvedOperator { .. } => "resolved-operator",
            Expression::Ternary(..) => "ternary",
            Expression::DollarDollar => "dollardollar",
            Expression::SelfValue => "self",
        }
    }

    /// `true` iff this occurrence has been bound to exactly one operator:
    /// every occurrence ends up referencing exactly one `Operator`
    /// definition once resolution completes.
    pub fn is_resolved(&self) -> bool {
        match self {
            Expression::UnresolvedOperator { .. } | Expression::Name(_) => false,
            Expression::ResolvedOperator { operands, .. } => operands.iter().all(Expression::is_resolved),
            Expression::Ternary(c, t, f) => c.is_resolved() && t.is_resolved() && f.is_resolved(),
            _ => true,
        }
    }

    /// The result type of a resolved operator occurrence, if any.
    pub fn result_type(&self) -> Option<&QualifiedType> {
        match self {
            Expression::ResolvedOperator { result_type, .. } => Some(result_type),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{Constness, Side, UnqualifiedType};

    #[test]
    fn unresolved_operator_is_not_resolved() {
        let e = Expression::UnresolvedOperator { kind: OperatorKind::Add, operands: vec![] };
        assert!(!e.is_resolved());
    }

    #[test]
    fn resolved_operator_with_resolved_operands_is_resolved() {
        let e = Expression::ResolvedOperator {
            kind: OperatorKind::Add,
            operator: OperatorId(0),
            operands: vec![Expression::Void, Expression::Void],
            result_type: QualifiedType::new(UnqualifiedType::Bool, Constness::Mutable, Side::Rhs),
        };
        assert!(e.is_resolved());
        assert!(e.result_type().is_some());
    }

    #[test]
    fn resolved_operator_with_unresolved_operand_is_not_resolved() {
        let unresolved_operand = Expression::UnresolvedOperator { kind: OperatorKind::Add, operands: vec![] };
        let e = Expression::ResolvedOperator {
            kind: OperatorKind::Add,
            operator: OperatorId(0),
            operands: vec![unresolved_operand],
            result_type: QualifiedType::new(UnqualifiedType::Bool, Constness::Mutable, Side::Rhs),
        };
        assert!(!e.is_resolved());
    }
}
