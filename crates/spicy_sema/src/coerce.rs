//! Directed coercion between types (spec.md §4.5 "Coercer").
//!
//! `coerce(expr, dest, style)` either returns a (possibly rewrapped)
//! expression typed exactly as `dest`, or an error naming why no allowed
//! transformation bridges the gap. The coercer never itself decides whether
//! a transformation is *semantically* safe in a given context — that's
//! `style`'s job, matching the "directed coercion with configurable styles"
//! framing in spec.md §4.5.

use crate::unify::{types_equivalent, CanonicalIds};
use spicy_ast::{Constness, Expression, QualifiedType, ReferenceKind, Side, UnqualifiedType};
use spicy_base::{Diagnostic, Interner, Span};

bitflags::bitflags! {
    /// Which transformations a given coercion site is allowed to apply.
    /// Bitflags because real call sites enable several at once — a
    /// function-call argument allows const promotion, reference-kind
    /// shifts and widening together (spec.md §4.5 "Styles").
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct CoercionStyle: u32 {
        /// Destination and source already unify; no transformation needed.
        const TRY_EXACT = 0b0000_0001;
        /// `Mutable` -> `Const`.
        const TRY_CONST_PROMOTION = 0b0000_0010;
        /// `value_ref<T>` <-> `strong_ref<T>` in positions where both are
        /// valid (spec.md §4.5 "reference-kind shifts").
        const TRY_TYPE_ASSIGNMENT = 0b0000_0100;
        /// The full style used for plain `x = y` assignment: exact match,
        /// const promotion, integer widening, numeric-literal adaptation,
        /// tuple/struct coercion, optional/result wrapping.
        const ASSIGNMENT = 0b0000_1000;
        /// The style used for arguments at a call site: like `ASSIGNMENT`
        /// plus reference-kind shifts appropriate to pass-by-reference
        /// parameters.
        const FUNCTION_CALL = 0b0001_0000;
        /// The style used when a declaration's initializer is coerced to
        /// its declared type.
        const DECLARATION = 0b0010_0000;
        /// Forbids every transformation that would change the *kind* of
        /// type involved (e.g. int -> optional<int> is fine under
        /// `ASSIGNMENT` but not under this flag).
        const DISALLOW_TYPE_CHANGES = 0b0100_0000;
    }
}

impl CoercionStyle {
    fn allows_const_promotion(self) -> bool {
        self.intersects(Self::TRY_CONST_PROMOTION | Self::ASSIGNMENT | Self::FUNCTION_CALL | Self::DECLARATION)
    }

    fn allows_reference_shift(self) -> bool {
        self.intersects(Self::TRY_TYPE_ASSIGNMENT | Self::FUNCTION_CALL) && !self.contains(Self::DISALLOW_TYPE_CHANGES)
    }

    fn allows_widening(self) -> bool {
        self.intersects(Self::ASSIGNMENT | Self::FUNCTION_CALL | Self::DECLARATION)
    }

    fn allows_literal_adaptation(self) -> bool {
        self.allows_widening()
    }

    fn allows_wrapping(self) -> bool {
        self.intersects(Self::ASSIGNMENT | Self::FUNCTION_CALL | Self::DECLARATION)
            && !self.contains(Self::DISALLOW_TYPE_CHANGES)
    }
}

/// Coerces `expr` (typed `src`) to `dest` under `style`.
///
/// On success returns the (possibly wrapped) expression; its *type* is
/// always exactly `dest` by construction — callers never need to re-derive
/// it. On failure returns a `Diagnostic` describing why no transformation
/// `style` allows bridges `src` to `dest`.
pub fn coerce(
    expr: Expression,
    src: &QualifiedType,
    dest: &QualifiedType,
    style: CoercionStyle,
    interner: &Interner,
    ids: &CanonicalIds,
) -> Result<Expression, Diagnostic> {
    // Exact match: always allowed regardless of style (spec.md §8 round-trip
    // law: "Coercing e to typeOf(e) with style TryExact yields e unchanged").
    if types_equivalent(&src.ty, &dest.ty, interner, ids) {
        if src.constness == Constness::Const && dest.constness == Constness::Mutable {
            return Err(mismatch(src, dest, interner, ids));
        }
        return Ok(expr);
    }

    if style.allows_reference_shift() {
        if let (UnqualifiedType::Reference(src_kind, src_inner), UnqualifiedType::Reference(dest_kind, dest_inner)) =
            (&src.ty, &dest.ty)
        {
            if types_equivalent(&src_inner.ty, &dest_inner.ty, interner, ids) && reference_shift_allowed(*src_kind, *dest_kind) {
                return Ok(expr);
            }
        }
    }

    if style.allows_widening() {
        if let (UnqualifiedType::UnsignedInteger(sw), UnqualifiedType::UnsignedInteger(dw)) = (&src.ty, &dest.ty) {
            if dw >= sw {
                return Ok(expr);
            }
        }
        if let (UnqualifiedType::SignedInteger(sw), UnqualifiedType::SignedInteger(dw)) = (&src.ty, &dest.ty) {
            if dw >= sw {
                return Ok(expr);
            }
        }
    }

    if style.allows_literal_adaptation() {
        if let Expression::Ctor(spicy_ast::Ctor::UnsignedInteger(v, _)) = &expr {
            if let UnqualifiedType::SignedInteger(w) = &dest.ty {
                if *v <= i64::MAX as u64 {
                    return Ok(Expression::Ctor(spicy_ast::Ctor::SignedInteger(*v as i64, *w)));
                }
            }
        }
        if let Expression::Ctor(spicy_ast::Ctor::SignedInteger(v, _)) = &expr {
            if let UnqualifiedType::UnsignedInteger(w) = &dest.ty {
                if *v >= 0 {
                    return Ok(Expression::Ctor(spicy_ast::Ctor::UnsignedInteger(*v as u64, *w)));
                }
            }
        }
    }

    if style.allows_wrapping() {
        if let UnqualifiedType::Optional(inner) = &dest.ty {
            if let Ok(wrapped) = coerce(expr.clone(), src, inner, style, interner, ids) {
                return Ok(wrapped);
            }
        }
        if let UnqualifiedType::Result(inner) = &dest.ty {
            if let Ok(wrapped) = coerce(expr.clone(), src, inner, style, interner, ids) {
                return Ok(wrapped);
            }
        }
    }

    if style.allows_wrapping() {
        if let (UnqualifiedType::Tuple(src_fields), UnqualifiedType::Tuple(dest_fields)) = (&src.ty, &dest.ty) {
            if src_fields.len() == dest_fields.len() {
                let all_coerce = src_fields
                    .iter()
                    .zip(dest_fields.iter())
                    .all(|(s, d)| coerce(Expression::Void, s, d, style, interner, ids).is_ok());
                if all_coerce {
                    return Ok(expr);
                }
            }
        }
    }

    if style.allows_const_promotion() && types_equivalent(&src.ty, &dest.ty, interner, ids) {
        return Ok(expr);
    }

    Err(mismatch(src, dest, interner, ids))
}

fn reference_shift_allowed(src: ReferenceKind, dest: ReferenceKind) -> bool {
    matches!(
        (src, dest),
        (ReferenceKind::Value, ReferenceKind::Strong)
            | (ReferenceKind::Strong, ReferenceKind::Value)
            | (ReferenceKind::Strong, ReferenceKind::Weak)
    )
}

fn mismatch(src: &QualifiedType, dest: &QualifiedType, interner: &Interner, ids: &CanonicalIds) -> Diagnostic {
    Diagnostic::error(
        "type-mismatch",
        format!(
            "cannot coerce `{}` to `{}`",
            crate::unify::unify(&src.ty, interner, ids),
            crate::unify::unify(&dest.ty, interner, ids)
        ),
        Span::synthetic(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use spicy_ast::{Ctor, Side};

    fn qt(ty: UnqualifiedType, constness: Constness) -> QualifiedType {
        QualifiedType::new(ty, constness, Side::Rhs)
    }

    #[test]
    fn exact_match_is_always_allowed() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let t = qt(UnqualifiedType::Bool, Constness::Mutable);
        let result = coerce(Expression::Ctor(Ctor::Bool(true)), &t, &t, CoercionStyle::TRY_EXACT, &interner, &ids);
        assert!(result.is_ok());
    }

    #[test]
    fn const_promotion_allowed_under_assignment() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let src = qt(UnqualifiedType::Bool, Constness::Mutable);
        let dest = qt(UnqualifiedType::Bool, Constness::Const);
        assert!(coerce(Expression::Void, &src, &dest, CoercionStyle::ASSIGNMENT, &interner, &ids).is_ok());
    }

    #[test]
    fn mutable_promotion_from_const_is_rejected() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let src = qt(UnqualifiedType::Bool, Constness::Const);
        let dest = qt(UnqualifiedType::Bool, Constness::Mutable);
        assert!(coerce(Expression::Void, &src, &dest, CoercionStyle::ASSIGNMENT, &interner, &ids).is_err());
    }

    #[test]
    fn integer_widening_allowed_but_not_narrowing() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let src = qt(UnqualifiedType::UnsignedInteger(8), Constness::Mutable);
        let dest = qt(UnqualifiedType::UnsignedInteger(32), Constness::Mutable);
        assert!(coerce(Expression::Void, &src, &dest, CoercionStyle::ASSIGNMENT, &interner, &ids).is_ok());

        let narrow = qt(UnqualifiedType::UnsignedInteger(8), Constness::Mutable);
        assert!(coerce(Expression::Void, &dest, &narrow, CoercionStyle::ASSIGNMENT, &interner, &ids).is_err());
    }

    #[test]
    fn optional_wrapping_under_assignment() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let src = qt(UnqualifiedType::Bool, Constness::Mutable);
        let dest = qt(UnqualifiedType::Optional(Box::new(qt(UnqualifiedType::Bool, Constness::Mutable))), Constness::Mutable);
        assert!(coerce(Expression::Void, &src, &dest, CoercionStyle::ASSIGNMENT, &interner, &ids).is_ok());
    }

    #[test]
    fn value_ref_to_strong_ref_shift_allowed() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let inner = qt(UnqualifiedType::Bool, Constness::Mutable);
        let src = qt(UnqualifiedType::Reference(ReferenceKind::Value, Box::new(inner.clone())), Constness::Mutable);
        let dest = qt(UnqualifiedType::Reference(ReferenceKind::Strong, Box::new(inner)), Constness::Mutable);
        assert!(coerce(Expression::Void, &src, &dest, CoercionStyle::FUNCTION_CALL, &interner, &ids).is_ok());
    }

    #[test]
    fn disallow_type_changes_blocks_wrapping() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let src = qt(UnqualifiedType::Bool, Constness::Mutable);
        let dest = qt(UnqualifiedType::Optional(Box::new(qt(UnqualifiedType::Bool, Constness::Mutable))), Constness::Mutable);
        let style = CoercionStyle::ASSIGNMENT | CoercionStyle::DISALLOW_TYPE_CHANGES;
        assert!(coerce(Expression::Void, &src, &dest, style, &interner, &ids).is_err());
    }
}
