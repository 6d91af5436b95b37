//! Canonical string form for structural type equivalence (spec.md §4.5
//! "Unifier").
//!
//! Two [`UnqualifiedType`]s are identical iff [`unify`] produces the same
//! string for both. Named types (units) are identified by their declared
//! canonical [`Id`], not by structure, so two distinct unit declarations
//! with identical field lists still unify to different strings.

use spicy_ast::{FunctionType, NodeId, UnqualifiedType};
use spicy_base::{Id, Interner};
use std::collections::HashMap;

/// Maps a declared unit's [`NodeId`] to its fully qualified canonical [`Id`].
/// Built by the scope/resolve passes (spec.md §4.3 "Success returns ... its
/// *qualified* canonical ID") and handed to the unifier so `Unit(NodeId)`
/// types unify by name rather than by arbitrary handle value.
pub type CanonicalIds = HashMap<NodeId, Id>;

/// Produces the canonical unification string for `ty`.
///
/// The string is deterministic and side-effect-free: calling `unify` twice
/// on structurally equal types (even built independently) yields identical
/// output, which is the whole point — it replaces pointer/handle identity
/// with a comparable key (spec.md §4.5, §8 "Unifying a type and parsing its
/// unified form back yields an equivalent type").
pub fn unify(ty: &UnqualifiedType, interner: &Interner, canonical_ids: &CanonicalIds) -> String {
    let mut out = String::new();
    write_unified(ty, interner, canonical_ids, &mut out);
    out
}

fn write_unified(ty: &UnqualifiedType, interner: &Interner, ids: &CanonicalIds, out: &mut String) {
    use UnqualifiedType::*;
    match ty {
        Bool => out.push_str("bool"),
        SignedInteger(n) => out.push_str(&format!("int{n}")),
        UnsignedInteger(n) => out.push_str(&format!("uint{n}")),
        Real => out.push_str("real"),
        Interval => out.push_str("interval"),
        Time => out.push_str("time"),
        Address => out.push_str("addr"),
        Port => out.push_str("port"),
        Network => out.push_str("network"),
        StringType => out.push_str("string"),
        Bytes => out.push_str("bytes"),
        Regexp => out.push_str("regexp"),
        Stream => out.push_str("stream"),
        StreamView => out.push_str("stream_view"),
        StreamIterator => out.push_str("stream_iterator"),
        Tuple(fields) => write_field_list(out, "tuple", fields, interner, ids),
        Struct(fields) => write_field_list(out, "struct", fields, interner, ids),
        Union(fields) => write_field_list(out, "union", fields, interner, ids),
        Enum(labels) => {
            out.push_str("enum(");
            for (i, label) in labels.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&label.display(interner).to_string());
            }
            out.push(')');
        }
        Bitfield(width, bits) => {
            out.push_str(&format!("bitfield{width}("));
            for (i, (name, lo, hi)) in bits.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&format!("{}:{}..{}", name.display(interner), lo, hi));
            }
            out.push(')');
        }
        Optional(t) => write_wrapper(out, "optional", t, interner, ids),
        Result(t) => write_wrapper(out, "result", t, interner, ids),
        Reference(kind, t) => {
            let name = match kind {
                spicy_ast::ReferenceKind::Value => "value_ref",
                spicy_ast::ReferenceKind::Strong => "strong_ref",
                spicy_ast::ReferenceKind::Weak => "weak_ref",
            };
            write_wrapper(out, name, t, interner, ids);
        }
        Vector(t) => write_wrapper(out, "vector", t, interner, ids),
        List(t) => write_wrapper(out, "list", t, interner, ids),
        Set(t) => write_wrapper(out, "set", t, interner, ids),
        Map(k, v) => {
            out.push_str("map(");
            write_unified(&k.ty, interner, ids, out);
            out.push(',');
            write_unified(&v.ty, interner, ids, out);
            out.push(')');
        }
        Iterator(t) => write_wrapper(out, "iterator", t, interner, ids),
        Function(f) => write_function(out, f, interner, ids),
        Library(name) => out.push_str(&format!("library({name})")),
        Unit(node) => match ids.get(node) {
            Some(id) => out.push_str(&format!("unit({})", id.display(interner))),
            None => out.push_str(&format!("unit(#{node:?})")),
        },
        Name(id) => out.push_str(&format!("name({})", id.display(interner))),
        Void => out.push_str("void"),
        Auto => out.push_str("auto"),
        Unknown => out.push_str("unknown"),
    }
}

fn write_field_list(
    out: &mut String,
    tag: &str,
    fields: &[spicy_ast::Field],
    interner: &Interner,
    ids: &CanonicalIds,
) {
    out.push_str(tag);
    out.push('(');
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&field.name.display(interner).to_string());
        out.push(':');
        write_unified(&field.ty.ty, interner, ids, out);
    }
    out.push(')');
}

fn write_wrapper(
    out: &mut String,
    tag: &str,
    inner: &spicy_ast::QualifiedType,
    interner: &Interner,
    ids: &CanonicalIds,
) {
    out.push_str(tag);
    out.push('(');
    write_unified(&inner.ty, interner, ids, out);
    out.push(')');
}

fn write_function(out: &mut String, f: &FunctionType, interner: &Interner, ids: &CanonicalIds) {
    out.push_str("function(");
    write_unified(&f.result.ty, interner, ids, out);
    out.push(';');
    for (i, p) in f.parameters.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_unified(&p.ty.ty, interner, ids, out);
    }
    out.push(')');
}

/// `true` iff `a` and `b` unify to the same canonical string — the
/// structural-equality test every higher layer (coercion, overload
/// resolution) should use instead of comparing `UnqualifiedType` values
/// or `NodeId`s directly.
pub fn types_equivalent(
    a: &UnqualifiedType,
    b: &UnqualifiedType,
    interner: &Interner,
    ids: &CanonicalIds,
) -> bool {
    unify(a, interner, ids) == unify(b, interner, ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spicy_ast::{Constness, Field, QualifiedType, Side};

    fn qt(ty: UnqualifiedType) -> QualifiedType {
        QualifiedType::new(ty, Constness::Mutable, Side::Rhs)
    }

    #[test]
    fn scalars_unify_by_shape() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        assert_eq!(
            unify(&UnqualifiedType::UnsignedInteger(32), &interner, &ids),
            unify(&UnqualifiedType::UnsignedInteger(32), &interner, &ids)
        );
        assert_ne!(
            unify(&UnqualifiedType::UnsignedInteger(32), &interner, &ids),
            unify(&UnqualifiedType::UnsignedInteger(16), &interner, &ids)
        );
    }

    #[test]
    fn vectors_unify_structurally() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let a = UnqualifiedType::Vector(Box::new(qt(UnqualifiedType::Bool)));
        let b = UnqualifiedType::Vector(Box::new(qt(UnqualifiedType::Bool)));
        assert!(types_equivalent(&a, &b, &interner, &ids));
    }

    #[test]
    fn tuples_are_order_sensitive() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let a = UnqualifiedType::Tuple(vec![qt(UnqualifiedType::Bool), qt(UnqualifiedType::Real)]);
        let b = UnqualifiedType::Tuple(vec![qt(UnqualifiedType::Real), qt(UnqualifiedType::Bool)]);
        assert!(!types_equivalent(&a, &b, &interner, &ids));
    }

    #[test]
    fn structs_compare_field_names_and_types() {
        let mut interner = Interner::new();
        let ids = CanonicalIds::new();
        let a = UnqualifiedType::Struct(vec![Field { name: Id::parse(&mut interner, "x"), ty: qt(UnqualifiedType::Bool) }]);
        let b = UnqualifiedType::Struct(vec![Field { name: Id::parse(&mut interner, "x"), ty: qt(UnqualifiedType::Bool) }]);
        assert!(types_equivalent(&a, &b, &interner, &ids));
    }

    #[test]
    fn distinct_unit_declarations_do_not_unify() {
        let interner = Interner::new();
        let mut ids = CanonicalIds::new();
        let mut interner2 = Interner::new();
        let n1 = spicy_ast::NodeId::new(0);
        let n2 = spicy_ast::NodeId::new(1);
        ids.insert(n1, Id::parse(&mut interner2, "Mod::A"));
        ids.insert(n2, Id::parse(&mut interner2, "Mod::B"));
        let a = UnqualifiedType::Unit(n1);
        let b = UnqualifiedType::Unit(n2);
        // identifiers were interned in `interner2`, not `interner`, but
        // `unify` only dereferences the canonical `Id` through `ids`, so
        // comparing with `interner` here would be wrong in real code; this
        // test only exercises that distinct NodeIds produce distinct keys,
        // and deliberately uses interner2 to render them.
        assert_ne!(unify(&a, &interner2, &ids), unify(&b, &interner2, &ids));
        let _ = interner;
    }

    #[test]
    fn unification_is_idempotent() {
        let interner = Interner::new();
        let ids = CanonicalIds::new();
        let ty = UnqualifiedType::Map(Box::new(qt(UnqualifiedType::StringType)), Box::new(qt(UnqualifiedType::Bool)));
        let once = unify(&ty, &interner, &ids);
        let twice = unify(&ty, &interner, &ids);
        assert_eq!(once, twice);
    }
}
