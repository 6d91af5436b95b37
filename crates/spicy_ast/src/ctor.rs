//! Ctors: literal constructor expressions. Every declaration, statement,
//! expression, ctor and type is a node in the same arena.

use crate::expr::Expression;
use crate::ty::QualifiedType;
use spicy_base::Id;

/// A value literally spelled out in source: `42`, `"foo"`, `b"\x01\x02"`,
/// `/foo.*bar/`, `[1, 2, 3]`, a tuple, struct, or enum label.
#[derive(Clone, Debug)]
pub enum Ctor {
    Bool(bool),
    SignedInteger(i64, u8),
    UnsignedInteger(u64, u8),
    Real(f64),
    StringValue(String),
    Bytes(Vec<u8>),
    Regexp(String),
    Tuple(Vec<Expression>),
    Vector(Option<QualifiedType>, Vec<Expression>),
    List(Option<QualifiedType>, Vec<Expression>),
    Set(Option<QualifiedType>, Vec<Expression>),
    Map(Option<QualifiedType>, Option<QualifiedType>, Vec<(Expression, Expression)>),
    /// A named-struct literal: `Foo { a=1, b=2 }`.
    Struct(Id, Vec<(Id, Expression)>),
    /// An enum label reference, e.g. `MyEnum::Value`.
    EnumLabel(Id),
    Null,
}

impl Ctor {
    pub fn tag(&self) -> &'static str {
        match self {
            Ctor::Bool(_) => "ctor-bool",
            Ctor::SignedInteger(..) => "ctor-sint",
            Ctor::UnsignedInteger(..) => "ctor-uint",
            Ctor::Real(_) => "ctor-real",
            Ctor::StringValue(_) => "ctor-string",
            Ctor::Bytes(_) => "ctor-bytes",
            Ctor::Regexp(_) => "ctor-regexp",
            Ctor::Tuple(_) => "ctor-tuple",
            Ctor::Vector(..) => "ctor-vector",
            Ctor::List(..) => "ctor-list",
            Ctor::Set(..) => "ctor-set",
            Ctor::Map(..) => "ctor-map",
            Ctor::Struct(..) => "ctor-struct",
            Ctor::EnumLabel(_) => "ctor-enum-label",
            Ctor::Null => "ctor-null",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable_strings() {
        assert_eq!(Ctor::Bool(true).tag(), "ctor-bool");
        assert_eq!(Ctor::Null.tag(), "ctor-null");
    }
}
