//! The type system.
//!
//! Two layers: [`UnqualifiedType`] is the shape of a value; [`QualifiedType`]
//! adds [`Constness`] and [`Side`], the currency expressions are actually
//! typed with.

use crate::node::NodeId;
use spicy_base::Id;

/// Whether a value may be mutated through a given type occurrence.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Constness {
    Const,
    Mutable,
}

/// Whether a given type occurrence sits in an assignable (addressable)
/// position.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    Lhs,
    Rhs,
}

/// The three ownership disciplines for heap-allocated unit instances.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReferenceKind {
    /// Single-owner, deep-copied on assignment.
    Value,
    /// Shared ownership; keeps the target alive.
    Strong,
    /// Non-owning; dereference fails if the target is gone.
    Weak,
}

/// A named struct/union/enum/bitfield member or tuple element.
#[derive(Clone, Debug)]
pub struct Field {
    pub name: Id,
    pub ty: QualifiedType,
}

#[derive(Clone, Debug)]
pub struct FunctionType {
    pub result: Box<QualifiedType>,
    pub parameters: Vec<Field>,
}

/// An integer byte order, relevant to Spicy's parse-type flavor of
/// `uint`/`int` but orthogonal to the abstract integer type itself.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ByteOrder {
    Big,
    Little,
    Network,
    Host,
}

/// The shape of a value, independent of constness/addressability.
#[derive(Clone, Debug)]
pub enum UnqualifiedType {
    // --- scalar ---
    Bool,
    SignedInteger(u8),
    UnsignedInteger(u8),
    Real,
    Interval,
    Time,
    Address,
    Port,
    Network,
    StringType,
    Bytes,
    Regexp,
    Stream,
    StreamView,
    StreamIterator,

    // --- compound ---
    Tuple(Vec<QualifiedType>),
    Struct(Vec<Field>),
    Union(Vec<Field>),
    Enum(Vec<Id>),
    /// A bitfield over an `N`-bit backing integer, each named bit-range
    /// `(name, lower, upper)` inclusive.
    Bitfield(u8, Vec<(Id, u8, u8)>),
    Optional(Box<QualifiedType>),
    Result(Box<QualifiedType>),
    Reference(ReferenceKind, Box<QualifiedType>),
    Vector(Box<QualifiedType>),
    List(Box<QualifiedType>),
    Set(Box<QualifiedType>),
    Map(Box<QualifiedType>, Box<QualifiedType>),
    /// An iterator over some container element type.
    Iterator(Box<QualifiedType>),

    Function(FunctionType),
    /// Opaque C++ type known only by its linker name.
    Library(String),
    /// A Spicy `unit` declaration, referenced by the [`NodeId`] of its
    /// `Declaration::Type`.
    Unit(NodeId),
    /// Unresolved reference to a declared type, by name.
    Name(Id),
    Void,
    /// To be inferred from an initializer.
    Auto,
    /// Placeholder for a type that resolution hasn't determined yet.
    Unknown,
}

impl UnqualifiedType {
    /// `true` iff no `Name`/`Unknown`/`Auto` placeholder appears anywhere
    /// in this type or its transitive element types.
    pub fn is_resolved(&self) -> bool {
        match self {
            UnqualifiedType::Name(_) | UnqualifiedType::Unknown | UnqualifiedType::Auto => false,
            UnqualifiedType::Tuple(fields) | UnqualifiedType::Struct(fields) | UnqualifiedType::Union(fields) => {
                fields.iter().all(|f| f.ty.is_resolved())
            }
            UnqualifiedType::Optional(t)
            | UnqualifiedType::Result(t)
            | UnqualifiedType::Reference(_, t)
            | UnqualifiedType::Vector(t)
            | UnqualifiedType::List(t)
            | UnqualifiedType::Set(t)
            | UnqualifiedType::Iterator(t) => t.is_resolved(),
            UnqualifiedType::Map(k, v) => k.is_resolved() && v.is_resolved(),
            UnqualifiedType::Function(f) => {
                f.result.is_resolved() && f.parameters.iter().all(|p| p.ty.is_resolved())
            }
            _ => true,
        }
    }

    /// The element type a container/reference/optional/result wraps, if any.
    pub fn element_type(&self) -> Option<&QualifiedType> {
        match self {
            UnqualifiedType::Optional(t)
            | UnqualifiedType::Result(t)
            | UnqualifiedType::Reference(_, t)
            | UnqualifiedType::Vector(t)
            | UnqualifiedType::List(t)
            | UnqualifiedType::Set(t)
            | UnqualifiedType::Iterator(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, UnqualifiedType::SignedInteger(_) | UnqualifiedType::UnsignedInteger(_))
    }
}

/// An [`UnqualifiedType`] plus the constness/side currency expressions carry
/// around it.
#[derive(Clone, Debug)]
pub struct QualifiedType {
    pub ty: UnqualifiedType,
    pub constness: Constness,
    pub side: Side,
}

impl QualifiedType {
    /// Constructs a qualified type. `Const` + `Lhs` is an invalid
    /// combination: a const value is never assignable, so it can never sit
    /// on the left of an assignment. Callers that would otherwise produce it
    /// should use [`QualifiedType::recreate_as_lhs`], which chooses a valid
    /// combination instead.
    pub fn new(ty: UnqualifiedType, constness: Constness, side: Side) -> Self {
        debug_assert!(
            !(constness == Constness::Const && side == Side::Lhs),
            "const values are never assignable, so they cannot be Lhs"
        );
        QualifiedType { ty, constness, side }
    }

    pub fn rhs_mutable(ty: UnqualifiedType) -> Self {
        QualifiedType::new(ty, Constness::Mutable, Side::Rhs)
    }

    pub fn rhs_const(ty: UnqualifiedType) -> Self {
        QualifiedType::new(ty, Constness::Const, Side::Rhs)
    }

    pub fn is_resolved(&self) -> bool {
        self.ty.is_resolved()
    }

    pub fn is_const(&self) -> bool {
        self.constness == Constness::Const
    }

    pub fn is_lhs(&self) -> bool {
        self.side == Side::Lhs
    }

    /// Preserves type identity (the `ty` field) but flips side/const to
    /// produce a valid assignable occurrence.
    /// `Const` types cannot become `Lhs`: they stay `Rhs` since they remain
    /// unassignable regardless of position.
    pub fn recreate_as_lhs(&self) -> QualifiedType {
        if self.constness == Constness::Const {
            QualifiedType::new(self.ty.clone(), Constness::Const, Side::Rhs)
        } else {
            QualifiedType::new(self.ty.clone(), Constness::Mutable, Side::Lhs)
        }
    }

    /// The element type of a container/reference/optional/result, with
    /// constness propagated down one level.
    pub fn value_type(&self) -> Option<QualifiedType> {
        self.ty.element_type().map(|inner| {
            let constness = if self.constness == Constness::Const {
                Constness::Const
            } else {
                inner.constness
            };
            QualifiedType::new(inner.ty.clone(), constness, Side::Rhs)
        })
    }

    /// The key/value element types of a `map`, with constness propagated.
    pub fn map_types(&self) -> Option<(QualifiedType, QualifiedType)> {
        match &self.ty {
            UnqualifiedType::Map(k, v) => {
                let propagate = |inner: &QualifiedType| {
                    let constness = if self.constness == Constness::Const {
                        Constness::Const
                    } else {
                        inner.constness
                    };
                    QualifiedType::new(inner.ty.clone(), constness, Side::Rhs)
                };
                Some((propagate(k), propagate(v)))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_name_type_is_not_resolved() {
        let mut interner = spicy_base::Interner::new();
        let id = Id::parse(&mut interner, "Foo");
        let qt = QualifiedType::rhs_mutable(UnqualifiedType::Name(id));
        assert!(!qt.is_resolved());
    }

    #[test]
    fn resolved_nested_container_is_resolved() {
        let qt = QualifiedType::rhs_mutable(UnqualifiedType::Vector(Box::new(
            QualifiedType::rhs_mutable(UnqualifiedType::UnsignedInteger(32)),
        )));
        assert!(qt.is_resolved());
    }

    #[test]
    fn unresolved_element_type_propagates_up() {
        let qt = QualifiedType::rhs_mutable(UnqualifiedType::Vector(Box::new(
            QualifiedType::rhs_mutable(UnqualifiedType::Auto),
        )));
        assert!(!qt.is_resolved());
    }

    #[test]
    fn recreate_as_lhs_flips_mutable_to_lhs() {
        let qt = QualifiedType::rhs_mutable(UnqualifiedType::Bool);
        let lhs = qt.recreate_as_lhs();
        assert!(lhs.is_lhs());
        assert!(!lhs.is_const());
    }

    #[test]
    fn recreate_as_lhs_keeps_const_values_on_rhs() {
        let qt = QualifiedType::rhs_const(UnqualifiedType::Bool);
        let still_rhs = qt.recreate_as_lhs();
        assert!(!still_rhs.is_lhs());
        assert!(still_rhs.is_const());
    }

    #[test]
    fn value_type_propagates_const_into_element() {
        let inner = QualifiedType::rhs_mutable(UnqualifiedType::StringType);
        let map_value_container = QualifiedType::new(
            UnqualifiedType::Vector(Box::new(inner)),
            Constness::Const,
            Side::Rhs,
        );
        let value_ty = map_value_container.value_type().unwrap();
        assert!(value_ty.is_const());
    }

    #[test]
    fn map_types_returns_key_and_value() {
        let key = QualifiedType::rhs_mutable(UnqualifiedType::StringType);
        let value = QualifiedType::rhs_mutable(UnqualifiedType::Bool);
        let map = QualifiedType::rhs_mutable(UnqualifiedType::Map(Box::new(key), Box::new(value)));
        let (k, v) = map.map_types().unwrap();
        assert!(matches!(k.ty, UnqualifiedType::StringType));
        assert!(matches!(v.ty, UnqualifiedType::Bool));
    }
}
