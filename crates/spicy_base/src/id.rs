//! `::`-separated identifier paths.
//!
//! An [`Id`] is the name vocabulary every declaration, scope entry and
//! operator-registry key is built from. Components are interned so that
//! comparing two `Id`s is a slice-of-`Symbol` comparison rather than a
//! string compare.

use crate::intern::{Interner, Symbol};
use std::fmt;

/// An insertion-ordered sequence of `::`-separated components.
///
/// `Id` is intentionally cheap to clone (it owns a `Vec<Symbol>`, not
/// strings) since scopes and resolver passes copy IDs around freely.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Id {
    components: Vec<Symbol>,
}

impl Id {
    /// An empty identifier (no components).
    pub fn empty() -> Self {
        Id { components: Vec::new() }
    }

    /// Builds an `Id` from an already-interned component list.
    pub fn from_components(components: Vec<Symbol>) -> Self {
        Id { components }
    }

    /// Interns and splits `path` on `::` into an `Id`.
    ///
    /// `""` produces the empty `Id`; a leading `::` is treated as an
    /// ordinary (empty) first component rather than stripped, matching the
    /// source's "absolute IDs are just IDs whose first component is empty"
    /// convention.
    pub fn parse(interner: &mut Interner, path: &str) -> Self {
        if path.is_empty() {
            return Id::empty();
        }
        let components = path.split("::").map(|part| interner.intern(part)).collect();
        Id { components }
    }

    /// A single-component `Id`.
    pub fn single(sym: Symbol) -> Self {
        Id { components: vec![sym] }
    }

    pub fn components(&self) -> &[Symbol] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// The last component (the "local" name), e.g. `Bar` in `Foo::Bar`.
    pub fn local(&self) -> Option<Symbol> {
        self.components.last().copied()
    }

    /// Everything but the last component (the "namespace"), e.g. `Foo` in
    /// `Foo::Bar`. Empty if this `Id` has zero or one components.
    pub fn namespace(&self) -> Id {
        if self.components.len() <= 1 {
            Id::empty()
        } else {
            Id::from_components(self.components[..self.components.len() - 1].to_vec())
        }
    }

    /// The first `n` components. Clamped to `self.len()`.
    pub fn prefix(&self, n: usize) -> Id {
        let n = n.min(self.components.len());
        Id::from_components(self.components[..n].to_vec())
    }

    /// The components after dropping the first `n`. Clamped to `self.len()`.
    pub fn suffix(&self, n: usize) -> Id {
        let n = n.min(self.components.len());
        Id::from_components(self.components[n..].to_vec())
    }

    /// `true` if `self` begins with every component of `other`, in order.
    pub fn starts_with(&self, other: &Id) -> bool {
        other.components.len() <= self.components.len()
            && self.components[..other.components.len()] == other.components[..]
    }

    /// Rebases `self` to be relative to `base`: if `self` starts with
    /// `base`, returns the remaining suffix; otherwise returns `self`
    /// unchanged. Used when printing an ID visible from inside the module
    /// that declares it, without its fully qualified module prefix.
    pub fn relative_to(&self, base: &Id) -> Id {
        if self.starts_with(base) && !base.is_empty() {
            self.suffix(base.len())
        } else {
            self.clone()
        }
    }

    /// Concatenates two `Id`s component-wise (`Foo::Bar` + `Baz` = `Foo::Bar::Baz`).
    pub fn join(&self, other: &Id) -> Id {
        let mut components = self.components.clone();
        components.extend_from_slice(&other.components);
        Id::from_components(components)
    }

    /// Renders the `Id` back to its `::`-joined string form.
    pub fn display<'a>(&'a self, interner: &'a Interner) -> IdDisplay<'a> {
        IdDisplay { id: self, interner }
    }
}

/// Deferred `Display` for an [`Id`], since rendering needs the [`Interner`]
/// that owns its components.
pub struct IdDisplay<'a> {
    id: &'a Id,
    interner: &'a Interner,
}

impl fmt::Display for IdDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sym) in self.id.components.iter().enumerate() {
            if i > 0 {
                write!(f, "::")?;
            }
            write!(f, "{}", self.interner.resolve(*sym))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({} components)", self.components.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_double_colon() {
        let mut interner = Interner::new();
        let id = Id::parse(&mut interner, "Foo::Bar::Baz");
        assert_eq!(id.len(), 3);
        assert_eq!(id.display(&interner).to_string(), "Foo::Bar::Baz");
    }

    #[test]
    fn empty_path_is_empty_id() {
        let mut interner = Interner::new();
        let id = Id::parse(&mut interner, "");
        assert!(id.is_empty());
    }

    #[test]
    fn local_and_namespace_split() {
        let mut interner = Interner::new();
        let id = Id::parse(&mut interner, "Foo::Bar::Baz");
        assert_eq!(interner.resolve(id.local().unwrap()), "Baz");
        assert_eq!(id.namespace().display(&interner).to_string(), "Foo::Bar");
    }

    #[test]
    fn namespace_of_single_component_is_empty() {
        let mut interner = Interner::new();
        let id = Id::parse(&mut interner, "Foo");
        assert!(id.namespace().is_empty());
    }

    #[test]
    fn prefix_and_suffix_slice() {
        let mut interner = Interner::new();
        let id = Id::parse(&mut interner, "A::B::C::D");
        assert_eq!(id.prefix(2).display(&interner).to_string(), "A::B");
        assert_eq!(id.suffix(2).display(&interner).to_string(), "C::D");
        assert_eq!(id.prefix(100).len(), 4);
    }

    #[test]
    fn starts_with_checks_component_prefix() {
        let mut interner = Interner::new();
        let id = Id::parse(&mut interner, "A::B::C");
        let base = Id::parse(&mut interner, "A::B");
        let other = Id::parse(&mut interner, "A::X");
        assert!(id.starts_with(&base));
        assert!(!id.starts_with(&other));
    }

    #[test]
    fn relative_to_strips_matching_base() {
        let mut interner = Interner::new();
        let id = Id::parse(&mut interner, "Mod::Type::field");
        let base = Id::parse(&mut interner, "Mod");
        assert_eq!(id.relative_to(&base).display(&interner).to_string(), "Type::field");

        let unrelated = Id::parse(&mut interner, "Other");
        assert_eq!(id.relative_to(&unrelated).display(&interner).to_string(), "Mod::Type::field");
    }

    #[test]
    fn join_concatenates_components() {
        let mut interner = Interner::new();
        let a = Id::parse(&mut interner, "Foo::Bar");
        let b = Id::parse(&mut interner, "Baz");
        assert_eq!(a.join(&b).display(&interner).to_string(), "Foo::Bar::Baz");
    }

    #[test]
    fn ids_with_equal_components_are_equal() {
        let mut interner = Interner::new();
        let a = Id::parse(&mut interner, "A::B");
        let b = Id::parse(&mut interner, "A::B");
        assert_eq!(a, b);
    }
}
