//! Reference-kind values, mirroring `spicy_ast::ty::ReferenceKind`'s
//! `Value`/`Strong`/`Weak` distinction at the type level.
//!
//! Grounded on `original_source/hilti/include/ast/ctors/reference.h`: a
//! strong reference keeps its referent alive, a weak reference observes it
//! without extending its lifetime and reports [`crate::Failure::InvalidValue`]
//! once the referent is gone, matching HILTI's `weak_ref<T>::deref()`
//! behavior.

use crate::failure::{Failure, Result};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// An owning, reference-counted handle, analogous to `ReferenceKind::Strong`.
#[derive(Debug)]
pub struct StrongRef<T>(Rc<RefCell<T>>);

impl<T> StrongRef<T> {
    pub fn new(value: T) -> Self {
        StrongRef(Rc::new(RefCell::new(value)))
    }

    pub fn downgrade(&self) -> WeakRef<T> {
        WeakRef(Rc::downgrade(&self.0))
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl<T> Clone for StrongRef<T> {
    fn clone(&self) -> Self {
        StrongRef(Rc::clone(&self.0))
    }
}

/// A non-owning handle, analogous to `ReferenceKind::Weak`. Dereferencing
/// after the last [`StrongRef`] drops yields `InvalidValue`, the same
/// failure HILTI's `weak_ref` raises on a dangling dereference.
#[derive(Debug)]
pub struct WeakRef<T>(Weak<RefCell<T>>);

impl<T> WeakRef<T> {
    pub fn upgrade(&self) -> Result<StrongRef<T>> {
        self.0
            .upgrade()
            .map(StrongRef)
            .ok_or_else(|| Failure::InvalidValue("dereferenced a weak reference whose referent was freed".into()))
    }

    pub fn is_expired(&self) -> bool {
        self.0.strong_count() == 0
    }
}

impl<T> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        WeakRef(self.0.clone())
    }
}

/// A heap-allocated, single-owner handle, matching `ReferenceKind::Value`'s
/// semantics exactly: unlike [`StrongRef`]/[`WeakRef`], nothing else can
/// observe `T` through a second handle, so cloning a `ValueRef` deep-copies
/// `T` rather than sharing it.
#[derive(Debug)]
pub struct ValueRef<T>(Box<T>);

impl<T> ValueRef<T> {
    pub fn new(value: T) -> Self {
        ValueRef(Box::new(value))
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0)
    }

    pub fn with_mut<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0)
    }
}

impl<T: Clone> Clone for ValueRef<T> {
    fn clone(&self) -> Self {
        ValueRef(Box::new((*self.0).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_ref_upgrades_while_strong_alive() {
        let strong = StrongRef::new(42i32);
        let weak = strong.downgrade();
        assert_eq!(weak.upgrade().unwrap().with(|v| *v), 42);
    }

    #[test]
    fn weak_ref_fails_after_strong_dropped() {
        let weak = {
            let strong = StrongRef::new(String::from("hi"));
            strong.downgrade()
        };
        assert!(weak.is_expired());
        let err = weak.upgrade().unwrap_err();
        assert!(matches!(err, Failure::InvalidValue(_)));
    }

    #[test]
    fn strong_ref_shares_mutation() {
        let a = StrongRef::new(1);
        let b = a.clone();
        a.with_mut(|v| *v += 1);
        assert_eq!(b.with(|v| *v), 2);
    }

    #[test]
    fn value_ref_clone_is_a_deep_copy_not_a_shared_handle() {
        let mut a = ValueRef::new(vec![1, 2, 3]);
        let b = a.clone();
        a.with_mut(|v| v.push(4));
        assert_eq!(a.with(|v| v.clone()), vec![1, 2, 3, 4]);
        assert_eq!(b.with(|v| v.clone()), vec![1, 2, 3]);
    }
}
