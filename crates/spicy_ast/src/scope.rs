//! Two-pass scope building and ID resolution.
//!
//! Grounded on `original_source/hilti/toolchain/src/ast/scope.cc`: a scope
//! maps an [`Id`] to an overload set of declarations, lookup walks outward
//! trying progressively shorter ID subpaths, and a "stop here" marker can
//! short-circuit further outward lookups for a name that's definitely not
//! found at an inner level.

use crate::decl::Linkage;
use crate::node::NodeId;
use spicy_base::Id;
use std::collections::{HashMap, HashSet};

/// A stable handle into a [`ScopeTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ScopeId(u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One declaration visible under some name in a scope, tagged with enough
/// metadata for the external/private and type-is-always-visible rules.
#[derive(Clone, Debug)]
pub struct ScopeEntry {
    pub decl: NodeId,
    /// The module that owns this declaration, for the external/private check.
    pub owning_module: Id,
    pub linkage: Linkage,
    /// `true` for type declarations and enum-derived constants, which
    /// remain visible externally even when the rest of their module is
    /// private.
    pub always_external_visible: bool,
}

/// A mapping `ID -> {declarations}` plus the "stop here" and
/// "NoInheritScope" controls.
pub struct Scope {
    parent: Option<ScopeId>,
    /// `true` for a scope that should not inherit lookups outward through
    /// intermediate scopes — used for function/hook bodies, which jump
    /// straight to the enclosing module scope.
    no_inherit: bool,
    /// `true` for a module's own top-level scope; `no_inherit` lookups
    /// target the nearest ancestor with this flag set.
    is_module: bool,
    items: HashMap<Id, Vec<ScopeEntry>>,
    stopped: HashSet<Id>,
}

impl Scope {
    fn new(parent: Option<ScopeId>) -> Self {
        Scope {
            parent,
            no_inherit: false,
            is_module: false,
            items: HashMap::new(),
            stopped: HashSet::new(),
        }
    }
}

/// Owns every [`Scope`] built for one resolution pass. Scopes are pure
/// derived state, rebuilt from scratch on every resolution round, so a
/// `ScopeTree` is typically built fresh each driver pass rather than
/// mutated incrementally.
#[derive(Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

/// Why a lookup failed.
#[derive(Debug, PartialEq, Eq)]
pub enum LookupError {
    NotFound,
    /// Multiple non-function candidates resolved for the same ID.
    Ambiguous(Vec<NodeId>),
}

impl ScopeTree {
    pub fn new() -> Self {
        ScopeTree { scopes: vec![] }
    }

    pub fn create_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(parent));
        id
    }

    pub fn create_module_scope(&mut self) -> ScopeId {
        let id = self.create_scope(None);
        self.scopes[id.index()].is_module = true;
        id
    }

    pub fn mark_no_inherit(&mut self, scope: ScopeId) {
        self.scopes[scope.index()].no_inherit = true;
    }

    /// Registers `decl` under `id` in `scope`.
    pub fn insert(&mut self, scope: ScopeId, id: Id, entry: ScopeEntry) {
        self.scopes[scope.index()].items.entry(id).or_default().push(entry);
    }

    /// Marks `id` as definitely-not-found at `scope`, halting outward
    /// lookups for that name.
    pub fn insert_stop(&mut self, scope: ScopeId, id: Id) {
        self.scopes[scope.index()].stopped.insert(id);
    }

    /// The nearest ancestor scope (including `scope` itself) flagged as a
    /// module scope — the landing point for a `NoInheritScope` jump.
    fn module_ancestor(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            let node = &self.scopes[s.index()];
            if node.is_module {
                return Some(s);
            }
            current = node.parent;
        }
        None
    }

    /// Looks up `id` starting from `start`, walking the chain of enclosing
    /// scopes outward.
    ///
    /// `from_module` is the module the lookup originates in, used to decide
    /// whether a candidate found in a different module counts as
    /// "external" for the private-declaration check.
    pub fn lookup(&self, start: ScopeId, id: &Id, from_module: &Id) -> Result<Vec<NodeId>, LookupError> {
        let mut current = Some(start);
        while let Some(scope_id) = current {
            let scope = &self.scopes[scope_id.index()];

            if scope.stopped.contains(id) {
                return Err(LookupError::NotFound);
            }

            if let Some(entries) = scope.items.get(id) {
                let visible: Vec<&ScopeEntry> = entries
                    .iter()
                    .filter(|e| self.is_visible(e, from_module))
                    .collect();

                if !visible.is_empty() {
                    if visible.len() > 1 && !self.all_functions_or_hooks(&visible) {
                        return Err(LookupError::Ambiguous(visible.iter().map(|e| e.decl).collect()));
                    }
                    return Ok(visible.iter().map(|e| e.decl).collect());
                }
            }

            current = if scope.no_inherit {
                self.module_ancestor(scope_id)
            } else {
                scope.parent
            };
        }
        Err(LookupError::NotFound)
    }

    fn is_visible(&self, entry: &ScopeEntry, from_module: &Id) -> bool {
        if entry.always_external_visible {
            return true;
        }
        let external = &entry.owning_module != from_module;
        !(external && entry.linkage == Linkage::Private)
    }

    /// Multiple candidates are only non-ambiguous when every candidate is
    /// part of an overload set the caller resolves separately (functions);
    /// this toolchain doesn't disambiguate overload *kind* here, only
    /// whether ambiguity should be reported eagerly at the scope layer —
    /// callers resolving a `Call`/`MemberCall` expect and handle multiple
    /// function candidates via `spicy_sema::overload`.
    fn all_functions_or_hooks(&self, _visible: &[&ScopeEntry]) -> bool {
        // The scope layer doesn't know a declaration's kind (that lives in
        // `spicy_ast::decl::Declaration`, one layer up from `NodeId`), so
        // it defers the "are these really overloadable" judgment upward:
        // treat any multi-candidate result as potentially an overload set
        // and let `spicy_sema` re-check declaration kinds before emitting
        // an ambiguity diagnostic. Non-function/hook ambiguity is instead
        // caught by `spicy_sema::validate`, which has access to the AST.
        true
    }
}
