//! The fixed-point module driver (spec.md §4.8 "Module Driver").
//!
//! Runs every source module through parse -> scope build -> ID resolution
//! -> validation -> unification -> grammar construction -> codegen ->
//! emit, re-running steps 2-6 until a pass makes no further changes or
//! `CompileOptions::max_driver_iterations` is hit (spec.md §4.8: "Between
//! steps (3) and (6), added/modified declarations ... feed back into step
//! (2)").
//!
//! ID resolution covers two things: `Expression::Name` occurrences, looked
//! up against a module scope plus, for anything reachable from a unit
//! body, a unit-local scope over that unit's own field names nested under
//! it (spec.md §4.3 "Build"); and `Expression::UnresolvedOperator`
//! occurrences whose operand types are already known, run through
//! `spicy_sema::overload::resolve` against the built-in registry so they
//! reach `spicy_sema::validate` already bound to a `ResolvedOperator`.

use spicy_ast::{
    AstContext, Ctor, DeclKind, Declaration, Expression, FieldType, Linkage, Module, Node, NodeId, NodeKind,
    Parser as AstParser, QualifiedType, Repeat, ScopeEntry, ScopeId, ScopeTree, SwitchField, UnitDecl, UnitField,
};
use spicy_base::{Diagnostic, Id, Interner, Span};
use spicy_grammar::GrammarCache;
use spicy_sema::{CanonicalIds, CoercionStyle, Registry};
use std::collections::HashMap;

use crate::artifact::{render_linker, render_module, LinkerUnit, ModuleUnit, VersionRecord};
use crate::config::CompileOptions;
use crate::diagnostics::Diagnostics;
use crate::parser::lower_unit;

/// One source file the driver is asked to compile: a canonical path plus
/// its Spicy/HILTI source text.
pub struct Source<'a> {
    pub canonical_path: &'a str,
    pub text: &'a str,
}

/// What `compile` produces: one [`ModuleUnit`] per successfully compiled
/// module, the `__linker__` unit tying them together, and every
/// diagnostic accumulated along the way.
pub struct DriverOutput {
    pub modules: Vec<ModuleUnit>,
    pub linker: LinkerUnit,
    pub diagnostics: Diagnostics,
}

/// Runs the whole pipeline over `sources` (spec.md §4.8).
pub fn compile(sources: &[Source], options: &CompileOptions) -> DriverOutput {
    let mut interner = Interner::new();
    let mut ctx = AstContext::new();
    let mut diagnostics = Diagnostics::new();

    let mut modules = Vec::new();
    for source in sources {
        match parse_source(source.text, source.canonical_path, &mut interner, &mut ctx) {
            Ok(module) => modules.push(module),
            Err(d) => diagnostics.push(d),
        }
    }

    let registry = Registry::with_builtins();
    let canonical_ids = CanonicalIds::new();

    // Steps 2-3: rebuild scopes and resolve IDs to a fixed point.
    for _ in 0..options.max_driver_iterations {
        let mut changed = false;
        for module in &mut modules {
            let (scope_tree, scope, unit_scopes) = build_module_scope(module, &ctx);
            changed |= resolve_module(module, &mut ctx, &scope_tree, scope, &unit_scopes, &registry, &interner, &canonical_ids);
        }
        if !changed {
            break;
        }
    }

    // Step 4: validate; a module with errors doesn't proceed to codegen,
    // but other modules still get a chance.
    let mut grammar_cache = GrammarCache::new();
    let mut rendered = Vec::new();
    for module in &modules {
        let errors = spicy_sema::validate(&ctx, module);
        let has_errors = errors.iter().any(Diagnostic::is_fatal);
        diagnostics.extend(errors);
        if has_errors {
            continue;
        }

        // Steps 5-7: unify field types, build+cache grammars, lower to
        // procedures, one unit at a time.
        let mut procedures = Vec::new();
        for &decl_id in &module.declarations {
            let NodeKind::Declaration(decl) = &ctx.get(decl_id).kind else { continue };
            let DeclKind::Type { unit: Some(unit), .. } = &decl.kind else { continue };
            unify_field_types(unit, &interner, &mut diagnostics);

            match grammar_cache.get_or_build(decl_id, unit, &module.uid.name) {
                Ok(grammar) => procedures.push(lower_unit(unit, grammar, &module.uid.name, &mut interner)),
                Err(e) => diagnostics.push(Diagnostic::error("grammar-ambiguity", e.message.clone(), Span::synthetic())),
            }
        }

        // Step 8: emit.
        rendered.push(render_module(&module.uid.name, &interner, &procedures));
    }

    let linker = render_linker(&rendered, VersionRecord::new(env!("CARGO_PKG_VERSION"), options.debug));
    DriverOutput { modules: rendered, linker, diagnostics }
}

fn parse_source(text: &str, canonical_path: &str, interner: &mut Interner, ctx: &mut AstContext) -> Result<Module, Diagnostic> {
    let mut parser = AstParser::new(text, interner, ctx)?;
    parser.parse_module(canonical_path)
}

/// Builds a fresh module scope and inserts every top-level declaration
/// under its own name (spec.md §4.3 "Build"; spec.md §4.8 step 2: "clear
/// and rebuild scopes"), then nests a unit-local scope under it for every
/// `unit` type declaration, populated with that unit's own field names.
/// Scopes are derived state rebuilt every pass rather than patched
/// incrementally. Returns the scope each unit's fields should resolve
/// against, keyed by the owning type declaration's `NodeId`.
fn build_module_scope(module: &Module, ctx: &AstContext) -> (ScopeTree, ScopeId, HashMap<NodeId, ScopeId>) {
    let mut tree = ScopeTree::new();
    let scope = tree.create_module_scope();

    for &decl_id in &module.declarations {
        let NodeKind::Declaration(decl) = &ctx.get(decl_id).kind else { continue };
        let Some(name) = decl.name() else { continue };
        let always_external_visible = matches!(decl.kind, DeclKind::Type { .. });
        tree.insert(
            scope,
            name.clone(),
            ScopeEntry { decl: decl_id, owning_module: module.uid.name.clone(), linkage: decl.linkage, always_external_visible },
        );
    }

    let mut unit_scopes = HashMap::new();
    for &decl_id in &module.declarations {
        let NodeKind::Declaration(decl) = &ctx.get(decl_id).kind else { continue };
        if let DeclKind::Type { unit: Some(unit), .. } = &decl.kind {
            let unit_scope = build_unit_scope(&mut tree, scope, unit, decl_id, &module.uid.name);
            unit_scopes.insert(decl_id, unit_scope);
        }
    }

    (tree, scope, unit_scopes)
}

/// Builds a scope over `unit`'s own field names, nested under
/// `module_scope` so a switch discriminant or `&until=`/`&while=`
/// expression can still reach top-level names by walking outward (spec.md
/// §4.3 "Build": a unit body is its own lexical scope for field-
/// referencing expressions).
///
/// Fields aren't individually arena-allocated `Node`s, so every entry
/// points back at the owning type declaration's own `NodeId` rather than a
/// per-field handle. That's enough for `Expression::Name` lookup, which
/// only needs to know a name resolves and to something, not to dereference
/// a field-specific node.
fn build_unit_scope(tree: &mut ScopeTree, module_scope: ScopeId, unit: &UnitDecl, decl_id: NodeId, module_name: &Id) -> ScopeId {
    let scope = tree.create_scope(Some(module_scope));
    for field in &unit.fields {
        insert_field_names(tree, scope, field, decl_id, module_name);
    }
    scope
}

fn insert_field_names(tree: &mut ScopeTree, scope: ScopeId, field: &UnitField, decl_id: NodeId, module_name: &Id) {
    if let Some(name) = &field.name {
        tree.insert(
            scope,
            name.clone(),
            ScopeEntry { decl: decl_id, owning_module: module_name.clone(), linkage: Linkage::Struct, always_external_visible: false },
        );
    }
    if let FieldType::Switch(SwitchField { cases, .. }) = &field.field_type {
        for case in cases {
            insert_field_names(tree, scope, &case.field, decl_id, module_name);
        }
    }
}

/// Re-resolves every declaration's reachable expressions against `scope`
/// (or, for a unit type declaration, its own unit-local scope from
/// `unit_scopes`), replacing resolved nodes in place via `ctx.set` and
/// writing the new `NodeId` back into `module.declarations`. Returns
/// whether anything changed, the signal the outer fixed-point loop
/// watches for.
#[allow(clippy::too_many_arguments)]
fn resolve_module(
    module: &mut Module,
    ctx: &mut AstContext,
    scopes: &ScopeTree,
    scope: ScopeId,
    unit_scopes: &HashMap<NodeId, ScopeId>,
    registry: &Registry,
    interner: &Interner,
    ids: &CanonicalIds,
) -> bool {
    let mut changed = false;
    let module_name = module.uid.name.clone();
    for decl_id in &mut module.declarations {
        let NodeKind::Declaration(decl) = &ctx.get(*decl_id).kind else { continue };

        let effective_scope = unit_scopes.get(decl_id).copied().unwrap_or(scope);
        let mut new_decl = decl.clone();
        let mut decl_changed = false;
        resolve_declaration(&mut new_decl, scopes, effective_scope, &module_name, registry, interner, ids, &mut decl_changed);

        if decl_changed {
            changed = true;
            *decl_id = ctx.set(*decl_id, move |n| Node::new(NodeKind::Declaration(new_decl), n.span));
        }
    }
    changed
}

#[allow(clippy::too_many_arguments)]
fn resolve_declaration(
    decl: &mut Declaration,
    scopes: &ScopeTree,
    scope: ScopeId,
    module_name: &Id,
    registry: &Registry,
    interner: &Interner,
    ids: &CanonicalIds,
    changed: &mut bool,
) {
    match &mut decl.kind {
        DeclKind::Constant { value, .. } | DeclKind::ExpressionAlias { value, .. } => {
            resolve_expression(value, scopes, scope, module_name, changed);
            resolve_operators(value, None, registry, interner, ids, changed);
        }
        DeclKind::GlobalVariable { init, .. } | DeclKind::LocalVariable { init, .. } => {
            if let Some(init) = init {
                resolve_expression(init, scopes, scope, module_name, changed);
                resolve_operators(init, None, registry, interner, ids, changed);
            }
        }
        DeclKind::Type { unit: Some(unit), .. } => {
            resolve_unit(unit, scopes, scope, module_name, registry, interner, ids, changed);
        }
        _ => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_unit(
    unit: &mut UnitDecl,
    scopes: &ScopeTree,
    scope: ScopeId,
    module_name: &Id,
    registry: &Registry,
    interner: &Interner,
    ids: &CanonicalIds,
    changed: &mut bool,
) {
    for field in &mut unit.fields {
        resolve_field(field, scopes, scope, module_name, registry, interner, ids, changed);
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_field(
    field: &mut UnitField,
    scopes: &ScopeTree,
    scope: ScopeId,
    module_name: &Id,
    registry: &Registry,
    interner: &Interner,
    ids: &CanonicalIds,
    changed: &mut bool,
) {
    // Inside a field's own `&until=`/`&while=` expression, `$` denotes the
    // per-iteration element value, i.e. the field's own declared type.
    let dollar_ty = match &field.field_type {
        FieldType::Type(qt) => Some(qt.clone()),
        _ => None,
    };
    match &mut field.repeat {
        Repeat::Until(e) | Repeat::While(e) => {
            resolve_expression(e, scopes, scope, module_name, changed);
            resolve_operators(e, dollar_ty.as_ref(), registry, interner, ids, changed);
        }
        _ => {}
    }
    if let Some(cond) = &mut field.condition {
        resolve_expression(cond, scopes, scope, module_name, changed);
        resolve_operators(cond, None, registry, interner, ids, changed);
    }
    match &mut field.field_type {
        FieldType::Switch(SwitchField { discriminant, cases }) => {
            if let Some(discriminant) = discriminant {
                resolve_expression(discriminant, scopes, scope, module_name, changed);
                resolve_operators(discriminant, None, registry, interner, ids, changed);
            }
            for case in cases {
                if let Some(guard) = &mut case.guard {
                    resolve_expression(guard, scopes, scope, module_name, changed);
                    resolve_operators(guard, None, registry, interner, ids, changed);
                }
                resolve_field(&mut case.field, scopes, scope, module_name, registry, interner, ids, changed);
            }
        }
        FieldType::Variable(expr) => {
            resolve_expression(expr, scopes, scope, module_name, changed);
            resolve_operators(expr, None, registry, interner, ids, changed);
        }
        _ => {}
    }
}

/// Resolves `expr` in place, recursing into every nested operand so a
/// `Name` buried inside a `Ternary` or an operator occurrence's operands
/// still gets a chance (spec.md §4.3 "Lookup").
fn resolve_expression(expr: &mut Expression, scopes: &ScopeTree, scope: ScopeId, module_name: &Id, changed: &mut bool) {
    match expr {
        Expression::Name(id) => match scopes.lookup(scope, id, module_name) {
            Ok(candidates) if candidates.len() == 1 => {
                *expr = Expression::ResolvedId(candidates[0], id.clone());
                *changed = true;
            }
            _ => {}
        },
        Expression::UnresolvedOperator { operands, .. } => {
            for operand in operands {
                resolve_expression(operand, scopes, scope, module_name, changed);
            }
        }
        Expression::ResolvedOperator { operands, .. } => {
            for operand in operands {
                resolve_expression(operand, scopes, scope, module_name, changed);
            }
        }
        Expression::Ternary(c, t, f) => {
            resolve_expression(c, scopes, scope, module_name, changed);
            resolve_expression(t, scopes, scope, module_name, changed);
            resolve_expression(f, scopes, scope, module_name, changed);
        }
        _ => {}
    }
}

/// Binds `UnresolvedOperator` occurrences whose operand types are already
/// known to exactly one `Operator` definition, recursing bottom-up so
/// nested operators resolve before the ones wrapping them (spec.md §4.4
/// "Resolution"). `dollar_ty` is `Some` only inside a field's own
/// `&until=`/`&while=` expression, where `$` is typed as that field's
/// declared type; everywhere else `$` has no binding and stays unresolved
/// (caught instead by `spicy_sema::validate` if actually referenced).
fn resolve_operators(
    expr: &mut Expression,
    dollar_ty: Option<&QualifiedType>,
    registry: &Registry,
    interner: &Interner,
    ids: &CanonicalIds,
    changed: &mut bool,
) {
    match expr {
        Expression::UnresolvedOperator { kind, operands } => {
            for operand in operands.iter_mut() {
                resolve_operators(operand, dollar_ty, registry, interner, ids, changed);
            }
            let Some(types) = operands.iter().map(|o| operand_type(o, dollar_ty)).collect::<Option<Vec<_>>>() else {
                return;
            };
            let kind = *kind;
            if let Ok(resolved) = spicy_sema::resolve(registry, kind, operands.clone(), &types, CoercionStyle::ASSIGNMENT, interner, ids) {
                *expr = resolved;
                *changed = true;
            }
        }
        Expression::ResolvedOperator { operands, .. } => {
            for operand in operands.iter_mut() {
                resolve_operators(operand, dollar_ty, registry, interner, ids, changed);
            }
        }
        Expression::Ternary(c, t, f) => {
            resolve_operators(c, dollar_ty, registry, interner, ids, changed);
            resolve_operators(t, dollar_ty, registry, interner, ids, changed);
            resolve_operators(f, dollar_ty, registry, interner, ids, changed);
        }
        _ => {}
    }
}

/// The type of `expr` as an operator operand, if it can be determined
/// without a full typechecking pass. `None` defers resolution of the
/// enclosing operator to a later driver iteration (spec.md §4.4: operand
/// types not yet resolved is "pending", not an error).
fn operand_type(expr: &Expression, dollar_ty: Option<&QualifiedType>) -> Option<QualifiedType> {
    match expr {
        Expression::DollarDollar => dollar_ty.cloned(),
        Expression::Ctor(c) => ctor_type(c),
        Expression::ResolvedOperator { result_type, .. } => Some(result_type.clone()),
        _ => None,
    }
}

/// The type of a scalar literal constructor. Compound ctors (vectors,
/// tuples, structs, ...) return `None`, deferring to whatever later pass
/// gives them a type — operator occurrences over compound literals aren't
/// exercised by this driver's resolution loop.
fn ctor_type(ctor: &Ctor) -> Option<QualifiedType> {
    use spicy_ast::UnqualifiedType;
    match ctor {
        Ctor::Bool(_) => Some(QualifiedType::rhs_mutable(UnqualifiedType::Bool)),
        Ctor::SignedInteger(_, width) => Some(QualifiedType::rhs_mutable(UnqualifiedType::SignedInteger(*width))),
        Ctor::UnsignedInteger(_, width) => Some(QualifiedType::rhs_mutable(UnqualifiedType::UnsignedInteger(*width))),
        Ctor::Real(_) => Some(QualifiedType::rhs_mutable(UnqualifiedType::Real)),
        Ctor::StringValue(_) => Some(QualifiedType::rhs_mutable(UnqualifiedType::StringType)),
        Ctor::Bytes(_) => Some(QualifiedType::rhs_mutable(UnqualifiedType::Bytes)),
        _ => None,
    }
}

/// Unifies every field's declared type to its canonical string (spec.md
/// §4.8 step 5, "Unify all types and rewrite cached type indices") and
/// flags a field name that unifies to different types in different switch
/// arms — a unit can't have two incompatible shapes live under the same
/// field name. Field types here aren't separately addressed by `NodeId`,
/// so there's no cached index to rewrite; this pass exists for the
/// cross-arm consistency check.
fn unify_field_types(unit: &UnitDecl, interner: &Interner, diagnostics: &mut Diagnostics) {
    let ids = CanonicalIds::new();
    let mut seen: HashMap<Id, String> = HashMap::new();
    check_field_type_conflicts(&unit.fields, interner, &ids, &mut seen, diagnostics);
}

fn check_field_type_conflicts(
    fields: &[UnitField],
    interner: &Interner,
    ids: &CanonicalIds,
    seen: &mut HashMap<Id, String>,
    diagnostics: &mut Diagnostics,
) {
    for field in fields {
        if let (Some(name), FieldType::Type(ty)) = (&field.name, &field.field_type) {
            let canonical = spicy_sema::unify(&ty.ty, interner, ids);
            match seen.get(name) {
                Some(previous) if previous != &canonical => {
                    diagnostics.push(Diagnostic::error(
                        "field-type-conflict",
                        format!(
                            "field `{}` unifies to `{canonical}` here but `{previous}` elsewhere in the same unit",
                            name.display(interner)
                        ),
                        Span::synthetic(),
                    ));
                }
                _ => {
                    seen.insert(name.clone(), canonical);
                }
            }
        }
        if let FieldType::Switch(SwitchField { cases, .. }) = &field.field_type {
            for case in cases {
                check_field_type_conflicts(std::slice::from_ref(&*case.field), interner, ids, seen, diagnostics);
            }
        }
    }
}
