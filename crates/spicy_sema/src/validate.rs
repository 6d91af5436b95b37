//! Post-resolution validation: the final pass over a module's declarations
//! that turns "still has an unresolved placeholder" or "structurally
//! impossible" states into diagnostics rather than letting them reach code
//! generation (spec.md §7 "Validation").
//!
//! Grounded on `original_source/spicy/compiler/include/validator.h`: a
//! visitor that runs once resolution has reached a fixed point, checking
//! invariants the resolver itself doesn't enforce (it only ever *rewrites*
//! nodes towards resolution; it never rejects a shape outright).

use spicy_ast::{AstContext, DeclKind, Expression, FieldType, Module, NodeKind, Repeat};
use spicy_base::{Diagnostic, Span};

/// Runs every check against `module`'s top-level declarations, returning
/// every diagnostic found. Does not stop at the first failure — callers
/// that want fail-fast behavior should check `.iter().any(Diagnostic::is_fatal)`
/// rather than relying on an early return (spec.md §7: "a validation pass
/// reports everything it finds in one sweep").
pub fn validate(ctx: &AstContext, module: &Module) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for &decl_id in &module.declarations {
        let node = ctx.get(decl_id);
        let NodeKind::Declaration(decl) = &node.kind else {
            continue;
        };
        if !decl.is_resolved() {
            diagnostics.push(Diagnostic::error(
                "unresolved-declaration",
                format!("declaration `{}` still has an unresolved type after resolution", decl.tag()),
                node.span,
            ));
            continue;
        }
        match &decl.kind {
            DeclKind::Constant { value, .. } | DeclKind::ExpressionAlias { value, .. } => {
                check_expression_resolved(value, node.span, &mut diagnostics);
            }
            DeclKind::GlobalVariable { init, .. } | DeclKind::LocalVariable { init, .. } => {
                if let Some(init) = init {
                    check_expression_resolved(init, node.span, &mut diagnostics);
                }
            }
            DeclKind::Type { unit: Some(unit), .. } => {
                for field in &unit.fields {
                    check_field(field, node.span, &mut diagnostics);
                }
            }
            _ => {}
        }
    }
    diagnostics
}

fn check_expression_resolved(expr: &Expression, span: Span, diagnostics: &mut Vec<Diagnostic>) {
    if !expr.is_resolved() {
        diagnostics.push(Diagnostic::error(
            "unresolved-expression",
            "expression still contains an unresolved operator or name occurrence",
            span,
        ));
    }
}

fn check_field(field: &spicy_ast::UnitField, span: Span, diagnostics: &mut Vec<Diagnostic>) {
    match &field.repeat {
        Repeat::Until(expr) | Repeat::While(expr) => check_expression_resolved(expr, span, diagnostics),
        _ => {}
    }
    if let Some(cond) = &field.condition {
        check_expression_resolved(cond, span, diagnostics);
    }
    match &field.field_type {
        FieldType::Switch(switch) => {
            if switch.cases.is_empty() {
                diagnostics.push(Diagnostic::error(
                    "empty-switch",
                    "unit field switch has no case arms",
                    span,
                ));
            }
            let default_count = switch.cases.iter().filter(|c| c.guard.is_none()).count();
            if default_count > 1 {
                diagnostics.push(Diagnostic::error(
                    "duplicate-default-case",
                    format!("unit field switch has {default_count} default (`*`) arms, expected at most one"),
                    span,
                ));
            }
            if let Some(discriminant) = &switch.discriminant {
                check_expression_resolved(discriminant, span, diagnostics);
            }
            for case in &switch.cases {
                if let Some(guard) = &case.guard {
                    check_expression_resolved(guard, span, diagnostics);
                }
                check_field(&case.field, span, diagnostics);
            }
        }
        FieldType::Variable(expr) => check_expression_resolved(expr, span, diagnostics),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spicy_ast::{
        Constness, Ctor, Declaration, Linkage, Module, ModuleUid, Node, OperatorKind, QualifiedType, Side,
        SwitchCase, SwitchField, UnitDecl, UnitField, UnqualifiedType,
    };
    use spicy_base::{Id, Interner};

    fn module_with(ctx: &mut AstContext, decl: Declaration) -> Module {
        let mut interner = Interner::new();
        let name = Id::parse(&mut interner, "M");
        let mut module = Module::new(ModuleUid::new(name, "/m.spicy", "spicy", "spicy"));
        let id = ctx.create(Node::new(NodeKind::Declaration(decl), Span::synthetic()));
        module.add_declaration(id);
        module
    }

    #[test]
    fn resolved_constant_passes() {
        let mut ctx = AstContext::new();
        let mut interner = Interner::new();
        let name = Id::parse(&mut interner, "x");
        let decl = Declaration::new(
            Linkage::Public,
            DeclKind::Constant {
                name,
                ty: QualifiedType::new(UnqualifiedType::Bool, Constness::Const, Side::Rhs),
                value: Expression::Ctor(Ctor::Bool(true)),
            },
        );
        let module = module_with(&mut ctx, decl);
        assert!(validate(&ctx, &module).is_empty());
    }

    #[test]
    fn unresolved_type_is_flagged() {
        let mut ctx = AstContext::new();
        let mut interner = Interner::new();
        let name = Id::parse(&mut interner, "x");
        let decl = Declaration::new(
            Linkage::Public,
            DeclKind::GlobalVariable {
                name,
                ty: QualifiedType::new(UnqualifiedType::Auto, Constness::Mutable, Side::Rhs),
                init: None,
            },
        );
        let module = module_with(&mut ctx, decl);
        let diags = validate(&ctx, &module);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, "unresolved-declaration");
    }

    #[test]
    fn unresolved_initializer_is_flagged_even_with_resolved_type() {
        let mut ctx = AstContext::new();
        let mut interner = Interner::new();
        let name = Id::parse(&mut interner, "x");
        let decl = Declaration::new(
            Linkage::Public,
            DeclKind::GlobalVariable {
                name,
                ty: QualifiedType::new(UnqualifiedType::Bool, Constness::Mutable, Side::Rhs),
                init: Some(Expression::UnresolvedOperator { kind: OperatorKind::Add, operands: vec![] }),
            },
        );
        let module = module_with(&mut ctx, decl);
        let diags = validate(&ctx, &module);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, "unresolved-expression");
    }

    #[test]
    fn empty_switch_is_flagged() {
        let mut ctx = AstContext::new();
        let mut interner = Interner::new();
        let type_name = Id::parse(&mut interner, "Foo");
        let mut unit = UnitDecl::default();
        let field = UnitField::new(
            None,
            FieldType::Switch(SwitchField { discriminant: None, cases: vec![] }),
        );
        unit.fields.push(field);
        let decl = Declaration::new(
            Linkage::Public,
            DeclKind::Type {
                name: type_name,
                ty: QualifiedType::new(UnqualifiedType::Void, Constness::Mutable, Side::Rhs),
                unit: Some(unit),
            },
        );
        let module = module_with(&mut ctx, decl);
        let diags = validate(&ctx, &module);
        assert!(diags.iter().any(|d| d.kind == "empty-switch"));
    }

    #[test]
    fn duplicate_default_arms_are_flagged() {
        let mut ctx = AstContext::new();
        let mut interner = Interner::new();
        let type_name = Id::parse(&mut interner, "Foo");
        let mut unit = UnitDecl::default();
        let leaf = || UnitField::new(None, FieldType::Variable(Expression::Ctor(Ctor::Bool(true))));
        let cases = vec![
            SwitchCase { guard: None, field: Box::new(leaf()) },
            SwitchCase { guard: None, field: Box::new(leaf()) },
        ];
        unit.fields.push(UnitField::new(None, FieldType::Switch(SwitchField { discriminant: None, cases })));
        let decl = Declaration::new(
            Linkage::Public,
            DeclKind::Type {
                name: type_name,
                ty: QualifiedType::new(UnqualifiedType::Void, Constness::Mutable, Side::Rhs),
                unit: Some(unit),
            },
        );
        let module = module_with(&mut ctx, decl);
        let diags = validate(&ctx, &module);
        assert!(diags.iter().any(|d| d.kind == "duplicate-default-case"));
    }
}
