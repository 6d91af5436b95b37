//! # spicy-ast
//!
//! The AST: node arena, type system, scopes, and the surface-syntax
//! lexer/parser that populates them.
//!
//! - [`node::AstContext`] — the arena every [`node::Node`] lives in, addressed
//!   by stable [`node::NodeId`] handles so back-edges (a field pointing at its
//!   owning unit, a resolved operator pointing at its binding) don't need
//!   lifetimes.
//! - [`ty`] — [`ty::UnqualifiedType`] (shape) and [`ty::QualifiedType`]
//!   (+ constness/side), the two-level type model.
//! - [`scope`] — [`scope::ScopeTree`], outward-walking ID lookup with
//!   private/external visibility and `NoInheritScope` jumps.
//! - [`decl`], [`expr`], [`stmt`], [`ctor`], [`attribute`], [`module`] — the
//!   node payload types.
//! - [`token`], [`lexer`], [`parser`] — turn `.spicy`/`.hlt` source text into
//!   a [`module::Module`] of [`node::NodeId`]s.
//!
//! This crate knows the shape of operator occurrences
//! ([`expr::OperatorKind`], [`expr::OperatorId`]) but not how they resolve —
//! that's `spicy-sema`, which depends on this crate rather than the reverse.

pub mod attribute;
pub mod ctor;
pub mod decl;
pub mod expr;
pub mod lexer;
pub mod module;
pub mod node;
pub mod parser;
pub mod scope;
pub mod stmt;
pub mod token;
pub mod ty;

pub use attribute::{Attribute, AttributeKind, AttributeSet, AttributeValue};
pub use ctor::Ctor;
pub use decl::{DeclKind, Declaration, FieldType, Hook, HookEvent, Linkage, Property, Repeat, SwitchCase, SwitchField, UnitDecl, UnitField};
pub use expr::{Expression, OperatorId, OperatorKind};
pub use module::{Module, ModuleUid};
pub use node::{AstContext, Node, NodeId, NodeKind};
pub use parser::Parser;
pub use scope::{LookupError, Scope, ScopeEntry, ScopeId, ScopeTree};
pub use stmt::Statement;
pub use token::{Token, TokenKind};
pub use ty::{ByteOrder, Constness, Field, FunctionType, QualifiedType, ReferenceKind, Side, UnqualifiedType};

#[cfg(test)]
mod tests {
    use super::*;
    use spicy_base::Interner;

    #[test]
    fn parses_and_walks_a_small_module() {
        let mut interner = Interner::new();
        let mut ctx = AstContext::new();
        let module = {
            let mut parser = Parser::new(
                "module Example;\n\
                 public type Packet = unit {\n\
                     version: uint8;\n\
                     length: uint16;\n\
                     payload: bytes &size=length;\n\
                 };\n",
                &mut interner,
                &mut ctx,
            )
            .unwrap();
            parser.parse_module("/example.spicy").unwrap()
        };

        assert_eq!(module.declarations.len(), 1);
        let node = ctx.get(module.declarations[0]);
        let NodeKind::Declaration(decl) = &node.kind else { panic!("expected a declaration node") };
        let DeclKind::Type { unit: Some(unit), .. } = &decl.kind else { panic!("expected a unit type") };
        assert_eq!(unit.fields.len(), 3);
        assert_eq!(unit.fields[2].attributes.find("&size").is_some(), true);
    }
}
