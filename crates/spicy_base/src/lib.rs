//! # spicy-base
//!
//! Pure structural atoms shared by every crate in the Spicy toolchain.
//!
//! - [`Arena`] — bump allocation for leaf data that outlives a compilation pass
//! - [`Interner`]/[`Symbol`] — string interning for O(1) identifier equality
//! - [`Id`] — a `::`-separated identifier path built over [`Interner`]
//! - [`Span`] — source location tracking
//! - [`Diagnostic`]/[`Severity`]/[`Result`] — errors annotated with source location
//!
//! This crate has no knowledge of Spicy/HILTI syntax or semantics. It
//! provides only the generic, reusable infrastructure the higher-level
//! crates (`spicy-ast`, `spicy-sema`, `spicy-grammar`, `spicy-runtime`,
//! `spicy-codegen`) build upon.

pub mod arena;
pub mod error;
pub mod id;
pub mod intern;
pub mod span;

pub use arena::Arena;
pub use error::{Diagnostic, Result, Severity};
pub use id::Id;
pub use intern::{Interner, Symbol, SymbolEq};
pub use span::Span;
