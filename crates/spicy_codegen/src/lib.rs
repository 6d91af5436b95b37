//! # spicy-codegen
//!
//! Lowers a finalized `spicy-grammar` [`spicy_grammar::Grammar`] into
//! deterministic parse procedures and drives the whole compilation
//! pipeline to a fixed point (spec.md §4.7, §4.8).
//!
//! - [`cursor::ParseCursor`] — the stream/view/look-ahead state a parse
//!   procedure threads through field after field, plus the wait-for-input
//!   primitive and `try`-block savepoints.
//! - [`field::build_field_step`] — one [`field::FieldStep`] per unit field:
//!   how its input window is acquired, its production, its hooks.
//! - [`parser::lower_unit`] — walks a unit's fields against its finalized
//!   grammar and produces a whole [`parser::Procedure`].
//! - [`artifact`] — the emitted per-module artifact, the `__linker__` unit,
//!   the version record, and parser registration metadata (spec.md §6).
//! - [`batch`] — the `!spicy-batch v2` reference input format (spec.md §6).
//! - [`config::CompileOptions`] — driver iteration bound, debug flag, cache
//!   directory resolution (SPEC_FULL §4.8, spec.md §6 "Environment knobs").
//! - [`diagnostics::Diagnostics`] — the accumulating sink the driver and
//!   `spicy-sema::validate` report into.
//! - [`driver::compile`] — orchestrates parse -> scope -> resolve ->
//!   validate -> unify -> grammar -> codegen -> emit to a fixed point
//!   (spec.md §4.8 "Module Driver").
//!
//! This crate is the top of the dependency order spec.md §2 lays out: it
//! depends on `spicy-ast`, `spicy-sema`, `spicy-grammar` and
//! `spicy-runtime`, but nothing depends on it.

pub mod artifact;
pub mod batch;
pub mod config;
pub mod cursor;
pub mod diagnostics;
pub mod driver;
pub mod field;
pub mod parser;

pub use artifact::{render_linker, render_module, Direction, LinkerUnit, ModuleUnit, ParserMetadata, PortClaim, VersionRecord};
pub use batch::{read_batch, select, BatchDirective, MAGIC};
pub use config::CompileOptions;
pub use cursor::{LiteralMode, ParseCursor, Savepoint};
pub use diagnostics::Diagnostics;
pub use driver::{compile, DriverOutput, Source};
pub use field::{build_field_step, Acquisition, FieldStep, HookRef, LoopPlan};
pub use parser::{lower_unit, Procedure};
