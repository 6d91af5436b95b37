//! # spicy-runtime
//!
//! The runtime contract generated parsers are written against: streams
//! and views, reference kinds, fibers for suspend/resume, sinks, filters,
//! incremental regex matching, and the [`Failure`] taxonomy every parsing
//! operation can raise.
//!
//! Nothing in this crate depends on `spicy-ast`, `spicy-sema` or
//! `spicy-grammar` — it sits at the bottom of the dependency order,
//! linked into generated code the same way the original HILTI/Spicy
//! runtime library links into every compiled parser.

pub mod failure;
pub mod fiber;
pub mod filter;
pub mod integer;
pub mod reference;
pub mod regexp;
pub mod sink;
pub mod stream;

pub use failure::{Failure, Result};
pub use fiber::{NeedsInput, Resumable};
pub use filter::{finalize_chain, forward_chain, Base64Encoder, Base64Filter, FilterUnit, ZlibFilter};
pub use integer::{pack_uint, unpack_int, unpack_uint, ByteOrder};
pub use reference::{StrongRef, ValueRef, WeakRef};
pub use regexp::{MatchIndicator, MatchState};
pub use sink::{Gap, OverlapPolicy, Sink};
pub use stream::{Stream, StreamIterator, View};
