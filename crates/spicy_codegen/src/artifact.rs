//! Generated artifact model: per-module translation units, the
//! `__linker__` unit tying them together, and parser registration
//! metadata.
//!
//! The real HILTI/Spicy toolchain emits one C++ translation unit per
//! module plus a `__linker__` unit that ties them together; grounded on
//! `original_source/hilti/src/compiler/cxx/linker.cc`'s `Linker::add` and
//! its embedded `rt::library::Version` record, this module keeps that
//! shape but renders a textual stand-in translation unit rather than real
//! C++ — emitting an actual C++ backend is out of scope here.

use serde::{Deserialize, Serialize};

use spicy_base::Id;

/// Mirrors `rt::library::Version`: a version record
/// (`{magic="v1", hilti_version, debug}`) readable at load time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VersionRecord {
    pub magic: String,
    pub hilti_version: String,
    pub debug: bool,
}

impl VersionRecord {
    pub fn new(hilti_version: impl Into<String>, debug: bool) -> Self {
        VersionRecord { magic: "v1".to_string(), hilti_version: hilti_version.into(), debug }
    }
}

/// A `(port, direction)` tuple a parser claims.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortClaim {
    pub port: u16,
    pub direction: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Originator,
    Responder,
    Both,
}

/// Everything a parser exports about itself for the reference driver and
/// any embedding application to discover.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParserMetadata {
    pub name: String,
    pub mime_types: Vec<String>,
    pub ports: Vec<PortClaim>,
    pub description: String,
    /// Symbol name of the stream-parsing entry point (`parse1`-style).
    pub stream_entry: String,
    /// Symbol name of the sink-driven entry point, if the unit supports
    /// being fed through a `Sink` rather than parsed directly.
    pub sink_entry: Option<String>,
}

/// One compiled module's generated translation unit: a textual stand-in
/// for the real C++ output, plus the parsers it exports.
#[derive(Clone, Debug)]
pub struct ModuleUnit {
    pub module_name: Id,
    pub source: String,
    pub parsers: Vec<ParserMetadata>,
}

/// The `__linker__` translation unit: lists all modules, registers their
/// parsers with the runtime, and embeds a version record.
#[derive(Clone, Debug)]
pub struct LinkerUnit {
    pub version: VersionRecord,
    pub source: String,
}

/// Renders a `ModuleUnit` for `module_name` from its already-lowered
/// [`crate::parser::Procedure`]s, naming each by the unit it came from.
pub fn render_module(module_name: &Id, interner: &spicy_base::Interner, procedures: &[crate::parser::Procedure]) -> ModuleUnit {
    let mut source = format!("// generated module: {}\n", module_name.display(interner));
    let mut parsers = Vec::new();

    for procedure in procedures {
        let name = procedure.name.display(interner).to_string();
        source.push_str(&format!(
            "// unit {name}: {} field step(s), random_access={}, filter={}\n",
            procedure.steps.len(),
            procedure.random_access,
            procedure.is_filter
        ));
        if procedure.is_filter {
            continue;
        }
        parsers.push(ParserMetadata {
            name: name.clone(),
            mime_types: Vec::new(),
            ports: Vec::new(),
            description: String::new(),
            stream_entry: format!("{name}__parse1"),
            sink_entry: Some(format!("{name}__parse_sink")),
        });
    }

    ModuleUnit { module_name: module_name.clone(), source, parsers }
}

/// Renders the `__linker__` unit from every compiled module's exported
/// parsers, embedding a [`VersionRecord`] the way `Linker::add` embeds
/// `__hlto_library_version` as a JSON string constant.
pub fn render_linker(modules: &[ModuleUnit], version: VersionRecord) -> LinkerUnit {
    let mut source = String::new();
    let version_json = serde_json::to_string(&version).expect("VersionRecord always serializes");
    source.push_str(&format!("static const char *__hlto_library_version = R\"({version_json})\";\n"));

    for module in modules {
        for parser in &module.parsers {
            source.push_str(&format!("register_parser(\"{}\", \"{}\");\n", parser.name, parser.stream_entry));
        }
    }

    LinkerUnit { version, source }
}
