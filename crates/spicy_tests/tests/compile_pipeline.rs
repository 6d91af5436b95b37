//! End-to-end exercise of the whole compilation pipeline (spec.md §4.8
//! "Module Driver"): parse -> scope -> resolve -> validate -> unify ->
//! grammar -> codegen -> emit, across two modules in one `compile` call,
//! one of them containing a switch field, a `&until`-bounded vector and a
//! `sink` field together.

use spicy_codegen::{compile, CompileOptions, Source};

fn source(text: &'static str) -> Source<'static> {
    Source { canonical_path: "/test.spicy", text }
}

#[test]
fn compiles_two_modules_with_switch_vector_and_sink_fields() {
    let sources = vec![
        source(
            "module Headers;\n\
             public type Header = unit {\n\
                 version: uint8;\n\
                 switch (version) {\n\
                     case 1 -> body_v1: uint16;\n\
                     default -> body_other: uint32;\n\
                 };\n\
             };\n",
        ),
        source(
            "module Reassembly;\n\
             public type Stream = unit {\n\
                 count: uint8;\n\
                 items: uint8[] &until=($$ == 0);\n\
                 payload: sink;\n\
             };\n",
        ),
    ];

    let output = compile(&sources, &CompileOptions::new().with_max_driver_iterations(8));

    assert!(!output.diagnostics.has_errors(), "unexpected diagnostics: {:?}", output.diagnostics.errors().collect::<Vec<_>>());
    assert_eq!(output.modules.len(), 2);

    let headers = output.modules.iter().find(|m| m.source.contains("Headers")).unwrap();
    assert_eq!(headers.parsers.len(), 1);
    assert_eq!(headers.parsers[0].name, "Header");

    let reassembly = output.modules.iter().find(|m| m.source.contains("Reassembly")).unwrap();
    assert_eq!(reassembly.parsers.len(), 1);
    assert_eq!(reassembly.parsers[0].name, "Stream");
    assert!(reassembly.parsers[0].sink_entry.is_some());

    // Both modules' parsers are registered in the single emitted linker unit.
    assert!(output.linker.source.contains("register_parser(\"Header\""));
    assert!(output.linker.source.contains("register_parser(\"Stream\""));
    assert!(output.linker.source.contains("\"magic\":\"v1\""));
}

#[test]
fn a_module_with_only_private_declarations_still_exports_its_parser() {
    let sources = vec![source(
        "module Internal;\n\
         type Hidden = unit {\n\
             value: uint8;\n\
         };\n",
    )];
    let output = compile(&sources, &CompileOptions::new());
    assert!(!output.diagnostics.has_errors());
    assert_eq!(output.modules.len(), 1);
    // Private linkage doesn't block codegen (only cross-module visibility);
    // the unit still lowers and exports a parser.
    assert_eq!(output.modules[0].parsers.len(), 1);
}
