//! Symbol listings through parsing, name resolution and both rollups.

use wheelscan::demangle::{BuiltinDemangler, DemangleStatus};
use wheelscan::parse::{parse_symbol_listing, NameLayout};
use wheelscan::symbols::{resolve_symbols, summarize_dynamic, summarize_static, Binding, SymbolType};

const MANGLED: &str = "\
nm: libdemo.so: warning: something odd
_ZN4daal10algorithms6kmeans5trainEv T 0000000000004096 0000000000000512
_ZTVN4daal4BaseE V 0000000000008192 0000000000000024
_ZN4daalL7scratchE b 0000000000009000 0000000000000016
malformed line
_ZN4daal8servicesL5tableE r 0000000000010000 0x40
";

const DEMANGLED: &str = "\
daal::algorithms::kmeans::train() T 0000000000004096 0000000000000512
vtable for daal::Base V 0000000000008192 0000000000000024
daal::scratch b 0000000000009000 0000000000000016
daal::services::table r 0000000000010000 0x40
";

#[test]
fn demangled_listing_with_spaces_lines_up() {
    let mangled = parse_symbol_listing(MANGLED, NameLayout::Mangled);
    let demangled = parse_symbol_listing(DEMANGLED, NameLayout::Demangled);
    assert_eq!(mangled.len(), 4);
    assert_eq!(demangled.len(), 4);
    assert_eq!(demangled[1].name, "vtable for daal::Base");
    assert_eq!(mangled[3].size, 64);

    let resolved = resolve_symbols(mangled, Some(demangled), &BuiltinDemangler);
    assert_eq!(resolved.demangling, DemangleStatus::Demangled);
    assert_eq!(resolved.records[0].bind, Binding::Global);
    assert_eq!(resolved.records[0].symbol_type, SymbolType::Func);
    assert_eq!(resolved.records[1].bind, Binding::Weak);
    assert_eq!(resolved.records[2].bind, Binding::Local);
}

#[test]
fn static_rollup_from_listing() {
    let resolved = resolve_symbols(
        parse_symbol_listing(MANGLED, NameLayout::Mangled),
        Some(parse_symbol_listing(DEMANGLED, NameLayout::Demangled)),
        &BuiltinDemangler,
    );
    let summary = summarize_static(&resolved.records, 10);

    assert_eq!(summary.defined_symbols, 4);
    assert_eq!(summary.size_by_storage["text"], 512);
    assert_eq!(summary.size_by_storage["rwdata"], 24);
    assert_eq!(summary.size_by_storage["bss"], 16);
    assert_eq!(summary.size_by_storage["rodata"], 64);
    assert_eq!(summary.top_global_functions[0].name, "daal::algorithms::kmeans::train()");
    assert_eq!(summary.top_rodata_objects[0].name, "daal::services::table");
    assert_eq!(summary.top_bss_objects[0].size, 16);
    assert_eq!(
        summary.namespace_level3_all[0],
        ("daal::algorithms::kmeans".to_string(), 512)
    );
}

#[test]
fn dynamic_rollup_levels() {
    let resolved = resolve_symbols(
        parse_symbol_listing(MANGLED, NameLayout::Mangled),
        None,
        &BuiltinDemangler,
    );
    let summary = summarize_dynamic(&resolved.records, 50);

    assert_eq!(summary.symbols.len(), 4);
    assert_eq!(summary.symbols[0].size, 512);
    assert_eq!(summary.symbols[0].demangled, "daal::algorithms::kmeans::train()");
    assert!(summary
        .namespace_level3
        .contains(&("daal::algorithms::kmeans".to_string(), 512)));
    assert!(summary
        .namespace_level4
        .contains(&("daal::algorithms::kmeans::train()".to_string(), 512)));

    let sizes = summary.size_map();
    assert_eq!(sizes["daal::algorithms::kmeans::train()"], 512);
}
