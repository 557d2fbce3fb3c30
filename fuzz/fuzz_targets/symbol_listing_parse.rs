#![no_main]
use libfuzzer_sys::fuzz_target;
use wheelscan::parse::{parse_section_headers, parse_symbol_listing, NameLayout};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let _ = parse_symbol_listing(&text, NameLayout::Mangled);
    let _ = parse_symbol_listing(&text, NameLayout::Demangled);
    let _ = parse_section_headers(&text);
});
