#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the split between the image table and the name table.
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let cut = (split as usize * 16).min(rest.len());
    let (image, names) = rest.split_at(cut);
    let cfg = wheelscan::config::KernelConfig::default();
    let _ = wheelscan::kernels::decode_kernel_table(
        image,
        names,
        &wheelscan::demangle::BuiltinDemangler,
        &cfg,
    );
});
