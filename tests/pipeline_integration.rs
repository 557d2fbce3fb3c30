//! End-to-end runs over an extracted package with scripted tools.

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{image_table, name_table, nm_listing, scripted_toolchain, section_listing, FakeSections, ScriptedRunner};
use tempfile::TempDir;
use wheelscan::config::ScanConfig;
use wheelscan::demangle::DemangleStatus;
use wheelscan::error::ScanError;
use wheelscan::kernels::KernelDecode;
use wheelscan::pipeline::{analyze_run, flatten_metrics, write_outputs, LibraryOutcome};
use wheelscan::tools::ToolOutput;

const CORE: &str = "libonedal_core.so.2";
const DPC: &str = "libonedal_dpc.so.2";
const BROKEN: &str = "libbroken.so";

const AUDIT: &str = "pkg.whl is consistent with the following platform tag: \"manylinux_2_28_x86_64\".\n\n\
The wheel references external versioned symbols in these\n\
system-provided shared libraries: libm.so.6 with versions {'GLIBC_2.2.5'}\n\n\
This constrains the platform tag to \"manylinux_2_17_x86_64\".\n";

struct Package {
    _dir: TempDir,
    root: PathBuf,
    archive: PathBuf,
}

fn package() -> Package {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("extracted");
    let lib_dir = root.join("pkg-1.0.data").join("data").join("lib");
    std::fs::create_dir_all(&lib_dir).unwrap();
    std::fs::create_dir_all(root.join("onedal")).unwrap();
    std::fs::write(lib_dir.join(CORE), vec![1u8; 1000]).unwrap();
    std::fs::write(lib_dir.join(DPC), vec![2u8; 2000]).unwrap();
    std::fs::write(lib_dir.join(BROKEN), vec![3u8; 10]).unwrap();
    std::fs::write(root.join("onedal").join("__init__.py"), vec![b'#'; 20]).unwrap();
    let archive = dir.path().join("pkg.whl");
    std::fs::write(&archive, vec![0u8; 50]).unwrap();
    Package {
        _dir: dir,
        root,
        archive,
    }
}

fn runner() -> ScriptedRunner {
    let core_dynamic = [
        ("_ZN6oneapi3dal4impl5trainEv", 'T', 400),
        ("_ZN6oneapi3dal6commonEv", 'T', 100),
    ];
    let core_dynamic_demangled = [
        ("oneapi::dal::impl::train()", 'T', 400),
        ("oneapi::dal::common()", 'T', 100),
    ];
    let core_static = [
        ("_ZN6oneapi3dal4impl5trainEv", 'T', 400),
        ("_ZN6oneapi3dal6detail6helperEv", 't', 50),
        ("lookup_table", 'r', 64),
        ("counter", 'b', 8),
    ];
    let dpc_dynamic = [
        ("_ZN6oneapi3dal4impl5trainEv", 'T', 800),
        ("_ZN4sycl3_V15queue6submitEv", 'W', 300),
    ];

    ScriptedRunner::new()
        .on(
            "readelf",
            &[CORE],
            &[],
            ToolOutput::ok(section_listing(&[
                (".text", 0x1f0, "AX"),
                (".rodata", 0x100, "A"),
                (".data", 0x20, "WA"),
                (".bss", 0x40, "WA"),
            ])),
        )
        .on(
            "readelf",
            &[DPC],
            &[],
            ToolOutput::ok(section_listing(&[
                (".text", 0x100, "AX"),
                ("__CLANG_OFFLOAD_BUNDLE__sycl-spir64", 0x4000, ""),
                (".tgtimg", 0x30, "WA"),
                (".tgtsym", 0x20, "A"),
            ])),
        )
        .on("nm", &["-D", "--demangle", CORE], &[], ToolOutput::ok(nm_listing(&core_dynamic_demangled)))
        .on("nm", &["-D", CORE], &["--demangle"], ToolOutput::ok(nm_listing(&core_dynamic)))
        .on("nm", &[CORE], &["-D", "--demangle"], ToolOutput::ok(nm_listing(&core_static)))
        // Demangled listing shorter than the mangled one: batch demangling takes over.
        .on(
            "nm",
            &["-D", "--demangle", DPC],
            &[],
            ToolOutput::ok(nm_listing(&[("sycl::_V1::queue::submit()", 'W', 300)])),
        )
        .on("nm", &[DPC], &["--demangle"], ToolOutput::ok(nm_listing(&dpc_dynamic)))
        .on(
            "ldd",
            &[CORE],
            &[],
            ToolOutput::ok("\tlibtbb.so.12 => /usr/lib/libtbb.so.12 (0x00007f)\n\n"),
        )
        .on("ldd", &[DPC], &[], ToolOutput::failed("not a dynamic executable\n"))
        .on("auditwheel", &["show"], &[], ToolOutput::ok(AUDIT))
}

fn sections() -> FakeSections {
    FakeSections::new()
        .with(DPC, ".tgtimg", image_table(&[(0, 4096), (4096, 0), (4096, 2048)]))
        .with(
            DPC,
            ".tgtsym",
            name_table(&[
                "k1._ZN6oneapi3dal7backend6kernel3runEv",
                "k2._ZN4sycl3_V16detail4fillEv",
            ]),
        )
}

fn outcome<'a>(libraries: &'a [LibraryOutcome], name: &str) -> &'a LibraryOutcome {
    libraries
        .iter()
        .find(|l| l.name() == name)
        .unwrap_or_else(|| panic!("{name} missing"))
}

#[test]
fn full_run_isolates_failures_and_keeps_order() {
    let pkg = package();
    let runner = Arc::new(runner());
    let tools = scripted_toolchain(Arc::clone(&runner), sections());
    let report = analyze_run(&tools, &pkg.root, Some(pkg.archive.as_path()), &ScanConfig::default()).unwrap();

    let names: Vec<&str> = report.libraries.iter().map(|l| l.name()).collect();
    assert_eq!(names, vec![BROKEN, CORE, DPC]);
    assert!(matches!(
        outcome(&report.libraries, BROKEN),
        LibraryOutcome::Failed { error, .. } if error.contains("readelf")
    ));
    assert_eq!(report.analyzed().count(), 2);
}

#[test]
fn library_reports_carry_sections_symbols_and_dependencies() {
    let pkg = package();
    let tools = scripted_toolchain(Arc::new(runner()), sections());
    let report = analyze_run(&tools, &pkg.root, Some(pkg.archive.as_path()), &ScanConfig::default()).unwrap();

    let core = outcome(&report.libraries, CORE).report().unwrap();
    assert_eq!(core.size_bytes, 1000);
    assert_eq!(core.sections.aggregates.code_bytes, 0x1f0);
    assert_eq!(core.sections.aggregates.bss_bytes, 0x40);
    assert_eq!(core.sections.aggregates.data_bytes, 0x20);
    assert!(core.device_kernels.is_none());
    assert_eq!(core.dynamic_demangling, DemangleStatus::Demangled);
    assert_eq!(core.dynamic_symbols.symbols[0].demangled, "oneapi::dal::impl::train()");
    assert_eq!(core.static_symbols.total_symbols, 4);
    assert_eq!(core.static_symbols.counts_by_bind["LOCAL"], 3);
    assert_eq!(core.static_symbols.top_local_functions[0].name, "oneapi::dal::detail::helper()");
    assert_eq!(
        core.runtime_dependencies,
        vec!["libtbb.so.12 => /usr/lib/libtbb.so.12 (0x00007f)"]
    );

    let dpc = outcome(&report.libraries, DPC).report().unwrap();
    assert_eq!(dpc.dynamic_symbols.symbols[1].demangled, "sycl::_V1::queue::submit()");
    assert_eq!(dpc.runtime_dependencies, vec!["not a dynamic executable"]);
    assert_eq!(dpc.sections.device_overview.image_bytes, 0x4000);
    assert_eq!(dpc.sections.device_overview.total_bytes, 0x4000 + 0x30 + 0x20);
}

#[test]
fn device_kernels_are_decoded_from_sections() {
    let pkg = package();
    let tools = scripted_toolchain(Arc::new(runner()), sections());
    let report = analyze_run(&tools, &pkg.root, None, &ScanConfig::default()).unwrap();

    let dpc = outcome(&report.libraries, DPC).report().unwrap();
    let Some(KernelDecode::Decoded(kernels)) = &dpc.device_kernels else {
        panic!("expected decoded kernels, got {:?}", dpc.device_kernels);
    };
    assert_eq!(kernels.entry_count, 2);
    assert_eq!(kernels.total_bytes, 6144);
    assert!(!kernels.pairing.mismatch);
    let families: Vec<&str> = kernels.top_families.iter().map(|f| f.family.as_str()).collect();
    assert_eq!(
        families,
        vec!["oneapi::dal::backend::kernel::run()", "sycl::_V1::detail::fill()"]
    );
}

#[test]
fn missing_kernel_sections_are_no_data() {
    let pkg = package();
    let tools = scripted_toolchain(Arc::new(runner()), FakeSections::new());
    let report = analyze_run(&tools, &pkg.root, None, &ScanConfig::default()).unwrap();
    let dpc = outcome(&report.libraries, DPC).report().unwrap();
    assert_eq!(dpc.device_kernels, Some(KernelDecode::NoData));
}

#[test]
fn overlap_abi_and_inventory() {
    let pkg = package();
    let tools = scripted_toolchain(Arc::new(runner()), sections());
    let report = analyze_run(&tools, &pkg.root, Some(pkg.archive.as_path()), &ScanConfig::default()).unwrap();

    assert_eq!(report.overlap.pairs.len(), 1);
    assert!(report.overlap.triple_overlap.is_none());
    let pair = report.overlap.pair(CORE, DPC).unwrap();
    assert_eq!(pair.shared_count, 1);
    assert_eq!(pair.top_symbols[0].name, "oneapi::dal::impl::train()");
    assert_eq!((pair.top_symbols[0].size_a, pair.top_symbols[0].size_b), (400, 800));

    let abi = report.abi.as_ref().unwrap();
    assert_eq!(abi.platform_tag.as_deref(), Some("manylinux_2_28_x86_64"));
    assert_eq!(abi.external_libs, vec!["libm.so.6"]);

    let inventory = report.inventory.as_ref().unwrap();
    assert_eq!(inventory.archive_size_bytes, Some(50));
    assert_eq!(inventory.total_uncompressed_bytes, 3030);
    assert_eq!(inventory.bytes_by_category["shared_library"], 3010);
}

#[test]
fn metrics_and_outputs() {
    let pkg = package();
    let out = TempDir::new().unwrap();
    let tools = scripted_toolchain(Arc::new(runner()), sections());
    let report = analyze_run(&tools, &pkg.root, Some(pkg.archive.as_path()), &ScanConfig::default()).unwrap();

    let metrics = write_outputs(&report, out.path()).unwrap();
    assert_eq!(metrics, flatten_metrics(&report));
    assert_eq!(metrics["wheel_compressed"], 50);
    assert_eq!(metrics["wheel_uncompressed"], 3030);
    assert_eq!(metrics[&format!("library_{CORE}")], 1000);
    assert_eq!(metrics[&format!("device_{DPC}")], 0x4000 + 0x30 + 0x20);
    assert_eq!(metrics[&format!("section_{CORE}_code_bytes")], 0x1f0);
    assert!(!metrics.contains_key(&format!("device_{CORE}")));
    assert!(!metrics.keys().any(|k| k.contains(BROKEN)));

    for file in [
        "metrics.json",
        "sections_summary.json",
        "symbols_summary.json",
        "static_symbols_summary.json",
        "runtime_dependencies.json",
        "symbol_overlap.json",
        "auditwheel_report.json",
        "file_inventory.json",
        "libraries.json",
    ] {
        assert!(out.path().join(file).is_file(), "{file}");
    }
    assert!(out.path().join(format!("device_kernels_{DPC}.json")).is_file());
    assert!(!out.path().join(format!("device_kernels_{CORE}.json")).exists());
    assert!(!out.path().join(format!("sections_{BROKEN}.json")).exists());
}

#[test]
fn empty_root_is_fatal() {
    let dir = TempDir::new().unwrap();
    let tools = scripted_toolchain(Arc::new(ScriptedRunner::new()), FakeSections::new());
    let err = analyze_run(&tools, dir.path(), None::<&Path>, &ScanConfig::default()).unwrap_err();
    assert!(matches!(err, ScanError::NoArtifacts(_)));
    assert!(err.is_fatal_run());
}
