use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use wheelscan::config::ScanConfig;
use wheelscan::error::ScanError;
use wheelscan::gate::{
    components_above, evaluate_with_config, format_size, load_baseline, load_current_metrics,
    save_baseline, GateReport,
};
use wheelscan::logging::{init_tracing, init_tracing_json};
use wheelscan::pipeline::{analyze_run, write_outputs};
use wheelscan::tools::Toolchain;

mod args;

use args::{AnalyzeArgs, Args, Command, GateArgs};

const DEFAULT_BASELINE: &str = "size_baseline.json";

fn main() -> Result<()> {
    let args = Args::parse();
    if args.json_logs {
        init_tracing_json();
    } else {
        init_tracing();
    }

    let result = match args.command {
        Command::Analyze(analyze) => run_analyze(&analyze),
        Command::Gate(gate) => run_gate(&gate),
    };
    match result {
        Ok(passed) => std::process::exit(if passed { 0 } else { 1 }),
        Err(err) => match err.downcast_ref::<ScanError>() {
            // Missing inputs get a one-line message instead of an error chain.
            Some(scan) if scan.is_fatal_run() => {
                eprintln!("Error: {scan}");
                std::process::exit(1);
            }
            _ => Err(err),
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => ScanConfig::from_json_file(path)
            .with_context(|| format!("loading configuration {}", path.display())),
        None => Ok(ScanConfig::default()),
    }
}

fn run_analyze(args: &AnalyzeArgs) -> Result<bool> {
    let config = load_config(args.config.as_deref())?;
    let tools = Toolchain::system(&config.tools);
    let report = analyze_run(&tools, &args.root, args.archive.as_deref(), &config)?;
    let metrics = write_outputs(&report, &args.output)?;

    let failed = report.libraries.len() - report.analyzed().count();
    println!(
        "Analyzed {} libraries ({} failed), {} size metrics written to {}",
        report.libraries.len(),
        failed,
        metrics.len(),
        args.output.display()
    );
    Ok(true)
}

fn run_gate(args: &GateArgs) -> Result<bool> {
    let mut gate = load_config(args.config.as_deref())?.gate;
    if let Some(max_growth) = &args.max_growth {
        gate.max_growth = max_growth.clone();
    }
    let floor = gate.report_floor_bytes;
    let current = load_current_metrics(&args.analysis_dir)?;
    println!("Loaded {} size metrics", current.len());

    if args.save_baseline {
        let path = args
            .baseline
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASELINE));
        save_baseline(&current, &path)?;
        println!("Baseline saved to {}", path.display());
        return Ok(true);
    }

    let Some(baseline_path) = &args.baseline else {
        println!("No baseline specified. Current sizes:");
        for (name, size) in components_above(&current, floor) {
            println!("  {name}: {}", format_size(size));
        }
        return Ok(true);
    };

    let baseline = load_baseline(baseline_path)?;
    let outcome = evaluate_with_config(&current, &baseline, &gate)?;

    for component in &outcome.new_components {
        println!("NEW: {} = {}", component.component, format_size(component.size));
    }
    if outcome.passed {
        println!("Size check PASSED (threshold: {})", gate.max_growth);
        if !outcome.improvements.is_empty() {
            println!("\nSize improvements:");
            for improvement in &outcome.improvements {
                println!("  {}: -{}", improvement.component, format_size(improvement.reduction));
            }
        }
    } else {
        println!("Size check FAILED (threshold: {})", gate.max_growth);
        println!("\n{} components exceed growth threshold:", outcome.failures.len());
        for failure in &outcome.failures {
            let pct = failure
                .growth_pct
                .map(|p| format!("{p:.1}%"))
                .unwrap_or_else(|| "new from zero".to_string());
            println!("\n  {}:", failure.component);
            println!("    Baseline: {}", format_size(failure.baseline));
            println!("    Current:  {}", format_size(failure.current));
            println!("    Growth:   {} ({pct})", format_size(failure.growth));
        }
    }

    let passed = outcome.passed;
    if let Some(output) = &args.output {
        write_report(
            output,
            &GateReport {
                threshold: gate.max_growth.clone(),
                outcome,
                current_sizes: current,
                baseline_sizes: baseline,
            },
        )?;
    }
    Ok(passed)
}

fn write_report(path: &Path, report: &GateReport) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("writing {}", path.display()))
}
