//! Common test utilities and helpers.
//!
//! A scripted [`ToolRunner`] stands in for the external inspection tools and
//! an in-memory [`SectionReader`] for raw section reads, so integration tests
//! run the full pipeline without any binary tooling installed.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use wheelscan::config::{DemanglerBackend, ToolConfig};
use wheelscan::error::{Result, ScanError};
use wheelscan::tools::{DemanglerSlot, SectionReader, ToolLookup, ToolOutput, ToolRunner, Toolchain};

enum Response {
    Output(ToolOutput),
    Unavailable,
}

struct Rule {
    program: String,
    with: Vec<String>,
    without: Vec<String>,
    response: Response,
}

impl Rule {
    fn matches(&self, program: &str, args: &[String]) -> bool {
        let has = |wanted: &String| args.iter().any(|a| a == wanted || a.ends_with(wanted.as_str()));
        self.program == program && self.with.iter().all(has) && !self.without.iter().any(has)
    }
}

/// Answers tool invocations from a list of rules; the first match wins.
///
/// An argument in `with`/`without` matches an actual argument equal to it or
/// ending with it, so a library file name matches its full path. Unmatched
/// invocations behave like a missing program.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, program: &str, with: &[&str], without: &[&str], output: ToolOutput) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            with: with.iter().map(|s| s.to_string()).collect(),
            without: without.iter().map(|s| s.to_string()).collect(),
            response: Response::Output(output),
        });
        self
    }

    pub fn unavailable(mut self, program: &str, with: &[&str]) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            with: with.iter().map(|s| s.to_string()).collect(),
            without: Vec::new(),
            response: Response::Unavailable,
        });
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls().iter().filter(|(p, _)| p == program).count()
    }
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String], _stdin: Option<&str>) -> Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        match self.rules.iter().find(|rule| rule.matches(program, args)) {
            Some(Rule {
                response: Response::Output(output),
                ..
            }) => Ok(output.clone()),
            _ => Err(ScanError::ToolUnavailable(program.to_string())),
        }
    }
}

/// Section contents keyed by library file name and section name.
#[derive(Default)]
pub struct FakeSections {
    sections: HashMap<(String, String), Vec<u8>>,
}

impl FakeSections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, library: &str, section: &str, bytes: Vec<u8>) -> Self {
        self.sections
            .insert((library.to_string(), section.to_string()), bytes);
        self
    }
}

impl SectionReader for FakeSections {
    fn read_section(&self, library: &Path, name: &str) -> Result<Option<Vec<u8>>> {
        let file = library
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self
            .sections
            .get(&(file, name.to_string()))
            .filter(|bytes| !bytes.is_empty())
            .cloned())
    }
}

/// Lookup that finds nothing.
pub struct NoTools;

impl ToolLookup for NoTools {
    fn find(&self, _program: &str) -> Option<PathBuf> {
        None
    }
}

/// Toolchain over scripted tools with the in-process demangler.
pub fn scripted_toolchain(runner: Arc<ScriptedRunner>, sections: FakeSections) -> Toolchain {
    let config = ToolConfig {
        demangler: DemanglerBackend::Builtin,
        ..ToolConfig::default()
    };
    Toolchain::new(
        runner,
        Arc::new(NoTools),
        Arc::new(DemanglerSlot::new()),
        Arc::new(sections),
        config,
    )
}

/// Encode `(offset, size)` pairs as image table records.
pub fn image_table(records: &[(u64, u64)]) -> Vec<u8> {
    records
        .iter()
        .flat_map(|(offset, size)| {
            offset
                .to_le_bytes()
                .into_iter()
                .chain(size.to_le_bytes())
        })
        .collect()
}

/// NUL-terminated kernel names.
pub fn name_table(names: &[&str]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for name in names {
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
    }
    bytes
}

/// One POSIX-format symbol line with decimal value and size.
pub fn nm_line(name: &str, kind: char, size: u64) -> String {
    format!("{name} {kind} {:016} {size:016}", 4096)
}

pub fn nm_listing(lines: &[(&str, char, u64)]) -> String {
    lines
        .iter()
        .map(|(name, kind, size)| nm_line(name, *kind, *size))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Section header listing in wide format; sizes are written in hex.
pub fn section_listing(sections: &[(&str, u64, &str)]) -> String {
    let mut text = String::from(
        "Section Headers:\n  [Nr] Name              Type            Address          Off    Size   ES Flg Lk Inf Al\n",
    );
    text.push_str("  [ 0]                   NULL            0000000000000000 000000 000000 00      0   0  0\n");
    for (index, (name, size, flags)) in sections.iter().enumerate() {
        text.push_str(&format!(
            "  [{:2}] {name:<17} PROGBITS        0000000000001000 001000 {size:06x} 00 {flags:>3}  0   0 16\n",
            index + 1
        ));
    }
    text
}
