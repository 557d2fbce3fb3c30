//! Tool discovery and the cached demangler slot.

use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Resolves a program name to an installed executable.
pub trait ToolLookup: Send + Sync {
    fn find(&self, program: &str) -> Option<PathBuf>;
}

/// Searches `PATH` like a shell would.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLookup;

impl ToolLookup for PathLookup {
    fn find(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

static SHARED_SLOT: Lazy<Arc<DemanglerSlot>> = Lazy::new(|| Arc::new(DemanglerSlot::new()));

/// Lazily resolved location of the external demangler.
///
/// The first `resolve` probes the candidates and remembers the answer,
/// including "none installed"; `reset` forgets it so the next call probes
/// again.
#[derive(Debug, Default)]
pub struct DemanglerSlot {
    resolved: Mutex<Option<Option<PathBuf>>>,
}

impl DemanglerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide slot used by [`crate::tools::Toolchain::system`].
    pub fn shared() -> Arc<DemanglerSlot> {
        Arc::clone(&SHARED_SLOT)
    }

    pub fn resolve(&self, lookup: &dyn ToolLookup, candidates: &[String]) -> Option<PathBuf> {
        let mut slot = self.resolved.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = slot.as_ref() {
            return cached.clone();
        }
        let found = candidates.iter().find_map(|name| lookup.find(name));
        debug!(demangler = ?found, "resolved demangler");
        *slot = Some(found.clone());
        found
    }

    pub fn reset(&self) {
        *self.resolved.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}
