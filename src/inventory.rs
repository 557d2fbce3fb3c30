//! File inventory of an extracted package.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Component, Path};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, ScanError};

/// Entries listed in [`FileInventory::top_entries`].
pub const TOP_ENTRIES: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Metadata,
    SharedLibrary,
    NativePayload,
    Python,
    Other,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Metadata => "metadata",
            FileCategory::SharedLibrary => "shared_library",
            FileCategory::NativePayload => "native_payload",
            FileCategory::Python => "python",
            FileCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Relative to the inventory root, `/`-separated.
    pub path: String,
    pub size: u64,
    pub sha256: String,
    pub category: FileCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInventory {
    pub archive_file: Option<String>,
    pub archive_size_bytes: Option<u64>,
    pub total_uncompressed_bytes: u64,
    /// Largest first; ties in path order.
    pub files: Vec<InventoryEntry>,
    pub top_entries: Vec<InventoryEntry>,
    pub bytes_by_category: BTreeMap<String, u64>,
}

/// Whether a file name ends in `.so` or `.so.<digits>[.<digits>...]`.
pub fn has_shared_object_suffix(file_name: &str) -> bool {
    let parts: Vec<&str> = file_name.split('.').collect();
    let Some(so) = parts.iter().skip(1).position(|&part| part == "so") else {
        return false;
    };
    parts[so + 2..]
        .iter()
        .all(|version| !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()))
}

/// Category of a file from its path relative to the package root.
pub fn categorize(relative: &Path) -> FileCategory {
    let parts: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    if parts.iter().any(|p| p.ends_with(".dist-info")) {
        return FileCategory::Metadata;
    }
    let file_name = parts.last().copied().unwrap_or_default();
    if parts.iter().any(|p| p.ends_with(".data")) && parts.contains(&"lib") {
        if has_shared_object_suffix(file_name) {
            return FileCategory::SharedLibrary;
        }
        return FileCategory::NativePayload;
    }
    if relative.extension().is_some_and(|ext| ext == "py") {
        return FileCategory::Python;
    }
    FileCategory::Other
}

/// Hex SHA-256 of a file, streamed.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn relative_posix(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ScanError::InvalidInput(format!("{} is outside {}", path.display(), root.display())))?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Hash and categorize every regular file under `root`.
pub fn build_inventory(root: &Path, archive: Option<&Path>) -> Result<FileInventory> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ScanError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        files.push(InventoryEntry {
            path: relative_posix(root, path)?,
            size: entry.metadata().map_err(|e| ScanError::Io(e.into()))?.len(),
            sha256: sha256_file(path)?,
            category: categorize(relative),
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.sort_by(|a, b| b.size.cmp(&a.size));

    let total_uncompressed_bytes = files.iter().map(|f| f.size).sum();
    let mut bytes_by_category = BTreeMap::new();
    for file in &files {
        *bytes_by_category
            .entry(file.category.as_str().to_string())
            .or_insert(0) += file.size;
    }

    let (archive_file, archive_size_bytes) = match archive {
        Some(path) => (
            path.file_name().map(|n| n.to_string_lossy().into_owned()),
            Some(std::fs::metadata(path)?.len()),
        ),
        None => (None, None),
    };

    debug!(files = files.len(), total_uncompressed_bytes, "built file inventory");
    Ok(FileInventory {
        archive_file,
        archive_size_bytes,
        total_uncompressed_bytes,
        top_entries: files.iter().take(TOP_ENTRIES).cloned().collect(),
        files,
        bytes_by_category,
    })
}
