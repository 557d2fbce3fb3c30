//! Raw section extraction for the device kernel tables.

use memmap2::Mmap;
use object::{Object, ObjectSection};
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, ScanError};

/// Extracts the raw bytes of a named section from a shared library.
pub trait SectionReader: Send + Sync {
    /// `Ok(None)` when the section is absent or empty.
    fn read_section(&self, library: &Path, name: &str) -> Result<Option<Vec<u8>>>;
}

/// Reads sections through the object crate over a read-only memory map.
///
/// Files the object crate cannot open report [`ScanError::ToolUnavailable`]:
/// the container format is outside what this reader can decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSectionReader;

impl SectionReader for ObjectSectionReader {
    fn read_section(&self, library: &Path, name: &str) -> Result<Option<Vec<u8>>> {
        let file = File::open(library)?;
        if file.metadata()?.len() == 0 {
            return Ok(None);
        }
        // Safety: read-only map of a regular file that is not modified during analysis.
        let mmap = unsafe { Mmap::map(&file)? };
        let object = object::File::parse(&*mmap).map_err(|e| {
            ScanError::ToolUnavailable(format!(
                "object reader cannot open {}: {e}",
                library.display()
            ))
        })?;

        let Some(section) = object.section_by_name(name) else {
            debug!(library = %library.display(), section = name, "section absent");
            return Ok(None);
        };
        let data = section.data().map_err(|e| ScanError::ToolFailed {
            tool: "object".to_string(),
            message: format!("{name}: {e}"),
        })?;
        if data.is_empty() {
            return Ok(None);
        }
        Ok(Some(data.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn non_object_file_is_unavailable() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an ELF image").unwrap();
        let result = ObjectSectionReader.read_section(file.path(), ".tgtimg");
        assert!(matches!(result, Err(ScanError::ToolUnavailable(_))));
    }

    #[test]
    fn empty_file_has_no_sections() {
        let file = NamedTempFile::new().unwrap();
        let result = ObjectSectionReader.read_section(file.path(), ".tgtimg").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = ObjectSectionReader.read_section(Path::new("/nonexistent/libx.so"), ".tgtsym");
        assert!(matches!(result, Err(ScanError::Io(_))));
    }
}
