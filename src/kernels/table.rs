//! Binary layout of the device kernel table.
//!
//! The image table is a sequence of 16-byte records, each two little-endian
//! `u64` values (offset, size). The symbol table is a run of NUL-terminated
//! names. Record `i` belongs to name `i`.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Bytes per image table record.
pub const RECORD_SIZE: usize = 16;

/// One offset/size record with a non-zero size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRecord {
    pub offset: u64,
    pub size: u64,
}

/// Decode whole strides, dropping a trailing partial stride and zero-size records.
pub fn decode_image_records(bytes: &[u8]) -> Vec<ImageRecord> {
    bytes
        .chunks_exact(RECORD_SIZE)
        .filter_map(|chunk| {
            let (offset, size) = chunk.split_at(8);
            let offset = u64::from_le_bytes(offset.try_into().ok()?);
            let size = u64::from_le_bytes(size.try_into().ok()?);
            (size != 0).then_some(ImageRecord { offset, size })
        })
        .collect()
}

/// Split on NUL, dropping empty names; invalid UTF-8 bytes are dropped.
pub fn decode_kernel_names(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|&b| b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| part.utf8_chunks().map(|chunk| chunk.valid()).collect::<String>())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Positionally paired records and names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelPairing {
    pub pairs: Vec<(ImageRecord, String)>,
    /// Records beyond the last name.
    pub unpaired_records: usize,
    /// Names beyond the last record.
    pub unpaired_names: usize,
}

/// Serializable view of how records and names lined up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingReport {
    pub mismatch: bool,
    pub unpaired_records: usize,
    pub unpaired_names: usize,
}

impl KernelPairing {
    pub fn pair(records: Vec<ImageRecord>, names: Vec<String>) -> Self {
        let paired = records.len().min(names.len());
        let unpaired_records = records.len() - paired;
        let unpaired_names = names.len() - paired;
        if unpaired_records > 0 || unpaired_names > 0 {
            warn!(
                records = records.len(),
                names = names.len(),
                "kernel table records and names differ in count, truncating"
            );
        }
        Self {
            pairs: records.into_iter().zip(names).collect(),
            unpaired_records,
            unpaired_names,
        }
    }

    pub fn is_mismatched(&self) -> bool {
        self.unpaired_records > 0 || self.unpaired_names > 0
    }

    pub fn report(&self) -> PairingReport {
        PairingReport {
            mismatch: self.is_mismatched(),
            unpaired_records: self.unpaired_records,
            unpaired_names: self.unpaired_names,
        }
    }
}
