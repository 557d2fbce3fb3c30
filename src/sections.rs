//! Section summary: size aggregates and device-offload sections.

use serde::{Deserialize, Serialize};

/// One section header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub name: String,
    pub size: u64,
    pub flags: String,
}

/// Bytes per coarse section class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAggregates {
    pub code_bytes: u64,
    pub rodata_bytes: u64,
    pub data_bytes: u64,
    pub bss_bytes: u64,
}

impl SectionAggregates {
    /// Aggregate names paired with their values, as used in metric keys.
    pub fn entries(&self) -> [(&'static str, u64); 4] {
        [
            ("code_bytes", self.code_bytes),
            ("rodata_bytes", self.rodata_bytes),
            ("data_bytes", self.data_bytes),
            ("bss_bytes", self.bss_bytes),
        ]
    }

    fn add(&mut self, section: &SectionRecord) {
        // Executable wins over everything; `.bss` is matched by name since it
        // carries the same flags as writable data.
        if section.flags.contains('X') {
            self.code_bytes = self.code_bytes.saturating_add(section.size);
        } else if section.name == ".bss" {
            self.bss_bytes = self.bss_bytes.saturating_add(section.size);
        } else if section.flags.contains('W') {
            self.data_bytes = self.data_bytes.saturating_add(section.size);
        } else if section.flags.contains('A') {
            self.rodata_bytes = self.rodata_bytes.saturating_add(section.size);
        }
    }
}

/// Role of a section in device offloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    DeviceImage,
    ImageTable,
    KernelSymbolTable,
    DeviceRelated,
}

const DEVICE_IMAGE_PREFIXES: &[&str] = &["__clang_offload_bundle__", ".sycl_offload", ".llvm_offloading"];

/// Name of the section holding the kernel image records.
pub const IMAGE_TABLE_SECTION: &str = ".tgtimg";
/// Name of the section holding the NUL-separated kernel names.
pub const KERNEL_SYMBOL_SECTION: &str = ".tgtsym";

pub fn classify_device_section(name: &str) -> Option<DeviceCategory> {
    let lowered = name.to_ascii_lowercase();
    if DEVICE_IMAGE_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return Some(DeviceCategory::DeviceImage);
    }
    if lowered == IMAGE_TABLE_SECTION {
        return Some(DeviceCategory::ImageTable);
    }
    if lowered == KERNEL_SYMBOL_SECTION {
        return Some(DeviceCategory::KernelSymbolTable);
    }
    if lowered.contains("spir") || lowered.contains("sycl") {
        return Some(DeviceCategory::DeviceRelated);
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSection {
    pub name: String,
    pub size: u64,
    pub category: DeviceCategory,
}

/// Device payload totals; metadata covers the image and kernel symbol tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOverview {
    pub total_bytes: u64,
    pub image_bytes: u64,
    pub metadata_bytes: u64,
}

/// Section summary of one library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    /// Largest first.
    pub sections: Vec<SectionRecord>,
    pub aggregates: SectionAggregates,
    /// Largest first.
    pub device_sections: Vec<DeviceSection>,
    pub device_overview: DeviceOverview,
}

impl SectionSummary {
    pub fn has_device_images(&self) -> bool {
        self.device_overview.image_bytes > 0
    }
}

pub fn summarize_sections(records: Vec<SectionRecord>) -> SectionSummary {
    let mut aggregates = SectionAggregates::default();
    let mut device_sections = Vec::new();
    let mut device_overview = DeviceOverview::default();

    for record in &records {
        aggregates.add(record);
        if let Some(category) = classify_device_section(&record.name) {
            device_overview.total_bytes = device_overview.total_bytes.saturating_add(record.size);
            match category {
                DeviceCategory::DeviceImage => {
                    device_overview.image_bytes = device_overview.image_bytes.saturating_add(record.size)
                }
                DeviceCategory::ImageTable | DeviceCategory::KernelSymbolTable => {
                    device_overview.metadata_bytes =
                        device_overview.metadata_bytes.saturating_add(record.size)
                }
                DeviceCategory::DeviceRelated => {}
            }
            device_sections.push(DeviceSection {
                name: record.name.clone(),
                size: record.size,
                category,
            });
        }
    }

    let mut sections = records;
    sections.sort_by(|a, b| b.size.cmp(&a.size));
    device_sections.sort_by(|a, b| b.size.cmp(&a.size));

    SectionSummary {
        sections,
        aggregates,
        device_sections,
        device_overview,
    }
}
