//! Result types returned by a conversion.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a finished conversion produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// One entry per converted page, sorted by page number.
    pub images: Vec<PageImage>,
    /// Path of the ZIP archive, when one was requested.
    pub archive: Option<PathBuf>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Image paths in page order.
    pub fn image_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.images.iter().map(|i| &i.path)
    }
}

/// A page image written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-indexed page number.
    pub page_num: usize,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Page count of the source document.
    pub total_pages: usize,
    /// Pages written as images.
    pub converted_pages: usize,
    /// Entries written to the archive (0 when not archiving).
    pub archive_entries: usize,
    pub images_duration_ms: u64,
    pub archive_duration_ms: u64,
    pub total_duration_ms: u64,
}
