//! Configuration types for PDF-to-image conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Input gathering (flags, prompts) is
//! kept out of the library: the CLI fills a config first and then hands it
//! to [`crate::convert::convert_pdf_to_images`].

use crate::error::Pdf2ImgError;
use crate::progress::ProgressCallback;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a PDF-to-image conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2img::{ArchiveSpec, ConversionConfig};
///
/// let config = ConversionConfig::builder()
///     .format("jpeg")
///     .concurrency(4)
///     .archive(ArchiveSpec::from_codes("bundle", 8, 9, 1).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(config.format.extension(), "jpeg");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Output image format. Default: PNG.
    pub format: OutputFormat,

    /// When set, every produced image is also written into a ZIP archive.
    pub archive: Option<ArchiveSpec>,

    /// Maximum number of page encode jobs in flight. Default: the number of
    /// hardware threads reported by [`std::thread::available_parallelism`].
    pub concurrency: usize,

    /// Rendering DPI. Range: 72–400. Default: 72.
    ///
    /// 72 DPI maps one PDF point to one pixel, which is pdfium's natural
    /// page size.
    pub dpi: u32,

    /// Optional cap on the rendered width and height in pixels.
    pub max_rendered_pixels: Option<u32>,

    /// Render pages in grayscale. The single-channel bitmap is converted
    /// back to RGB before encoding.
    pub grayscale: bool,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Path to the pdfium shared library, or a directory containing it.
    /// If None, the working directory is tried first, then the system loader.
    pub pdfium_library_path: Option<PathBuf>,

    /// Receives per-page and per-entry progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::png(),
            archive: None,
            concurrency: default_concurrency(),
            dpi: 72,
            max_rendered_pixels: None,
            grayscale: false,
            password: None,
            pages: PageSelection::default(),
            pdfium_library_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("format", &self.format)
            .field("archive", &self.archive)
            .field("concurrency", &self.concurrency)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("grayscale", &self.grayscale)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
            format_name: None,
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
    // Parsed in `build()` so an unknown format surfaces as an error there.
    format_name: Option<String>,
}

impl ConversionConfigBuilder {
    /// Image format name, case-insensitive (`PNG`, `jpeg`, `Tiff`, …).
    pub fn format(mut self, name: impl Into<String>) -> Self {
        self.format_name = Some(name.into());
        self
    }

    pub fn archive(mut self, spec: ArchiveSpec) -> Self {
        self.config.archive = Some(spec);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = Some(px.max(16));
        self
    }

    pub fn grayscale(mut self, v: bool) -> Self {
        self.config.grayscale = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ConversionConfig, Pdf2ImgError> {
        if let Some(name) = self.format_name.take() {
            self.config.format = OutputFormat::parse(&name)?;
        }
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(Pdf2ImgError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Output format ────────────────────────────────────────────────────────

/// A validated output image format.
///
/// Keeps the name the user asked for (uppercased) because it also decides
/// the file extension: `JPEG` writes `.jpeg`, `JPG` writes `.jpg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    name: String,
    format: ImageFormat,
}

impl OutputFormat {
    /// Resolve a case-insensitive format name against the encoders compiled
    /// into the `image` crate.
    pub fn parse(name: &str) -> Result<Self, Pdf2ImgError> {
        let name = name.trim().to_uppercase();
        let format = ImageFormat::from_extension(name.to_lowercase())
            .filter(|f| f.writing_enabled())
            .ok_or_else(|| Pdf2ImgError::UnsupportedFormat {
                format: name.clone(),
            })?;
        Ok(Self { name, format })
    }

    pub fn png() -> Self {
        Self {
            name: "PNG".to_string(),
            format: ImageFormat::Png,
        }
    }

    /// The uppercased name as requested.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file extension written for each page (lowercased name).
    pub fn extension(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn image_format(&self) -> ImageFormat {
        self.format
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ── Archive settings ─────────────────────────────────────────────────────

/// Compression method for archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionMethod {
    /// Code 0: entries are stored uncompressed.
    Stored,
    /// Code 8: DEFLATE.
    Deflated,
}

impl CompressionMethod {
    /// Map the ZIP method code (0 or 8) to a method.
    pub fn from_code(code: u16) -> Result<Self, Pdf2ImgError> {
        match code {
            0 => Ok(Self::Stored),
            8 => Ok(Self::Deflated),
            other => Err(Pdf2ImgError::InvalidArchiveSpec(format!(
                "compression method must be 0 (store) or 8 (deflate), got {other}"
            ))),
        }
    }
}

/// How image paths become archive entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryLayout {
    /// Code 0: keep the folder structure of the image path.
    Nested,
    /// Code 1: bare file names only.
    #[default]
    Flat,
}

impl EntryLayout {
    pub fn from_code(code: u8) -> Result<Self, Pdf2ImgError> {
        match code {
            0 => Ok(Self::Nested),
            1 => Ok(Self::Flat),
            other => Err(Pdf2ImgError::InvalidArchiveSpec(format!(
                "storage layout must be 0 (nested) or 1 (flat), got {other}"
            ))),
        }
    }
}

/// Settings for the optional ZIP archive written after all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSpec {
    /// Archive base name; `.zip` is appended.
    pub name: String,
    pub method: CompressionMethod,
    /// Compression level, 0–9.
    pub level: u8,
    pub layout: EntryLayout,
}

impl ArchiveSpec {
    pub fn new(
        name: impl Into<String>,
        method: CompressionMethod,
        level: u8,
        layout: EntryLayout,
    ) -> Result<Self, Pdf2ImgError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(Pdf2ImgError::InvalidArchiveSpec(
                "archive name must not be empty".into(),
            ));
        }
        if trimmed.contains(['/', '\\']) {
            return Err(Pdf2ImgError::InvalidArchiveSpec(format!(
                "archive name must not contain path separators, got '{trimmed}'"
            )));
        }
        if level > 9 {
            return Err(Pdf2ImgError::InvalidArchiveSpec(format!(
                "compression level must be 0–9, got {level}"
            )));
        }
        Ok(Self {
            name: trimmed.to_string(),
            method,
            level,
            layout,
        })
    }

    /// Build from the raw numeric codes the CLI asks for.
    pub fn from_codes(
        name: impl Into<String>,
        method_code: u16,
        level: u8,
        layout_code: u8,
    ) -> Result<Self, Pdf2ImgError> {
        Self::new(
            name,
            CompressionMethod::from_code(method_code)?,
            level,
            EntryLayout::from_code(layout_code)?,
        )
    }

    /// File name of the archive, e.g. `bundle.zip`.
    pub fn file_name(&self) -> String {
        format!("{}.zip", self.name)
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_png_all_pages() {
        let c = ConversionConfig::default();
        assert_eq!(c.format.name(), "PNG");
        assert_eq!(c.pages, PageSelection::All);
        assert!(c.archive.is_none());
        assert!(c.concurrency >= 1);
        assert_eq!(c.dpi, 72);
    }

    #[test]
    fn format_is_case_insensitive_and_extension_lowercased() {
        let f = OutputFormat::parse("jPeG").unwrap();
        assert_eq!(f.name(), "JPEG");
        assert_eq!(f.extension(), "jpeg");
        assert_eq!(f.image_format(), ImageFormat::Jpeg);

        let f = OutputFormat::parse(" jpg ").unwrap();
        assert_eq!(f.extension(), "jpg");
        assert_eq!(f.image_format(), ImageFormat::Jpeg);
    }

    #[test]
    fn unknown_format_is_rejected_at_build() {
        let err = ConversionConfig::builder().format("xcf").build().unwrap_err();
        assert!(matches!(err, Pdf2ImgError::UnsupportedFormat { ref format } if format == "XCF"));
    }

    #[test]
    fn builder_clamps_values() {
        let c = ConversionConfig::builder()
            .concurrency(0)
            .dpi(5000)
            .build()
            .unwrap();
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.dpi, 400);
    }

    #[test]
    fn archive_codes_map_to_settings() {
        let spec = ArchiveSpec::from_codes("bundle", 8, 9, 1).unwrap();
        assert_eq!(spec.method, CompressionMethod::Deflated);
        assert_eq!(spec.level, 9);
        assert_eq!(spec.layout, EntryLayout::Flat);
        assert_eq!(spec.file_name(), "bundle.zip");

        let spec = ArchiveSpec::from_codes("raw", 0, 0, 0).unwrap();
        assert_eq!(spec.method, CompressionMethod::Stored);
        assert_eq!(spec.layout, EntryLayout::Nested);
    }

    #[test]
    fn archive_codes_out_of_range_are_rejected() {
        assert!(ArchiveSpec::from_codes("a", 12, 5, 1).is_err());
        assert!(ArchiveSpec::from_codes("a", 8, 10, 1).is_err());
        assert!(ArchiveSpec::from_codes("a", 8, 5, 2).is_err());
        assert!(ArchiveSpec::from_codes("  ", 8, 5, 1).is_err());
        assert!(ArchiveSpec::from_codes("../evil", 8, 5, 1).is_err());
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(3, 10).to_indices(4), vec![2, 3]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(5),
            vec![0, 2] // deduplicated and sorted
        );
    }
}
