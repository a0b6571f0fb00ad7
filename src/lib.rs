//! # edgequake-pdf2img
//!
//! Rasterise every page of a PDF into an image file, and optionally bundle
//! the images into a ZIP archive.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    check the path exists and starts with %PDF
//!  ├─ 2. Render   rasterise pages via pdfium (one blocking thread)
//!  ├─ 3. Encode   page_<n>.<ext> via the image crate (bounded worker pool)
//!  ├─ 4. Archive  optional <name>.zip (stored or deflate, flat or nested)
//!  └─ 5. Output   image paths in page order + per-run stats
//! ```
//!
//! Pages are written in whatever order the workers finish, but every file
//! is named after its own page number, so the result on disk is the same
//! on every run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2img::{convert_pdf_to_images, ArchiveSpec, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .format("PNG")
//!         .archive(ArchiveSpec::from_codes("bundle", 8, 9, 1)?)
//!         .build()?;
//!     let output = convert_pdf_to_images("document.pdf", "out", &config).await?;
//!     for image in &output.images {
//!         println!("page {} → {}", image.page_num, image.path.display());
//!     }
//!     if let Some(zip) = output.archive {
//!         println!("archive: {}", zip.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## PDFium
//!
//! Rendering needs the pdfium shared library at runtime. It is looked up in
//! [`ConversionConfig::pdfium_library_path`] first, then in the working
//! directory, then through the system loader.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ArchiveSpec, CompressionMethod, ConversionConfig, ConversionConfigBuilder, EntryLayout,
    OutputFormat, PageSelection,
};
pub use convert::{convert_pdf_to_images, convert_pdf_to_images_sync, convert_with};
pub use error::Pdf2ImgError;
pub use output::{ConversionOutput, ConversionStats, PageImage};
pub use pipeline::encode::convert_page_to_image;
pub use pipeline::render::{DocumentOpener, PageSource, PdfiumOpener};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
