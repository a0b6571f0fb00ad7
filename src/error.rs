//! Error types for the edgequake-pdf2img library.
//!
//! Every failure is fatal. A conversion either produces an image for each
//! selected page or stops at the first problem and returns it, leaving
//! whatever was already written on disk. There is deliberately no per-page
//! error type: one bad page aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-pdf2img library.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The requested image format is unknown or was not compiled in.
    #[error("Unsupported image format '{format}'\nSupported: PNG, JPEG, JPG, BMP, GIF, TIFF, WEBP.")]
    UnsupportedFormat { format: String },

    /// Encoding or writing a page image failed.
    #[error("Failed to write page {page} to '{path}': {source}")]
    EncodeFailed {
        page: usize,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The output folder could not be created.
    #[error("Failed to create output folder '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ZIP writer rejected an entry or could not finish the archive.
    #[error("Failed to write archive '{path}': {source}")]
    ArchiveFailed {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Reading an image or creating the archive file failed.
    #[error("I/O error on '{path}' while archiving: {source}")]
    ArchiveIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Archive name, compression method, level or layout code is invalid.
    #[error("Invalid archive settings: {0}")]
    InvalidArchiveSpec(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium must be available as a shared library. You can:\n\
  • Place libpdfium next to the executable or in the working directory.\n\
  • Install it system-wide so the dynamic loader can find it.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = Pdf2ImgError::UnsupportedFormat {
            format: "XCF".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'XCF'"), "got: {msg}");
    }

    #[test]
    fn rasterisation_failed_display() {
        let e = Pdf2ImgError::RasterisationFailed {
            page: 7,
            detail: "bitmap allocation failed".into(),
        };
        assert!(e.to_string().contains("page 7"));
        assert!(e.to_string().contains("bitmap allocation failed"));
    }

    #[test]
    fn output_dir_failed_keeps_source() {
        use std::error::Error as _;
        let e = Pdf2ImgError::OutputDirFailed {
            path: PathBuf::from("/root/out"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(e.to_string().contains("/root/out"));
        assert!(e.source().is_some());
    }

    #[test]
    fn invalid_archive_spec_display() {
        let e = Pdf2ImgError::InvalidArchiveSpec("compression method must be 0 or 8, got 3".into());
        assert!(e.to_string().contains("got 3"));
    }
}
