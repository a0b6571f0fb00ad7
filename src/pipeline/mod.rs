//! Pipeline stages for PDF-to-image conversion.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the rendering backend can be swapped behind a trait.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ archive
//! (path)    (pdfium)   (image)    (zip, optional)
//! ```
//!
//! 1. [`input`]   — validate the user-supplied path before pdfium opens it
//! 2. [`render`]  — rasterise pages on one blocking thread; the document is
//!    open only for the duration of that thread's work
//! 3. [`encode`]  — normalise channels, encode and write `page_<n>.<ext>`;
//!    many of these run at once
//! 4. [`archive`] — bundle the written images into one ZIP file

pub mod archive;
pub mod encode;
pub mod input;
pub mod render;
