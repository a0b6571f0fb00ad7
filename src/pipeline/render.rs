//! PDF rasterisation: open a document and render pages to `DynamicImage`.
//!
//! ## One render thread
//!
//! pdfium keeps global state and `pdfium-render` serialises every call
//! through one lock, so rendering pages from several threads buys nothing.
//! The document is therefore opened, rendered and closed on a single
//! blocking thread. Rendered bitmaps leave that thread over a bounded
//! channel to the encode jobs, which is where the parallelism is.
//!
//! ## Seams
//!
//! [`PageSource`] is anything that can count and render pages.
//! [`DocumentOpener`] opens one on the render thread and guarantees it is
//! closed again when the closure returns, whichever way it returns.
//! [`PdfiumOpener`] is the real implementation; tests substitute their own.

use crate::config::ConversionConfig;
use crate::error::Pdf2ImgError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A source of page bitmaps, used only from the render thread.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Rasterise the page at the 0-based `index`.
    fn render_page(&self, index: usize) -> Result<DynamicImage, Pdf2ImgError>;
}

/// Opens a [`PageSource`], lends it to `f`, then closes it.
pub trait DocumentOpener: Send + 'static {
    fn with_document<R, F>(self, f: F) -> Result<R, Pdf2ImgError>
    where
        F: FnOnce(&dyn PageSource) -> Result<R, Pdf2ImgError>;
}

/// One rendered page travelling from the render thread to an encode job.
pub struct RenderedPage {
    /// 0-based page index.
    pub index: usize,
    pub image: DynamicImage,
}

/// Render `indices` in order, handing each bitmap to `tx`.
///
/// Stops early, without error, once the receiving side is closed: that only
/// happens when the consumer has already failed and is shutting down.
pub fn render_into(
    source: &dyn PageSource,
    indices: &[usize],
    tx: &mpsc::Sender<RenderedPage>,
) -> Result<(), Pdf2ImgError> {
    for &index in indices {
        let image = source.render_page(index)?;
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        if tx.blocking_send(RenderedPage { index, image }).is_err() {
            debug!("Encoder stopped; no longer rendering after page {}", index + 1);
            break;
        }
    }
    Ok(())
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// Opens a PDF file with pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumOpener {
    path: PathBuf,
    password: Option<String>,
    library_path: Option<PathBuf>,
    dpi: u32,
    max_rendered_pixels: Option<u32>,
    grayscale: bool,
}

impl PdfiumOpener {
    pub fn new(path: impl Into<PathBuf>, config: &ConversionConfig) -> Self {
        Self {
            path: path.into(),
            password: config.password.clone(),
            library_path: config.pdfium_library_path.clone(),
            dpi: config.dpi,
            max_rendered_pixels: config.max_rendered_pixels,
            grayscale: config.grayscale,
        }
    }

    fn render_config(&self) -> PdfRenderConfig {
        let mut render_config = PdfRenderConfig::new()
            .scale_page_by_factor(self.dpi as f32 / 72.0)
            .use_grayscale_rendering(self.grayscale);
        if let Some(max) = self.max_rendered_pixels {
            render_config = render_config
                .set_maximum_width(max as i32)
                .set_maximum_height(max as i32);
        }
        render_config
    }
}

impl DocumentOpener for PdfiumOpener {
    fn with_document<R, F>(self, f: F) -> Result<R, Pdf2ImgError>
    where
        F: FnOnce(&dyn PageSource) -> Result<R, Pdf2ImgError>,
    {
        let pdfium = bind_pdfium(self.library_path.as_deref())?;

        let document = pdfium
            .load_pdf_from_file(&self.path, self.password.as_deref())
            .map_err(|e| classify_load_error(&self.path, self.password.is_some(), e))?;

        let pages = PdfiumPages {
            document,
            render_config: self.render_config(),
            grayscale: self.grayscale,
        };
        info!("PDF loaded: {} pages", pages.page_count());

        let result = f(&pages);

        drop(pages);
        debug!("Closed {}", self.path.display());
        result
    }
}

struct PdfiumPages<'a> {
    document: PdfDocument<'a>,
    render_config: PdfRenderConfig,
    grayscale: bool,
}

impl PageSource for PdfiumPages<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&self, index: usize) -> Result<DynamicImage, Pdf2ImgError> {
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| Pdf2ImgError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page.render_with_config(&self.render_config).map_err(|e| {
            Pdf2ImgError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        if self.grayscale {
            // pdfium fills a BGRA bitmap even in grayscale mode.
            Ok(DynamicImage::ImageLuma8(image.to_luma8()))
        } else {
            Ok(image)
        }
    }
}

fn classify_load_error(path: &Path, had_password: bool, e: PdfiumError) -> Pdf2ImgError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            Pdf2ImgError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            Pdf2ImgError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        Pdf2ImgError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

/// Platform file name of the pdfium shared library.
fn pdfium_library_name() -> String {
    format!(
        "{}pdfium{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

/// Bind to pdfium.
///
/// An explicit `library_path` may name the library file or the directory
/// holding it. Without one, the working directory is tried before the
/// system loader search path.
pub fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, Pdf2ImgError> {
    let bindings = match library_path {
        Some(path) => {
            let lib = if path.is_dir() {
                path.join(pdfium_library_name())
            } else {
                path.to_path_buf()
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_library(Path::new(".").join(pdfium_library_name()))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Pdf2ImgError::PdfiumBindingFailed(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    struct SolidPages(usize);

    impl PageSource for SolidPages {
        fn page_count(&self) -> usize {
            self.0
        }

        fn render_page(&self, index: usize) -> Result<DynamicImage, Pdf2ImgError> {
            if index >= self.0 {
                return Err(Pdf2ImgError::RasterisationFailed {
                    page: index + 1,
                    detail: "no such page".into(),
                });
            }
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                4 + index as u32,
                4,
                Rgba([255, 255, 255, 255]),
            )))
        }
    }

    #[test]
    fn render_into_sends_pages_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        render_into(&SolidPages(3), &[0, 1, 2], &tx).unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Some(page) = rx.blocking_recv() {
            assert_eq!(page.image.width(), 4 + page.index as u32);
            seen.push(page.index);
        }
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn render_into_stops_when_receiver_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        // Closed receiver is not an error for the renderer.
        render_into(&SolidPages(3), &[0, 1, 2], &tx).unwrap();
    }

    #[test]
    fn render_into_propagates_page_failure() {
        let (tx, _rx) = mpsc::channel(8);
        let err = render_into(&SolidPages(2), &[0, 1, 2], &tx).unwrap_err();
        assert!(matches!(err, Pdf2ImgError::RasterisationFailed { page: 3, .. }));
    }

    #[test]
    fn library_name_has_platform_affixes() {
        let name = pdfium_library_name();
        assert!(name.contains("pdfium"));
        assert!(name.ends_with(std::env::consts::DLL_SUFFIX));
    }

    #[test]
    fn grayscale_and_dpi_reach_render_config() {
        let config = ConversionConfig::builder()
            .dpi(144)
            .grayscale(true)
            .build()
            .unwrap();
        let opener = PdfiumOpener::new("doc.pdf", &config);
        assert_eq!(opener.dpi, 144);
        assert!(opener.grayscale);
        assert_eq!(opener.path, PathBuf::from("doc.pdf"));
    }
}
