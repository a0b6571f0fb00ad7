//! Image encoding: `DynamicImage` → `page_<n>.<ext>` on disk.
//!
//! pdfium hands back 8-bit BGRA bitmaps (converted to RGBA by
//! `pdfium-render`), or single-channel bitmaps in grayscale mode. Before
//! encoding, single-channel images are widened to RGB, and images with an
//! alpha channel are flattened to RGB for encoders that cannot store alpha.

use crate::config::OutputFormat;
use crate::error::Pdf2ImgError;
use crate::output::PageImage;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File path for the page at the 0-based `page_index`.
pub fn page_image_path(output_folder: &Path, page_index: usize, format: &OutputFormat) -> PathBuf {
    output_folder.join(format!("page_{}.{}", page_index + 1, format.extension()))
}

/// Bring a rendered bitmap into a layout the target encoder accepts.
pub fn normalise_channels(image: DynamicImage, format: ImageFormat) -> DynamicImage {
    let image = if image.color().channel_count() <= 2 {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };

    if image.color().has_alpha() && !supports_alpha(format) {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    }
}

fn supports_alpha(format: ImageFormat) -> bool {
    !matches!(format, ImageFormat::Jpeg)
}

/// Encode one rendered page and write it to `output_folder`.
///
/// The file name comes from `page_index`, so the result does not depend on
/// which job finishes first.
pub fn convert_page_to_image(
    image: DynamicImage,
    page_index: usize,
    output_folder: &Path,
    format: &OutputFormat,
) -> Result<PageImage, Pdf2ImgError> {
    let path = page_image_path(output_folder, page_index, format);
    let image = normalise_channels(image, format.image_format());

    image
        .save_with_format(&path, format.image_format())
        .map_err(|source| Pdf2ImgError::EncodeFailed {
            page: page_index + 1,
            path: path.clone(),
            source,
        })?;

    debug!(
        "Wrote page {} → {} ({}x{})",
        page_index + 1,
        path.display(),
        image.width(),
        image.height()
    );

    Ok(PageImage {
        page_num: page_index + 1,
        path,
        width: image.width(),
        height: image.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GrayImage, Luma, Rgba, RgbaImage};

    fn rgba(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 255])))
    }

    #[test]
    fn path_uses_one_based_index_and_lowercase_extension() {
        let f = OutputFormat::parse("PNG").unwrap();
        assert_eq!(
            page_image_path(Path::new("out"), 0, &f),
            PathBuf::from("out/page_1.png")
        );
        let f = OutputFormat::parse("JPEG").unwrap();
        assert_eq!(
            page_image_path(Path::new("out"), 41, &f),
            PathBuf::from("out/page_42.jpeg")
        );
    }

    #[test]
    fn single_channel_becomes_rgb() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([90])));
        let out = normalise_channels(gray, ImageFormat::Png);
        assert_eq!(out.color(), ColorType::Rgb8);
    }

    #[test]
    fn alpha_is_kept_for_png_and_dropped_for_jpeg() {
        assert_eq!(normalise_channels(rgba(2, 2), ImageFormat::Png).color(), ColorType::Rgba8);
        assert_eq!(normalise_channels(rgba(2, 2), ImageFormat::Jpeg).color(), ColorType::Rgb8);
    }

    #[test]
    fn grayscale_page_writes_valid_png() {
        let dir = tempfile::tempdir().unwrap();
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(12, 8, Luma([128])));
        let format = OutputFormat::parse("png").unwrap();

        let written = convert_page_to_image(gray, 2, dir.path(), &format).unwrap();
        assert_eq!(written.page_num, 3);
        assert_eq!(written.path, dir.path().join("page_3.png"));

        let decoded = image::open(&written.path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn rgba_page_writes_valid_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let format = OutputFormat::parse("JPEG").unwrap();

        let written = convert_page_to_image(rgba(16, 16), 0, dir.path(), &format).unwrap();
        assert_eq!(written.path, dir.path().join("page_1.jpeg"));
        let decoded = image::open(&written.path).unwrap();
        assert_eq!(decoded.width(), 16);
    }

    #[test]
    fn missing_folder_is_encode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let format = OutputFormat::png();

        let err = convert_page_to_image(rgba(2, 2), 0, &missing, &format).unwrap_err();
        assert!(matches!(err, Pdf2ImgError::EncodeFailed { page: 1, .. }));
    }
}
