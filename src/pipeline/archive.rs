//! ZIP bundling of the written page images.
//!
//! Runs once, on a single blocking thread, after every page image exists.
//! Entries are added in page order and streamed from disk, so peak memory
//! is one copy buffer regardless of document size.

use crate::config::{ArchiveSpec, CompressionMethod, EntryLayout};
use crate::error::Pdf2ImgError;
use crate::progress::ProgressCallback;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Archive entry name for an image file written under `output_folder`.
///
/// `Flat` keeps only the file name. `Nested` keeps the path below
/// `output_folder` (the whole path if the image lies outside it), with
/// root, drive prefix, `.` and `..` components dropped, joined with `/`.
pub fn entry_name(image: &Path, output_folder: &Path, layout: EntryLayout) -> String {
    match layout {
        EntryLayout::Flat => image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        EntryLayout::Nested => image
            .strip_prefix(output_folder)
            .unwrap_or(image)
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"),
    }
}

/// ZIP entry options for an archive spec.
///
/// zip's deflate backend accepts levels 1–9; level 0 means "no compression"
/// and is written as stored entries.
pub fn entry_options(spec: &ArchiveSpec) -> SimpleFileOptions {
    let options = SimpleFileOptions::default();
    match (spec.method, spec.level) {
        (CompressionMethod::Stored, _) | (CompressionMethod::Deflated, 0) => {
            options.compression_method(zip::CompressionMethod::Stored)
        }
        (CompressionMethod::Deflated, level) => options
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level))),
    }
}

/// Write `images` into `<output_folder>/<spec.name>.zip`, returning the
/// archive path.
pub fn write_archive(
    images: &[PathBuf],
    output_folder: &Path,
    spec: &ArchiveSpec,
    progress: Option<&ProgressCallback>,
) -> Result<PathBuf, Pdf2ImgError> {
    let archive_path = output_folder.join(spec.file_name());
    info!(
        "Writing {} images to {} ({:?}, level {}, {:?})",
        images.len(),
        archive_path.display(),
        spec.method,
        spec.level,
        spec.layout
    );

    let file = File::create(&archive_path).map_err(|source| Pdf2ImgError::ArchiveIo {
        path: archive_path.clone(),
        source,
    })?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = entry_options(spec);
    let zip_err = |source| Pdf2ImgError::ArchiveFailed {
        path: archive_path.clone(),
        source,
    };

    if let Some(cb) = progress {
        cb.on_archive_start(images.len());
    }

    for (done, image) in images.iter().enumerate() {
        let name = entry_name(image, output_folder, spec.layout);
        zip.start_file(name.clone(), options).map_err(zip_err)?;

        let mut source = File::open(image).map_err(|source| Pdf2ImgError::ArchiveIo {
            path: image.clone(),
            source,
        })?;
        std::io::copy(&mut source, &mut zip).map_err(|source| Pdf2ImgError::ArchiveIo {
            path: image.clone(),
            source,
        })?;

        debug!("Archived {} as '{}'", image.display(), name);
        if let Some(cb) = progress {
            cb.on_archive_entry(&name, done + 1, images.len());
        }
    }

    zip.finish().map_err(zip_err)?;

    if let Some(cb) = progress {
        cb.on_archive_complete(&archive_path);
    }
    Ok(archive_path)
}
