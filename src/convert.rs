//! Conversion entry points.
//!
//! One run is a fork-join: the render thread produces bitmaps in page order,
//! a bounded set of blocking encode jobs writes them to disk in whatever
//! order they finish, and the call returns only after every job has been
//! joined. Archiving, when requested, starts after that join.
//!
//! Any failure stops the run. Rendering stops, jobs already running are
//! drained, and the first error is returned. Images written before the
//! failure stay on disk.

use crate::config::{ConversionConfig, PageSelection};
use crate::error::Pdf2ImgError;
use crate::output::{ConversionOutput, ConversionStats, PageImage};
use crate::pipeline::render::{self, DocumentOpener, PdfiumOpener, RenderedPage};
use crate::pipeline::{archive, encode, input};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Convert every selected page of a PDF file into an image file.
///
/// Writes `<output_folder>/page_<n>.<ext>` for each page and, when
/// `config.archive` is set, `<output_folder>/<name>.zip` holding them all.
/// The output folder and its parents are created if missing.
///
/// # Errors
/// Returns the first fatal error:
/// - File not found / permission denied / not a PDF
/// - pdfium could not be loaded, or the document could not be opened
/// - A page failed to render, encode or write
/// - The archive could not be written
pub async fn convert_pdf_to_images(
    pdf_path: impl AsRef<Path>,
    output_folder: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let pdf_path = input::resolve_local(pdf_path.as_ref())?;
    info!("Starting conversion: {}", pdf_path.display());

    let opener = PdfiumOpener::new(pdf_path, config);
    convert_with(opener, output_folder, config).await
}

/// Synchronous wrapper around [`convert_pdf_to_images`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_pdf_to_images_sync(
    pdf_path: impl AsRef<Path>,
    output_folder: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2ImgError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_pdf_to_images(pdf_path, output_folder, config))
}

/// Run the conversion pipeline over any [`DocumentOpener`].
///
/// [`convert_pdf_to_images`] calls this with a pdfium opener; other
/// backends (or in-memory test documents) plug in here.
pub async fn convert_with<O: DocumentOpener>(
    opener: O,
    output_folder: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let total_start = Instant::now();
    let output_folder = output_folder.as_ref().to_path_buf();
    let concurrency = config.concurrency.max(1);

    // ── Step 1: Open the document on the render thread ───────────────────
    let (plan_tx, plan_rx) = oneshot::channel::<(usize, Vec<usize>)>();
    let (page_tx, mut page_rx) = mpsc::channel::<RenderedPage>(concurrency);
    let selection = config.pages.clone();

    let render_task = tokio::task::spawn_blocking(move || {
        opener.with_document(move |source| {
            let total = source.page_count();
            let indices = selection.to_indices(total);
            if plan_tx.send((total, indices.clone())).is_err() {
                return Ok(());
            }
            render::render_into(source, &indices, &page_tx)
        })
    });

    let (total_pages, indices) = match plan_rx.await {
        Ok(plan) => plan,
        Err(_) => {
            // No plan means the document never opened; the task holds the reason.
            join_render(render_task).await?;
            return Err(Pdf2ImgError::Internal(
                "Document closed before reporting its page count".into(),
            ));
        }
    };
    info!("PDF has {} pages, converting {}", total_pages, indices.len());

    if indices.is_empty() && config.pages != PageSelection::All {
        drop(page_rx);
        join_render(render_task).await?;
        return Err(Pdf2ImgError::PageOutOfRange {
            page: first_requested_page(&config.pages),
            total: total_pages,
        });
    }

    // ── Step 2: Ensure the output folder exists ──────────────────────────
    if let Err(source) = tokio::fs::create_dir_all(&output_folder).await {
        drop(page_rx);
        if let Err(e) = join_render(render_task).await {
            debug!("Render thread failed while aborting: {}", e);
        }
        return Err(Pdf2ImgError::OutputDirFailed {
            path: output_folder,
            source,
        });
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(indices.len());
    }

    // ── Step 3: Encode pages on a bounded set of blocking jobs ───────────
    let images_start = Instant::now();
    let mut jobs: JoinSet<Result<PageImage, Pdf2ImgError>> = JoinSet::new();
    let mut images: Vec<PageImage> = Vec::with_capacity(indices.len());
    let mut failure: Option<Pdf2ImgError> = None;
    let mut rendering_done = false;

    loop {
        tokio::select! {
            page = page_rx.recv(), if !rendering_done && failure.is_none() && jobs.len() < concurrency => {
                match page {
                    Some(RenderedPage { index, image }) => {
                        let folder = output_folder.clone();
                        let format = config.format.clone();
                        jobs.spawn_blocking(move || {
                            encode::convert_page_to_image(image, index, &folder, &format)
                        });
                    }
                    None => rendering_done = true,
                }
            }
            Some(joined) = jobs.join_next(), if !jobs.is_empty() => {
                let result = joined
                    .map_err(|e| Pdf2ImgError::Internal(format!("Encode task panicked: {}", e)))
                    .and_then(|r| r);
                match result {
                    Ok(page) => {
                        if let Some(ref cb) = config.progress_callback {
                            cb.on_page_complete(page.page_num, indices.len(), &page.path);
                        }
                        images.push(page);
                    }
                    Err(e) if failure.is_none() => {
                        warn!("Aborting conversion: {}", e);
                        page_rx.close();
                        failure = Some(e);
                    }
                    Err(e) => debug!("Further failure while draining: {}", e),
                }
            }
            else => break,
        }
    }

    // ── Step 4: Close the document ───────────────────────────────────────
    drop(page_rx);
    let render_result = join_render(render_task).await;
    if let Some(e) = failure {
        return Err(e);
    }
    render_result?;

    if images.len() != indices.len() {
        return Err(Pdf2ImgError::Internal(format!(
            "Expected {} page images, wrote {}",
            indices.len(),
            images.len()
        )));
    }

    // Completion order is arbitrary; report in page order.
    images.sort_by_key(|i| i.page_num);
    let images_duration_ms = images_start.elapsed().as_millis() as u64;
    info!(
        "Wrote {} images to {} in {}ms",
        images.len(),
        output_folder.display(),
        images_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(indices.len());
    }

    // ── Step 5: Optional archive ─────────────────────────────────────────
    let mut archive_path = None;
    let mut archive_duration_ms = 0;
    if let Some(spec) = config.archive.clone() {
        let archive_start = Instant::now();
        let paths: Vec<PathBuf> = images.iter().map(|i| i.path.clone()).collect();
        let folder = output_folder.clone();
        let progress = config.progress_callback.clone();

        let path = tokio::task::spawn_blocking(move || {
            archive::write_archive(&paths, &folder, &spec, progress.as_ref())
        })
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Archive task panicked: {}", e)))??;

        archive_duration_ms = archive_start.elapsed().as_millis() as u64;
        info!("Archive written: {} in {}ms", path.display(), archive_duration_ms);
        archive_path = Some(path);
    }

    let stats = ConversionStats {
        total_pages,
        converted_pages: images.len(),
        archive_entries: if archive_path.is_some() { images.len() } else { 0 },
        images_duration_ms,
        archive_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages, {}ms total",
        stats.converted_pages, total_pages, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        images,
        archive: archive_path,
        stats,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn join_render(task: JoinHandle<Result<(), Pdf2ImgError>>) -> Result<(), Pdf2ImgError> {
    task.await
        .map_err(|e| Pdf2ImgError::Internal(format!("Render task panicked: {}", e)))?
}

/// The page number to name when a selection matches nothing.
fn first_requested_page(selection: &PageSelection) -> usize {
    match selection {
        PageSelection::All => 0,
        PageSelection::Single(p) => *p,
        PageSelection::Range(start, _) => *start,
        PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
    }
}
