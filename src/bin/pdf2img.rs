//! CLI binary for edgequake-pdf2img.
//!
//! A thin shim over the library crate. Run without arguments it asks for
//! everything interactively; with a PDF path it takes its settings from
//! flags. Either way the answers are collected into a `ConversionConfig`
//! before any conversion work starts.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2img::{
    convert_pdf_to_images, ArchiveSpec, ConversionConfig, ConversionProgressCallback,
    PageSelection, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Interactive prompts ──────────────────────────────────────────────────────

const PROMPT_PDF: &str = "Введите путь к PDF файлу: ";
const PROMPT_OUTPUT: &str = "Введите путь для сохранения изображений или zip-файла: ";
const PROMPT_SAVE_ZIP: &str = "Хотите сохранить изображения в zip-файл? (y/n): ";
const PROMPT_FORMAT: &str = "Выберите формат изображения (например, PNG, JPEG): ";
const PROMPT_ZIP_NAME: &str = "Введите название ZIP архива (без расширения): ";
const PROMPT_ZIP_METHOD: &str = "Выберите метод сжатия (0 - без сжатия, 8 - сжатие Deflate): ";
const PROMPT_ZIP_LEVEL: &str =
    "Выберите уровень сжатия (от 0 до 9, где 0 - без сжатия, 9 - максимальное сжатие): ";
const PROMPT_ZIP_LAYOUT: &str =
    "Выберите метод хранения файлов в архиве (0 - вложенные папки, 1 - без вложенных папок): ";

/// Answers gathered from the prompts.
#[derive(Debug, PartialEq)]
struct Answers {
    pdf_path: PathBuf,
    output_folder: PathBuf,
    format: String,
    archive: Option<ArchiveSpec>,
}

struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .context("Failed to read answer")?;
        if n == 0 {
            anyhow::bail!("Input closed before answering: {}", prompt.trim_end());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn ask_number<T>(&mut self, prompt: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let answer = self.ask(prompt)?;
        let answer = answer.trim();
        answer
            .parse()
            .with_context(|| format!("Invalid number '{answer}'"))
    }

    /// Ask the four conversion questions, then the archive questions if
    /// archiving was chosen.
    fn session(&mut self) -> Result<Answers> {
        let pdf_path = PathBuf::from(self.ask(PROMPT_PDF)?);
        let output_folder = PathBuf::from(self.ask(PROMPT_OUTPUT)?);
        let save_to_zip = self.ask(PROMPT_SAVE_ZIP)?.to_lowercase() == "y";
        let format = self.ask(PROMPT_FORMAT)?.to_uppercase();

        let archive = if save_to_zip {
            let name = self.ask(PROMPT_ZIP_NAME)?;
            let method: u16 = self.ask_number(PROMPT_ZIP_METHOD)?;
            let level: u8 = self.ask_number(PROMPT_ZIP_LEVEL)?;
            let layout: u8 = self.ask_number(PROMPT_ZIP_LAYOUT)?;
            Some(
                ArchiveSpec::from_codes(name, method, level, layout)
                    .context("Invalid archive settings")?,
            )
        } else {
            None
        };

        Ok(Answers {
            pdf_path,
            output_folder,
            format,
            archive,
        })
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Two bars: one for page images, one for archive entries. Both stay hidden
/// until their stage starts.
struct CliProgressCallback {
    pages: ProgressBar,
    entries: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            pages: ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden()),
            entries: ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden()),
        })
    }

    fn activate(bar: &ProgressBar, prefix: &'static str, total: usize) {
        let style = ProgressStyle::with_template(
            "{prefix:.bold:<12} [{bar:42.green/238}] {pos:>3}/{len}  {msg:.dim}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        bar.set_style(style);
        bar.set_prefix(prefix);
        bar.set_length(total as u64);
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        Self::activate(&self.pages, "Processing", total_pages);
    }

    fn on_page_complete(&self, page_num: usize, _total_pages: usize, _path: &Path) {
        self.pages.set_message(format!("page {page_num}"));
        self.pages.inc(1);
    }

    fn on_conversion_complete(&self, _total_pages: usize) {
        self.pages.finish_with_message("done");
    }

    fn on_archive_start(&self, total_entries: usize) {
        Self::activate(&self.entries, "Creating ZIP", total_entries);
    }

    fn on_archive_entry(&self, entry_name: &str, _done: usize, _total: usize) {
        self.entries.set_message(entry_name.to_string());
        self.entries.inc(1);
    }

    fn on_archive_complete(&self, _archive_path: &Path) {
        self.entries.finish_with_message("done");
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Interactive: answer the questions one by one
  pdf2img

  # All pages as PNG into ./document_pages/
  pdf2img document.pdf

  # JPEG at 150 DPI into out/, then bundle into out/bundle.zip
  pdf2img document.pdf -o out -f jpeg --dpi 150 --zip bundle

  # Stored (uncompressed) archive with paths relative to the output folder
  pdf2img document.pdf -o out --zip raw --compression 0 --layout 0

  # Pages 3 to 7 only, in grayscale, on 4 workers
  pdf2img --pages 3-7 --grayscale -c 4 document.pdf

ARCHIVE CODES:
  --compression   0 = store (no compression), 8 = deflate
  --level         0–9 (deflate level; 0 writes stored entries)
  --layout        0 = paths relative to the output folder, 1 = bare file names

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (file or directory)
  RUST_LOG          Override log filtering (e.g. RUST_LOG=edgequake_pdf2img=debug)
"#;

/// Convert every page of a PDF into an image file, optionally bundled as ZIP.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Convert every page of a PDF into an image file, optionally bundled as ZIP",
    long_about = "Rasterise every page of a PDF with pdfium and write page_<n>.<ext> files. \
Run without arguments to be asked for the PDF path, output folder, archive choice and image \
format interactively.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to convert. Omit to answer interactive prompts instead.
    input: Option<PathBuf>,

    /// Output folder (default: <pdf stem>_pages).
    #[arg(short, long, env = "PDF2IMG_OUTPUT")]
    output: Option<PathBuf>,

    /// Image format: PNG, JPEG, JPG, BMP, GIF, TIFF, WEBP.
    #[arg(short, long, env = "PDF2IMG_FORMAT", default_value = "PNG")]
    format: String,

    /// Also write all images into <output>/<NAME>.zip.
    #[arg(long, env = "PDF2IMG_ZIP", value_name = "NAME")]
    zip: Option<String>,

    /// ZIP compression method: 0 = store, 8 = deflate.
    #[arg(long, env = "PDF2IMG_COMPRESSION", default_value_t = 8)]
    compression: u16,

    /// ZIP compression level (0–9).
    #[arg(long, env = "PDF2IMG_LEVEL", default_value_t = 6,
          value_parser = clap::value_parser!(u8).range(0..=9))]
    level: u8,

    /// ZIP entry layout: 0 = relative to the output folder, 1 = bare file names.
    #[arg(long, env = "PDF2IMG_LAYOUT", default_value_t = 1,
          value_parser = clap::value_parser!(u8).range(0..=1))]
    layout: u8,

    /// Number of pages encoded in parallel (default: number of CPUs).
    #[arg(short, long, env = "PDF2IMG_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "PDF2IMG_DPI", default_value_t = 72,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Cap rendered width and height at this many pixels.
    #[arg(long, env = "PDF2IMG_MAX_PIXELS")]
    max_pixels: Option<u32>,

    /// Render pages in grayscale.
    #[arg(long, env = "PDF2IMG_GRAYSCALE")]
    grayscale: bool,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2IMG_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2IMG_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium, or the directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the conversion result as JSON.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// Disable progress bars.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library logs stay at ERROR while a progress bar is drawn.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Gather settings ──────────────────────────────────────────────────
    let answers = match cli.input.clone() {
        Some(pdf_path) => answers_from_flags(&cli, pdf_path)?,
        None => {
            let stdin = io::stdin();
            let mut prompter = Prompter {
                input: stdin.lock(),
                output: io::stdout(),
            };
            prompter.session()?
        }
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, &answers, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert_pdf_to_images(&answers.pdf_path, &answers.output_folder, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        eprintln!(
            "{}  {}/{} pages  {}ms  {}",
            green("✔"),
            bold(&output.stats.converted_pages.to_string()),
            output.stats.total_pages,
            output.stats.total_duration_ms,
            dim(&format!("({})", config.format)),
        );
    }

    match output.archive {
        Some(ref zip_path) => println!("Изображения сохранены в zip-файл: {}", zip_path.display()),
        None => println!(
            "Изображения сохранены в папку: {}",
            answers.output_folder.display()
        ),
    }

    Ok(())
}

/// Settings for a non-interactive run.
fn answers_from_flags(cli: &Cli, pdf_path: PathBuf) -> Result<Answers> {
    let output_folder = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_folder(&pdf_path));

    let archive = match cli.zip {
        Some(ref name) => Some(
            ArchiveSpec::from_codes(name.as_str(), cli.compression, cli.level, cli.layout)
                .context("Invalid archive settings")?,
        ),
        None => None,
    };

    Ok(Answers {
        pdf_path,
        output_folder,
        format: cli.format.to_uppercase(),
        archive,
    })
}

/// `document.pdf` → `document_pages`.
fn default_output_folder(pdf_path: &Path) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".to_string());
    PathBuf::from(format!("{stem}_pages"))
}

/// Map answers and CLI flags to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    answers: &Answers,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .format(answers.format.as_str())
        .dpi(cli.dpi)
        .grayscale(cli.grayscale)
        .pages(parse_pages(&cli.pages)?);

    if let Some(ref spec) = answers.archive {
        builder = builder.archive(spec.clone());
    }
    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if let Some(px) = cli.max_pixels {
        builder = builder.max_rendered_pixels(px);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.as_str());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    let page = |p: &str| -> Result<usize> {
        let n: usize = p
            .trim()
            .parse()
            .with_context(|| format!("Invalid page number: '{}'", p.trim()))?;
        if n < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", n);
        }
        Ok(n)
    };

    if let Some((start, end)) = s.split_once('-') {
        let (start, end) = (page(start)?, page(end)?);
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    if s.contains(',') {
        let pages = s.split(',').map(page).collect::<Result<Vec<_>>>()?;
        return Ok(PageSelection::Set(pages));
    }

    Ok(PageSelection::Single(page(&s)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgequake_pdf2img::{CompressionMethod, EntryLayout};
    use std::io::Cursor;

    fn run_session(input: &str) -> (Result<Answers>, String) {
        let mut out = Vec::new();
        let result = Prompter {
            input: Cursor::new(input.as_bytes().to_vec()),
            output: &mut out,
        }
        .session();
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn session_without_archive_asks_four_questions() {
        let (answers, transcript) = run_session("doc.pdf\nout\nn\npng\n");
        let answers = answers.unwrap();

        assert_eq!(answers.pdf_path, PathBuf::from("doc.pdf"));
        assert_eq!(answers.output_folder, PathBuf::from("out"));
        assert_eq!(answers.format, "PNG");
        assert!(answers.archive.is_none());
        assert_eq!(
            transcript,
            format!("{PROMPT_PDF}{PROMPT_OUTPUT}{PROMPT_SAVE_ZIP}{PROMPT_FORMAT}")
        );
    }

    #[test]
    fn session_with_archive_asks_eight_questions() {
        let (answers, transcript) = run_session("doc.pdf\nout\nY\njpeg\nbundle\n8\n9\n1\n");
        let answers = answers.unwrap();

        assert_eq!(answers.format, "JPEG");
        let spec = answers.archive.unwrap();
        assert_eq!(spec.name, "bundle");
        assert_eq!(spec.method, CompressionMethod::Deflated);
        assert_eq!(spec.level, 9);
        assert_eq!(spec.layout, EntryLayout::Flat);
        assert!(transcript.ends_with(PROMPT_ZIP_LAYOUT));
    }

    #[test]
    fn path_answers_keep_surrounding_spaces() {
        let (answers, _) = run_session(" my doc.pdf \r\nout dir \nn\npng\n");
        let answers = answers.unwrap();
        assert_eq!(answers.pdf_path, PathBuf::from(" my doc.pdf "));
        assert_eq!(answers.output_folder, PathBuf::from("out dir "));
    }

    #[test]
    fn numeric_answers_tolerate_spaces() {
        let (answers, _) = run_session("doc.pdf\nout\ny\npng\nbundle\n 8 \n9\n 0\n");
        let spec = answers.unwrap().archive.unwrap();
        assert_eq!(spec.method, CompressionMethod::Deflated);
        assert_eq!(spec.layout, EntryLayout::Nested);
    }

    #[test]
    fn only_y_means_yes() {
        let (answers, _) = run_session("doc.pdf\nout\nyes\npng\n");
        assert!(answers.unwrap().archive.is_none());
    }

    #[test]
    fn non_numeric_level_is_fatal() {
        let (answers, _) = run_session("doc.pdf\nout\ny\npng\nbundle\n8\nhigh\n1\n");
        let err = answers.unwrap_err();
        assert!(format!("{err:#}").contains("Invalid number 'high'"));
    }

    #[test]
    fn unknown_method_code_is_fatal() {
        let (answers, _) = run_session("doc.pdf\nout\ny\npng\nbundle\n5\n9\n1\n");
        assert!(answers.is_err());
    }

    #[test]
    fn closed_input_is_fatal() {
        let (answers, _) = run_session("doc.pdf\n");
        assert!(answers.is_err());
    }

    #[test]
    fn parse_pages_forms() {
        assert_eq!(parse_pages("all").unwrap(), PageSelection::All);
        assert_eq!(parse_pages("5").unwrap(), PageSelection::Single(5));
        assert_eq!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15));
        assert_eq!(parse_pages("1,3,5").unwrap(), PageSelection::Set(vec![1, 3, 5]));
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("9-2").is_err());
        assert!(parse_pages("x").is_err());
    }

    #[test]
    fn default_output_folder_uses_stem() {
        assert_eq!(
            default_output_folder(Path::new("/tmp/report.pdf")),
            PathBuf::from("report_pages")
        );
    }

    #[test]
    fn flags_build_archive_spec() {
        let cli = Cli::parse_from([
            "pdf2img", "doc.pdf", "-o", "out", "--zip", "bundle", "--level", "9",
        ]);
        let answers = answers_from_flags(&cli, PathBuf::from("doc.pdf")).unwrap();
        let spec = answers.archive.unwrap();
        assert_eq!(spec.method, CompressionMethod::Deflated);
        assert_eq!(spec.level, 9);
        assert_eq!(spec.layout, EntryLayout::Flat);
        assert_eq!(answers.output_folder, PathBuf::from("out"));
    }
}
