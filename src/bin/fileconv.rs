//! CLI binary for edgequake-fileconv.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionParameters`, runs one tool over the given files and writes the
//! results into an output directory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edgequake_fileconv::{
    convert_batch, deliver, images_to_pdf, inspect, merge_pdfs, pdf_to_jpg_with_progress, pipeline::input,
    Blob, CompressionMode, ConversionParameters, ConversionProgressCallback, ConversionResult, ConvertError,
    NoopProgressCallback, Orientation, OutputFormat, PageRange, PageSize, ProgressCallback, Tool, TransformOutput,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// file. Files may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    unit: &'static str,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new(unit: &'static str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            unit,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let style = ProgressStyle::with_template(&format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {}  ⏱ {{elapsed_precise}}",
            self.unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        if self.bar.length() != Some(total as u64) {
            self.bar.set_length(total as u64);
            self.bar.set_style(style);
            self.bar.set_prefix("Converting");
            self.bar.reset_eta();
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_items: usize) {
        self.activate_bar(total_items);
    }

    fn on_item_start(&self, _index: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_item_complete(&self, _index: usize, name: &str, output_bytes: usize) {
        self.bar.println(format!(
            "  {} {:<32}  {}",
            green("✓"),
            name,
            dim(&human_bytes(output_bytes as u64)),
        ));
        self.bar.inc(1);
    }

    fn on_item_error(&self, _index: usize, name: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!("  {} {:<32}  {}", red("✗"), name, red(&msg)));
        self.bar.inc(1);
    }

    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.set_position(page_num as u64);
    }

    fn on_batch_complete(&self, total_items: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_items.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_items { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_items,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # JPEG → PNG (or WebP) next to the current directory
  fileconv jpg-to-png holiday.jpg beach.jpeg

  fileconv jpg-to-png --format webp --quality 0.6 *.jpg -o out/

  # PNG → JPEG on a white background
  fileconv png-to-jpg --quality 0.9 logo.png

  # Compress by quality, or to a size budget
  fileconv compress --quality 0.5 photo.jpg
  fileconv compress --max-size 200k photo.png

  # Resize to 1024 px wide, keeping the aspect ratio
  fileconv resize --width 1024 photo.jpg

  # Images → one PDF, Letter landscape with 10 mm margins
  fileconv jpg-to-pdf --page-size letter --orientation landscape --margin 10 a.jpg b.jpg

  # Merge, split, rasterise
  fileconv merge part1.pdf part2.pdf
  fileconv split --range 2-4 report.pdf
  fileconv pdf-to-jpg slides.pdf -o slides/

  # PDF metadata as JSON
  fileconv inspect --json report.pdf

OUTPUT NAMES:
  jpg-to-png   photo.jpg  → photo.png / photo.webp
  png-to-jpg   logo.png   → logo.jpg
  compress     photo.png  → compressed-photo.jpg
  resize       photo.jpg  → resized-photo.jpg
  jpg-to-pdf   *.jpg      → converted.pdf
  merge        *.pdf      → merged-document.pdf
  split        report.pdf → split-2-4-report.pdf
  pdf-to-jpg   slides.pdf → page-1.jpg, page-2.jpg, …

ENVIRONMENT VARIABLES:
  FILECONV_OUT_DIR       Default output directory
  FILECONV_CONCURRENCY   Files converted in parallel
  FILECONV_PASSWORD      Password for encrypted PDFs
  PDFIUM_LIB_PATH        Path to libpdfium (PDF tools only)
  RUST_LOG               Override log filtering (e.g. edgequake_fileconv=debug)
"#;

/// Convert, compress and resize images; merge, split and rasterise PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "fileconv",
    version,
    about = "Convert, compress and resize images; merge, split and rasterise PDFs",
    long_about = "Local file conversion tools. Images are handled in pure Rust; the PDF tools \
drive a PDFium shared library. Nothing leaves the machine.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory the results are written to.
    #[arg(short, long, env = "FILECONV_OUT_DIR", default_value = ".", global = true)]
    out_dir: PathBuf,

    /// Number of files converted in parallel.
    #[arg(short, long, env = "FILECONV_CONCURRENCY", default_value_t = 4, global = true)]
    concurrency: usize,

    /// User password for encrypted PDF inputs.
    #[arg(long, env = "FILECONV_PASSWORD", global = true)]
    password: Option<String>,

    /// Print a JSON report on stdout.
    #[arg(long, env = "FILECONV_JSON", global = true)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "FILECONV_NO_PROGRESS", global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FILECONV_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FILECONV_QUIET", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert JPEG images to PNG or WebP.
    JpgToPng {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Target format.
        #[arg(long, value_enum, default_value = "png")]
        format: FormatArg,
        /// WebP quality (0.01–1); PNG output is lossless and ignores it.
        #[arg(long, env = "FILECONV_QUALITY", default_value_t = 0.8)]
        quality: f32,
    },
    /// Convert PNG images to JPEG on a white background.
    PngToJpg {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// JPEG quality (0.01–1).
        #[arg(long, env = "FILECONV_QUALITY", default_value_t = 0.85)]
        quality: f32,
    },
    /// Re-encode images as smaller JPEGs.
    Compress {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// JPEG quality (0.01–1).
        #[arg(long, env = "FILECONV_QUALITY", default_value_t = 0.53)]
        quality: f32,
        /// Largest acceptable output, e.g. 150000, 200k or 2M. Overrides --quality.
        #[arg(long, value_parser = parse_size)]
        max_size: Option<u64>,
    },
    /// Resize images to a new pixel width.
    Resize {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Target width in pixels.
        #[arg(short, long, default_value_t = 800)]
        width: u32,
        /// Target height in pixels; only used with --no-keep-aspect.
        #[arg(long)]
        height: Option<u32>,
        /// Do not preserve the aspect ratio.
        #[arg(long)]
        no_keep_aspect: bool,
        /// Quality for JPEG sources (0.01–1).
        #[arg(long, env = "FILECONV_QUALITY", default_value_t = 0.92)]
        quality: f32,
    },
    /// Place JPEG images, one per page, into a single PDF.
    JpgToPdf {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, value_enum, default_value = "a4")]
        page_size: PageSizeArg,
        #[arg(long, value_enum, default_value = "portrait")]
        orientation: OrientationArg,
        /// Margin on every side, in millimetres (0–50).
        #[arg(long, default_value_t = 0.0)]
        margin: f32,
    },
    /// Merge PDFs, in the order given, into one document.
    Merge {
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,
    },
    /// Extract a page range from a PDF.
    Split {
        input: PathBuf,
        /// Pages to keep, e.g. 3 or 2-4 (1-indexed, inclusive).
        #[arg(short, long, default_value = "1-1")]
        range: String,
    },
    /// Render every page of a PDF to a JPEG.
    PdfToJpg {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print PDF metadata without converting anything.
    Inspect { input: PathBuf },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Webp,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Webp => OutputFormat::WebP,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

/// One line of the `--json` report.
#[derive(Serialize, Debug)]
struct FileReport {
    input: String,
    outputs: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ConversionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; -v brings them back.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let started = Instant::now();

    let reports = match &cli.command {
        Command::Inspect { input } => {
            let info = inspect(input, cli.password.clone())
                .await
                .with_context(|| format!("Failed to inspect {}", input.display()))?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&info).context("Failed to serialize metadata")?
                );
            } else {
                println!("File:         {}", input.display());
                if let Some(ref t) = info.title {
                    println!("Title:        {}", t);
                }
                if let Some(ref a) = info.author {
                    println!("Author:       {}", a);
                }
                println!("Pages:        {}", info.page_count);
                println!("PDF Version:  {}", info.pdf_version);
                if let Some(ref p) = info.producer {
                    println!("Producer:     {}", p);
                }
            }
            return Ok(());
        }
        Command::JpgToPdf { inputs, .. } | Command::Merge { inputs } => {
            let tool = tool_for(&cli.command);
            let params = build_params(&cli)?;
            vec![run_whole_set(&cli, tool, inputs, &params).await?]
        }
        Command::PdfToJpg { inputs } => run_pdf_to_jpg(&cli, inputs, show_progress).await?,
        Command::Split { input, .. } => {
            let params = build_params(&cli)?;
            run_per_item(&cli, Tool::SplitPdf, std::slice::from_ref(input), &params, show_progress).await?
        }
        Command::JpgToPng { inputs, .. }
        | Command::PngToJpg { inputs, .. }
        | Command::Compress { inputs, .. }
        | Command::Resize { inputs, .. } => {
            let tool = tool_for(&cli.command);
            let params = build_params(&cli)?;
            run_per_item(&cli, tool, inputs, &params, show_progress).await?
        }
    };

    let failed = reports.iter().filter(|r| r.error.is_some()).count();

    if cli.json {
        let json = serde_json::to_string_pretty(&reports).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        for report in &reports {
            if report.error.is_some() {
                continue;
            }
            for path in &report.outputs {
                eprintln!("   {} {}", dim("→"), bold(&path.display().to_string()));
            }
            if let (Some(r), Some(ratio)) = (&report.result, report.compression_ratio) {
                eprintln!(
                    "     {} → {}  ({:+.1}%)",
                    dim(&human_bytes(r.origin_size as u64)),
                    human_bytes(r.size as u64),
                    -ratio * 100.0
                );
            }
        }
        eprintln!("{}", dim(&format!("done in {}ms", started.elapsed().as_millis())));
    }

    if failed > 0 {
        for report in reports.iter().filter(|r| r.error.is_some()) {
            eprintln!(
                "{} {}: {}",
                red("✘"),
                report.input,
                report.error.as_deref().unwrap_or_default()
            );
        }
        anyhow::bail!("{} of {} files failed", failed, reports.len());
    }

    Ok(())
}

fn tool_for(command: &Command) -> Tool {
    match command {
        Command::JpgToPng { .. } => Tool::JpgToPng,
        Command::PngToJpg { .. } => Tool::PngToJpg,
        Command::Compress { .. } => Tool::Compress,
        Command::Resize { .. } => Tool::Resize,
        Command::JpgToPdf { .. } => Tool::JpgToPdf,
        Command::Merge { .. } => Tool::MergePdf,
        Command::Split { .. } => Tool::SplitPdf,
        Command::PdfToJpg { .. } | Command::Inspect { .. } => Tool::PdfToJpg,
    }
}

/// Map CLI args to `ConversionParameters`, starting from the tool defaults.
fn build_params(cli: &Cli) -> Result<ConversionParameters> {
    let mut builder = tool_for(&cli.command).default_parameters().to_builder();

    builder = match &cli.command {
        Command::JpgToPng { format, quality, .. } => builder.output_format((*format).into()).quality(*quality),
        Command::PngToJpg { quality, .. } => builder.quality(*quality),
        Command::Compress {
            quality, max_size, ..
        } => {
            let builder = builder.quality(*quality);
            match max_size {
                Some(max_bytes) => builder.compression(CompressionMode::MaxSize {
                    max_bytes: *max_bytes,
                }),
                None => builder,
            }
        }
        Command::Resize {
            width,
            height,
            no_keep_aspect,
            quality,
            ..
        } => {
            let mut builder = builder
                .target_width(*width)
                .keep_aspect_ratio(!no_keep_aspect)
                .quality(*quality);
            if let Some(h) = height {
                builder = builder.target_height(*h);
            }
            builder
        }
        Command::JpgToPdf {
            page_size,
            orientation,
            margin,
            ..
        } => builder
            .page_size((*page_size).into())
            .orientation((*orientation).into())
            .margin_mm(*margin),
        Command::Split { range, .. } => {
            builder.page_range(PageRange::parse(range).context("Invalid --range")?)
        }
        Command::Merge { .. } | Command::PdfToJpg { .. } | Command::Inspect { .. } => builder,
    };

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }

    builder.build().context("Invalid configuration")
}

async fn load_all(paths: &[PathBuf]) -> Result<Vec<Blob>> {
    let mut blobs = Vec::with_capacity(paths.len());
    for path in paths {
        blobs.push(
            input::load_file(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
        );
    }
    Ok(blobs)
}

fn warn_skipped(tool: Tool, paths: &[PathBuf], accepted: usize, quiet: bool) {
    let skipped = paths.len().saturating_sub(accepted);
    if skipped > 0 && !quiet {
        eprintln!(
            "{} skipped {} file(s) that {} does not accept",
            cyan("⚠"),
            skipped,
            tool
        );
    }
}

async fn run_per_item(
    cli: &Cli,
    tool: Tool,
    paths: &[PathBuf],
    params: &ConversionParameters,
    show_progress: bool,
) -> Result<Vec<FileReport>> {
    let blobs = load_all(paths).await?;
    let accepted = blobs.iter().filter(|b| tool.accepts(&b.mime)).count();
    warn_skipped(tool, paths, accepted, cli.quiet);

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new("files") as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let items = convert_batch(tool, blobs, params, cli.concurrency, progress).await;

    let mut reports = Vec::with_capacity(items.len());
    for item in items {
        reports.push(match item.result {
            Ok(output) => report_output(&cli.out_dir, item.name, output).await?,
            Err(e) => failed_report(item.name, &e),
        });
    }
    Ok(reports)
}

async fn run_whole_set(
    cli: &Cli,
    tool: Tool,
    paths: &[PathBuf],
    params: &ConversionParameters,
) -> Result<FileReport> {
    let blobs = load_all(paths).await?;
    let accepted = blobs.iter().filter(|b| tool.accepts(&b.mime)).count();
    warn_skipped(tool, paths, accepted, cli.quiet);

    let result = match tool {
        Tool::MergePdf => merge_pdfs(blobs, params).await,
        _ => images_to_pdf(blobs, params).await,
    }
    .with_context(|| format!("{} failed", tool))?;

    let label = paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    report_output(&cli.out_dir, label, TransformOutput::Single(result)).await
}

/// PDF→JPG, one document at a time, with a per-page bar.
async fn run_pdf_to_jpg(cli: &Cli, paths: &[PathBuf], show_progress: bool) -> Result<Vec<FileReport>> {
    let blobs = input::accept(Tool::PdfToJpg, load_all(paths).await?);
    warn_skipped(Tool::PdfToJpg, paths, blobs.len(), cli.quiet);

    let dirs = if paths.len() > 1 {
        // Pages of several documents would overwrite each other.
        let names: Vec<&str> = blobs.iter().map(|b| b.name.as_str()).collect();
        document_dirs(&cli.out_dir, &names)
    } else {
        vec![cli.out_dir.clone(); blobs.len()]
    };

    let mut reports = Vec::with_capacity(blobs.len());
    for (blob, dir) in blobs.into_iter().zip(dirs) {
        let name = blob.name.clone();

        let cb = show_progress.then(|| CliProgressCallback::new("pages"));
        let progress: ProgressCallback = match &cb {
            Some(cb) => Arc::clone(cb) as ProgressCallback,
            None => Arc::new(NoopProgressCallback),
        };
        let rendered = pdf_to_jpg_with_progress(blob, cli.password.clone(), &progress).await;
        if let Some(cb) = cb {
            cb.bar.finish_and_clear();
        }

        reports.push(match rendered {
            Ok(pages) => report_output(&dir, name, TransformOutput::Pages(pages)).await?,
            Err(e) => failed_report(name, &e),
        });
    }
    Ok(reports)
}

/// One output directory per document, named after its file stem. Repeated
/// stems get a `-2`, `-3`, ... suffix.
fn document_dirs(out_dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    let mut used = HashSet::new();
    names
        .iter()
        .map(|name| {
            let stem = Path::new(name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "document".to_string());
            let mut candidate = stem.clone();
            let mut n = 1;
            while !used.insert(candidate.clone()) {
                n += 1;
                candidate = format!("{stem}-{n}");
            }
            out_dir.join(candidate)
        })
        .collect()
}

async fn report_output(dir: &Path, input: String, output: TransformOutput) -> Result<FileReport> {
    let outputs = deliver(dir, &output)
        .await
        .with_context(|| format!("Failed to write results for {}", input))?;

    Ok(match output {
        TransformOutput::Single(result) => FileReport {
            input,
            outputs,
            compression_ratio: result.compression_ratio(),
            pages: result.page_count,
            result: Some(result),
            error: None,
        },
        TransformOutput::Pages(pages) => FileReport {
            input,
            outputs,
            result: None,
            pages: Some(pages.len()),
            compression_ratio: None,
            error: None,
        },
    })
}

fn failed_report(input: String, error: &ConvertError) -> FileReport {
    FileReport {
        input,
        outputs: Vec::new(),
        result: None,
        pages: None,
        compression_ratio: None,
        error: Some(error.to_string()),
    }
}

/// Parse `150000`, `200k`, `1.5M` into a byte count.
fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let (number, multiplier) = match s.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('k') => (&s[..s.len() - 1], 1024.0),
        Some('m') => (&s[..s.len() - 1], 1024.0 * 1024.0),
        _ => (s, 1.0),
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid size '{s}' (expected e.g. 150000, 200k, 2M)"))?;
    if !(value > 0.0) {
        return Err(format!("size must be positive, got '{s}'"));
    }
    Ok((value * multiplier).round() as u64)
}

fn human_bytes(n: u64) -> String {
    match n {
        n if n >= 1024 * 1024 => format!("{:.1} MB", n as f64 / (1024.0 * 1024.0)),
        n if n >= 1024 => format!("{:.1} KB", n as f64 / 1024.0),
        n => format!("{n} B"),
    }
}
