//! End-to-end integration tests for edgequake-fileconv.
//!
//! The image tools are pure Rust, so their tests always run. The PDF tools
//! need a PDFium shared library; those tests print SKIP and return when none
//! can be bound. Fixture PDFs are generated with the library itself, one
//! solid-coloured JPEG per page, so page order can be checked by sampling
//! rendered pixels.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture

use edgequake_fileconv::pipeline::document::{fit_image, page_dimensions};
use edgequake_fileconv::pipeline::input;
use edgequake_fileconv::{
    convert_batch, deliver, engine, images_to_pdf, inspect, merge_pdfs, pdf_to_jpg_stream, transform,
    Blob, CompressionMode, ConversionParameters, ConvertError, ItemEvent, Orientation, OutputFormat,
    PageRange, PageSize, PreviewRegistry, RenderedPage, Tool, TransformOutput, Workspace,
};
use futures::StreamExt;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test when no PDFium library can be bound.
macro_rules! pdfium_skip_unless_available {
    () => {{
        init_tracing();
        if !engine::is_available() {
            println!("SKIP — no PDFium library found (set PDFIUM_LIB_PATH to run PDF tests)");
            return;
        }
    }};
}

/// Route library logs to the test harness; `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// A photo-like gradient with enough detail for quality to matter.
fn photo(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
        let noise = ((x * 31 + y * 17) ^ (x * y)) % 64;
        Rgb([
            ((x * 255 / w.max(1)) as u8).wrapping_add(noise as u8),
            ((y * 255 / h.max(1)) as u8).wrapping_sub(noise as u8),
            (((x + y) * 3) % 256) as u8,
        ])
    }))
}

fn jpeg_blob(name: &str, img: &DynamicImage) -> Blob {
    Blob::new(name, "image/jpeg", encode(img, ImageFormat::Jpeg))
}

fn solid_jpeg(name: &str, w: u32, h: u32, colour: [u8; 3]) -> Blob {
    jpeg_blob(name, &DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(colour))))
}

fn page_colour(n: usize) -> [u8; 3] {
    let n = n as u8;
    [n.wrapping_mul(45), 255u8.wrapping_sub(n.wrapping_mul(45)), 90]
}

fn single(output: TransformOutput) -> edgequake_fileconv::ConversionResult {
    match output {
        TransformOutput::Single(r) => r,
        other => panic!("expected a single result, got {other:?}"),
    }
}

/// A PDF of `colours.len()` A4 pages, each filled with one solid colour.
async fn coloured_pdf(name: &str, colours: &[[u8; 3]]) -> Blob {
    let images = colours
        .iter()
        .enumerate()
        .map(|(i, c)| solid_jpeg(&format!("p{i}.jpg"), 60, 80, *c))
        .collect();
    let result = images_to_pdf(images, &ConversionParameters::default())
        .await
        .unwrap();
    Blob::new(name, "application/pdf", result.data)
}

fn centre_colour(page: &RenderedPage) -> [u8; 3] {
    let img = image::load_from_memory(&page.jpeg).unwrap().to_rgb8();
    img.get_pixel(img.width() / 2, img.height() / 2).0
}

fn assert_close(actual: [u8; 3], expected: [u8; 3], context: &str) {
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (*a as i16 - e as i16).abs() <= 16,
            "[{context}] colour {actual:?} is not close to {expected:?}"
        );
    }
}

async fn render_all(blob: Blob) -> Vec<RenderedPage> {
    let out = transform(Tool::PdfToJpg, blob, ConversionParameters::default())
        .await
        .unwrap();
    match out {
        TransformOutput::Pages(pages) => pages,
        other => panic!("expected pages, got {other:?}"),
    }
}

// ── Raster tools ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn jpeg_size_is_monotonic_in_quality() {
    init_tracing();
    let source = Blob::new("photo.png", "image/png", encode(&photo(160, 120), ImageFormat::Png));
    let mut sizes = Vec::new();
    for q in [0.95, 0.8, 0.6, 0.4, 0.2, 0.05] {
        let params = Tool::Compress.default_parameters().to_builder().quality(q).build().unwrap();
        let r = single(transform(Tool::Compress, source.clone(), params).await.unwrap());
        sizes.push(r.size);
    }
    for pair in sizes.windows(2) {
        assert!(pair[1] <= pair[0], "sizes not non-increasing: {sizes:?}");
    }

    // Deterministic for a fixed encoder.
    let params = Tool::Compress.default_parameters();
    let a = single(transform(Tool::Compress, source.clone(), params.clone()).await.unwrap());
    let b = single(transform(Tool::Compress, source, params).await.unwrap());
    assert_eq!(a.data, b.data);
}

#[tokio::test]
async fn png_output_is_pixel_identical_to_decoded_source() {
    let blob = jpeg_blob("scene.jpg", &photo(64, 48));
    let expected = image::load_from_memory(blob.bytes()).unwrap().to_rgb8();

    let r = single(
        transform(Tool::JpgToPng, blob, Tool::JpgToPng.default_parameters())
            .await
            .unwrap(),
    );
    assert_eq!(r.file_name, "scene.png");
    assert_eq!(r.mime, "image/png");

    let decoded = image::load_from_memory_with_format(&r.data, ImageFormat::Png)
        .unwrap()
        .to_rgb8();
    assert_eq!(decoded.dimensions(), expected.dimensions());
    assert_eq!(decoded.as_raw(), expected.as_raw());
}

#[tokio::test]
async fn jpg_to_webp_produces_riff_container() {
    let params = Tool::JpgToPng
        .default_parameters()
        .to_builder()
        .output_format(OutputFormat::WebP)
        .build()
        .unwrap();
    let r = single(
        transform(Tool::JpgToPng, jpeg_blob("a.jpeg", &photo(20, 20)), params)
            .await
            .unwrap(),
    );
    assert_eq!(r.file_name, "a.webp");
    assert_eq!(&r.data[..4], b"RIFF");
    assert_eq!(&r.data[8..12], b"WEBP");
}

#[tokio::test]
async fn webp_size_is_monotonic_in_quality() {
    let source = jpeg_blob("scene.jpg", &photo(160, 120));
    let mut sizes = Vec::new();
    for q in [1.0, 0.8, 0.5, 0.25, 0.1] {
        let params = Tool::JpgToPng
            .default_parameters()
            .to_builder()
            .output_format(OutputFormat::WebP)
            .quality(q)
            .build()
            .unwrap();
        let r = single(transform(Tool::JpgToPng, source.clone(), params).await.unwrap());
        assert_eq!(r.quality, Some(q), "quality {q} not reported");
        sizes.push(r.size);
    }
    for pair in sizes.windows(2) {
        assert!(pair[1] <= pair[0], "sizes not non-increasing: {sizes:?}");
    }
    assert!(sizes[sizes.len() - 1] < sizes[0], "quality had no effect: {sizes:?}");
}

#[tokio::test]
async fn png_to_jpg_flattens_transparency_on_white() {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0])));
    let blob = Blob::new("logo.png", "image/png", encode(&img, ImageFormat::Png));

    let r = single(
        transform(Tool::PngToJpg, blob, Tool::PngToJpg.default_parameters())
            .await
            .unwrap(),
    );
    assert_eq!(r.file_name, "logo.jpg");
    let out = image::load_from_memory(&r.data).unwrap().to_rgb8();
    for p in out.pixels() {
        assert!(p.0.iter().all(|c| *c >= 245), "pixel not white: {:?}", p.0);
    }
}

#[tokio::test]
async fn resize_height_follows_aspect_ratio() {
    let blob = jpeg_blob("wide.jpg", &photo(1000, 750));
    for width in [1, 37, 400, 800, 1600] {
        let params = Tool::Resize.default_parameters().to_builder().target_width(width).build().unwrap();
        let r = single(transform(Tool::Resize, blob.clone(), params).await.unwrap());
        let expected_h = ((width as f64 * 750.0 / 1000.0).round() as u32).max(1);
        assert_eq!(r.dimensions, Some((width, expected_h)), "width {width}");
        assert_eq!(r.file_name, "resized-wide.jpg");
        assert_eq!(r.mime, "image/jpeg");
    }
}

#[tokio::test]
async fn resize_without_aspect_lock_uses_explicit_height() {
    let params = Tool::Resize
        .default_parameters()
        .to_builder()
        .target_width(120)
        .target_height(30)
        .keep_aspect_ratio(false)
        .build()
        .unwrap();
    let blob = Blob::new("icon.png", "image/png", encode(&photo(50, 50), ImageFormat::Png));
    let r = single(transform(Tool::Resize, blob, params).await.unwrap());
    assert_eq!(r.dimensions, Some((120, 30)));
    assert_eq!(r.mime, "image/png");
    let decoded = image::load_from_memory(&r.data).unwrap();
    assert_eq!(decoded.dimensions(), (120, 30));
}

#[tokio::test]
async fn compress_to_max_size_respects_budget() {
    let blob = Blob::new("big.png", "image/png", encode(&photo(300, 200), ImageFormat::Png));
    let loose = single(
        transform(Tool::Compress, blob.clone(), Tool::Compress.default_parameters())
            .await
            .unwrap(),
    );
    let budget = (loose.size as u64) / 2;

    let params = Tool::Compress
        .default_parameters()
        .to_builder()
        .compression(CompressionMode::MaxSize { max_bytes: budget })
        .build()
        .unwrap();
    let r = single(transform(Tool::Compress, blob, params).await.unwrap());
    assert!(r.size as u64 <= budget, "{} > {}", r.size, budget);
    assert_eq!(r.file_name, "compressed-big.jpg");
    assert!(r.compression_ratio().unwrap() > 0.0);
}

#[tokio::test]
async fn batch_writes_every_result() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = vec![
        jpeg_blob("one.jpg", &photo(30, 20)),
        jpeg_blob("two.jpg", &photo(20, 30)),
    ];
    let items = convert_batch(Tool::JpgToPng, inputs, &Tool::JpgToPng.default_parameters(), 2, None).await;
    for item in items {
        let written = deliver(tmp.path(), &item.result.unwrap()).await.unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].exists());
    }
    assert!(tmp.path().join("one.png").exists());
    assert!(tmp.path().join("two.png").exists());
}

#[test]
fn load_file_declares_type_from_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Holiday.JPEG");
    std::fs::write(&path, encode(&photo(4, 4), ImageFormat::Jpeg)).unwrap();

    let blob = tokio_test::block_on(input::load_file(&path)).unwrap();
    assert_eq!(blob.name, "Holiday.JPEG");
    assert_eq!(blob.mime, "image/jpeg");

    let missing = tokio_test::block_on(input::load_file(tmp.path().join("nope.png")));
    assert!(matches!(missing, Err(ConvertError::FileNotFound { .. })));
}

// ── Working set ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn workspace_lifecycle_releases_every_preview() {
    init_tracing();
    let registry = PreviewRegistry::new();
    let mut ws = Workspace::with_registry(Tool::JpgToPng, registry.clone());

    let ids = ws.add_files(vec![
        jpeg_blob("a.jpg", &photo(40, 30)),
        jpeg_blob("b.jpg", &photo(30, 40)),
        Blob::new("c.pdf", "application/pdf", b"%PDF-1.7".to_vec()),
        jpeg_blob("d.jpg", &photo(10, 10)),
    ]);
    assert_eq!(ids.len(), 3);
    assert_eq!(registry.live_count(), 3);
    let first_preview = ws.get(ids[0]).unwrap().preview().uri();

    ws.convert_all(&Tool::JpgToPng.default_parameters()).unwrap();
    assert!(ws.items().all(|i| i.is_converting()));
    assert!(ws.remove(ids[1]));

    let events = ws.wait_all().await;
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| matches!(e, ItemEvent::Completed(_))));
    assert!(ws.items().all(|i| !i.is_converting() && i.output().is_some()));
    // two origins + two results
    assert_eq!(registry.live_count(), 4);

    let tmp = tempfile::tempdir().unwrap();
    for item in ws.items() {
        deliver(tmp.path(), item.output().unwrap()).await.unwrap();
    }
    assert!(tmp.path().join("a.png").exists());
    assert!(!tmp.path().join("b.png").exists());
    assert!(tmp.path().join("d.png").exists());

    assert!(registry.is_live(&first_preview));
    ws.clear();
    assert!(!registry.is_live(&first_preview));
    assert_eq!(registry.live_count(), 0);
}

#[tokio::test]
async fn workspace_apply_ready_is_non_blocking() {
    let mut ws = Workspace::new(Tool::Compress);
    let ids = ws.add_files(vec![jpeg_blob("x.jpg", &photo(16, 16))]);
    assert!(ws.apply_ready().is_empty());

    ws.start_transform(ids[0], &Tool::Compress.default_parameters()).unwrap();
    let mut events = Vec::new();
    while events.is_empty() {
        tokio::task::yield_now().await;
        events = ws.apply_ready();
    }
    assert!(matches!(events[0], ItemEvent::Completed(id) if id == ids[0]));
}

// ── PDF tools (need PDFium) ──────────────────────────────────────────────────

#[tokio::test]
async fn jpg_to_pdf_two_images_fill_usable_width() {
    pdfium_skip_unless_available!();

    let images = vec![
        solid_jpeg("wide.jpg", 400, 200, [200, 30, 30]),
        solid_jpeg("tall.jpg", 100, 400, [30, 30, 200]),
    ];
    let params = ConversionParameters::builder()
        .page_size(PageSize::A4)
        .orientation(Orientation::Portrait)
        .margin_mm(0.0)
        .build()
        .unwrap();
    let result = images_to_pdf(images, &params).await.unwrap();
    assert_eq!(result.file_name, "converted.pdf");
    assert_eq!(result.page_count, Some(2));

    let (pw, ph) = page_dimensions(PageSize::A4, Orientation::Portrait);
    let wide = fit_image(pw, ph, 0.0, 400, 200);
    assert_eq!(wide.width, pw);
    assert_eq!(wide.x, 0.0);

    let pages = render_all(Blob::new("converted.pdf", "application/pdf", result.data)).await;
    assert_eq!(pages.len(), 2);

    // The wide image spans the full page width at mid-height.
    let img = image::load_from_memory(&pages[0].jpeg).unwrap().to_rgb8();
    let mid = img.height() / 2;
    assert_close(img.get_pixel(3, mid).0, [200, 30, 30], "left edge");
    assert_close(img.get_pixel(img.width() - 4, mid).0, [200, 30, 30], "right edge");
    // ...and leaves white above it.
    assert_close(img.get_pixel(img.width() / 2, 5).0, [255, 255, 255], "top band");
}

#[tokio::test]
async fn split_2_4_of_five_pages_keeps_pages_in_order() {
    pdfium_skip_unless_available!();

    let colours: Vec<[u8; 3]> = (1..=5).map(page_colour).collect();
    let source = coloured_pdf("report.pdf", &colours).await;

    let params = ConversionParameters::builder()
        .page_range(PageRange::parse("2-4").unwrap())
        .build()
        .unwrap();
    let r = single(transform(Tool::SplitPdf, source.clone(), params).await.unwrap());
    assert_eq!(r.file_name, "split-2-4-report.pdf");
    assert_eq!(r.page_count, Some(3));

    let pages = render_all(Blob::new(&r.file_name, "application/pdf", r.data)).await;
    assert_eq!(pages.len(), 3);
    for (i, page) in pages.iter().enumerate() {
        assert_close(centre_colour(page), page_colour(i + 2), &format!("page {}", i + 1));
    }

    // End past the last page is clamped.
    let params = ConversionParameters::builder()
        .page_range(PageRange::parse("4-99").unwrap())
        .build()
        .unwrap();
    let r = single(transform(Tool::SplitPdf, source.clone(), params).await.unwrap());
    assert_eq!(r.page_count, Some(2));

    // Start past the last page fails validation.
    let params = ConversionParameters::builder()
        .page_range(PageRange::parse("7-9").unwrap())
        .build()
        .unwrap();
    let err = transform(Tool::SplitPdf, source, params).await.unwrap_err();
    assert!(matches!(err, ConvertError::InvalidRange { total: 5, .. }));
    assert!(err.is_validation());
}

#[tokio::test]
async fn merge_concatenates_pages_in_input_order() {
    pdfium_skip_unless_available!();

    let first: Vec<[u8; 3]> = (1..=2).map(page_colour).collect();
    let second: Vec<[u8; 3]> = (3..=5).map(page_colour).collect();
    let a = coloured_pdf("a.pdf", &first).await;
    let b = coloured_pdf("b.pdf", &second).await;

    let merged = merge_pdfs(vec![a.clone(), b], &ConversionParameters::default())
        .await
        .unwrap();
    assert_eq!(merged.file_name, "merged-document.pdf");
    assert_eq!(merged.page_count, Some(5));

    let pages = render_all(Blob::new("merged.pdf", "application/pdf", merged.data)).await;
    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.page_num, i + 1);
        assert_close(centre_colour(page), page_colour(i + 1), &format!("page {}", i + 1));
    }

    let err = merge_pdfs(vec![a], &ConversionParameters::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::NotEnoughInputs { required: 2, got: 1 }));
}

#[tokio::test]
async fn merge_rejects_corrupt_input_without_output() {
    pdfium_skip_unless_available!();

    let good = coloured_pdf("good.pdf", &[page_colour(1)]).await;
    let bad = Blob::new("bad.pdf", "application/pdf", b"%PDF-1.4\ngarbage".to_vec());
    let err = merge_pdfs(vec![good, bad], &ConversionParameters::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::CorruptPdf { .. }), "got {err:?}");
}

#[tokio::test]
async fn pdf_to_jpg_renders_every_page_at_double_scale() {
    pdfium_skip_unless_available!();

    let source = coloured_pdf("slides.pdf", &[page_colour(1), page_colour(2)]).await;
    let pages = render_all(source.clone()).await;
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].file_name(), "page-1.jpg");
    // A4 is 595 × 842 pt; at 2× that is roughly 1190 × 1684 px.
    assert!((1185..=1195).contains(&pages[0].width), "width {}", pages[0].width);
    assert!((1679..=1689).contains(&pages[0].height), "height {}", pages[0].height);

    let (total, mut stream) = pdf_to_jpg_stream(source, None).await.unwrap();
    assert_eq!(total, 2);
    let mut seen = Vec::new();
    while let Some(page) = stream.next().await {
        seen.push(page.unwrap().page_num);
    }
    assert_eq!(seen, [1, 2]);
}

#[tokio::test]
async fn inspect_reports_page_count() {
    pdfium_skip_unless_available!();

    let source = coloured_pdf("doc.pdf", &[page_colour(1), page_colour(2), page_colour(3)]).await;
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("doc.pdf");
    std::fs::write(&path, source.bytes()).unwrap();

    let info = inspect(&path, None).await.unwrap();
    assert_eq!(info.page_count, 3);
}

#[tokio::test]
async fn not_a_pdf_is_rejected_before_pdfium() {
    let blob = Blob::new("fake.pdf", "application/pdf", b"GIF89a....".to_vec());
    let err = transform(Tool::PdfToJpg, blob, ConversionParameters::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::NotAPdf { .. }), "got {err:?}");
}
