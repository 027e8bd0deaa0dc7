// Preview pipeline tests
// Most cases render the first page through a fake backend; real documents
// are rendered through MuPDF.

use super::test_harness::{make_pdf, text_spec, FakeBackend};
use image::{Rgb, RgbImage};
use std::path::Path;
use std::sync::Arc;
use tilemark::document::{ColorMode, LopdfBackend, UnavailableRasterizer};
use tilemark::watermark::{
    build_preview_with, Color, WatermarkError, WatermarkMode, WatermarkParams,
};

fn decode(data: &[u8]) -> RgbImage {
    image::load_from_memory(data)
        .expect("Preview is not a valid image")
        .to_rgb8()
}

#[test]
fn test_preview_is_jpeg_of_first_page_size() {
    let backend = FakeBackend::new(vec![(612.0, 792.0), (300.0, 200.0)], Rgb([255, 255, 255]));
    let spec = text_spec("Confidential");

    let preview = build_preview_with(&backend, &spec, Path::new("doc.pdf")).unwrap();

    assert_eq!(&preview.data[..2], &[0xFF, 0xD8]);
    assert_eq!((preview.width, preview.height), (612, 792));
    let decoded = decode(&preview.data);
    assert_eq!(decoded.dimensions(), (612, 792));

    // Only the first page is rendered, in color
    let log = backend.log.borrow();
    assert_eq!(log.renders, vec![(0, ColorMode::Rgb)]);
    assert!(log.insertions.is_empty());
    assert!(log.saved.is_empty());
}

#[test]
fn test_preview_shows_watermark() {
    let backend = FakeBackend::letter(1);
    let spec = WatermarkParams {
        text: "Confidential".to_string(),
        font_size: 24,
        opacity: 255,
        color: Color::black(),
        ..Default::default()
    }
    .into_spec()
    .unwrap();

    let preview = build_preview_with(&backend, &spec, Path::new("doc.pdf")).unwrap();
    let decoded = decode(&preview.data);

    let dark = decoded.pixels().filter(|p| p[0] < 128).count();
    assert!(dark > 500, "only {} dark pixels", dark);
}

#[test]
fn test_preview_grayscale_desaturates_page() {
    let backend = FakeBackend::new(vec![(200.0, 100.0)], Rgb([255, 0, 0]));

    // Fully transparent text leaves only the page visible
    let params = WatermarkParams {
        text: "Invisible".to_string(),
        opacity: 0,
        ..Default::default()
    };

    let color = build_preview_with(&backend, &params.clone().into_spec().unwrap(), Path::new("doc.pdf")).unwrap();
    for pixel in decode(&color.data).pixels() {
        assert!(pixel[0] > 240 && pixel[1] < 16 && pixel[2] < 16, "{:?}", pixel);
    }

    let gray_spec = WatermarkParams {
        grayscale: true,
        ..params
    }
    .into_spec()
    .unwrap();
    let gray = build_preview_with(&backend, &gray_spec, Path::new("doc.pdf")).unwrap();
    for pixel in decode(&gray.data).pixels() {
        // Luma of pure red is 76
        assert!(pixel.0.iter().all(|&c| (72..=80).contains(&c)), "{:?}", pixel);
    }
}

#[test]
fn test_preview_ignores_configured_spacing() {
    let backend = FakeBackend::letter(1);
    let narrow = WatermarkParams {
        text: "Draft".to_string(),
        horizontal_spacing: 0,
        vertical_spacing: 0,
        ..Default::default()
    };
    let wide = WatermarkParams {
        horizontal_spacing: 400,
        vertical_spacing: 400,
        ..narrow.clone()
    };

    let first = build_preview_with(&backend, &narrow.into_spec().unwrap(), Path::new("doc.pdf")).unwrap();
    let second = build_preview_with(&backend, &wide.into_spec().unwrap(), Path::new("doc.pdf")).unwrap();

    assert_eq!(first.data, second.data);
}

#[test]
fn test_preview_is_deterministic() {
    let backend = FakeBackend::letter(1);
    let spec = text_spec("Internal use only");

    let first = build_preview_with(&backend, &spec, Path::new("doc.pdf")).unwrap();
    let second = build_preview_with(&backend, &spec, Path::new("doc.pdf")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_preview_of_empty_document() {
    let backend = FakeBackend::new(Vec::new(), Rgb([255, 255, 255]));
    let result = build_preview_with(&backend, &text_spec("Draft"), Path::new("empty.pdf"));

    assert!(matches!(
        result,
        Err(WatermarkError::PageOutOfRange { index: 0, count: 0 })
    ));
}

#[test]
fn test_preview_render_failure_propagates() {
    let mut backend = FakeBackend::letter(1);
    backend.fail_render = true;

    let result = build_preview_with(&backend, &text_spec("Draft"), Path::new("doc.pdf"));
    assert!(matches!(result, Err(WatermarkError::Render(_))));
}

#[test]
fn test_preview_missing_image_falls_back_to_text() {
    let dir = tempfile::tempdir().unwrap();
    let spec = WatermarkParams {
        text: "Fallback".to_string(),
        image_path: Some(dir.path().join("missing.png")),
        ..Default::default()
    }
    .into_spec()
    .unwrap();
    assert!(matches!(spec.mode, WatermarkMode::Text(_)));

    let preview = build_preview_with(&FakeBackend::letter(1), &spec, Path::new("doc.pdf")).unwrap();
    assert_eq!((preview.width, preview.height), (612, 792));
}

#[test]
fn test_preview_without_rasterizer() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.pdf");
    make_pdf(&input, 1, (612, 792));

    let backend = LopdfBackend::with_rasterizer(Arc::new(UnavailableRasterizer));
    let result = build_preview_with(&backend, &text_spec("Draft"), &input);

    assert!(matches!(result, Err(WatermarkError::RenderUnavailable)));
}

#[cfg(feature = "mupdf")]
#[test]
fn test_preview_of_real_document() {
    use tilemark::watermark::build_preview;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("letter.pdf");
    make_pdf(&input, 2, (612, 792));

    let preview = build_preview(&text_spec("Draft"), &input).unwrap();

    assert_eq!(&preview.data[..2], &[0xFF, 0xD8]);
    assert_eq!((preview.width, preview.height), (612, 792));
    assert_eq!(decode(&preview.data).dimensions(), (612, 792));
}
