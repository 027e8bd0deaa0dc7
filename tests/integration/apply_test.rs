// Full-document pipeline tests against the in-memory backend

use super::test_harness::{text_spec, FakeBackend};
use image::Rgb;
use std::path::Path;
use tilemark::document::{ColorMode, PageRect};
use tilemark::watermark::{
    apply_watermark_with, build_tile, tile_counts, CanvasDimensions, Spacing, TileDimensions,
    WatermarkError, WatermarkParams,
};

fn expected_tiles(page: (f32, f32), tile: &TileDimensions, spacing: Spacing) -> usize {
    let canvas = CanvasDimensions {
        width: page.0 as u32,
        height: page.1 as u32,
    };
    let (cols, rows) = tile_counts(&canvas, tile, spacing);
    (cols * rows) as usize
}

#[test]
fn test_apply_tiles_every_page() {
    let pages = vec![(612.0, 792.0), (300.0, 200.0), (841.9, 595.3)];
    let backend = FakeBackend::new(pages.clone(), Rgb([255, 255, 255]));
    let spec = text_spec("Confidential");
    let tile = build_tile(&spec.mode).unwrap();
    let tile_dims = TileDimensions {
        width: tile.width(),
        height: tile.height(),
    };

    let summary = apply_watermark_with(&backend, &spec, Path::new("in.pdf"), Path::new("out.pdf")).unwrap();

    let expected: Vec<usize> = pages
        .iter()
        .map(|page| expected_tiles(*page, &tile_dims, spec.spacing))
        .collect();
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.tiles_placed, expected.iter().sum::<usize>());

    let log = backend.log.borrow();
    for (index, count) in expected.iter().enumerate() {
        let on_page = log.insertions.iter().filter(|i| i.page == index).count();
        assert_eq!(on_page, *count, "page {}", index);
    }

    // Every stamp is the same tile
    assert!(log.insertions.iter().all(|i| i.raster == *tile.as_rgba()));
    assert!(log.renders.is_empty());
    assert_eq!(log.saved, vec![Path::new("out.pdf").to_path_buf()]);
}

#[test]
fn test_apply_placement_order_is_column_major() {
    let backend = FakeBackend::letter(1);
    let spec = WatermarkParams {
        text: "Draft".to_string(),
        horizontal_spacing: 25,
        vertical_spacing: 5,
        ..Default::default()
    }
    .into_spec()
    .unwrap();
    let tile = build_tile(&spec.mode).unwrap();
    let (w, h) = (tile.width() as f32, tile.height() as f32);

    apply_watermark_with(&backend, &spec, Path::new("in.pdf"), Path::new("out.pdf")).unwrap();

    let log = backend.log.borrow();
    let rects: Vec<PageRect> = log.insertions.iter().map(|i| i.rect).collect();
    assert_eq!(rects[0], PageRect::new(0.0, 0.0, w, h));
    // y advances first, then x
    assert_eq!(rects[1], PageRect::new(0.0, h + 5.0, w, 2.0 * h + 5.0));

    let rows = rects.iter().filter(|r| r.x0 == 0.0).count();
    assert_eq!(rects[rows].x0, w + 25.0);
    assert_eq!(rects[rows].y0, 0.0);
}

#[test]
fn test_apply_uses_configured_spacing() {
    let spec = |h, v| {
        WatermarkParams {
            text: "Draft".to_string(),
            horizontal_spacing: h,
            vertical_spacing: v,
            ..Default::default()
        }
        .into_spec()
        .unwrap()
    };

    let dense = apply_watermark_with(&FakeBackend::letter(1), &spec(0, 0), Path::new("in.pdf"), Path::new("out.pdf")).unwrap();
    let sparse = apply_watermark_with(&FakeBackend::letter(1), &spec(200, 200), Path::new("in.pdf"), Path::new("out.pdf")).unwrap();

    assert!(dense.tiles_placed > sparse.tiles_placed);
}

#[test]
fn test_apply_grayscale_inserts_gray_page_first() {
    let pages = vec![(612.0, 792.0), (300.0, 200.0)];
    let backend = FakeBackend::new(pages.clone(), Rgb([255, 0, 0]));
    let spec = WatermarkParams {
        text: "Confidential".to_string(),
        grayscale: true,
        ..Default::default()
    }
    .into_spec()
    .unwrap();

    let summary = apply_watermark_with(&backend, &spec, Path::new("in.pdf"), Path::new("out.pdf")).unwrap();

    let log = backend.log.borrow();
    assert_eq!(log.renders, vec![(0, ColorMode::Gray), (1, ColorMode::Gray)]);
    // One full-page raster per page on top of the tiles
    assert_eq!(log.insertions.len(), summary.tiles_placed + pages.len());

    for (index, (width, height)) in pages.iter().enumerate() {
        let first = log
            .insertions
            .iter()
            .find(|i| i.page == index)
            .unwrap();
        assert_eq!(first.rect, PageRect::page(*width, *height));
        assert_eq!(first.raster.dimensions(), (*width as u32, *height as u32));
        assert!(first
            .raster
            .pixels()
            .all(|p| p[0] == 76 && p[1] == 76 && p[2] == 76 && p[3] == 255));
    }
}

#[test]
fn test_apply_render_failure_does_not_save() {
    let mut backend = FakeBackend::letter(2);
    backend.fail_render = true;
    let spec = WatermarkParams {
        text: "Confidential".to_string(),
        grayscale: true,
        ..Default::default()
    }
    .into_spec()
    .unwrap();

    let result = apply_watermark_with(&backend, &spec, Path::new("in.pdf"), Path::new("out.pdf"));

    assert!(matches!(result, Err(WatermarkError::Render(_))));
    assert!(backend.log.borrow().saved.is_empty());
}

#[test]
fn test_apply_empty_document_still_saves() {
    let backend = FakeBackend::new(Vec::new(), Rgb([255, 255, 255]));

    let summary = apply_watermark_with(&backend, &text_spec("Draft"), Path::new("in.pdf"), Path::new("out.pdf")).unwrap();

    assert_eq!(summary.pages, 0);
    assert_eq!(summary.tiles_placed, 0);
    assert_eq!(backend.log.borrow().saved.len(), 1);
}
