//! Integration tests for the extract -> match -> export pipeline
//!
//! These tests exercise the public API end to end:
//! - Image decoding and validation
//! - Palette extraction guarantees (length, order, weights, determinism)
//! - Pencil matching against custom and bundled catalogs
//! - Export formats and batch behavior
//! - Session records and history storage

use std::collections::BTreeSet;
use std::io::Cursor;

use pencil_palette::{
    analyze, decode_image, extract, match_palette, render, render_tag, Algorithm, Color,
    ExportFormat, ExportMetadata, JsonLinesStore, MatchOptions, PaletteError, PencilCatalog,
    PencilColor, PipelineConfig, QuantizerConfig, SessionStore, SourceImage,
};

fn scarlet_catalog() -> PencilCatalog {
    PencilCatalog::new(vec![
        PencilColor::new("Prismacolor", "Premier", "PC922", "Scarlet Red", Color::new(237, 28, 36)),
        PencilColor::new("Prismacolor", "Premier", "PC903", "True Blue", Color::new(0, 115, 207)),
        PencilColor::new("Prismacolor", "Premier", "PC938", "White", Color::new(255, 255, 255)),
    ])
    .unwrap()
}

/// Deterministic 32x32 scene: sky gradient, green band, red block
fn scene() -> SourceImage {
    let mut data = Vec::with_capacity(32 * 32 * 3);
    for y in 0..32u32 {
        for x in 0..32u32 {
            let px = if y < 12 {
                [40 + (y * 4) as u8, 110 + (y * 3) as u8, 220]
            } else if y < 22 {
                [30, 140 + (x % 5) as u8, 50]
            } else if x < 10 {
                [220, 30, 35]
            } else {
                [235, 225, 200]
            };
            data.extend_from_slice(&px);
        }
    }
    SourceImage::from_raw(32, 32, 3, data).unwrap()
}

// ============================================================================
// Image Input
// ============================================================================

#[test]
fn test_decode_png_bytes() {
    let mut bytes = Vec::new();
    image::RgbImage::from_pixel(3, 2, image::Rgb([255, 0, 0]))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();

    let img = decode_image(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (3, 2));
    assert_eq!(img.pixel(2, 1), Some(Color::new(255, 0, 0)));
}

#[test]
fn test_garbage_bytes_rejected() {
    let result = decode_image(b"definitely not an image");
    assert!(matches!(result, Err(PaletteError::ImageLoadError { .. })));
}

#[test]
fn test_zero_area_and_bad_channels_rejected() {
    assert!(matches!(
        SourceImage::from_raw(0, 10, 3, Vec::new()),
        Err(PaletteError::InvalidImage { .. })
    ));
    assert!(matches!(
        SourceImage::from_raw(1, 1, 2, vec![0, 0]),
        Err(PaletteError::InvalidImage { .. })
    ));
}

// ============================================================================
// Extraction
// ============================================================================

#[test]
fn test_solid_red_scenario() {
    let img = SourceImage::solid(16, 16, Color::new(255, 0, 0)).unwrap();
    let palette = extract(&img, 3, &QuantizerConfig::default()).unwrap();

    assert_eq!(palette.len(), 1);
    assert_eq!(palette[0].weight, 1.0);

    let matches = match_palette(&palette, &scarlet_catalog(), &MatchOptions::default()).unwrap();
    assert_eq!(matches[0].pencil.name, "Scarlet Red");
    assert!(matches[0].distance > 0.0);
    assert!(matches[0].distance < 25.0);
}

#[test]
fn test_extraction_guarantees_for_every_algorithm() {
    let img = scene();
    for algorithm in [Algorithm::KMeans, Algorithm::MedianCut, Algorithm::HistogramBinning] {
        let config = QuantizerConfig {
            algorithm,
            ..QuantizerConfig::default()
        };
        let palette = extract(&img, 6, &config).unwrap();

        assert!(!palette.is_empty() && palette.len() <= 6, "{:?}", algorithm);
        let sum: f32 = palette.iter().map(|e| e.weight).sum();
        assert!((sum - 1.0).abs() < 1e-4, "{:?} weights sum to {}", algorithm, sum);
        assert!(palette.windows(2).all(|w| w[0].weight >= w[1].weight));

        // Byte-identical on repeat
        assert_eq!(palette, extract(&img, 6, &config).unwrap(), "{:?}", algorithm);
    }
}

#[test]
fn test_stride_bounds_work_but_keeps_dominant_color() {
    let config = QuantizerConfig {
        sample_stride: 4,
        ..QuantizerConfig::default()
    };
    let palette = extract(&scene(), 4, &config).unwrap();
    assert!(palette.len() <= 4);
    assert!(palette[0].weight > 0.2);
}

#[test]
fn test_large_image_sample_is_capped() {
    let (width, height) = (1200u32, 900u32);
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x * 7 + y) as u8, (y * 13) as u8, (x ^ y) as u8]);
        }
    }
    let image = SourceImage::from_raw(width, height, 3, data).unwrap();

    let analysis = analyze(&image, &PipelineConfig::default(), &scarlet_catalog()).unwrap();
    // 300 x 225 samples fit the default cap of 90,000; stride 3 would not
    assert_eq!(analysis.sample_stride, 4);
    assert_eq!(analysis.entries.len(), 8);
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_every_color_gets_a_match() {
    let config = PipelineConfig {
        palette_size: 5,
        ..PipelineConfig::default()
    };
    let analysis = analyze(&scene(), &config, &scarlet_catalog()).unwrap();
    assert_eq!(analysis.matches.len(), analysis.entries.len());
    for (m, e) in analysis.matches.iter().zip(&analysis.entries) {
        assert_eq!(&m.entry, e);
    }
}

#[test]
fn test_bundled_catalog_is_total() {
    let catalog = PencilCatalog::builtin().unwrap();
    for color in [
        Color::new(0, 0, 0),
        Color::new(255, 255, 255),
        Color::new(12, 200, 99),
        Color::new(255, 0, 255),
    ] {
        let (pencil, distance) = catalog.nearest_to(color);
        assert!(distance >= 0.0, "{}", pencil);
    }
}

#[test]
fn test_unknown_brand_filter() {
    let config = PipelineConfig {
        matching: MatchOptions {
            brand_filter: Some(BTreeSet::from(["Crayola".to_string()])),
            max_distance: None,
        },
        ..PipelineConfig::default()
    };
    let result = analyze(&scene(), &config, PencilCatalog::builtin().unwrap());
    assert!(matches!(result, Err(PaletteError::UnknownBrand { .. })));
}

#[test]
fn test_empty_catalog_is_fatal() {
    let err = PencilCatalog::from_json_str("[]").unwrap_err();
    assert!(matches!(err, PaletteError::EmptyCatalog { .. }));
    assert!(!err.is_recoverable());
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_empty_csv_is_header_only() {
    let doc = render(&[], ExportFormat::Csv, &ExportMetadata::default()).unwrap();
    assert_eq!(doc.as_text(), Some("hex,r,g,b,pencil_brand,pencil_name,distance\n"));
}

#[test]
fn test_bmp_is_unsupported() {
    let result = render_tag(&[], "bmp", &ExportMetadata::default());
    assert!(matches!(result, Err(PaletteError::UnsupportedFormat { .. })));
}

#[test]
fn test_json_export_round_trip() {
    let analysis = analyze(&scene(), &PipelineConfig::default(), &scarlet_catalog()).unwrap();
    let doc = render(&analysis.matches, ExportFormat::Json, &ExportMetadata::default()).unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(doc.as_text().unwrap()).unwrap();

    assert_eq!(parsed.len(), analysis.matches.len());
    for (value, m) in parsed.iter().zip(&analysis.matches) {
        assert_eq!(value["hex"], m.entry.color.hex());
        let rgb: Vec<u8> = serde_json::from_value(value["rgb"].clone()).unwrap();
        assert_eq!(rgb, m.entry.color.to_array());
        let distance = value["distance"].as_f64().unwrap() as f32;
        assert!((distance - m.distance).abs() < 1e-3);
    }
}

#[test]
fn test_every_format_renders_identically_twice() {
    let analysis = analyze(&scene(), &PipelineConfig::default(), &scarlet_catalog()).unwrap();
    let metadata = ExportMetadata::default();
    for format in ExportFormat::ALL {
        let a = render(&analysis.matches, format, &metadata).unwrap();
        let b = render(&analysis.matches, format, &metadata).unwrap();
        assert_eq!(a.content, b.content, "{}", format);
        assert!(!a.is_empty());
    }
}

// ============================================================================
// Session History
// ============================================================================

#[test]
fn test_analysis_persisted_to_history() {
    let dir = std::env::temp_dir().join(format!("pencil_palette_it_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let mut store = JsonLinesStore::open(dir.join("history.jsonl")).unwrap();

    let image = scene();
    let analysis = analyze(&image, &PipelineConfig::default(), &scarlet_catalog()).unwrap();
    let exports = analysis
        .export(&["css", "bmp"], &ExportMetadata::default())
        .into_iter()
        .filter_map(|(_, doc)| doc.ok())
        .collect();
    let record = analysis.into_record("visitor-1", Some("scene.png"), exports);
    store.save(&record).unwrap();

    let recent = store.recent("visitor-1", 5).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0], record);
    assert_eq!(recent[0].exports().len(), 1);
    assert_eq!(store.statistics().unwrap().total_analyses, 1);

    std::fs::remove_dir_all(&dir).unwrap();
}
