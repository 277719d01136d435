//! Integration tests: stage synthetic scans end to end through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use mristage_pipeline::{
    BoundingBox, Location, Malignancy, Stage, StagingConfig, StagingError, StagingVerdict, analyze,
    analyze_bytes, analyze_staged, render,
};

/// Black background with filled white squares given as `(x, y, side)`.
fn scan(width: u32, height: u32, squares: &[(u32, u32, u32)]) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let inside = squares
            .iter()
            .any(|&(x0, y0, s)| (x0..x0 + s).contains(&x) && (y0..y0 + s).contains(&y));
        Luma([if inside { 255 } else { 0 }])
    })
}

fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn assert_invariants(verdict: &StagingVerdict) {
    let allowed = [0.95, 0.85, 0.80, 0.75, 0.70];
    assert!(
        allowed
            .iter()
            .any(|c| (c - verdict.confidence()).abs() < f64::EPSILON),
        "unexpected confidence {}",
        verdict.confidence()
    );
    assert_eq!(verdict.stage() == Stage::NoTumor, verdict.tumor_count() == 0);
    assert_eq!(verdict.malignancy(), verdict.stage().malignancy());
    match verdict.tumor_count() {
        0 => assert_eq!(verdict.location(), None),
        1 => assert_eq!(verdict.location(), Some(Location::Single)),
        _ => assert_eq!(verdict.location(), Some(Location::Multiple)),
    }
    assert!(verdict.largest_size().ends_with(" pixels"));
}

#[test]
fn blank_scans_detect_nothing() {
    for (w, h) in [(1, 1), (2, 7), (16, 16), (100, 100), (257, 31)] {
        let verdict = analyze(
            &DynamicImage::ImageLuma8(GrayImage::new(w, h)),
            &StagingConfig::default(),
        )
        .unwrap();
        assert_eq!(verdict, StagingVerdict::no_tumor(), "{w}x{h}");
        assert!((verdict.confidence() - 0.95).abs() < f64::EPSILON);
        assert_eq!(verdict.malignancy(), Malignancy::Absent);
        assert_eq!(verdict.largest_size(), "0 pixels");
    }
}

#[test]
fn single_mid_sized_region_is_stage_two() {
    let img = DynamicImage::ImageLuma8(scan(200, 200, &[(80, 80, 40)]));
    let staged = analyze_staged(&img, &StagingConfig::default()).unwrap();
    let verdict = &staged.verdict;

    assert_eq!(verdict.tumor_count(), 1);
    assert_eq!(verdict.stage(), Stage::II);
    assert_eq!(verdict.malignancy(), Malignancy::Moderate);
    assert_eq!(verdict.location(), Some(Location::Single));
    assert!((verdict.confidence() - 0.80).abs() < f64::EPSILON);

    // The edge ring runs along the last background column/row on the
    // low side and the last foreground column/row on the high side, so
    // it spans 41 pixels and encloses at most 40 x 40.
    assert_eq!(
        staged.contours[0].bounding_box(),
        Some(BoundingBox {
            x: 79,
            y: 79,
            width: 41,
            height: 41
        })
    );
    assert!(
        (1580.0..=1600.0).contains(&verdict.largest_area()),
        "area {}",
        verdict.largest_area()
    );
    assert_invariants(verdict);
}

#[test]
fn edge_rings_are_one_pixel_wide() {
    let staged = analyze_staged(
        &DynamicImage::ImageLuma8(scan(200, 200, &[(80, 80, 40)])),
        &StagingConfig::default(),
    )
    .unwrap();
    // Away from the corners each side of the square is a single line.
    for y in 90..110 {
        let cols: Vec<u32> = (0..200)
            .filter(|&x| staged.edges.get_pixel(x, y).0[0] > 0)
            .collect();
        assert_eq!(cols, vec![79, 119], "row {y}");
    }
    for x in 90..110 {
        let rows: Vec<u32> = (0..200)
            .filter(|&y| staged.edges.get_pixel(x, y).0[0] > 0)
            .collect();
        assert_eq!(rows, vec![79, 119], "column {x}");
    }
}

#[test]
fn stage_one_two_boundary_between_31_and_32_pixel_squares() {
    // Enclosed areas land near 950 and 1013 square pixels.
    let config = StagingConfig::default();
    let small = analyze(&DynamicImage::ImageLuma8(scan(100, 100, &[(30, 30, 31)])), &config).unwrap();
    let large = analyze(&DynamicImage::ImageLuma8(scan(100, 100, &[(30, 30, 32)])), &config).unwrap();

    assert_eq!(small.stage(), Stage::I);
    assert!(small.largest_area() < 1000.0, "area {}", small.largest_area());
    assert_eq!(large.stage(), Stage::II);
    assert!(large.largest_area() >= 1000.0, "area {}", large.largest_area());
}

#[test]
fn stage_two_three_boundary_between_70_and_71_pixel_squares() {
    let config = StagingConfig::default();
    let small = analyze(&DynamicImage::ImageLuma8(scan(120, 120, &[(20, 20, 70)])), &config).unwrap();
    let large = analyze(&DynamicImage::ImageLuma8(scan(120, 120, &[(20, 20, 71)])), &config).unwrap();

    assert_eq!(small.stage(), Stage::II);
    assert_eq!(large.stage(), Stage::III);
}

#[test]
fn two_disjoint_regions_are_multiple() {
    let img = DynamicImage::ImageLuma8(scan(200, 200, &[(30, 30, 40), (120, 120, 40)]));
    let staged = analyze_staged(&img, &StagingConfig::default()).unwrap();
    let verdict = &staged.verdict;

    assert_eq!(verdict.tumor_count(), 2);
    assert_eq!(verdict.location(), Some(Location::Multiple));
    assert_eq!(verdict.stage(), Stage::II);
    // Equal squares enclose equal areas.
    let areas: Vec<f64> = staged.contours.iter().map(|c| c.area()).collect();
    assert!((areas[0] - areas[1]).abs() < f64::EPSILON, "{areas:?}");
    assert_invariants(verdict);
}

#[test]
fn largest_of_unequal_regions_decides_the_stage() {
    // Alone, the 20-pixel square is Stage I; the 60-pixel one is Stage II.
    let config = StagingConfig::default();
    let alone = analyze(&DynamicImage::ImageLuma8(scan(200, 200, &[(20, 20, 20)])), &config).unwrap();
    assert_eq!(alone.stage(), Stage::I);

    let img = DynamicImage::ImageLuma8(scan(200, 200, &[(20, 20, 20), (100, 100, 60)]));
    let staged = analyze_staged(&img, &config).unwrap();
    let verdict = &staged.verdict;

    assert_eq!(verdict.tumor_count(), 2);
    assert_eq!(verdict.stage(), Stage::II);
    assert_eq!(verdict.location(), Some(Location::Multiple));

    let largest = staged
        .contours
        .iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .unwrap();
    assert!((verdict.largest_area() - largest.area()).abs() < f64::EPSILON);
    assert_eq!(largest.bounding_box().unwrap().x, 99);
    assert!(
        (3500.0..=3600.0).contains(&verdict.largest_area()),
        "area {}",
        verdict.largest_area()
    );
    assert_invariants(verdict);
}

#[test]
fn region_inside_a_hole_is_not_counted() {
    // A filled square with a square hole produces two edge rings; the
    // inner ring sits inside the outer ring's hole.
    let img = GrayImage::from_fn(120, 120, |x, y| {
        let outer = (10..110).contains(&x) && (10..110).contains(&y);
        let hole = (40..80).contains(&x) && (40..80).contains(&y);
        Luma([if outer && !hole { 255 } else { 0 }])
    });
    let verdict = analyze(&DynamicImage::ImageLuma8(img), &StagingConfig::default()).unwrap();

    assert_eq!(verdict.tumor_count(), 1);
    assert_eq!(verdict.stage(), Stage::III);
}

#[test]
fn color_scan_is_reduced_to_intensity() {
    let gray = scan(200, 200, &[(80, 80, 40)]);
    let color = RgbImage::from_fn(200, 200, |x, y| {
        if gray.get_pixel(x, y).0[0] > 0 {
            Rgb([255, 255, 0])
        } else {
            Rgb([0, 0, 0])
        }
    });
    let verdict = analyze(&DynamicImage::ImageRgb8(color), &StagingConfig::default()).unwrap();

    assert_eq!(verdict.tumor_count(), 1);
    assert_eq!(verdict.stage(), Stage::II);
}

#[test]
fn encoded_scan_matches_in_memory_scan() {
    let img = DynamicImage::ImageLuma8(scan(150, 120, &[(20, 20, 30), (90, 40, 50)]));
    let from_bytes = analyze_bytes(&png_bytes(&img), &StagingConfig::default()).unwrap();
    let from_image = analyze(&img, &StagingConfig::default()).unwrap();
    assert_eq!(from_bytes, from_image);
    assert_invariants(&from_bytes);
}

#[test]
fn repeated_analysis_is_identical() {
    let img = DynamicImage::ImageLuma8(scan(160, 160, &[(10, 10, 25), (60, 70, 70)]));
    let config = StagingConfig::default();
    let first = analyze_staged(&img, &config).unwrap();
    for _ in 0..3 {
        let again = analyze_staged(&img, &config).unwrap();
        assert_eq!(again.verdict, first.verdict);
        assert_eq!(again.contours, first.contours);
        assert_eq!(again.edges, first.edges);
    }
}

#[test]
fn concurrent_analysis_is_identical() {
    let img = DynamicImage::ImageLuma8(scan(200, 200, &[(30, 30, 40), (120, 120, 60)]));
    let config = StagingConfig::default();
    let expected = analyze(&img, &config).unwrap();

    let results: Vec<StagingVerdict> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| analyze(&img, &config).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|v| *v == expected));
}

#[test]
fn verdict_json_uses_storage_field_names() {
    let img = DynamicImage::ImageLuma8(scan(200, 200, &[(80, 80, 40)]));
    let verdict = analyze(&img, &StagingConfig::default()).unwrap();
    let json = serde_json::to_value(&verdict).unwrap();

    assert_eq!(json["stage"], "Stage II");
    assert_eq!(json["malignancy"], "Moderate");
    assert_eq!(json["location"], "Single region");
    assert_eq!(json["tumor_count"], 1);
    assert!(json["largest_size"].as_str().unwrap().ends_with(" pixels"));

    let back: StagingVerdict = serde_json::from_value(json).unwrap();
    assert_eq!(back.stage(), verdict.stage());
    assert_eq!(back.tumor_count(), verdict.tumor_count());
}

#[test]
fn invalid_inputs_are_rejected() {
    let config = StagingConfig::default();
    assert!(matches!(
        analyze_bytes(&[], &config),
        Err(StagingError::EmptyInput)
    ));
    assert!(matches!(
        analyze_bytes(b"definitely not an image", &config),
        Err(StagingError::ImageDecode(_))
    ));
    let err = analyze(&DynamicImage::new_rgb8(10, 0), &config).unwrap_err();
    assert!(err.is_invalid_image());
    assert!(err.to_string().contains("10x0"));
}

#[test]
fn render_matches_classifier_and_leaves_input_untouched() {
    let img = DynamicImage::ImageLuma8(scan(120, 120, &[(30, 30, 40)]));
    let before = img.clone();
    let out = render(&img, &StagingConfig::default()).unwrap();

    assert_eq!(img, before);
    assert_eq!(out.dimensions(), (120, 120));
    assert!(out.pixels().any(|p| *p == mristage_pipeline::render::CONTOUR_COLOR));
    assert!(out.pixels().any(|p| *p == mristage_pipeline::render::BOX_COLOR));
}

#[test]
fn render_of_blank_scan_is_plain_copy() {
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 30, Luma([42])));
    let out = render(&img, &StagingConfig::default()).unwrap();
    assert_eq!(out, img.to_rgb8());
}
