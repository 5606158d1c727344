//! Tests for the matching pipeline on synthetic frames

use crate::error::VisionError;
use crate::vision::{
    ColorRangeFilterConfig, EdgeFilterConfig, FeatureMatcher, MatchConfig, MatchMethod, Point,
    Rectangle, TemplateMatcher, apply_color_range_filter, apply_edge_filter, centroid,
    create_ui_config,
};
use image::{Rgb, RgbImage, imageops};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn noise(w: u32, h: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(w, h, |_, _| Rgb([rng.random(), rng.random(), rng.random()]))
}

/// Random gray 4x4 blocks, rich in corners
fn blocks(w: u32, h: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let cols = w / 4 + 1;
    let cells: Vec<u8> = (0..cols * (h / 4 + 1)).map(|_| rng.random()).collect();
    RgbImage::from_fn(w, h, |x, y| {
        let v = cells[((y / 4) * cols + x / 4) as usize];
        Rgb([v, v, v])
    })
}

fn blob(size: u32) -> RgbImage {
    let c = (size / 2) as f32;
    RgbImage::from_fn(size, size, |x, y| {
        let d2 = (x as f32 - c).powi(2) + (y as f32 - c).powi(2);
        let v = (255.0 * (-d2 / 18.0).exp()) as u8;
        Rgb([v, v / 2, 255 - v])
    })
}

fn paste(frame: &mut RgbImage, needle: &RgbImage, x: u32, y: u32) {
    imageops::replace(frame, needle, x as i64, y as i64);
}

#[test]
fn test_exact_copy_is_found_with_correlation() {
    let needle = noise(12, 10, 1);
    let mut frame = noise(80, 60, 2);
    paste(&mut frame, &needle, 37, 21);

    let matcher = TemplateMatcher::from_image(needle, MatchMethod::CorrelationCoefficientNormed);
    let result = matcher.find(&frame, 0.9, 10).unwrap();

    assert_eq!(result.rectangles, vec![Rectangle::new(37, 21, 12, 10)]);
    assert!(!result.truncated);
    assert_eq!(result.click_points(), vec![Point::new(43, 26)]);
}

#[test]
fn test_exact_copy_is_found_with_squared_difference() {
    let needle = noise(12, 10, 3);
    let mut frame = noise(80, 60, 4);
    paste(&mut frame, &needle, 5, 44);

    let matcher = TemplateMatcher::from_image(needle, MatchMethod::SquaredDifferenceNormed);
    let result = matcher.find(&frame, 0.05, 10).unwrap();
    assert_eq!(result.rectangles, vec![Rectangle::new(5, 44, 12, 10)]);

    // lower is better for this method
    let scores = matcher.score_map(&frame).unwrap();
    assert_eq!(scores.get_pixel(5, 44)[0], 0.0);
    assert!(scores.get_pixel(30, 20)[0] > 0.2);
}

#[test]
fn test_no_detection_is_empty_result() {
    let matcher = TemplateMatcher::from_image(noise(12, 10, 5), MatchMethod::default());
    let result = matcher.find(&noise(80, 60, 6), 0.9, 10).unwrap();
    assert!(result.is_empty());
    assert!(!result.truncated);
    assert!(result.click_points().is_empty());
}

#[test]
fn test_too_many_results_are_truncated() {
    let needle = noise(6, 6, 7);
    let mut frame = noise(120, 40, 8);
    for i in 0..12 {
        paste(&mut frame, &needle, 2 + i * 9, 10);
    }

    let matcher = TemplateMatcher::from_image(needle, MatchMethod::default());
    let all = matcher.find(&frame, 0.9, 100).unwrap();
    assert_eq!(all.len(), 12);
    assert!(!all.truncated);

    // the flag is the caller-visible side of the "too many results" warning
    let result = matcher.find(&frame, 0.9, 10).unwrap();
    assert_eq!(result.len(), 10);
    assert!(result.truncated);
    assert_eq!(result.rectangles[0], Rectangle::new(2, 10, 6, 6));
    assert_eq!(result.rectangles[9], Rectangle::new(83, 10, 6, 6));
}

#[test]
fn test_neighbouring_hits_collapse_to_one_target() {
    let needle = blob(15);
    let mut frame = RgbImage::from_pixel(100, 80, Rgb([0, 0, 255]));
    paste(&mut frame, &needle, 30, 30);

    let matcher = TemplateMatcher::from_image(needle, MatchMethod::default());
    let scores = matcher.score_map(&frame).unwrap();
    let raw_hits = scores.pixels().filter(|p| p[0] >= 0.8).count();
    assert!(raw_hits > 1, "smooth blob should light up several positions");

    let result = matcher.find(&frame, 0.8, 10).unwrap();
    assert_eq!(result.len(), 1);
    let rect = result.rectangles[0];
    assert!((rect.x - 30).abs() <= 1 && (rect.y - 30).abs() <= 1, "{rect:?}");
    assert_eq!((rect.w, rect.h), (15, 15));
}

#[test]
fn test_distant_targets_stay_separate() {
    let needle = blob(15);
    let mut frame = RgbImage::from_pixel(120, 80, Rgb([0, 0, 255]));
    paste(&mut frame, &needle, 10, 10);
    paste(&mut frame, &needle, 80, 50);

    let matcher = TemplateMatcher::from_image(needle, MatchMethod::default());
    let result = matcher.find_with_config(&frame, &MatchConfig { threshold: 0.8, max_results: 10 }).unwrap();
    assert_eq!(result.len(), 2);
    assert!(result.rectangles[0].x < result.rectangles[1].x);

    let single = matcher.find_with_config(&frame, &create_ui_config()).unwrap();
    assert_eq!(single.len(), 1);
    assert!(single.truncated);
}

#[test]
fn test_color_filter_feeds_template_matcher() {
    // red target on a green/blue noise frame; keeping only red hues leaves the target
    let needle = RgbImage::from_fn(8, 8, |x, y| Rgb([120 + (x * 16 + y * 3) as u8, 0, 0]));
    let mut frame = RgbImage::from_fn(60, 40, |x, y| Rgb([0, (x * 4) as u8, (y * 6) as u8]));
    paste(&mut frame, &needle, 20, 12);

    let config = ColorRangeFilterConfig {
        h_max: 10,
        s_min: 100,
        ..Default::default()
    };
    let filtered = apply_color_range_filter(&frame, &config);
    assert_eq!(filtered.get_pixel(0, 39).0, [0, 0, 0]);

    let filtered_needle = apply_color_range_filter(&needle, &config);
    let matcher = TemplateMatcher::from_image(filtered_needle, MatchMethod::default());
    let result = matcher.find(&filtered, 0.95, 10).unwrap();
    assert_eq!(result.rectangles, vec![Rectangle::new(20, 12, 8, 8)]);
}

#[test]
fn test_edge_filter_keeps_frame_shape() {
    let frame = blocks(64, 48, 9);
    let edges = apply_edge_filter(&frame, &EdgeFilterConfig::default());
    assert_eq!(edges.dimensions(), frame.dimensions());
    assert!(edges.pixels().all(|p| p.0 == [0, 0, 0] || p.0 == [255, 255, 255]));
}

#[test]
fn test_keypoints_locate_pasted_needle() {
    let needle = blocks(96, 96, 5);
    let mut frame = RgbImage::from_pixel(240, 200, Rgb([128, 128, 128]));
    paste(&mut frame, &needle, 70, 50);

    let matcher = FeatureMatcher::from_image(needle);
    let result = matcher.match_keypoints(&frame, 32).unwrap();

    assert!(!result.needle_keypoints.is_empty());
    assert!(result.good.len() > 5, "only {} good matches", result.good.len());
    assert_eq!(result.points.len(), result.good.len());
    for m in &result.good {
        assert!(m.needle_idx < result.needle_keypoints.len());
        assert!(m.haystack_idx < result.haystack_keypoints.len());
    }

    let center = centroid(&result.points);
    let target = Rectangle::new(66, 46, 104, 104);
    assert!(target.contains_point(center), "centroid {center:?} outside pasted needle");
    assert_eq!(result.center(), Some(center));
}

#[test]
fn test_points_only_reported_above_quality_gate() {
    let matcher = FeatureMatcher::from_image(blocks(64, 64, 12));
    let result = matcher.match_keypoints(&blocks(160, 120, 13), 32).unwrap();
    assert_eq!(result.points.is_empty(), result.good.len() <= 5);
}

#[test]
fn test_small_sprite_needle_is_searched() {
    let sprite = RgbImage::from_fn(15, 15, |x, y| {
        if (5..10).contains(&x) && (5..10).contains(&y) {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    let mut frame = blocks(200, 200, 16);
    paste(&mut frame, &sprite, 90, 120);

    let result = FeatureMatcher::from_image(sprite).match_keypoints(&frame, 32).unwrap();
    assert!(!result.needle_keypoints.is_empty());
    assert!(!result.haystack_keypoints.is_empty());
}

#[test]
fn test_flat_needle_is_index_failure() {
    let matcher = FeatureMatcher::from_image(RgbImage::from_pixel(64, 64, Rgb([40, 40, 40])));
    let err = matcher.match_keypoints(&blocks(120, 120, 14), 32).unwrap_err();
    assert!(matches!(err, VisionError::MatchIndex { .. }));
}

#[test]
fn test_flat_frame_is_index_failure() {
    let matcher = FeatureMatcher::from_image(blocks(64, 64, 15));
    let err = matcher
        .match_keypoints(&RgbImage::from_pixel(120, 120, Rgb([200, 200, 200])), 32)
        .unwrap_err();
    assert!(err.is_match_index_failure());
}
