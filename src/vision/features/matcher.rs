//! Keypoint correspondence between the needle and a frame

use super::lsh::LshIndex;
use super::orb::{Keypoint, OrbDetector};
use crate::error::{VisionError, VisionResult};
use crate::vision::needle::Needle;
use crate::vision::types::Point;
use image::RgbImage;
use std::path::Path;

pub const DEFAULT_PATCH_SIZE: u32 = 32;
pub const NEEDLE_FEATURES: usize = 500;
pub const HAYSTACK_FEATURES: usize = 2000;
/// Best match must be below this fraction of the runner-up
pub const RATIO_TEST: f32 = 0.7;
/// Points are only reported with more good correspondences than this
pub const MIN_MATCH_COUNT: usize = 5;

const LSH_TABLES: usize = 6;
const LSH_KEY_SIZE: usize = 12;

/// A needle keypoint paired with its best haystack keypoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub needle_idx: usize,
    pub haystack_idx: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, Default)]
pub struct KeypointMatches {
    pub needle_keypoints: Vec<Keypoint>,
    pub haystack_keypoints: Vec<Keypoint>,
    /// Correspondences that passed the ratio test
    pub good: Vec<Correspondence>,
    /// Haystack positions of `good`, empty unless more than `MIN_MATCH_COUNT`
    pub points: Vec<Point>,
}

impl KeypointMatches {
    /// Centroid of `points`, or `None` when the quality gate left it empty
    pub fn center(&self) -> Option<Point> {
        (!self.points.is_empty()).then(|| centroid(&self.points))
    }
}

/// Lowe's ratio test on the two nearest distances
pub fn passes_ratio_test(best: f32, second: f32) -> bool {
    best < RATIO_TEST * second
}

/// Integer mean of the points, rounded down.
///
/// # Panics
/// Panics on an empty slice; callers must check first.
pub fn centroid(points: &[Point]) -> Point {
    assert!(!points.is_empty(), "centroid of an empty point list");
    let n = points.len() as i64;
    let sum_x: i64 = points.iter().map(|p| p.x as i64).sum();
    let sum_y: i64 = points.iter().map(|p| p.y as i64).sum();
    Point::new(sum_x.div_euclid(n) as i32, sum_y.div_euclid(n) as i32)
}

pub struct FeatureMatcher {
    needle: Needle,
}

impl FeatureMatcher {
    pub fn new(needle: Needle) -> Self {
        Self { needle }
    }

    pub fn open(path: impl AsRef<Path>) -> VisionResult<Self> {
        Ok(Self::new(Needle::open(path)?))
    }

    pub fn from_image(image: RgbImage) -> Self {
        Self::new(Needle::from_image(image))
    }

    pub fn needle(&self) -> &Needle {
        &self.needle
    }

    /// Match needle keypoints against `frame`.
    ///
    /// `Ok` with empty collections means matching ran and found nothing
    /// usable. `Err(MatchIndex)` means no index could be built, because one
    /// side produced no descriptors.
    pub fn match_keypoints(&self, frame: &RgbImage, patch_size: u32) -> VisionResult<KeypointMatches> {
        let (needle_keypoints, needle_descriptors) =
            OrbDetector::new(NEEDLE_FEATURES, patch_size).detect_and_compute(self.needle.image());
        let (haystack_keypoints, haystack_descriptors) =
            OrbDetector::new(HAYSTACK_FEATURES, patch_size).detect_and_compute(frame);

        if needle_descriptors.is_empty() {
            return Err(VisionError::MatchIndex {
                reason: format!("no descriptors on {}", self.needle.display_name()),
            });
        }
        let index = LshIndex::build(&haystack_descriptors, LSH_TABLES, LSH_KEY_SIZE)?;

        let good: Vec<Correspondence> = needle_descriptors
            .iter()
            .enumerate()
            .filter_map(|(needle_idx, descriptor)| match index.knn(descriptor, 2).as_slice() {
                [best, second] if passes_ratio_test(best.distance as f32, second.distance as f32) => {
                    Some(Correspondence {
                        needle_idx,
                        haystack_idx: best.index,
                        distance: best.distance as f32,
                    })
                }
                _ => None,
            })
            .collect();

        let mut points = Vec::new();
        if good.len() > MIN_MATCH_COUNT {
            log::info!("match {:03}, kp {:03}", good.len(), needle_keypoints.len());
            points = good
                .iter()
                .map(|m| {
                    let kp = &haystack_keypoints[m.haystack_idx];
                    Point::new(kp.x as i32, kp.y as i32)
                })
                .collect();
        } else {
            log::debug!(
                "🔍 Only {} good correspondences for {} (need more than {})",
                good.len(),
                self.needle.display_name(),
                MIN_MATCH_COUNT
            );
        }

        Ok(KeypointMatches {
            needle_keypoints,
            haystack_keypoints,
            good,
            points,
        })
    }
}
