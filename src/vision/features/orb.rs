//! Oriented FAST keypoints with rotated BRIEF descriptors over a scale pyramid

use image::{GrayImage, RgbImage, imageops::FilterType};
use imageproc::corners::{Corner, corners_fast9};
use imageproc::filter::gaussian_blur_f32;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

const DESCRIPTOR_BITS: usize = 256;
const PATTERN_SEED: u64 = 0x0_5eed_b41e_f0b5;
const FAST_THRESHOLD: u8 = 20;
const NMS_RADIUS: i64 = 3;
const BLUR_SIGMA: f32 = 2.0;
/// Downscaled pyramid levels smaller than this on either side are not built
const MIN_LEVEL_SIZE: u32 = 16;
/// FAST needs a 3 px ring around the centre pixel
const MIN_FAST_SIZE: u32 = 7;

/// A detected feature, in full-resolution frame coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Orientation in radians
    pub angle: f32,
    /// Pyramid level the keypoint was found on
    pub octave: u8,
    /// FAST corner score
    pub response: f32,
    /// Patch diameter at full resolution
    pub size: f32,
}

/// Test pairs of the BRIEF descriptor, in unit-disk coordinates
#[derive(Debug, Clone)]
struct BriefPattern {
    pairs: Vec<[(f32, f32); 2]>,
}

impl BriefPattern {
    fn seeded(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let pairs = (0..DESCRIPTOR_BITS)
            .map(|_| [unit_disk_point(&mut rng), unit_disk_point(&mut rng)])
            .collect();
        Self { pairs }
    }
}

fn unit_disk_point(rng: &mut StdRng) -> (f32, f32) {
    loop {
        let x: f32 = rng.random_range(-1.0..=1.0);
        let y: f32 = rng.random_range(-1.0..=1.0);
        if x * x + y * y <= 1.0 {
            return (x, y);
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrbDetector {
    n_features: usize,
    patch_size: u32,
    scale_factor: f32,
    n_levels: u32,
    pattern: BriefPattern,
}

impl OrbDetector {
    /// Detector with a feature budget and a descriptor patch diameter.
    ///
    /// Border keypoints are kept; samples outside the image clamp to the edge.
    pub fn new(n_features: usize, patch_size: u32) -> Self {
        Self {
            n_features,
            patch_size: patch_size.max(2),
            scale_factor: 1.2,
            n_levels: 8,
            pattern: BriefPattern::seeded(PATTERN_SEED),
        }
    }

    /// Feature budget per pyramid level, shrinking geometrically with scale
    fn level_budgets(&self) -> Vec<usize> {
        let factor = 1.0 / self.scale_factor as f64;
        let levels = self.n_levels as i32;
        let mut per_level = self.n_features as f64 * (1.0 - factor) / (1.0 - factor.powi(levels));

        let mut budgets = Vec::with_capacity(self.n_levels as usize);
        let mut assigned = 0usize;
        for _ in 0..self.n_levels - 1 {
            let n = (per_level.round() as usize).min(self.n_features - assigned);
            budgets.push(n);
            assigned += n;
            per_level *= factor;
        }
        budgets.push(self.n_features.saturating_sub(assigned));
        budgets
    }

    pub fn detect_and_compute(&self, image: &RgbImage) -> (Vec<Keypoint>, Vec<Descriptor>) {
        let gray = image::imageops::grayscale(image);
        let (width, height) = gray.dimensions();

        let mut keypoints = Vec::new();
        let mut descriptors = Vec::new();

        for (level, budget) in self.level_budgets().into_iter().enumerate() {
            let scale = self.scale_factor.powi(level as i32);
            let level_w = (width as f32 / scale).round() as u32;
            let level_h = (height as f32 / scale).round() as u32;
            let floor = if level == 0 { MIN_FAST_SIZE } else { MIN_LEVEL_SIZE };
            if level_w < floor || level_h < floor {
                break;
            }

            let level_img = if level == 0 {
                gray.clone()
            } else {
                image::imageops::resize(&gray, level_w, level_h, FilterType::Triangle)
            };

            let corners = strongest_corners(&level_img, budget);
            if corners.is_empty() {
                continue;
            }
            let blurred = gaussian_blur_f32(&level_img, BLUR_SIGMA);
            let radius = (self.patch_size / 2) as i64;

            for corner in corners {
                let angle = orientation(&level_img, corner.x as i64, corner.y as i64, radius);
                descriptors.push(self.describe(&blurred, corner.x as i64, corner.y as i64, angle));
                keypoints.push(Keypoint {
                    x: corner.x as f32 * scale,
                    y: corner.y as f32 * scale,
                    angle,
                    octave: level as u8,
                    response: corner.score,
                    size: self.patch_size as f32 * scale,
                });
            }
        }

        log::debug!(
            "🔑 Detected {} keypoints on {}x{} (budget {})",
            keypoints.len(),
            width,
            height,
            self.n_features
        );
        (keypoints, descriptors)
    }

    fn describe(&self, blurred: &GrayImage, cx: i64, cy: i64, angle: f32) -> Descriptor {
        let (sin, cos) = angle.sin_cos();
        let reach = (self.patch_size as f32 / 2.0 - 1.0).max(1.0);
        let rotate = |(px, py): (f32, f32)| {
            let (x, y) = (px * reach, py * reach);
            (
                cx + (cos * x - sin * y).round() as i64,
                cy + (sin * x + cos * y).round() as i64,
            )
        };

        let mut descriptor = [0u8; 32];
        for (bit, [p, q]) in self.pattern.pairs.iter().enumerate() {
            let (px, py) = rotate(*p);
            let (qx, qy) = rotate(*q);
            if sample(blurred, px, py) < sample(blurred, qx, qy) {
                descriptor[bit / 8] |= 1 << (bit % 8);
            }
        }
        descriptor
    }
}

/// FAST-9 corners, strongest first, thinned so no two lie within `NMS_RADIUS`
fn strongest_corners(image: &GrayImage, budget: usize) -> Vec<Corner> {
    if budget == 0 {
        return Vec::new();
    }
    let (width, height) = image.dimensions();
    let mut corners = corners_fast9(image, FAST_THRESHOLD);
    corners.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
    });

    let mut taken = vec![false; (width * height) as usize];
    let mut kept = Vec::with_capacity(budget.min(corners.len()));
    for corner in corners {
        let (x, y) = (corner.x as i64, corner.y as i64);
        let crowded = (-NMS_RADIUS..=NMS_RADIUS).any(|dy| {
            (-NMS_RADIUS..=NMS_RADIUS).any(|dx| {
                let (nx, ny) = (x + dx, y + dy);
                nx >= 0
                    && ny >= 0
                    && nx < width as i64
                    && ny < height as i64
                    && taken[(ny as u32 * width + nx as u32) as usize]
            })
        });
        if crowded {
            continue;
        }
        taken[(corner.y * width + corner.x) as usize] = true;
        kept.push(corner);
        if kept.len() == budget {
            break;
        }
    }
    kept
}

/// Intensity-centroid angle of the disk of `radius` around (cx, cy)
fn orientation(image: &GrayImage, cx: i64, cy: i64, radius: i64) -> f32 {
    let mut m10 = 0.0f64;
    let mut m01 = 0.0f64;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let v = sample(image, cx + dx, cy + dy) as f64;
            m10 += dx as f64 * v;
            m01 += dy as f64 * v;
        }
    }
    m01.atan2(m10) as f32
}

fn sample(image: &GrayImage, x: i64, y: i64) -> u8 {
    let x = x.clamp(0, image.width() as i64 - 1) as u32;
    let y = y.clamp(0, image.height() as i64 - 1) as u32;
    image.get_pixel(x, y)[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn blocks(w: u32, h: u32, seed: u64) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(seed);
        let cells: Vec<u8> = (0..(w / 4 + 1) * (h / 4 + 1))
            .map(|_| rng.random_range(0..=255))
            .collect();
        RgbImage::from_fn(w, h, |x, y| {
            let v = cells[((y / 4) * (w / 4 + 1) + x / 4) as usize];
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_level_budgets_sum_to_feature_count() {
        for n in [500, 2000, 7] {
            let detector = OrbDetector::new(n, 32);
            let budgets = detector.level_budgets();
            assert_eq!(budgets.len(), 8);
            assert_eq!(budgets.iter().sum::<usize>(), n);
            assert!(budgets[0] >= budgets[1]);
        }
    }

    #[test]
    fn test_flat_image_has_no_keypoints() {
        let detector = OrbDetector::new(500, 32);
        let (kps, descs) = detector.detect_and_compute(&RgbImage::from_pixel(64, 64, Rgb([90, 90, 90])));
        assert!(kps.is_empty());
        assert!(descs.is_empty());
    }

    #[test]
    fn test_textured_image_respects_budget() {
        let detector = OrbDetector::new(50, 32);
        let (kps, descs) = detector.detect_and_compute(&blocks(96, 96, 3));
        assert!(!kps.is_empty());
        assert!(kps.len() <= 50);
        assert_eq!(kps.len(), descs.len());
        assert!(kps.iter().all(|k| k.x >= 0.0 && k.x < 96.0 && k.y >= 0.0 && k.y < 96.0));
    }

    #[test]
    fn test_detection_is_deterministic() {
        let img = blocks(80, 64, 11);
        let a = OrbDetector::new(200, 31).detect_and_compute(&img);
        let b = OrbDetector::new(200, 31).detect_and_compute(&img);
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
    }

    #[test]
    fn test_image_below_fast_ring_builds_no_levels() {
        let detector = OrbDetector::new(500, 32);
        let (kps, _) = detector.detect_and_compute(&blocks(6, 40, 1));
        assert!(kps.is_empty());
    }

    #[test]
    fn test_small_sprite_is_detected_at_full_resolution() {
        // bright square on black: its corners pass FAST-9
        let sprite = RgbImage::from_fn(15, 15, |x, y| {
            if (5..10).contains(&x) && (5..10).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let (kps, descs) = OrbDetector::new(500, 32).detect_and_compute(&sprite);
        assert!(!kps.is_empty());
        assert_eq!(kps.len(), descs.len());
        assert!(kps.iter().all(|k| k.octave == 0));
    }
}
