//! Template matching implementation
//!
//! Correlation scoring over all three color channels, clustering of
//! near-duplicate hits and truncation to a result budget.

use super::config::MatchConfig;
use super::grouping::group_rectangles;
use super::needle::Needle;
use super::types::{MatchResult, Point, Rectangle, get_click_points};
use crate::error::{VisionError, VisionResult};
use image::{ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::integral_image::{integral_image, integral_squared_image, sum_image_pixels};
use std::path::Path;

/// Score surface, one value per needle position
pub type ScoreMap = ImageBuffer<Luma<f32>, Vec<f32>>;

const GROUP_EPS: f64 = 0.5;

/// Scoring method. Each method knows which direction of the threshold is a hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMethod {
    /// Mean-subtracted normalized correlation, 1.0 is a perfect match
    #[default]
    CorrelationCoefficientNormed,
    /// Normalized squared difference, 0.0 is a perfect match
    SquaredDifferenceNormed,
}

impl MatchMethod {
    /// Whether `score` counts as a detection at `threshold`
    pub fn accepts(self, score: f32, threshold: f32) -> bool {
        match self {
            MatchMethod::CorrelationCoefficientNormed => score >= threshold,
            MatchMethod::SquaredDifferenceNormed => score <= threshold,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MatchMethod::CorrelationCoefficientNormed => "ccoeff-normed",
            MatchMethod::SquaredDifferenceNormed => "sqdiff-normed",
        }
    }
}

/// Finds every occurrence of one needle in a frame
pub struct TemplateMatcher {
    needle: Needle,
    method: MatchMethod,
}

impl TemplateMatcher {
    pub fn new(needle: Needle, method: MatchMethod) -> Self {
        Self { needle, method }
    }

    /// Load the needle from disk
    pub fn open(path: impl AsRef<Path>, method: MatchMethod) -> VisionResult<Self> {
        Ok(Self::new(Needle::open(path)?, method))
    }

    pub fn from_image(image: RgbImage, method: MatchMethod) -> Self {
        Self::new(Needle::from_image(image), method)
    }

    pub fn needle(&self) -> &Needle {
        &self.needle
    }

    pub fn method(&self) -> MatchMethod {
        self.method
    }

    pub fn find_with_config(&self, frame: &RgbImage, config: &MatchConfig) -> VisionResult<MatchResult> {
        self.find(frame, config.threshold, config.max_results)
    }

    /// Find clustered needle rectangles in `frame`
    ///
    /// # Arguments
    /// * `frame` - The image to search in (RGB format)
    /// * `threshold` - Score threshold, compared in the method's direction
    /// * `max_results` - Clusters beyond this count are cut with a warning
    ///
    /// # Returns
    /// Rectangles of the needle's size, in scan order. No hit is an empty result.
    pub fn find(&self, frame: &RgbImage, threshold: f32, max_results: usize) -> VisionResult<MatchResult> {
        let scores = self.score_map(frame)?;
        let (w, h) = (self.needle.width() as i32, self.needle.height() as i32);

        let candidates: Vec<Rectangle> = scores
            .enumerate_pixels()
            .filter(|(_, _, score)| self.method.accepts(score[0], threshold))
            .map(|(x, y, _)| Rectangle::new(x as i32, y as i32, w, h))
            .collect();

        if candidates.is_empty() {
            log::debug!("🔍 No positions passed {} {}", self.method.name(), threshold);
            return Ok(MatchResult::default());
        }

        let mut rectangles = group_rectangles(&candidates, 1, GROUP_EPS);
        log::debug!(
            "✅ {} positions grouped into {} matches for {}",
            candidates.len(),
            rectangles.len(),
            self.needle.display_name()
        );

        let mut truncated = false;
        if rectangles.len() > max_results {
            log::warn!("⚠️ Warning: too many results, raise the threshold.");
            rectangles.truncate(max_results);
            truncated = true;
        }

        Ok(MatchResult {
            rectangles,
            truncated,
        })
    }

    pub fn get_click_points(&self, rectangles: &[Rectangle]) -> Vec<Point> {
        get_click_points(rectangles)
    }

    /// Score every position the needle fits at
    pub fn score_map(&self, frame: &RgbImage) -> VisionResult<ScoreMap> {
        let needle = self.needle.image();
        if needle.width() > frame.width() || needle.height() > frame.height() {
            return Err(VisionError::NeedleLargerThanFrame {
                needle_width: needle.width(),
                needle_height: needle.height(),
                frame_width: frame.width(),
                frame_height: frame.height(),
            });
        }
        Ok(match self.method {
            MatchMethod::CorrelationCoefficientNormed => ccoeff_normed(frame, needle),
            MatchMethod::SquaredDifferenceNormed => sqdiff_normed(frame, needle),
        })
    }
}

/// Per-channel running sums of an image, for constant-time window statistics
struct Integrals {
    sum: ImageBuffer<Rgb<u64>, Vec<u64>>,
    sq: ImageBuffer<Rgb<u64>, Vec<u64>>,
}

impl Integrals {
    fn of(image: &RgbImage) -> Self {
        Self {
            sum: integral_image::<_, u64>(image),
            sq: integral_squared_image::<_, u64>(image),
        }
    }

    /// Per-channel sum and sum of squares of the `width`x`height` window at (x, y)
    fn window(&self, x: u32, y: u32, width: u32, height: u32) -> ([u64; 3], [u64; 3]) {
        let (right, bottom) = (x + width - 1, y + height - 1);
        (
            sum_image_pixels(&self.sum, x, y, right, bottom),
            sum_image_pixels(&self.sq, x, y, right, bottom),
        )
    }
}

/// `n` times the summed per-channel variance of a window, exact
fn spread(n: i128, sum: [u64; 3], sq: [u64; 3]) -> i128 {
    (0..3).map(|c| n * sq[c] as i128 - sum[c] as i128 * sum[c] as i128).sum()
}

/// Per-channel sum of needle x frame products with the needle placed at (x, y)
fn cross_sums(frame: &RgbImage, needle: &RgbImage, x: u32, y: u32) -> [u64; 3] {
    let stride = frame.width() as usize * 3;
    let row_len = needle.width() as usize * 3;
    let (frame_raw, needle_raw) = (frame.as_raw(), needle.as_raw());

    let mut acc = [0u64; 3];
    for (dy, needle_row) in needle_raw.chunks_exact(row_len).enumerate() {
        let start = (y as usize + dy) * stride + x as usize * 3;
        let window_row = &frame_raw[start..start + row_len];
        for (i, t) in window_row.chunks_exact(3).zip(needle_row.chunks_exact(3)) {
            for c in 0..3 {
                acc[c] += i[c] as u64 * t[c] as u64;
            }
        }
    }
    acc
}

fn ccoeff_normed(frame: &RgbImage, needle: &RgbImage) -> ScoreMap {
    let (nw, nh) = needle.dimensions();
    let out_w = frame.width() - nw + 1;
    let out_h = frame.height() - nh + 1;
    let n = (nw * nh) as i128;

    let (t_sum, t_sq) = Integrals::of(needle).window(0, 0, nw, nh);
    let t_spread = spread(n, t_sum, t_sq);
    if t_spread == 0 {
        // a flat needle correlates equally with everything
        return ScoreMap::from_pixel(out_w, out_h, Luma([1.0]));
    }

    let integrals = Integrals::of(frame);
    let report_interval = (out_h / 10).max(1);
    ScoreMap::from_fn(out_w, out_h, |x, y| {
        if x == 0 && y % report_interval == 0 {
            log::debug!("  ⏳ Correlation scanning: {}%", y * 100 / out_h);
        }
        let (i_sum, i_sq) = integrals.window(x, y, nw, nh);
        let w_spread = spread(n, i_sum, i_sq);
        if w_spread == 0 {
            return Luma([0.0]);
        }
        let cross = cross_sums(frame, needle, x, y);
        let num: i128 = (0..3)
            .map(|c| n * cross[c] as i128 - t_sum[c] as i128 * i_sum[c] as i128)
            .sum();
        let score = num as f64 / ((t_spread as f64).sqrt() * (w_spread as f64).sqrt());
        Luma([score.clamp(-1.0, 1.0) as f32])
    })
}

fn sqdiff_normed(frame: &RgbImage, needle: &RgbImage) -> ScoreMap {
    let (nw, nh) = needle.dimensions();
    let out_w = frame.width() - nw + 1;
    let out_h = frame.height() - nh + 1;

    let (_, t_sq) = Integrals::of(needle).window(0, 0, nw, nh);
    let template_sq: u64 = t_sq.iter().sum();

    let integrals = Integrals::of(frame);
    let report_interval = (out_h / 10).max(1);
    ScoreMap::from_fn(out_w, out_h, |x, y| {
        if x == 0 && y % report_interval == 0 {
            log::debug!("  ⏳ Squared-difference scanning: {}%", y * 100 / out_h);
        }
        let (_, i_sq) = integrals.window(x, y, nw, nh);
        let window_sq: u64 = i_sq.iter().sum();
        let cross: u64 = cross_sums(frame, needle, x, y).iter().sum();
        let diff_sq = template_sq as i128 + window_sq as i128 - 2 * cross as i128;

        let denom = (template_sq as f64 * window_sq as f64).sqrt();
        let score = if denom == 0.0 {
            if diff_sq == 0 { 0.0 } else { 1.0 }
        } else {
            (diff_sq as f64 / denom).clamp(0.0, 1.0)
        };
        Luma([score as f32])
    })
}
