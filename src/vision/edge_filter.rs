//! Morphological edge extraction: erode, dilate, then Canny

use super::config::EdgeFilterConfig;
use image::{DynamicImage, RgbImage};
use imageproc::edges::canny;

/// Run erode -> dilate -> Canny and return the binary edge map as RGB
pub fn apply_edge_filter(image: &RgbImage, config: &EdgeFilterConfig) -> RgbImage {
    let kernel = config.kernel_size.max(1);

    let mut work = image.clone();
    for _ in 0..config.erode_iter {
        work = morph(&work, kernel, Morph::Erode);
    }
    for _ in 0..config.dilate_iter {
        work = morph(&work, kernel, Morph::Dilate);
    }

    let gray = image::imageops::grayscale(&work);
    let edges = canny(&gray, config.canny1 as f32, config.canny2 as f32);

    log::debug!(
        "🧱 Edge filter k={} erode={} dilate={} canny=({}, {})",
        kernel,
        config.erode_iter,
        config.dilate_iter,
        config.canny1,
        config.canny2
    );

    DynamicImage::ImageLuma8(edges).to_rgb8()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Morph {
    Erode,
    Dilate,
}

impl Morph {
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Morph::Erode => a.min(b),
            Morph::Dilate => a.max(b),
        }
    }
}

/// One pass of grayscale erosion/dilation with a `kernel`x`kernel` square,
/// anchored at `kernel / 2`, applied to each channel. Samples outside the
/// image do not take part.
pub fn morph(image: &RgbImage, kernel: u32, op: Morph) -> RgbImage {
    let (width, height) = image.dimensions();
    if kernel <= 1 || width == 0 || height == 0 {
        return image.clone();
    }
    let anchor = (kernel / 2) as i64;
    let span = kernel as i64;

    // the square element is separable: rows first, then columns
    let mut rows = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let lo = (x as i64 - anchor).max(0) as u32;
            let hi = (x as i64 - anchor + span - 1).min(width as i64 - 1) as u32;
            let mut acc = image.get_pixel(lo, y).0;
            for xx in lo + 1..=hi {
                let p = image.get_pixel(xx, y).0;
                for c in 0..3 {
                    acc[c] = op.pick(acc[c], p[c]);
                }
            }
            rows.get_pixel_mut(x, y).0 = acc;
        }
    }

    let mut out = RgbImage::new(width, height);
    for y in 0..height {
        let lo = (y as i64 - anchor).max(0) as u32;
        let hi = (y as i64 - anchor + span - 1).min(height as i64 - 1) as u32;
        for x in 0..width {
            let mut acc = rows.get_pixel(x, lo).0;
            for yy in lo + 1..=hi {
                let p = rows.get_pixel(x, yy).0;
                for c in 0..3 {
                    acc[c] = op.pick(acc[c], p[c]);
                }
            }
            out.get_pixel_mut(x, y).0 = acc;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn square_image(size: u32, from: u32, to: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| {
            if (from..to).contains(&x) && (from..to).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn test_unit_kernel_is_identity() {
        let img = square_image(10, 3, 6);
        assert_eq!(morph(&img, 1, Morph::Erode), img);
        assert_eq!(morph(&img, 1, Morph::Dilate), img);
    }

    #[test]
    fn test_erode_removes_isolated_pixel() {
        let mut img = RgbImage::new(9, 9);
        img.put_pixel(4, 4, Rgb([200, 100, 50]));
        let eroded = morph(&img, 3, Morph::Erode);
        assert!(eroded.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_dilate_grows_pixel_into_square() {
        let mut img = RgbImage::new(9, 9);
        img.put_pixel(4, 4, Rgb([200, 100, 50]));
        let dilated = morph(&img, 3, Morph::Dilate);
        for y in 3..=5 {
            for x in 3..=5 {
                assert_eq!(dilated.get_pixel(x, y).0, [200, 100, 50]);
            }
        }
        assert_eq!(dilated.get_pixel(2, 4).0, [0, 0, 0]);
        assert_eq!(dilated.get_pixel(4, 6).0, [0, 0, 0]);
    }

    #[test]
    fn test_even_kernel_anchor() {
        // side 2, anchor 1: window covers x-1..=x
        let mut img = RgbImage::new(5, 1);
        img.put_pixel(2, 0, Rgb([9, 9, 9]));
        let dilated = morph(&img, 2, Morph::Dilate);
        let row: Vec<u8> = dilated.pixels().map(|p| p.0[0]).collect();
        assert_eq!(row, vec![0, 0, 9, 9, 0]);
    }

    #[test]
    fn test_edges_trace_square_outline() {
        let img = square_image(40, 10, 30);
        let config = EdgeFilterConfig {
            kernel_size: 1,
            ..Default::default()
        };
        let edges = apply_edge_filter(&img, &config);

        assert_eq!(edges.dimensions(), (40, 40));
        assert!(edges.pixels().any(|p| p.0 == [255, 255, 255]));
        assert!(edges.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
        assert_eq!(edges.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(edges.get_pixel(20, 20).0, [0, 0, 0]);
    }

    #[test]
    fn test_open_removes_small_blob_before_edges() {
        // 3x3 blob vanishes under a 5x5 erosion, leaving nothing to trace
        let img = square_image(40, 18, 21);
        let edges = apply_edge_filter(&img, &EdgeFilterConfig::default());
        assert!(edges.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
