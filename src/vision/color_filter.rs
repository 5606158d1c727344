//! HSV color-range filter
//!
//! Recolors a frame in HSV space (saturation/value shifts), keeps only pixels
//! inside the configured range and converts the result back to RGB.

use super::channel::shift_channel;
use super::config::ColorRangeFilterConfig;
use image::{Rgb, RgbImage};

/// Apply the range filter. Pixels outside the range come back black.
pub fn apply_color_range_filter(image: &RgbImage, config: &ColorRangeFilterConfig) -> RgbImage {
    let (width, height) = image.dimensions();
    let pixel_count = (width * height) as usize;

    let mut hue = Vec::with_capacity(pixel_count);
    let mut sat = Vec::with_capacity(pixel_count);
    let mut val = Vec::with_capacity(pixel_count);
    for pixel in image.pixels() {
        let [h, s, v] = rgb_to_hsv(pixel.0);
        hue.push(h);
        sat.push(s);
        val.push(v);
    }

    // add before subtract, each step saturating on its own
    shift_channel(&mut sat, config.s_add as i32);
    shift_channel(&mut sat, -(config.s_sub as i32));
    shift_channel(&mut val, config.v_add as i32);
    shift_channel(&mut val, -(config.v_sub as i32));

    let lower = config.lower();
    let upper = config.upper();

    let mut kept = 0usize;
    let mut out = RgbImage::new(width, height);
    for (i, pixel) in out.pixels_mut().enumerate() {
        let hsv = [hue[i], sat[i], val[i]];
        if in_range(hsv, lower, upper) {
            *pixel = Rgb(hsv_to_rgb(hsv));
            kept += 1;
        }
    }

    log::debug!("🎨 Color range filter kept {}/{} pixels", kept, pixel_count);
    out
}

fn in_range(hsv: [u8; 3], lower: [u8; 3], upper: [u8; 3]) -> bool {
    (0..3).all(|i| hsv[i] >= lower[i] && hsv[i] <= upper[i])
}

/// Convert an RGB sample to 8-bit HSV (H 0..=179, S and V 0..=255)
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = max - min;

    let s = if max == 0.0 { 0.0 } else { 255.0 * diff / max };

    let mut h = if diff == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / diff
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    let mut h8 = (h / 2.0).round() as u32;
    if h8 >= 180 {
        h8 -= 180;
    }

    [h8 as u8, s.round() as u8, max as u8]
}

/// Convert an 8-bit HSV sample back to RGB
pub fn hsv_to_rgb([h, s, v]: [u8; 3]) -> [u8; 3] {
    let hue = (h as f32 * 2.0) % 360.0;
    let sat = s as f32 / 255.0;
    let value = v as f32 / 255.0;

    let chroma = value * sat;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - ((sector % 2.0) - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = value - chroma;

    let to_u8 = |c: f32| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}
