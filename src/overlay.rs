//! Drawing of match results onto a frame

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use target_vision::vision::{Point, Rectangle};

const LINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

pub fn draw_rectangles(image: &mut RgbImage, rectangles: &[Rectangle]) {
    for r in rectangles.iter().filter(|r| r.w > 0 && r.h > 0) {
        let rect = Rect::at(r.x, r.y).of_size(r.w as u32, r.h as u32);
        draw_hollow_rect_mut(image, rect, LINE_COLOR);
    }
}

pub fn draw_crosshairs(image: &mut RgbImage, points: &[Point]) {
    for p in points {
        draw_cross_mut(image, MARKER_COLOR, p.x, p.y);
    }
}
