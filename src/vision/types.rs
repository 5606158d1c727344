/// Core value types shared by the matchers
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in frame pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// A pixel coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Center of the rectangle, rounded down
    pub fn center(&self) -> Point {
        Point::new(
            self.x + self.w.div_euclid(2),
            self.y + self.h.div_euclid(2),
        )
    }

    /// Check if this rectangle contains a point
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangles found by one `find` call
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MatchResult {
    /// Clustered detections, in scan order of their first member
    pub rectangles: Vec<Rectangle>,
    /// Set when more clusters than `max_results` were found and the list was cut
    pub truncated: bool,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rectangles.len()
    }

    /// Click points for every rectangle, same order
    pub fn click_points(&self) -> Vec<Point> {
        get_click_points(&self.rectangles)
    }
}

/// Center of each rectangle using floor division, one point per rectangle
pub fn get_click_points(rectangles: &[Rectangle]) -> Vec<Point> {
    rectangles.iter().map(Rectangle::center).collect()
}
