//! Configuration for matching and preprocessing filters
//!
//! The filter configs mirror the sliders of the tuning GUI. They are plain
//! values: the GUI (or a JSON file) builds one and hands it in.

use crate::error::{VisionError, VisionResult};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Score threshold, compared in the direction of the matcher's method
    pub threshold: f32,
    /// Maximum number of clustered rectangles to return
    pub max_results: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            max_results: 10,
        }
    }
}

/// Configuration preset for UI elements (buttons, menus)
pub fn create_ui_config() -> MatchConfig {
    MatchConfig {
        threshold: 0.9,
        max_results: 1,
    }
}

/// Configuration preset for game objects (items, characters)
pub fn create_game_object_config() -> MatchConfig {
    MatchConfig {
        threshold: 0.7,
        max_results: 10,
    }
}

/// HSV range filter with saturation/value shifts.
///
/// Hue uses the 8-bit 0..=179 scale, saturation and value 0..=255.
/// A min above its max is allowed and simply masks out everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorRangeFilterConfig {
    pub h_min: u8,
    pub s_min: u8,
    pub v_min: u8,
    pub h_max: u8,
    pub s_max: u8,
    pub v_max: u8,
    pub s_add: u8,
    pub s_sub: u8,
    pub v_add: u8,
    pub v_sub: u8,
}

impl Default for ColorRangeFilterConfig {
    fn default() -> Self {
        Self {
            h_min: 0,
            s_min: 0,
            v_min: 0,
            h_max: 179,
            s_max: 255,
            v_max: 255,
            s_add: 0,
            s_sub: 0,
            v_add: 0,
            v_sub: 0,
        }
    }
}

impl ColorRangeFilterConfig {
    pub fn lower(&self) -> [u8; 3] {
        [self.h_min, self.s_min, self.v_min]
    }

    pub fn upper(&self) -> [u8; 3] {
        [self.h_max, self.s_max, self.v_max]
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> VisionResult<Self> {
        load_json(path.as_ref())
    }
}

/// Erode/dilate/Canny settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeFilterConfig {
    /// Side of the square structuring element (1..=30)
    pub kernel_size: u32,
    /// Erosion passes (1..=5)
    pub erode_iter: u32,
    /// Dilation passes (1..=5)
    pub dilate_iter: u32,
    /// Weak-edge hysteresis threshold (0..=200)
    pub canny1: u32,
    /// Strong-edge hysteresis threshold (0..=500), expected >= canny1
    pub canny2: u32,
}

impl Default for EdgeFilterConfig {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            erode_iter: 1,
            dilate_iter: 1,
            canny1: 100,
            canny2: 200,
        }
    }
}

impl EdgeFilterConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> VisionResult<Self> {
        load_json(path.as_ref())
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> VisionResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| VisionError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| VisionError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}
