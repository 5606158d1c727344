//! Target location in captured frames
//!
//! This module provides the matching core used by the automation agent:
//! - Saturating channel shifts and an HSV color-range filter
//! - Morphological edge extraction (erode, dilate, Canny)
//! - Template correlation matching with duplicate clustering and click points
//! - Keypoint correspondence with ratio-test filtering and a centroid estimate

pub mod channel;
pub mod color_filter;
pub mod config;
pub mod edge_filter;
pub mod features;
pub mod grouping;
pub mod matcher;
pub mod needle;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export main types and functions
pub use channel::shift_channel;
pub use color_filter::apply_color_range_filter;
pub use config::{
    ColorRangeFilterConfig, EdgeFilterConfig, MatchConfig, create_game_object_config,
    create_ui_config,
};
pub use edge_filter::apply_edge_filter;
pub use features::{
    Correspondence, DEFAULT_PATCH_SIZE, FeatureMatcher, Keypoint, KeypointMatches, centroid,
    passes_ratio_test,
};
pub use grouping::group_rectangles;
pub use matcher::{MatchMethod, TemplateMatcher};
pub use needle::Needle;
pub use types::{MatchResult, Point, Rectangle, get_click_points};
