//! Keypoint matching: ORB-style features, an LSH index and Lowe's ratio test

pub mod lsh;
pub mod matcher;
pub mod orb;

pub use matcher::{
    Correspondence, DEFAULT_PATCH_SIZE, FeatureMatcher, KeypointMatches, centroid, passes_ratio_test,
};
pub use orb::{Descriptor, Keypoint, OrbDetector};
