use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// The error type for matching, filtering and config loading.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Failed to load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to save image {path:?}: {source}")]
    ImageSave {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error(
        "Needle {needle_width}x{needle_height} does not fit in frame {frame_width}x{frame_height}"
    )]
    NeedleLargerThanFrame {
        needle_width: u32,
        needle_height: u32,
        frame_width: u32,
        frame_height: u32,
    },

    #[error("Could not build correspondence index: {reason}")]
    MatchIndex { reason: String },

    #[error("Failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl VisionError {
    /// True when keypoint matching was attempted but no index could be built.
    pub fn is_match_index_failure(&self) -> bool {
        matches!(self, VisionError::MatchIndex { .. })
    }
}
