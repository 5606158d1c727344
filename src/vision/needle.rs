//! Reference image ("needle") loaded once per matcher

use crate::error::{VisionError, VisionResult};
use image::RgbImage;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct Needle {
    image: RgbImage,
    path: Option<PathBuf>,
}

impl Needle {
    /// Decode a color image from disk. Failing to decode is fatal for the matcher.
    pub fn open(path: impl AsRef<Path>) -> VisionResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| VisionError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();

        log::debug!(
            "📐 Loaded needle {:?} ({}x{})",
            path,
            image.width(),
            image.height()
        );

        Ok(Self {
            image,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn from_image(image: RgbImage) -> Self {
        Self { image, path: None }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Name for log lines
    pub fn display_name(&self) -> String {
        match &self.path {
            Some(path) => format!(
                "needle-{}-[{}x{}]",
                path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed"),
                self.width(),
                self.height()
            ),
            None => format!("needle-[{}x{}]", self.width(), self.height()),
        }
    }
}
