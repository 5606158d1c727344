pub mod error;
pub mod vision;

pub use error::{VisionError, VisionResult};
pub use vision::{FeatureMatcher, MatchMethod, TemplateMatcher};
