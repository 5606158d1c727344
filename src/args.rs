use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use target_vision::vision::{MatchConfig, MatchMethod, create_game_object_config, create_ui_config};

#[derive(Debug, Parser)]
#[command(name = "target-vision", version, about = "Locate click targets in a captured frame")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Template correlation search with clustered rectangles
    Find(FindArgs),
    /// Keypoint correspondence search with a centroid estimate
    Features(FeatureArgs),
}

/// Inputs shared by both searches
#[derive(Debug, ClapArgs)]
pub struct InputArgs {
    /// Reference image to look for
    #[arg(long)]
    pub needle: PathBuf,
    /// Captured frame to search in
    #[arg(long)]
    pub frame: PathBuf,
    /// JSON color-range filter applied to the frame first
    #[arg(long)]
    pub hsv_config: Option<PathBuf>,
    /// JSON edge filter applied to the frame after the color filter
    #[arg(long)]
    pub edge_config: Option<PathBuf>,
    /// Write the frame with results drawn on it
    #[arg(long)]
    pub annotate: Option<PathBuf>,
}

#[derive(Debug, ClapArgs)]
pub struct FindArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[arg(long, value_enum, default_value_t = Method::Ccoeff)]
    pub method: Method,
    #[arg(long, value_enum, default_value_t = Preset::Default)]
    pub preset: Preset,
    /// Overrides the preset threshold
    #[arg(long)]
    pub threshold: Option<f32>,
    /// Overrides the preset result budget
    #[arg(long)]
    pub max_results: Option<usize>,
}

impl FindArgs {
    pub fn match_config(&self) -> MatchConfig {
        let mut config = match self.preset {
            Preset::Default => MatchConfig::default(),
            Preset::Ui => create_ui_config(),
            Preset::GameObject => create_game_object_config(),
        };
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(max_results) = self.max_results {
            config.max_results = max_results;
        }
        config
    }
}

#[derive(Debug, ClapArgs)]
pub struct FeatureArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Descriptor patch diameter in pixels
    #[arg(long, default_value_t = target_vision::vision::DEFAULT_PATCH_SIZE)]
    pub patch_size: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Method {
    /// Normalized correlation coefficient, higher is better
    Ccoeff,
    /// Normalized squared difference, lower is better
    Sqdiff,
}

impl From<Method> for MatchMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Ccoeff => MatchMethod::CorrelationCoefficientNormed,
            Method::Sqdiff => MatchMethod::SquaredDifferenceNormed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Preset {
    Default,
    Ui,
    GameObject,
}
