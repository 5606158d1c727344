mod args;
mod overlay;

use args::{Args, Command, FeatureArgs, FindArgs, InputArgs};
use clap::Parser;
use image::RgbImage;
use serde_json::json;
use std::path::Path;
use target_vision::vision::{
    ColorRangeFilterConfig, EdgeFilterConfig, FeatureMatcher, Needle, TemplateMatcher,
    apply_color_range_filter, apply_edge_filter,
};
use target_vision::{VisionError, VisionResult};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let outcome = match &args.command {
        Command::Find(find) => run_find(find),
        Command::Features(features) => run_features(features),
    };

    if let Err(e) = outcome {
        log::error!("❌ {e}");
        std::process::exit(1);
    }
}

fn run_find(args: &FindArgs) -> VisionResult<()> {
    let matcher = TemplateMatcher::open(&args.input.needle, args.method.into())?;
    let frame = load_frame(&args.input)?;
    let config = args.match_config();

    let result = matcher.find_with_config(&frame, &config)?;
    let points = result.click_points();
    log::info!(
        "🎯 {} matches for {} ({} threshold {})",
        result.len(),
        matcher.needle().display_name(),
        matcher.method().name(),
        config.threshold
    );

    if let Some(out) = &args.input.annotate {
        let mut canvas = frame;
        overlay::draw_rectangles(&mut canvas, &result.rectangles);
        overlay::draw_crosshairs(&mut canvas, &points);
        save(&canvas, out)?;
    }

    println!(
        "{}",
        json!({
            "rectangles": result.rectangles,
            "truncated": result.truncated,
            "click_points": points,
        })
    );
    Ok(())
}

fn run_features(args: &FeatureArgs) -> VisionResult<()> {
    let matcher = FeatureMatcher::new(Needle::open(&args.input.needle)?);
    let frame = load_frame(&args.input)?;

    let matches = matcher.match_keypoints(&frame, args.patch_size)?;
    let center = matches.center();
    log::info!(
        "🔑 {} needle / {} frame keypoints, {} good correspondences",
        matches.needle_keypoints.len(),
        matches.haystack_keypoints.len(),
        matches.good.len()
    );

    if let Some(out) = &args.input.annotate {
        let mut canvas = frame;
        overlay::draw_crosshairs(&mut canvas, &matches.points);
        if let Some(c) = center {
            overlay::draw_crosshairs(&mut canvas, &[c]);
        }
        save(&canvas, out)?;
    }

    println!(
        "{}",
        json!({
            "good_matches": matches.good.len(),
            "points": matches.points,
            "centroid": center,
        })
    );
    Ok(())
}

/// Load the frame and run the optional preprocessing filters on it
fn load_frame(input: &InputArgs) -> VisionResult<RgbImage> {
    let mut frame = image::open(&input.frame)
        .map_err(|source| VisionError::ImageLoad {
            path: input.frame.clone(),
            source,
        })?
        .to_rgb8();

    if let Some(path) = &input.hsv_config {
        let config = ColorRangeFilterConfig::from_json_file(path)?;
        frame = apply_color_range_filter(&frame, &config);
    }
    if let Some(path) = &input.edge_config {
        let config = EdgeFilterConfig::from_json_file(path)?;
        frame = apply_edge_filter(&frame, &config);
    }
    Ok(frame)
}

fn save(image: &RgbImage, path: &Path) -> VisionResult<()> {
    image.save(path).map_err(|source| VisionError::ImageSave {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("✅ Annotated frame saved to {}", path.display());
    Ok(())
}
