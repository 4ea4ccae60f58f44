//! Corner review: annotate every image so detections can be checked by eye.
//!
//! Detected boards are written as `detected_<name>` with the corners drawn
//! on top; images where the board was not found are written untouched as
//! `failed_<name>`.

use std::fs;
use std::path::{Path, PathBuf};

use chesscal_core::{
    discover_files, BoardSpec, ConfigError, DiscoverError, JsonConfig, SubPixParams,
    IMAGE_EXTENSIONS,
};
use opencv::core::Mat;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::detect::{self, Detection};

#[derive(thiserror::Error, Debug)]
pub enum VisualizeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error("cannot create output directory '{}': {source}", dir.display())]
    OutputDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("data/video_calibration")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/verification_images/video_method_verification")
}

fn default_refine() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualizeConfig {
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub board: BoardSpec,
    /// Refine corners to sub-pixel precision before drawing them.
    #[serde(default = "default_refine")]
    pub refine: bool,
    #[serde(default)]
    pub subpix: SubPixParams,
}

impl Default for VisualizeConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            output_dir: default_output_dir(),
            board: BoardSpec::default(),
            refine: default_refine(),
            subpix: SubPixParams::default(),
        }
    }
}

impl JsonConfig for VisualizeConfig {}

impl VisualizeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.board.validate()?;
        self.subpix.validate()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOutcome {
    Detected,
    NotDetected,
    Unreadable,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageReview {
    pub source: PathBuf,
    pub outcome: ImageOutcome,
    /// Annotated copy, when one was written.
    pub written: Option<PathBuf>,
}

impl ImageReview {
    fn unreadable(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            outcome: ImageOutcome::Unreadable,
            written: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VisualizeReport {
    pub output_dir: PathBuf,
    pub images: Vec<ImageReview>,
}

impl VisualizeReport {
    pub fn count(&self, outcome: ImageOutcome) -> usize {
        self.images.iter().filter(|i| i.outcome == outcome).count()
    }
}

/// Output name for an annotated copy of `source`.
pub fn review_file_name(source: &Path, outcome: ImageOutcome) -> Option<String> {
    let prefix = match outcome {
        ImageOutcome::Detected => "detected",
        ImageOutcome::NotDetected => "failed",
        ImageOutcome::Unreadable => return None,
    };
    Some(format!("{prefix}_{}", detect::file_name(source)))
}

/// Detect, annotate and save every image found in `cfg.image_dir`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(cfg), fields(dir = %cfg.image_dir.display()))
)]
pub fn visualize_corners(cfg: &VisualizeConfig) -> Result<VisualizeReport, VisualizeError> {
    cfg.validate()?;
    log::info!(
        "starting corner detection for grid size ({}, {})",
        cfg.board.cols,
        cfg.board.rows
    );

    let paths = discover_files(&cfg.image_dir, IMAGE_EXTENSIONS)?;
    log::info!("found {} images, processing", paths.len());

    if !cfg.output_dir.exists() {
        fs::create_dir_all(&cfg.output_dir).map_err(|source| VisualizeError::OutputDir {
            dir: cfg.output_dir.clone(),
            source,
        })?;
        log::info!("created directory {}", cfg.output_dir.display());
    }

    let mut report = VisualizeReport {
        output_dir: cfg.output_dir.clone(),
        images: Vec::with_capacity(paths.len()),
    };
    for path in paths {
        let img = detect::read_color(&path);
        report.images.push(review_image(cfg, &path, img));
    }

    log::info!(
        "processing complete: {} detected, {} failed, {} unreadable; check '{}'",
        report.count(ImageOutcome::Detected),
        report.count(ImageOutcome::NotDetected),
        report.count(ImageOutcome::Unreadable),
        cfg.output_dir.display()
    );
    Ok(report)
}

/// Review one decoded image. OpenCV failures are logged and the image is
/// recorded as unreadable so the remaining images are still processed.
fn review_image(cfg: &VisualizeConfig, path: &Path, img: Option<Mat>) -> ImageReview {
    let name = detect::file_name(path);
    let Some(img) = img else {
        log::warn!("could not read image {name}, skipping");
        return ImageReview::unreadable(path);
    };
    annotate(cfg, path, img).unwrap_or_else(|err| {
        log::warn!("OpenCV failed on {name}, skipping: {err}");
        ImageReview::unreadable(path)
    })
}

fn annotate(cfg: &VisualizeConfig, path: &Path, mut img: Mat) -> opencv::Result<ImageReview> {
    let name = detect::file_name(path);
    let subpix = cfg.refine.then_some(&cfg.subpix);
    let outcome = match detect::locate_corners(&img, &cfg.board, subpix)? {
        Detection::Found(corners) => {
            log::info!("  [SUCCESS] found corners in {name}");
            detect::draw_corners(&mut img, &cfg.board, &corners)?;
            ImageOutcome::Detected
        }
        Detection::NotFound => {
            log::info!("  [FAILURE] could not find corners in {name}");
            ImageOutcome::NotDetected
        }
    };

    let mut written = None;
    if let Some(out_name) = review_file_name(path, outcome) {
        let out = cfg.output_dir.join(out_name);
        if detect::write_image(&out, &img)? {
            written = Some(out);
        } else {
            log::warn!("could not write {}", out.display());
        }
    }
    Ok(ImageReview {
        source: path.to_path_buf(),
        outcome,
        written,
    })
}
