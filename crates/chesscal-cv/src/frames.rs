//! Frame extraction: pull evenly spaced stills out of every video in a
//! directory so they can be fed to the calibrator.

use std::fs;
use std::path::{Path, PathBuf};

use chesscal_core::{
    discover_files, frame_file_name, sample_frame_indices, ConfigError, DiscoverError, JsonConfig,
    VIDEO_EXTENSIONS,
};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::detect;

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
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

fn default_video_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/video_calibration")
}

fn default_frames_per_video() -> u64 {
    70
}

fn default_extensions() -> Vec<String> {
    VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_frames_per_video")]
    pub frames_per_video: u64,
    /// Accepted video extensions, matched case-insensitively.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            video_dir: default_video_dir(),
            output_dir: default_output_dir(),
            frames_per_video: default_frames_per_video(),
            extensions: default_extensions(),
        }
    }
}

impl JsonConfig for ExtractConfig {}

impl ExtractConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_per_video == 0 {
            return Err(ConfigError::Invalid(
                "frames_per_video must be at least 1".into(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid("no video extensions given".into()));
        }
        Ok(())
    }
}

/// What happened to one video.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VideoReport {
    pub path: PathBuf,
    pub total_frames: u64,
    /// Frame positions that were scheduled for extraction.
    pub planned: Vec<u64>,
    pub saved: Vec<PathBuf>,
    /// Set when the whole video was skipped.
    pub skipped_reason: Option<String>,
}

impl VideoReport {
    fn skipped(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            skipped_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn failed_reads(&self) -> usize {
        self.planned.len() - self.saved.len()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtractReport {
    pub output_dir: PathBuf,
    pub videos: Vec<VideoReport>,
}

impl ExtractReport {
    pub fn frames_saved(&self) -> usize {
        self.videos.iter().map(|v| v.saved.len()).sum()
    }

    pub fn videos_skipped(&self) -> usize {
        self.videos
            .iter()
            .filter(|v| v.skipped_reason.is_some())
            .count()
    }
}

/// Extract `cfg.frames_per_video` stills from every video in `cfg.video_dir`.
///
/// Videos that cannot be opened or report no frames are skipped with a
/// warning; individual frames that fail to decode are skipped the same way.
/// Only a missing or empty input directory is an error.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(cfg), fields(dir = %cfg.video_dir.display()))
)]
pub fn extract_frames(cfg: &ExtractConfig) -> Result<ExtractReport, FrameError> {
    cfg.validate()?;
    let videos = discover_files(&cfg.video_dir, cfg.extensions.as_slice())?;
    log::info!("found {} videos", videos.len());

    if !cfg.output_dir.exists() {
        fs::create_dir_all(&cfg.output_dir).map_err(|source| FrameError::OutputDir {
            dir: cfg.output_dir.clone(),
            source,
        })?;
        log::info!("created directory {}", cfg.output_dir.display());
    }

    let mut report = ExtractReport {
        output_dir: cfg.output_dir.clone(),
        videos: Vec::with_capacity(videos.len()),
    };
    for path in &videos {
        report.videos.push(extract_video(cfg, path));
    }

    log::info!(
        "extraction complete: {} frames saved to '{}'",
        report.frames_saved(),
        cfg.output_dir.display()
    );
    Ok(report)
}

fn open_capture(path: &Path) -> Result<VideoCapture, String> {
    let name = path
        .to_str()
        .ok_or_else(|| "path is not valid UTF-8".to_string())?;
    let cap = VideoCapture::from_file(name, videoio::CAP_ANY).map_err(|e| e.to_string())?;
    match cap.is_opened() {
        Ok(true) => Ok(cap),
        Ok(false) => Err("could not open video".into()),
        Err(e) => Err(e.to_string()),
    }
}

fn extract_video(cfg: &ExtractConfig, path: &Path) -> VideoReport {
    let display = path.display();
    log::info!("processing video {display}");

    let mut cap = match open_capture(path) {
        Ok(cap) => cap,
        Err(reason) => {
            log::warn!("  {reason}: {display}, skipping");
            return VideoReport::skipped(path, reason);
        }
    };

    let total = match cap.get(videoio::CAP_PROP_FRAME_COUNT) {
        Ok(n) if n.is_finite() && n >= 1.0 => n as u64,
        Ok(_) => {
            log::warn!("  video reports no frames: {display}, skipping");
            return VideoReport::skipped(path, "video reports no frames");
        }
        Err(e) => {
            log::warn!("  cannot read frame count of {display}: {e}, skipping");
            return VideoReport::skipped(path, e.to_string());
        }
    };
    if total < cfg.frames_per_video {
        log::info!(
            "  video has only {total} frames, fewer than the {} requested; extracting all of them",
            cfg.frames_per_video
        );
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let planned = sample_frame_indices(total, cfg.frames_per_video);
    log::info!("  extracting {} frames", planned.len());

    let mut saved = Vec::with_capacity(planned.len());
    let mut frame = Mat::default();
    for (i, &position) in planned.iter().enumerate() {
        match read_frame_at(&mut cap, position, &mut frame) {
            Ok(true) => {}
            Ok(false) => {
                log::warn!("  could not read frame at position {position}");
                continue;
            }
            Err(e) => {
                log::warn!("  could not read frame at position {position}: {e}");
                continue;
            }
        }
        let out = cfg.output_dir.join(frame_file_name(&stem, i + 1));
        match detect::write_image(&out, &frame) {
            Ok(true) => saved.push(out),
            Ok(false) => log::warn!("  could not write {}", out.display()),
            Err(e) => log::warn!("  could not write {}: {e}", out.display()),
        }
    }

    if let Err(e) = cap.release() {
        log::warn!("  releasing {display} failed: {e}");
    }
    log::info!("  saved {} frames from {display}", saved.len());

    VideoReport {
        path: path.to_path_buf(),
        total_frames: total,
        planned,
        saved,
        skipped_reason: None,
    }
}

fn read_frame_at(cap: &mut VideoCapture, position: u64, frame: &mut Mat) -> opencv::Result<bool> {
    cap.set(videoio::CAP_PROP_POS_FRAMES, position as f64)?;
    Ok(cap.read(frame)? && !frame.empty())
}
