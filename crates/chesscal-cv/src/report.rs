//! JSON report written next to the `.npz` archive.

use std::fs;
use std::path::{Path, PathBuf};

use chesscal_core::{BoardSpec, CalibrationArchive, CalibrationQuality};
use serde::{Deserialize, Serialize};

use crate::calibrate::CalibrationOutcome;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageError {
    pub path: PathBuf,
    pub mean_error_px: f64,
}

/// Human-readable summary of one calibration run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub board: BoardSpec,
    /// `[width, height]` in pixels.
    pub image_size: [u32; 2],
    pub used_images: Vec<PathBuf>,
    pub rejected_images: Vec<PathBuf>,
    pub unreadable_images: Vec<PathBuf>,
    pub per_image: Vec<ImageError>,
    pub mean_error_px: f64,
    /// RMS reported by the solver, in pixels.
    pub rms_px: f64,
    pub quality: CalibrationQuality,
    pub calibration: CalibrationArchive,
}

impl CalibrationReport {
    pub fn from_outcome(board: &BoardSpec, outcome: &CalibrationOutcome) -> Self {
        let per_image = outcome
            .used_images
            .iter()
            .zip(&outcome.stats.per_image)
            .map(|(path, &err)| ImageError {
                path: path.clone(),
                mean_error_px: err,
            })
            .collect();
        Self {
            board: *board,
            image_size: [outcome.image_size.0, outcome.image_size.1],
            used_images: outcome.used_images.clone(),
            rejected_images: outcome.rejected_images.clone(),
            unreadable_images: outcome.unreadable_images.clone(),
            per_image,
            mean_error_px: outcome.stats.mean,
            rms_px: outcome.rms,
            quality: outcome.stats.quality,
            calibration: outcome.archive.clone(),
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
