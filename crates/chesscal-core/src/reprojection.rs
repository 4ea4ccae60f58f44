//! Reprojection error statistics and calibration quality classes.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Advisory quality class derived from the mean reprojection error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationQuality {
    /// Below half a pixel.
    High,
    /// Below one pixel.
    Acceptable,
    Low,
}

impl CalibrationQuality {
    pub const HIGH_BELOW_PX: f64 = 0.5;
    pub const ACCEPTABLE_BELOW_PX: f64 = 1.0;

    pub fn classify(mean_error_px: f64) -> Self {
        if mean_error_px < Self::HIGH_BELOW_PX {
            Self::High
        } else if mean_error_px < Self::ACCEPTABLE_BELOW_PX {
            Self::Acceptable
        } else {
            Self::Low
        }
    }

    /// One-line verdict for console reports.
    pub fn verdict(&self) -> &'static str {
        match self {
            Self::High => "This is a high-quality calibration.",
            Self::Acceptable => "This is a decent calibration.",
            Self::Low => "This calibration quality is low. Consider retaking photos.",
        }
    }
}

impl fmt::Display for CalibrationQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Acceptable => "acceptable",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StatsError {
    #[error("no images to aggregate")]
    Empty,
    #[error("point count mismatch (detected {detected}, projected {projected})")]
    LengthMismatch { detected: usize, projected: usize },
    #[error("non-finite reprojection error for image {index}")]
    NonFinite { index: usize },
}

/// Mean Euclidean distance between paired detected and projected points.
pub fn mean_point_distance(
    detected: &[Point2<f64>],
    projected: &[Point2<f64>],
) -> Result<f64, StatsError> {
    if detected.len() != projected.len() {
        return Err(StatsError::LengthMismatch {
            detected: detected.len(),
            projected: projected.len(),
        });
    }
    if detected.is_empty() {
        return Err(StatsError::Empty);
    }
    let sum: f64 = detected
        .iter()
        .zip(projected)
        .map(|(d, p)| (d - p).norm())
        .sum();
    Ok(sum / detected.len() as f64)
}

/// Per-image reprojection errors and their uniform average.
///
/// Every image contributes one scalar regardless of its point count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReprojectionStats {
    pub per_image: Vec<f64>,
    pub mean: f64,
    pub quality: CalibrationQuality,
}

impl ReprojectionStats {
    pub fn from_per_image(per_image: Vec<f64>) -> Result<Self, StatsError> {
        if per_image.is_empty() {
            return Err(StatsError::Empty);
        }
        if let Some(index) = per_image.iter().position(|e| !e.is_finite() || *e < 0.0) {
            return Err(StatsError::NonFinite { index });
        }
        let mean = per_image.iter().sum::<f64>() / per_image.len() as f64;
        Ok(Self {
            quality: CalibrationQuality::classify(mean),
            per_image,
            mean,
        })
    }

    /// Index and value of the worst image, useful for pruning bad frames.
    pub fn worst(&self) -> Option<(usize, f64)> {
        self.per_image
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}
