//! Checkerboard camera calibration toolkit.
//!
//! This crate re-exports the workspace crates under one roof:
//! - `chesscal::core`: board template, input discovery, frame sampling,
//!   reprojection statistics and the `.npz` archive.
//! - `chesscal::print`: printable PDF targets with colored orientation corners.
//! - `chesscal::cv` (feature `cv`, on by default): OpenCV-backed frame
//!   extraction, corner review and calibration.
//!
//! The `chesscal` binary (features `cli` + `cv`) wraps the four pipelines as
//! subcommands.
//!
//! ## Quickstart
//!
//! ```no_run
//! use chesscal::{generate_target, TargetConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = generate_target(&TargetConfig::default())?;
//! println!("{:?}", summary.layout.inner_corners());
//! # Ok(())
//! # }
//! ```

pub use chesscal_core as core;
pub use chesscal_print as print;

#[cfg(feature = "cv")]
pub use chesscal_cv as cv;

pub use chesscal_core::{BoardSpec, CalibrationArchive, CalibrationQuality, JsonConfig};
pub use chesscal_print::{generate_target, TargetConfig, TargetSummary};

#[cfg(feature = "cv")]
pub use chesscal_cv::{
    calibrate, extract_frames, visualize_corners, CalibrateConfig, CalibrationOutcome,
    ExtractConfig, VisualizeConfig,
};
