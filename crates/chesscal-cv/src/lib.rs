//! OpenCV-backed calibration pipelines.
//!
//! - [`extract_frames`]: evenly spaced stills from every video in a directory.
//! - [`visualize_corners`]: annotated copies of every image for manual review.
//! - [`calibrate`]: intrinsics, distortion and poses saved as an `.npz` archive.
//!
//! Each pipeline takes one explicit config struct (loadable from JSON through
//! [`chesscal_core::JsonConfig`]) and returns a report of what happened to
//! every input. Unreadable inputs are skipped with a warning; only a missing
//! input set or, for the calibrator, a failed solve aborts the run.
//!
//! ```no_run
//! use chesscal_cv::{calibrate, CalibrateConfig};
//!
//! # fn main() -> Result<(), chesscal_cv::CalibrateError> {
//! let outcome = calibrate(&CalibrateConfig::default())?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

mod calibrate;
mod detect;
mod frames;
mod report;
mod visualize;

pub use calibrate::{
    calibrate, CalibrateConfig, CalibrateError, CalibrationOutcome, CorrespondenceSet,
};
pub use frames::{extract_frames, ExtractConfig, ExtractReport, FrameError, VideoReport};
pub use report::{CalibrationReport, ImageError, ReportError};
pub use visualize::{
    review_file_name, visualize_corners, ImageOutcome, ImageReview, VisualizeConfig,
    VisualizeError, VisualizeReport,
};
