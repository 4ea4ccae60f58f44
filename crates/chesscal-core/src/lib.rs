//! Core types shared by the `chesscal-*` calibration utilities.
//!
//! Everything here is plain data and bookkeeping; it does not depend on
//! OpenCV or any image type. The pipelines that do live in `chesscal-cv`
//! (frame extraction, corner review, calibration) and `chesscal-print`
//! (printable targets).

mod archive;
mod board;
mod config;
mod discover;
mod logger;
mod reprojection;
mod sampling;

pub use archive::{ArchiveError, CalibrationArchive, DIST_COEFF_COUNT};
pub use board::{BoardError, BoardSpec};
pub use config::{ConfigError, JsonConfig, SubPixParams};
pub use discover::{
    discover_files, has_extension, DiscoverError, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS,
};
pub use reprojection::{mean_point_distance, CalibrationQuality, ReprojectionStats, StatsError};
pub use sampling::{frame_file_name, sample_frame_indices};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
