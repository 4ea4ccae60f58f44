//! Camera calibration from a directory of checkerboard images.
//!
//! Every image is searched for the full inner-corner grid. Accepted
//! detections are refined to sub-pixel precision and paired with the
//! board's planar template; OpenCV then solves for the intrinsics, the
//! distortion coefficients and one pose per accepted image. The result is
//! scored by reprojecting the template through each pose and saved as an
//! `.npz` archive.

use std::fmt;
use std::path::{Path, PathBuf};

use chesscal_core::{
    discover_files, mean_point_distance, ArchiveError, BoardSpec, CalibrationArchive,
    ConfigError, DiscoverError, JsonConfig, ReprojectionStats, StatsError, SubPixParams,
    DIST_COEFF_COUNT, IMAGE_EXTENSIONS,
};
use opencv::{
    calib3d,
    core::{self, Mat, Point2f, Point3f, Size, TermCriteria, Vector},
    prelude::*,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::detect::{self, Detection};
use crate::report::{CalibrationReport, ReportError};

#[derive(thiserror::Error, Debug)]
pub enum CalibrateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error("no checkerboard detected in any of the {examined} images")]
    NoDetections { examined: usize },
    #[error("calibration solve failed: {0}")]
    Solve(String),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("data/video_calibration")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data/video_calibration_data.npz")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrateConfig {
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    #[serde(default)]
    pub board: BoardSpec,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Optional pretty JSON report of the run.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
    #[serde(default)]
    pub subpix: SubPixParams,
}

impl Default for CalibrateConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            board: BoardSpec::default(),
            output_path: default_output_path(),
            report_path: None,
            subpix: SubPixParams::default(),
        }
    }
}

impl JsonConfig for CalibrateConfig {}

impl CalibrateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.board.validate()?;
        self.subpix.validate()
    }
}

/// Paired 3-D template points and refined 2-D detections, one entry per
/// accepted image.
pub struct CorrespondenceSet {
    object_points: Vector<Vector<Point3f>>,
    image_points: Vector<Vector<Point2f>>,
    sources: Vec<PathBuf>,
}

impl Default for CorrespondenceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrespondenceSet {
    pub fn new() -> Self {
        Self {
            object_points: Vector::new(),
            image_points: Vector::new(),
            sources: Vec::new(),
        }
    }

    pub fn push(&mut self, template: &Vector<Point3f>, corners: Vector<Point2f>, source: &Path) {
        self.object_points.push(template.clone());
        self.image_points.push(corners);
        self.sources.push(source.to_path_buf());
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

/// Everything a calibration run produced.
#[derive(Clone, Debug)]
pub struct CalibrationOutcome {
    pub archive: CalibrationArchive,
    pub stats: ReprojectionStats,
    /// RMS reprojection error reported by the solver.
    pub rms: f64,
    pub used_images: Vec<PathBuf>,
    pub rejected_images: Vec<PathBuf>,
    pub unreadable_images: Vec<PathBuf>,
    /// `(width, height)` of the first decoded image.
    pub image_size: (u32, u32),
}

impl CalibrationOutcome {
    pub fn successful_detections(&self) -> usize {
        self.used_images.len()
    }
}

impl fmt::Display for CalibrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Camera Matrix:")?;
        for row in &self.archive.camera_matrix {
            writeln!(f, "  [{:12.4} {:12.4} {:12.4}]", row[0], row[1], row[2])?;
        }
        let dist: Vec<String> = self
            .archive
            .dist_coeffs
            .iter()
            .map(|d| format!("{d:.6}"))
            .collect();
        writeln!(f, "Distortion Coefficients: [{}]", dist.join(", "))?;
        writeln!(f, "Image size: {}x{}", self.image_size.0, self.image_size.1)?;
        writeln!(f, "Used {} successful detections.", self.successful_detections())?;
        writeln!(f, "Solver RMS: {:.4} pixels", self.rms)?;
        writeln!(f, "Mean Re-projection Error: {:.4} pixels", self.stats.mean)?;
        write!(f, "{}", self.stats.quality.verdict())
    }
}

/// Calibrate from every image in `cfg.image_dir` and save the archive.
///
/// Nothing is written unless the solve succeeds.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(cfg), fields(dir = %cfg.image_dir.display()))
)]
pub fn calibrate(cfg: &CalibrateConfig) -> Result<CalibrationOutcome, CalibrateError> {
    cfg.validate()?;
    let paths = discover_files(&cfg.image_dir, IMAGE_EXTENSIONS)?;
    log::info!(
        "found {} images, starting corner detection for grid ({}, {})",
        paths.len(),
        cfg.board.cols,
        cfg.board.rows
    );

    let template = detect::object_template(&cfg.board);
    let mut set = CorrespondenceSet::new();
    let mut rejected = Vec::new();
    let mut unreadable = Vec::new();
    let mut image_size: Option<Size> = None;

    for path in &paths {
        let name = detect::file_name(path);
        let Some(img) = detect::read_color(path) else {
            log::warn!("could not read image {name}, skipping");
            unreadable.push(path.clone());
            continue;
        };
        let size = *image_size.get_or_insert(Size::new(img.cols(), img.rows()));
        if img.cols() != size.width || img.rows() != size.height {
            log::warn!(
                "{name} is {}x{}, expected {}x{}",
                img.cols(),
                img.rows(),
                size.width,
                size.height
            );
        }

        match examine(&img, cfg, &name) {
            Some(Detection::Found(corners)) => {
                log::info!("  [SUCCESS] found corners in {name}");
                set.push(&template, corners, path);
            }
            Some(Detection::NotFound) => {
                log::info!("  [FAILURE] could not find corners in {name}");
                rejected.push(path.clone());
            }
            None => unreadable.push(path.clone()),
        }
    }

    let Some(image_size) = image_size.filter(|_| !set.is_empty()) else {
        return Err(CalibrateError::NoDetections {
            examined: paths.len(),
        });
    };
    log::info!("calibrating from {} detections", set.len());

    let solution = solve(&set, image_size)?;
    let stats = reprojection_stats(&set, &template, &solution)?;
    log::info!(
        "mean reprojection error {:.4} px ({} quality)",
        stats.mean,
        stats.quality
    );
    if let Some((index, err)) = stats.worst() {
        log::debug!("worst image {} at {err:.4} px", set.sources()[index].display());
    }

    let archive = solution.to_archive()?;
    archive.write_npz(&cfg.output_path)?;
    log::info!("calibration data saved to {}", cfg.output_path.display());

    let outcome = CalibrationOutcome {
        archive,
        stats,
        rms: solution.rms,
        used_images: set.sources().to_vec(),
        rejected_images: rejected,
        unreadable_images: unreadable,
        image_size: (image_size.width as u32, image_size.height as u32),
    };

    if let Some(report_path) = &cfg.report_path {
        CalibrationReport::from_outcome(&cfg.board, &outcome).write_json(report_path)?;
        log::info!("report saved to {}", report_path.display());
    }
    Ok(outcome)
}

/// Detect and refine corners in one image; `None` when OpenCV fails on it.
fn examine(img: &Mat, cfg: &CalibrateConfig, name: &str) -> Option<Detection> {
    match detect::locate_corners(img, &cfg.board, Some(&cfg.subpix)) {
        Ok(detection) => Some(detection),
        Err(err) => {
            log::warn!("OpenCV failed on {name}, skipping: {err}");
            None
        }
    }
}

struct Solution {
    rms: f64,
    camera_matrix: Mat,
    dist_coeffs: Mat,
    rvecs: Vector<Mat>,
    tvecs: Vector<Mat>,
}

fn solve(set: &CorrespondenceSet, image_size: Size) -> Result<Solution, CalibrateError> {
    let mut camera_matrix = Mat::default();
    let mut dist_coeffs = Mat::default();
    let mut rvecs = Vector::<Mat>::new();
    let mut tvecs = Vector::<Mat>::new();
    let criteria = TermCriteria {
        typ: core::TermCriteria_COUNT + core::TermCriteria_EPS,
        max_count: 30,
        epsilon: f64::EPSILON,
    };

    let rms = calib3d::calibrate_camera(
        &set.object_points,
        &set.image_points,
        image_size,
        &mut camera_matrix,
        &mut dist_coeffs,
        &mut rvecs,
        &mut tvecs,
        0,
        criteria,
    )
    .map_err(|e| CalibrateError::Solve(e.to_string()))?;

    if !rms.is_finite() {
        return Err(CalibrateError::Solve(format!("non-finite RMS {rms}")));
    }
    if rvecs.len() != set.len() || tvecs.len() != set.len() {
        return Err(CalibrateError::Solve(format!(
            "expected {} poses, solver returned {} rotations and {} translations",
            set.len(),
            rvecs.len(),
            tvecs.len()
        )));
    }
    Ok(Solution {
        rms,
        camera_matrix,
        dist_coeffs,
        rvecs,
        tvecs,
    })
}

fn reprojection_stats(
    set: &CorrespondenceSet,
    template: &Vector<Point3f>,
    solution: &Solution,
) -> Result<ReprojectionStats, CalibrateError> {
    let mut per_image = Vec::with_capacity(set.len());
    for i in 0..set.len() {
        let rvec = solution.rvecs.get(i)?;
        let tvec = solution.tvecs.get(i)?;
        let mut projected = Vector::<Point2f>::new();
        calib3d::project_points(
            template,
            &rvec,
            &tvec,
            &solution.camera_matrix,
            &solution.dist_coeffs,
            &mut projected,
            &mut core::no_array(),
            0.0,
        )?;
        let detected = set.image_points.get(i)?;
        per_image.push(mean_point_distance(
            &detect::to_points(&detected),
            &detect::to_points(&projected),
        )?);
    }
    Ok(ReprojectionStats::from_per_image(per_image)?)
}

impl Solution {
    fn to_archive(&self) -> Result<CalibrationArchive, CalibrateError> {
        let mut camera_matrix = [[0.0; 3]; 3];
        for (r, row) in camera_matrix.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = *self.camera_matrix.at_2d::<f64>(r as i32, c as i32)?;
            }
        }

        let available = self.dist_coeffs.total();
        if available < DIST_COEFF_COUNT {
            return Err(CalibrateError::Solve(format!(
                "solver returned {available} distortion coefficients"
            )));
        }
        let dist_coeffs = (0..DIST_COEFF_COUNT as i32)
            .map(|i| self.dist_coeffs.at::<f64>(i).copied())
            .collect::<opencv::Result<Vec<f64>>>()?;

        let archive = CalibrationArchive {
            camera_matrix,
            dist_coeffs,
            rvecs: vec3_list(&self.rvecs)?,
            tvecs: vec3_list(&self.tvecs)?,
        };
        let finite = archive.camera_matrix.iter().flatten().all(|v| v.is_finite())
            && archive.dist_coeffs.iter().all(|v| v.is_finite());
        if !finite {
            return Err(CalibrateError::Solve(
                "solver produced non-finite intrinsics".into(),
            ));
        }
        Ok(archive)
    }
}

fn vec3_list(mats: &Vector<Mat>) -> opencv::Result<Vec<[f64; 3]>> {
    mats.iter()
        .map(|m| {
            Ok([
                *m.at::<f64>(0)?,
                *m.at::<f64>(1)?,
                *m.at::<f64>(2)?,
            ])
        })
        .collect()
}
