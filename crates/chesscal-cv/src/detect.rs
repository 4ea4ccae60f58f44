//! Thin wrappers over the OpenCV calls shared by the visualizer and the
//! calibrator: decode, grayscale, find corners, refine.

use std::path::Path;

use chesscal_core::{BoardSpec, SubPixParams};
use nalgebra::Point2;
use opencv::{
    calib3d,
    core::{self, Mat, Point2f, Point3f, Size, TermCriteria, Vector},
    imgcodecs, imgproc,
    prelude::*,
};

/// Outcome of one detection attempt.
pub(crate) enum Detection {
    Found(Vector<Point2f>),
    NotFound,
}

/// OpenCV pattern size `(cols, rows)` of inner corners.
pub(crate) fn pattern_size(board: &BoardSpec) -> Size {
    Size::new(board.cols as i32, board.rows as i32)
}

pub(crate) fn subpix_criteria(params: &SubPixParams) -> TermCriteria {
    TermCriteria {
        typ: core::TermCriteria_EPS + core::TermCriteria_MAX_ITER,
        max_count: params.max_iterations,
        epsilon: params.epsilon,
    }
}

/// Decode `path` as a 3-channel image. `None` when the file cannot be decoded.
pub(crate) fn read_color(path: &Path) -> Option<Mat> {
    let name = path.to_str()?;
    match imgcodecs::imread(name, imgcodecs::IMREAD_COLOR) {
        Ok(img) if !img.empty() => Some(img),
        Ok(_) => None,
        Err(err) => {
            log::debug!("imread({name}) failed: {err}");
            None
        }
    }
}

pub(crate) fn to_gray(img: &Mat) -> opencv::Result<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color_def(img, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}

pub(crate) fn find_corners(gray: &Mat, board: &BoardSpec) -> opencv::Result<Detection> {
    let mut corners = Vector::<Point2f>::new();
    let found = calib3d::find_chessboard_corners(
        gray,
        pattern_size(board),
        &mut corners,
        calib3d::CALIB_CB_ADAPTIVE_THRESH + calib3d::CALIB_CB_NORMALIZE_IMAGE,
    )?;
    if found && corners.len() == board.corner_count() {
        Ok(Detection::Found(corners))
    } else {
        Ok(Detection::NotFound)
    }
}

/// Grayscale conversion, detection and, when `subpix` is set, refinement.
pub(crate) fn locate_corners(
    img: &Mat,
    board: &BoardSpec,
    subpix: Option<&SubPixParams>,
) -> opencv::Result<Detection> {
    let gray = to_gray(img)?;
    let mut detection = find_corners(&gray, board)?;
    if let (Detection::Found(corners), Some(params)) = (&mut detection, subpix) {
        refine_corners(&gray, corners, params)?;
    }
    Ok(detection)
}

/// Iterative sub-pixel refinement, in place.
pub(crate) fn refine_corners(
    gray: &Mat,
    corners: &mut Vector<Point2f>,
    params: &SubPixParams,
) -> opencv::Result<()> {
    imgproc::corner_sub_pix(
        gray,
        corners,
        Size::new(params.window[0], params.window[1]),
        Size::new(params.zero_zone[0], params.zero_zone[1]),
        subpix_criteria(params),
    )
}

pub(crate) fn draw_corners(
    img: &mut Mat,
    board: &BoardSpec,
    corners: &Vector<Point2f>,
) -> opencv::Result<()> {
    calib3d::draw_chessboard_corners(img, pattern_size(board), corners, true)
}

/// Write `img`; OpenCV reports an unsupported extension or unwritable path as `false`.
pub(crate) fn write_image(path: &Path, img: &Mat) -> opencv::Result<bool> {
    let Some(name) = path.to_str() else {
        return Ok(false);
    };
    imgcodecs::imwrite(name, img, &Vector::<i32>::new())
}

pub(crate) fn object_template(board: &BoardSpec) -> Vector<Point3f> {
    board
        .object_points()
        .iter()
        .map(|p| Point3f::new(p.x as f32, p.y as f32, p.z as f32))
        .collect()
}

pub(crate) fn to_points(v: &Vector<Point2f>) -> Vec<Point2<f64>> {
    v.iter()
        .map(|p| Point2::new(p.x as f64, p.y as f64))
        .collect()
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
