//! Checkerboard target description and the canonical 3-D grid template.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Static checkerboard specification.
///
/// `cols`/`rows` are **inner corner counts** (squares minus one), so the
/// OpenCV pattern size is `(cols, rows)`. `square_size` is expressed in
/// whatever physical unit the calibration should be scaled to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardSpec {
    pub cols: u32,
    pub rows: u32,
    pub square_size: f64,
}

impl Default for BoardSpec {
    fn default() -> Self {
        Self {
            cols: 9,
            rows: 13,
            square_size: 1.8,
        }
    }
}

/// Board specification validation errors.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum BoardError {
    #[error("cols and rows must be >= 2 (got {cols}x{rows})")]
    InvalidSize { cols: u32, rows: u32 },
    #[error("square_size must be finite and > 0 (got {0})")]
    InvalidSquareSize(f64),
}

impl BoardSpec {
    pub fn new(cols: u32, rows: u32, square_size: f64) -> Result<Self, BoardError> {
        let spec = Self {
            cols,
            rows,
            square_size,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if self.cols < 2 || self.rows < 2 {
            return Err(BoardError::InvalidSize {
                cols: self.cols,
                rows: self.rows,
            });
        }
        if !self.square_size.is_finite() || self.square_size <= 0.0 {
            return Err(BoardError::InvalidSquareSize(self.square_size));
        }
        Ok(())
    }

    /// Number of inner corners on the board.
    #[inline]
    pub fn corner_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Planar object points (`z = 0`) scaled by the square size.
    ///
    /// Row-major: all columns of row 0 first. This is the order OpenCV
    /// reports corners in for a `(cols, rows)` pattern.
    pub fn object_points(&self) -> Vec<Point3<f64>> {
        let mut pts = Vec::with_capacity(self.corner_count());
        for row in 0..self.rows {
            for col in 0..self.cols {
                pts.push(Point3::new(
                    col as f64 * self.square_size,
                    row as f64 * self.square_size,
                    0.0,
                ));
            }
        }
        pts
    }
}
