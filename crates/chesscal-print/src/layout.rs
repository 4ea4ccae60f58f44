//! Page geometry: how many whole boxes fit inside the margins.

use serde::{Deserialize, Serialize};

use crate::PrintError;

/// PDF points per centimeter (72 pt per inch).
pub const POINTS_PER_CM: f64 = 72.0 / 2.54;

#[inline]
pub fn cm_to_pt(cm: f64) -> f64 {
    cm * POINTS_PER_CM
}

#[inline]
pub fn mm_to_pt(mm: f64) -> f64 {
    cm_to_pt(mm / 10.0)
}

/// Page size in PDF points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_pt: f64,
    pub height_pt: f64,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width_pt: 595.275_590_551_181_2,
        height_pt: 841.889_763_779_527_7,
    };
    pub const LETTER: PageSize = PageSize {
        width_pt: 612.0,
        height_pt: 792.0,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// How the box edge length is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BoxSizing {
    /// Fixed edge length; as many whole boxes as fit along each axis.
    Fixed { size_mm: f64 },
    /// Exactly `boxes` across the drawable width; edge length follows.
    FitAcross { boxes: u32 },
}

impl Default for BoxSizing {
    fn default() -> Self {
        BoxSizing::Fixed { size_mm: 18.0 }
    }
}

/// Resolved checkerboard layout on one page.
///
/// Coordinates follow PDF conventions: origin at the bottom-left corner of
/// the page, row 0 is the bottom row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page: PageSize,
    pub margin_pt: f64,
    pub box_pt: f64,
    pub boxes_x: u32,
    pub boxes_y: u32,
}

impl PageLayout {
    pub fn compute(page: PageSize, margin_pt: f64, sizing: BoxSizing) -> Result<Self, PrintError> {
        if !(page.width_pt > 0.0 && page.height_pt > 0.0) {
            return Err(PrintError::InvalidLayout(format!(
                "page size must be positive, got {}x{} pt",
                page.width_pt, page.height_pt
            )));
        }
        if !margin_pt.is_finite() || margin_pt < 0.0 {
            return Err(PrintError::InvalidLayout(format!(
                "margin must be >= 0, got {margin_pt} pt"
            )));
        }
        let drawable_w = page.width_pt - 2.0 * margin_pt;
        let drawable_h = page.height_pt - 2.0 * margin_pt;
        if drawable_w <= 0.0 || drawable_h <= 0.0 {
            return Err(PrintError::InvalidLayout(format!(
                "margin of {margin_pt:.1} pt leaves no drawable area"
            )));
        }

        let (box_pt, boxes_x) = match sizing {
            BoxSizing::Fixed { size_mm } => {
                if !size_mm.is_finite() || size_mm <= 0.0 {
                    return Err(PrintError::InvalidLayout(format!(
                        "box size must be > 0, got {size_mm} mm"
                    )));
                }
                let box_pt = mm_to_pt(size_mm);
                (box_pt, (drawable_w / box_pt).floor() as u32)
            }
            BoxSizing::FitAcross { boxes } => {
                if boxes == 0 {
                    return Err(PrintError::InvalidLayout(
                        "need at least one box across".into(),
                    ));
                }
                (drawable_w / boxes as f64, boxes)
            }
        };
        let boxes_y = (drawable_h / box_pt).floor() as u32;
        if boxes_x == 0 || boxes_y == 0 {
            return Err(PrintError::InvalidLayout(format!(
                "{:.2} cm boxes do not fit in the drawable area",
                box_pt / POINTS_PER_CM
            )));
        }

        Ok(Self {
            page,
            margin_pt,
            box_pt,
            boxes_x,
            boxes_y,
        })
    }

    /// Total number of boxes drawn.
    #[inline]
    pub fn box_count(&self) -> usize {
        self.boxes_x as usize * self.boxes_y as usize
    }

    /// Inner corner counts `(cols, rows)` a detector should be configured with.
    #[inline]
    pub fn inner_corners(&self) -> (u32, u32) {
        (self.boxes_x - 1, self.boxes_y - 1)
    }

    #[inline]
    pub fn box_size_cm(&self) -> f64 {
        self.box_pt / POINTS_PER_CM
    }

    /// Bottom-left corner of box `(row, col)` in page points.
    #[inline]
    pub fn box_origin(&self, row: u32, col: u32) -> (f64, f64) {
        (
            self.margin_pt + col as f64 * self.box_pt,
            self.margin_pt + row as f64 * self.box_pt,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn a4_with_18mm_boxes_matches_9x13_board() {
        let layout =
            PageLayout::compute(PageSize::A4, cm_to_pt(1.5), BoxSizing::default()).unwrap();
        assert_eq!((layout.boxes_x, layout.boxes_y), (10, 14));
        assert_eq!(layout.inner_corners(), (9, 13));
        assert_eq!(layout.box_count(), 140);
        assert_relative_eq!(layout.box_size_cm(), 1.8, epsilon = 1e-9);
    }

    #[test]
    fn box_counts_follow_floor_division() {
        let page = PageSize::LETTER;
        for (margin_cm, size_mm) in [(0.0, 10.0), (1.0, 25.0), (2.5, 33.3), (1.5, 7.0)] {
            let margin = cm_to_pt(margin_cm);
            let s = mm_to_pt(size_mm);
            let layout =
                PageLayout::compute(page, margin, BoxSizing::Fixed { size_mm }).unwrap();
            let want_x = ((page.width_pt - 2.0 * margin) / s).floor() as u32;
            let want_y = ((page.height_pt - 2.0 * margin) / s).floor() as u32;
            assert_eq!((layout.boxes_x, layout.boxes_y), (want_x, want_y));
            assert_eq!(layout.box_count(), (want_x * want_y) as usize);
        }
    }

    #[test]
    fn fit_across_derives_box_size_from_width() {
        let margin = cm_to_pt(1.5);
        let layout =
            PageLayout::compute(PageSize::A4, margin, BoxSizing::FitAcross { boxes: 10 }).unwrap();
        assert_eq!(layout.boxes_x, 10);
        assert_relative_eq!(
            layout.box_pt * 10.0,
            PageSize::A4.width_pt - 2.0 * margin,
            epsilon = 1e-9
        );
        assert_eq!(layout.boxes_y, 14);
    }

    #[test]
    fn origins_are_offset_by_margin() {
        let layout =
            PageLayout::compute(PageSize::A4, 10.0, BoxSizing::Fixed { size_mm: 10.0 }).unwrap();
        let (x, y) = layout.box_origin(2, 3);
        assert_relative_eq!(x, 10.0 + 3.0 * layout.box_pt);
        assert_relative_eq!(y, 10.0 + 2.0 * layout.box_pt);
    }

    #[test]
    fn rejects_impossible_geometry() {
        assert!(PageLayout::compute(PageSize::A4, 400.0, BoxSizing::default()).is_err());
        assert!(PageLayout::compute(PageSize::A4, -1.0, BoxSizing::default()).is_err());
        assert!(
            PageLayout::compute(PageSize::A4, 0.0, BoxSizing::Fixed { size_mm: 0.0 }).is_err()
        );
        assert!(
            PageLayout::compute(PageSize::A4, 0.0, BoxSizing::Fixed { size_mm: 500.0 }).is_err()
        );
        assert!(PageLayout::compute(PageSize::A4, 0.0, BoxSizing::FitAcross { boxes: 0 }).is_err());
    }
}
