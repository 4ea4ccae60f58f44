//! Checkerboard colors and corner orientation markers.

use serde::{Deserialize, Serialize};

use crate::PageLayout;

/// 8-bit sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn hex(v: u32) -> Self {
        Rgb([(v >> 16) as u8, (v >> 8) as u8, v as u8])
    }

    /// Components scaled to `[0, 1]` for PDF color operators.
    pub fn unit(&self) -> [f32; 3] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

/// Colors of the four corner boxes, named as seen on the printed page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CornerColors {
    pub top_left: Rgb,
    pub top_right: Rgb,
    pub bottom_left: Rgb,
    pub bottom_right: Rgb,
}

impl CornerColors {
    pub fn as_array(&self) -> [Rgb; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }
}

/// Built-in color schemes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Dark red / dark blue squares: distinct hues that stay high-contrast
    /// against a white page, so the board is easy to segment in HSV.
    #[default]
    DarkHue,
    /// Classic black / white board.
    Monochrome,
}

impl Palette {
    /// The two alternating base colors (even parity first).
    pub fn base(&self) -> [Rgb; 2] {
        match self {
            Palette::DarkHue => [Rgb::hex(0x8B0000), Rgb::hex(0x00008B)],
            Palette::Monochrome => [Rgb::hex(0x000000), Rgb::hex(0xFFFFFF)],
        }
    }

    pub fn corners(&self) -> CornerColors {
        match self {
            Palette::DarkHue => CornerColors {
                top_left: Rgb::hex(0xFFD700),
                top_right: Rgb::hex(0x00FF00),
                bottom_left: Rgb::hex(0xFF00FF),
                bottom_right: Rgb::hex(0x00FFFF),
            },
            Palette::Monochrome => CornerColors {
                top_left: Rgb::hex(0xFF0000),
                top_right: Rgb::hex(0x0000FF),
                bottom_left: Rgb::hex(0x008000),
                bottom_right: Rgb::hex(0xFFFF00),
            },
        }
    }

    /// Fill color of box `(row, col)`; row 0 is the bottom of the page.
    pub fn box_color(&self, layout: &PageLayout, corner_markers: bool, row: u32, col: u32) -> Rgb {
        if corner_markers {
            let last_row = layout.boxes_y - 1;
            let last_col = layout.boxes_x - 1;
            let corners = self.corners();
            match (row, col) {
                (0, 0) => return corners.bottom_left,
                (0, c) if c == last_col => return corners.bottom_right,
                (r, 0) if r == last_row => return corners.top_left,
                (r, c) if r == last_row && c == last_col => return corners.top_right,
                _ => {}
            }
        }
        self.base()[((row + col) % 2) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxSizing, PageSize};
    use std::collections::HashSet;

    fn layout() -> PageLayout {
        PageLayout::compute(PageSize::A4, 42.5, BoxSizing::default()).unwrap()
    }

    #[test]
    fn hex_parses_components() {
        assert_eq!(Rgb::hex(0x8B0000), Rgb([0x8B, 0, 0]));
        assert_eq!(Rgb::hex(0x00FFFF).unit(), [0.0, 1.0, 1.0]);
    }

    #[test]
    fn corner_colors_are_distinct_from_each_other_and_the_base() {
        for palette in [Palette::DarkHue, Palette::Monochrome] {
            let corners = palette.corners().as_array();
            let unique: HashSet<_> = corners.iter().collect();
            assert_eq!(unique.len(), 4, "{palette:?}");
            for c in corners {
                assert!(!palette.base().contains(&c), "{palette:?} {c:?}");
            }
        }
    }

    #[test]
    fn box_colors_alternate_by_parity() {
        let layout = layout();
        let p = Palette::DarkHue;
        let [even, odd] = p.base();
        assert_eq!(p.box_color(&layout, false, 0, 0), even);
        assert_eq!(p.box_color(&layout, false, 0, 1), odd);
        assert_eq!(p.box_color(&layout, false, 3, 2), odd);
        assert_eq!(p.box_color(&layout, true, 4, 4), even);
    }

    #[test]
    fn markers_land_on_the_four_corners() {
        let layout = layout();
        let p = Palette::DarkHue;
        let c = p.corners();
        let (lr, lc) = (layout.boxes_y - 1, layout.boxes_x - 1);
        assert_eq!(p.box_color(&layout, true, 0, 0), c.bottom_left);
        assert_eq!(p.box_color(&layout, true, 0, lc), c.bottom_right);
        assert_eq!(p.box_color(&layout, true, lr, 0), c.top_left);
        assert_eq!(p.box_color(&layout, true, lr, lc), c.top_right);

        let marked = (0..layout.boxes_y)
            .flat_map(|r| (0..layout.boxes_x).map(move |c| (r, c)))
            .filter(|&(r, col)| !p.base().contains(&p.box_color(&layout, true, r, col)))
            .count();
        assert_eq!(marked, 4);
    }
}
