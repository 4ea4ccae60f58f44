//! PNG preview of the printed page.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::{PageLayout, Palette, PrintError, Rgb};

const PAGE_BACKGROUND: Rgb = Rgb([255, 255, 255]);

/// Row-major RGB8 raster of a whole page.
#[derive(Clone, Debug)]
pub struct RgbRaster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbRaster {
    fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&color.0);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Pixel at `(x, y)`, `y = 0` being the top image row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb([self.data[i], self.data[i + 1], self.data[i + 2]]))
    }

    fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb) {
        let stride = self.width as usize * 3;
        for y in y0..y1.min(self.height) {
            let row = y as usize * stride;
            for x in x0..x1.min(self.width) {
                let i = row + x as usize * 3;
                self.data[i..i + 3].copy_from_slice(&color.0);
            }
        }
    }

    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<(), PrintError> {
        let writer = BufWriter::new(File::create(path)?);
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.data)?;
        writer.finish()?;
        Ok(())
    }
}

/// Rasterize the layout at `dpi`.
pub fn render_raster(
    layout: &PageLayout,
    palette: Palette,
    corner_markers: bool,
    dpi: f64,
) -> Result<RgbRaster, PrintError> {
    if !dpi.is_finite() || dpi <= 0.0 {
        return Err(PrintError::InvalidLayout(format!(
            "preview dpi must be > 0, got {dpi}"
        )));
    }
    let scale = dpi / 72.0;
    let width = (layout.page.width_pt * scale).round() as u32;
    let height = (layout.page.height_pt * scale).round() as u32;
    let mut raster = RgbRaster::filled(width, height, PAGE_BACKGROUND);

    let to_px = |pt: f64| (pt * scale).round().max(0.0) as u32;
    for row in 0..layout.boxes_y {
        for col in 0..layout.boxes_x {
            let (x, y) = layout.box_origin(row, col);
            let x0 = to_px(x);
            let x1 = to_px(x + layout.box_pt);
            // PDF y grows upwards, raster rows grow downwards.
            let y0 = height.saturating_sub(to_px(y + layout.box_pt));
            let y1 = height.saturating_sub(to_px(y));
            let color = palette.box_color(layout, corner_markers, row, col);
            raster.fill_rect(x0, y0, x1, y1, color);
        }
    }
    Ok(raster)
}
