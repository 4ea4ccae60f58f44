//! Printable checkerboard targets.
//!
//! The target is a checkerboard that fills as many whole boxes as fit on a
//! page inside a margin, optionally with four uniquely colored corner boxes
//! so the board orientation can be recovered later. Output is a single-page
//! PDF plus an optional PNG preview of the same layout.
//!
//! ```no_run
//! use chesscal_print::{generate_target, TargetConfig};
//!
//! # fn main() -> Result<(), chesscal_print::PrintError> {
//! let summary = generate_target(&TargetConfig::default())?;
//! println!("{}x{} boxes", summary.layout.boxes_x, summary.layout.boxes_y);
//! # Ok(())
//! # }
//! ```

mod layout;
mod palette;
mod pdf;
mod raster;

use std::fs;
use std::path::{Path, PathBuf};

use chesscal_core::JsonConfig;
use serde::{Deserialize, Serialize};

pub use layout::{cm_to_pt, mm_to_pt, BoxSizing, PageLayout, PageSize, POINTS_PER_CM};
pub use palette::{CornerColors, Palette, Rgb};
pub use pdf::render_pdf;
pub use raster::{render_raster, RgbRaster};

#[derive(thiserror::Error, Debug)]
pub enum PrintError {
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Png(#[from] png::EncodingError),
}

fn default_margin_cm() -> f64 {
    1.5
}

fn default_corner_markers() -> bool {
    true
}

fn default_output_path() -> PathBuf {
    PathBuf::from("checkered_calibration.pdf")
}

fn default_preview_dpi() -> f64 {
    150.0
}

/// Configuration of the target generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub page: PageSize,
    #[serde(default = "default_margin_cm")]
    pub margin_cm: f64,
    #[serde(default)]
    pub sizing: BoxSizing,
    #[serde(default)]
    pub palette: Palette,
    #[serde(default = "default_corner_markers")]
    pub corner_markers: bool,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default)]
    pub preview_path: Option<PathBuf>,
    #[serde(default = "default_preview_dpi")]
    pub preview_dpi: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            page: PageSize::default(),
            margin_cm: default_margin_cm(),
            sizing: BoxSizing::default(),
            palette: Palette::default(),
            corner_markers: default_corner_markers(),
            output_path: default_output_path(),
            preview_path: None,
            preview_dpi: default_preview_dpi(),
        }
    }
}

impl JsonConfig for TargetConfig {}

impl TargetConfig {
    pub fn layout(&self) -> Result<PageLayout, PrintError> {
        PageLayout::compute(self.page, cm_to_pt(self.margin_cm), self.sizing)
    }
}

/// What was generated.
#[derive(Clone, Debug, Serialize)]
pub struct TargetSummary {
    pub layout: PageLayout,
    pub pdf_path: PathBuf,
    pub preview_path: Option<PathBuf>,
}

fn write_creating_parent(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}

/// Lay out, render and write the target described by `cfg`.
pub fn generate_target(cfg: &TargetConfig) -> Result<TargetSummary, PrintError> {
    log::info!("using a {:.1} cm margin on all sides", cfg.margin_cm);
    let layout = cfg.layout()?;
    log::info!(
        "box size {:.2} cm, grid of {}x{} squares ({}x{} inner corners)",
        layout.box_size_cm(),
        layout.boxes_x,
        layout.boxes_y,
        layout.boxes_x - 1,
        layout.boxes_y - 1
    );
    if cfg.corner_markers {
        log::info!("corner squares colored for orientation tracking");
    }

    let bytes = render_pdf(&layout, cfg.palette, cfg.corner_markers);
    write_creating_parent(&cfg.output_path, &bytes)?;
    log::info!("wrote {}", cfg.output_path.display());

    if let Some(preview) = &cfg.preview_path {
        let raster = render_raster(&layout, cfg.palette, cfg.corner_markers, cfg.preview_dpi)?;
        if let Some(parent) = preview.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        raster.write_png(preview)?;
        log::info!(
            "wrote {} ({}x{} px)",
            preview.display(),
            raster.width,
            raster.height
        );
    }

    Ok(TargetSummary {
        layout,
        pdf_path: cfg.output_path.clone(),
        preview_path: cfg.preview_path.clone(),
    })
}
