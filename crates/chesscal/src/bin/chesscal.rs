//! chesscal CLI: printable targets, frame extraction, corner review and
//! camera calibration.

use std::path::{Path, PathBuf};

use chesscal::core::{BoardSpec, JsonConfig};
use chesscal::cv::{
    calibrate, extract_frames, visualize_corners, CalibrateConfig, ExtractConfig, ImageOutcome,
    VisualizeConfig,
};
use chesscal::print::{generate_target, BoxSizing, PageSize, Palette, TargetConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "chesscal")]
#[command(about = "Checkerboard camera calibration utilities")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines (tracing builds only).
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a printable checkerboard PDF.
    Generate(GenerateArgs),
    /// Extract evenly spaced frames from videos.
    Extract(ExtractArgs),
    /// Draw detected corners on every image for manual review.
    Visualize(VisualizeArgs),
    /// Calibrate the camera from checkerboard images.
    Calibrate(CalibrateArgs),
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// JSON config file; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the resolved config as JSON before running.
    #[arg(long)]
    save_config: Option<PathBuf>,
}

impl ConfigArgs {
    fn load<T: JsonConfig + Default>(&self) -> CliResult<T> {
        match &self.config {
            Some(path) => {
                log::info!("loading config {}", path.display());
                Ok(T::load_json(path)?)
            }
            None => Ok(T::default()),
        }
    }

    fn save<T: JsonConfig>(&self, cfg: &T) -> CliResult<()> {
        if let Some(path) = &self.save_config {
            cfg.write_json(path)?;
            log::info!("config written to {}", path.display());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args, Default)]
struct BoardArgs {
    /// Inner corners per row.
    #[arg(long)]
    cols: Option<u32>,
    /// Inner corners per column.
    #[arg(long)]
    rows: Option<u32>,
    /// Square edge length in the unit the calibration should use.
    #[arg(long)]
    square_size: Option<f64>,
}

impl BoardArgs {
    fn apply(&self, board: &mut BoardSpec) {
        if let Some(cols) = self.cols {
            board.cols = cols;
        }
        if let Some(rows) = self.rows {
            board.rows = rows;
        }
        if let Some(square_size) = self.square_size {
            board.square_size = square_size;
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PageArg {
    A4,
    Letter,
}

impl PageArg {
    fn to_core(self) -> PageSize {
        match self {
            Self::A4 => PageSize::A4,
            Self::Letter => PageSize::LETTER,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PaletteArg {
    DarkHue,
    Monochrome,
}

impl PaletteArg {
    fn to_core(self) -> Palette {
        match self {
            Self::DarkHue => Palette::DarkHue,
            Self::Monochrome => Palette::Monochrome,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct GenerateArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Output PDF path.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also write a PNG preview to this path.
    #[arg(long)]
    preview: Option<PathBuf>,
    /// Preview resolution.
    #[arg(long)]
    preview_dpi: Option<f64>,
    #[arg(long, value_enum)]
    page: Option<PageArg>,
    #[arg(long, value_enum)]
    palette: Option<PaletteArg>,
    /// Margin on every side, in centimeters.
    #[arg(long)]
    margin_cm: Option<f64>,
    /// Fixed box edge length in millimeters.
    #[arg(long, conflicts_with = "fit_across")]
    box_mm: Option<f64>,
    /// Fit exactly this many boxes across the page width.
    #[arg(long)]
    fit_across: Option<u32>,
    /// Leave the four corner boxes in the base colors.
    #[arg(long)]
    no_corner_markers: bool,
}

impl GenerateArgs {
    fn resolve(&self) -> CliResult<TargetConfig> {
        let mut cfg: TargetConfig = self.config.load()?;
        if let Some(output) = &self.output {
            cfg.output_path = output.clone();
        }
        if let Some(preview) = &self.preview {
            cfg.preview_path = Some(preview.clone());
        }
        if let Some(dpi) = self.preview_dpi {
            cfg.preview_dpi = dpi;
        }
        if let Some(page) = self.page {
            cfg.page = page.to_core();
        }
        if let Some(palette) = self.palette {
            cfg.palette = palette.to_core();
        }
        if let Some(margin) = self.margin_cm {
            cfg.margin_cm = margin;
        }
        if let Some(size_mm) = self.box_mm {
            cfg.sizing = BoxSizing::Fixed { size_mm };
        }
        if let Some(boxes) = self.fit_across {
            cfg.sizing = BoxSizing::FitAcross { boxes };
        }
        if self.no_corner_markers {
            cfg.corner_markers = false;
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Args)]
struct ExtractArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Directory containing the videos.
    #[arg(long)]
    video_dir: Option<PathBuf>,
    /// Directory the frames are written to.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Frames to extract from each video.
    #[arg(long)]
    frames: Option<u64>,
    /// Accepted video extension (repeatable).
    #[arg(long = "ext")]
    extensions: Vec<String>,
}

impl ExtractArgs {
    fn resolve(&self) -> CliResult<ExtractConfig> {
        let mut cfg: ExtractConfig = self.config.load()?;
        if let Some(dir) = &self.video_dir {
            cfg.video_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(frames) = self.frames {
            cfg.frames_per_video = frames;
        }
        if !self.extensions.is_empty() {
            cfg.extensions = self.extensions.clone();
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Args)]
struct VisualizeArgs {
    #[command(flatten)]
    config: ConfigArgs,
    #[command(flatten)]
    board: BoardArgs,
    /// Directory containing the images.
    #[arg(long)]
    image_dir: Option<PathBuf>,
    /// Directory the annotated images are written to.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Draw the raw detections without sub-pixel refinement.
    #[arg(long)]
    no_refine: bool,
}

impl VisualizeArgs {
    fn resolve(&self) -> CliResult<VisualizeConfig> {
        let mut cfg: VisualizeConfig = self.config.load()?;
        self.board.apply(&mut cfg.board);
        if let Some(dir) = &self.image_dir {
            cfg.image_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if self.no_refine {
            cfg.refine = false;
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Args)]
struct CalibrateArgs {
    #[command(flatten)]
    config: ConfigArgs,
    #[command(flatten)]
    board: BoardArgs,
    /// Directory containing the images.
    #[arg(long)]
    image_dir: Option<PathBuf>,
    /// Output `.npz` archive.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also write a JSON report to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

impl CalibrateArgs {
    fn resolve(&self) -> CliResult<CalibrateConfig> {
        let mut cfg: CalibrateConfig = self.config.load()?;
        self.board.apply(&mut cfg.board);
        if let Some(dir) = &self.image_dir {
            cfg.image_dir = dir.clone();
        }
        if let Some(output) = &self.output {
            cfg.output_path = output.clone();
        }
        if let Some(report) = &self.report {
            cfg.report_path = Some(report.clone());
        }
        Ok(cfg)
    }
}

fn init_logging(cli: &Cli) -> CliResult<()> {
    #[cfg(feature = "tracing")]
    {
        chesscal::core::init_tracing(cli.log_json);
        if cli.verbose > 0 {
            log::debug!("verbosity follows RUST_LOG when tracing is enabled");
        }
        Ok(())
    }
    #[cfg(not(feature = "tracing"))]
    {
        let level = match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        chesscal::core::init_with_level(level)?;
        Ok(())
    }
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match &cli.command {
        Commands::Generate(args) => run_generate(args),
        Commands::Extract(args) => run_extract(args),
        Commands::Visualize(args) => run_visualize(args),
        Commands::Calibrate(args) => run_calibrate(args),
    }
}

fn run_generate(args: &GenerateArgs) -> CliResult<()> {
    let cfg = args.resolve()?;
    args.config.save(&cfg)?;
    let summary = generate_target(&cfg)?;
    let layout = &summary.layout;
    let (inner_x, inner_y) = layout.inner_corners();
    println!("Box size: {:.2} cm", layout.box_size_cm());
    println!(
        "Grid: {}x{} squares ({}x{} inner corners)",
        layout.boxes_x, layout.boxes_y, inner_x, inner_y
    );
    println!("Saved target to {}", summary.pdf_path.display());
    if let Some(preview) = &summary.preview_path {
        println!("Saved preview to {}", preview.display());
    }
    Ok(())
}

fn run_extract(args: &ExtractArgs) -> CliResult<()> {
    let cfg = args.resolve()?;
    args.config.save(&cfg)?;
    let report = extract_frames(&cfg)?;
    for video in &report.videos {
        match &video.skipped_reason {
            Some(reason) => println!("{}: skipped ({reason})", display_name(&video.path)),
            None => println!(
                "{}: saved {} of {} planned frames ({} total)",
                display_name(&video.path),
                video.saved.len(),
                video.planned.len(),
                video.total_frames
            ),
        }
    }
    println!(
        "Saved {} frames to {}",
        report.frames_saved(),
        report.output_dir.display()
    );
    Ok(())
}

fn run_visualize(args: &VisualizeArgs) -> CliResult<()> {
    let cfg = args.resolve()?;
    args.config.save(&cfg)?;
    let report = visualize_corners(&cfg)?;
    println!(
        "Detected: {}, not detected: {}, unreadable: {}",
        report.count(ImageOutcome::Detected),
        report.count(ImageOutcome::NotDetected),
        report.count(ImageOutcome::Unreadable)
    );
    println!("Review images in {}", report.output_dir.display());
    Ok(())
}

fn run_calibrate(args: &CalibrateArgs) -> CliResult<()> {
    let cfg = args.resolve()?;
    args.config.save(&cfg)?;
    let outcome = calibrate(&cfg)?;
    println!("{outcome}");
    println!("Calibration data saved to {}", cfg.output_path.display());
    if let Some(report) = &cfg.report_path {
        println!("Report saved to {}", report.display());
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
