//! Stderr logging for the `chesscal` pipelines.
//!
//! Stdout belongs to the calibration summary and the per-video tables, so
//! every diagnostic line (per-image `[SUCCESS]`/`[FAILURE]` notes, skipped
//! videos, OpenCV warnings) is routed to stderr with the time since start
//! and the pipeline that emitted it.

use std::fmt::Display;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

struct ConsoleLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// `[  1.250s  WARN cv::calibrate] message`, with the crate prefix dropped
/// from the target.
fn format_line(elapsed: f64, level: Level, target: &str, args: impl Display) -> String {
    let target = target.strip_prefix("chesscal_").unwrap_or(target);
    format!("[{elapsed:7.3}s {level:>5} {target}] {args}")
}

static LOGGER: OnceLock<ConsoleLogger> = OnceLock::new();

/// Route `log` records at or above `level` to stderr.
///
/// The clock starts at the first call. Repeated calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut installed_now = false;
    let logger = LOGGER.get_or_init(|| {
        installed_now = true;
        ConsoleLogger {
            level,
            started: Instant::now(),
        }
    });
    if installed_now {
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Span-aware alternative to [`init_with_level`]: pipeline spans are closed
/// with their timings, filtered by `RUST_LOG` (default `info`). Output stays
/// on stderr in both the human and the JSON-lines form.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .with_writer(std::io::stderr)
            .finish()
            .try_init();
    }
}
