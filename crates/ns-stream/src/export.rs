//! CSV export of the retained frame history
//!
//! One header row, then one row per sample: an interpolated millisecond
//! timestamp followed by one column per channel in enumeration order.

use chrono::{DateTime, Local};
use ns_core::{Channel, Frame, NsError, NsResult};
use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Decimal places written for each sample value
pub const SAMPLE_PRECISION: usize = 6;
/// Decimal places written for the row timestamp
pub const TIMESTAMP_PRECISION: usize = 3;

const FILENAME_PREFIX: &str = "neurostream_export";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub frames: usize,
    pub rows: usize,
}

fn write_header<W: Write>(writer: &mut W) -> std::io::Result<()> {
    write!(writer, "timestamp")?;
    for channel in Channel::ALL {
        write!(writer, ",{}", channel.name())?;
    }
    writeln!(writer)
}

/// Write `frames` as CSV. An empty history writes nothing and returns `None`.
pub fn write_csv<'a, W, I>(frames: I, writer: &mut W) -> NsResult<Option<ExportSummary>>
where
    W: Write,
    I: IntoIterator<Item = &'a Frame>,
{
    let mut frames = frames.into_iter().peekable();
    if frames.peek().is_none() {
        return Ok(None);
    }

    write_header(writer)?;

    let mut summary = ExportSummary { frames: 0, rows: 0 };
    for frame in frames {
        for offset in 0..frame.sample_count() {
            write!(
                writer,
                "{:.*}",
                TIMESTAMP_PRECISION,
                frame.sample_timestamp_ms(offset)
            )?;
            for channel in Channel::ALL {
                write!(writer, ",{:.*}", SAMPLE_PRECISION, frame.channel(channel)[offset])?;
            }
            writeln!(writer)?;
            summary.rows += 1;
        }
        summary.frames += 1;
    }

    writer.flush()?;
    Ok(Some(summary))
}

/// Export filename embedding the export time down to the millisecond
pub fn export_filename(at: DateTime<Local>) -> String {
    format!("{}_{}.csv", FILENAME_PREFIX, at.format("%Y%m%d_%H%M%S_%3f"))
}

/// Write `frames` to a fresh file in `dir`.
///
/// Returns `Ok(None)` without touching the filesystem when there is nothing to
/// export. Never overwrites an existing file.
pub fn export_to_dir<'a, I>(dir: &Path, frames: I) -> NsResult<Option<PathBuf>>
where
    I: IntoIterator<Item = &'a Frame>,
{
    let mut frames = frames.into_iter().peekable();
    if frames.peek().is_none() {
        debug!("export requested with empty history, skipping");
        return Ok(None);
    }

    let (path, file) = create_unique(dir, &export_filename(Local::now()))?;
    let mut writer = BufWriter::new(file);
    let summary = write_csv(frames, &mut writer)?;

    if let Some(summary) = summary {
        info!(
            path = %path.display(),
            frames = summary.frames,
            rows = summary.rows,
            "history exported"
        );
    }
    Ok(Some(path))
}

/// Create `name` in `dir`, adding a numeric suffix if it already exists
fn create_unique(dir: &Path, name: &str) -> NsResult<(PathBuf, std::fs::File)> {
    let stem = name.trim_end_matches(".csv");
    for attempt in 0..100_u32 {
        let candidate = if attempt == 0 {
            dir.join(name)
        } else {
            dir.join(format!("{}_{}.csv", stem, attempt))
        };

        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(NsError::ExportFailed {
        message: format!("no free export filename for {} in {}", name, dir.display()),
    })
}
