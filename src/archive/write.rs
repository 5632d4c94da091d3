//! Archive writer.
//!
//! Serializes a [`Collection`] into one text stream: a banner, one delimited
//! block per file, and a footer. Unreadable files do not abort the run; their
//! block carries an inline error marker instead of content.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, warn};

use super::format::{BANNER_RULE, SEPARATOR_LINE, footer_line, header_line, read_error_marker};
use crate::collect::Collection;
use crate::encoding::{TextEncoding, read_text};
use crate::error::SrcpackError;

/// Notice written when no file matched.
pub const EMPTY_NOTICE: &str = "No files matched the rules; the archive has no entries.";

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

/// Metadata printed at the top of the archive. Never parsed back.
#[derive(Clone, Debug)]
pub struct Banner {
    pub tool: String,
    pub generated_at: DateTime<Local>,
    pub rules_file: PathBuf,
    pub processed_roots: Vec<PathBuf>,
}

impl Banner {
    /// Banner stamped with the current time and this crate's version.
    #[must_use]
    pub fn now(rules_file: &Path, processed_roots: &[PathBuf]) -> Self {
        Self {
            tool: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            generated_at: Local::now(),
            rules_file: rules_file.to_owned(),
            processed_roots: processed_roots.to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// ArchiveWriter
// ---------------------------------------------------------------------------

/// Streaming writer for one archive.
pub struct ArchiveWriter<W: Write> {
    out: W,
    total: usize,
    written: usize,
}

impl<W: Write> ArchiveWriter<W> {
    /// `total` is the entry count declared in every header.
    pub const fn new(out: W, total: usize) -> Self {
        Self {
            out,
            total,
            written: 0,
        }
    }

    /// Write the banner block.
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn write_banner(&mut self, banner: &Banner) -> io::Result<()> {
        writeln!(self.out, "{} archive", banner.tool)?;
        writeln!(
            self.out,
            "Date: {}",
            banner.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(self.out, "Source Rules File: {}", banner.rules_file.display())?;
        if !banner.processed_roots.is_empty() {
            writeln!(self.out, "Processed Roots:")?;
            for root in &banner.processed_roots {
                writeln!(self.out, "- {}", root.display())?;
            }
        }
        writeln!(self.out, "{BANNER_RULE}")?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Write one entry. `content` is copied verbatim.
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn write_entry(&mut self, original_path: &str, content: &str) -> io::Result<()> {
        self.written += 1;
        writeln!(self.out, "{SEPARATOR_LINE}")?;
        writeln!(
            self.out,
            "{}",
            header_line(self.written, self.total, original_path)
        )?;
        writeln!(self.out, "{SEPARATOR_LINE}")?;
        writeln!(self.out)?;
        self.out.write_all(content.as_bytes())?;
        // Spacer; the reader removes exactly these two newlines.
        self.out.write_all(b"\n\n")?;
        Ok(())
    }

    /// Write the footer, flush, and hand back the sink.
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn finish(mut self) -> io::Result<W> {
        if self.written == 0 {
            writeln!(self.out, "{EMPTY_NOTICE}")?;
        }
        writeln!(self.out, "{}", footer_line(self.written))?;
        self.out.flush()?;
        Ok(self.out)
    }
}

// ---------------------------------------------------------------------------
// Packing
// ---------------------------------------------------------------------------

/// A collected file whose content could not be read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnreadableFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a pack run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PackReport {
    /// Entries written, including those carrying an error marker.
    pub entries: usize,
    pub unreadable: Vec<UnreadableFile>,
    /// How many files each decoding strategy handled.
    pub encodings: BTreeMap<TextEncoding, usize>,
}

/// Write `collection` to `out` as a complete archive.
///
/// # Errors
/// Only write failures on `out` are returned. Read failures on source files
/// are recorded in the report.
pub fn pack_collection<W: Write>(
    out: W,
    collection: &Collection,
    banner: &Banner,
) -> io::Result<PackReport> {
    let mut writer = ArchiveWriter::new(out, collection.len());
    let mut report = PackReport::default();

    writer.write_banner(banner)?;
    for file in &collection.files {
        let recorded = file.path.display().to_string();
        match read_text(&file.path) {
            Ok(decoded) => {
                debug!(path = %recorded, encoding = %decoded.encoding, "packing");
                *report.encodings.entry(decoded.encoding).or_default() += 1;
                writer.write_entry(&recorded, &decoded.text)?;
            }
            Err(err) => {
                warn!(path = %recorded, "could not read file: {err}");
                writer.write_entry(&recorded, &read_error_marker(&err.to_string()))?;
                report.unreadable.push(UnreadableFile {
                    path: file.path.clone(),
                    reason: err.to_string(),
                });
            }
        }
        report.entries += 1;
    }
    writer.finish()?;
    Ok(report)
}

/// Create (or truncate) `archive` and pack `collection` into it.
///
/// # Errors
/// Returns [`SrcpackError::Io`] if the archive cannot be created or written.
/// The archive may be left partially written.
pub fn write_archive_file(
    archive: &Path,
    collection: &Collection,
    banner: &Banner,
) -> Result<PackReport, SrcpackError> {
    if let Some(parent) = archive.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(archive)?;
    Ok(pack_collection(BufWriter::new(file), collection, banner)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
