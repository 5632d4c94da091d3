//! Restoring archive entries to disk.
//!
//! Each entry's recorded path is mapped to a destination under the restore
//! root through a [`PrefixMap`]. Writes follow the no-overwrite policy unless
//! overwrite mode is on: an existing destination is left alone and reported
//! as skipped, so re-running an unpack is a no-op. Two entries of one run
//! that land on the same destination are reported as a [`Collision`]; the
//! first one wins.

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::archive::ArchiveEntry;
use crate::archive::format::is_separator_line;
use crate::config::{BootstrapFile, UnpackConfig};
use crate::paths::{extension_key, foreign_components};

/// Placeholder in bootstrap contents replaced by the restore timestamp.
pub const GENERATED_PLACEHOLDER: &str = "{generated}";

// ---------------------------------------------------------------------------
// Prefix mapping
// ---------------------------------------------------------------------------

/// Where an entry goes, relative to the restore root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Under a configured prefix's target folder.
    Mapped(PathBuf),
    /// No prefix matched; kept by file name in the unclassified bucket.
    Unclassified(PathBuf),
    /// Unsafe or unusable path; not written.
    Rejected(String),
}

#[derive(Clone, Debug)]
struct Prefix {
    source: String,
    folded: Vec<String>,
    target: PathBuf,
}

/// Ordered source prefixes. The first one that covers a path wins.
#[derive(Clone, Debug)]
pub struct PrefixMap {
    prefixes: Vec<Prefix>,
    unclassified_dir: PathBuf,
}

impl PrefixMap {
    /// Build from config, dropping prefixes that cannot be used.
    #[must_use]
    pub fn from_config(config: &UnpackConfig) -> Self {
        let mut prefixes = Vec::new();
        for p in &config.prefixes {
            let folded: Vec<String> = foreign_components(&p.source)
                .into_iter()
                .map(str::to_lowercase)
                .collect();
            let target_dir = p.target_dir();
            let Some(target) = safe_relative(&foreign_components(&target_dir)) else {
                warn!(source = %p.source, target = %target_dir, "unusable prefix; ignored");
                continue;
            };
            if folded.is_empty() {
                warn!(source = %p.source, "empty prefix source; ignored");
                continue;
            }
            prefixes.push(Prefix {
                source: p.source.clone(),
                folded,
                target,
            });
        }
        let unclassified_dir = safe_relative(&foreign_components(&config.unclassified_dir))
            .unwrap_or_else(|| PathBuf::from("_misc"));
        Self {
            prefixes,
            unclassified_dir,
        }
    }

    /// Map a recorded path to its destination under the restore root.
    #[must_use]
    pub fn destination(&self, original_path: &str) -> Destination {
        let components = foreign_components(original_path);
        let folded: Vec<String> = components.iter().map(|c| c.to_lowercase()).collect();

        for prefix in &self.prefixes {
            if !folded.starts_with(&prefix.folded) {
                continue;
            }
            let rest = &components[prefix.folded.len()..];
            if rest.is_empty() {
                return Destination::Rejected(format!(
                    "path names the prefix '{}' itself, not a file under it",
                    prefix.source
                ));
            }
            return match safe_relative(rest) {
                Some(relative) => Destination::Mapped(prefix.target.join(relative)),
                None => Destination::Rejected(format!(
                    "path escapes the prefix '{}'",
                    prefix.source
                )),
            };
        }

        match components.last() {
            Some(name) if !matches!(*name, "." | "..") => {
                Destination::Unclassified(self.unclassified_dir.join(name))
            }
            _ => Destination::Rejected("path has no file name".to_owned()),
        }
    }
}

/// Join components into a relative path, refusing `.` and `..`.
fn safe_relative(components: &[&str]) -> Option<PathBuf> {
    if components.is_empty() || components.iter().any(|c| matches!(*c, "." | "..")) {
        return None;
    }
    Some(components.iter().collect())
}

// ---------------------------------------------------------------------------
// Content fixups
// ---------------------------------------------------------------------------

/// Drop leading blank and separator lines when the first remaining line
/// opens a JSON object or array. Otherwise `content` is returned unchanged.
#[must_use]
pub fn strip_structured_preamble(content: &str) -> &str {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim().is_empty() || is_separator_line(line) {
            offset += line.len();
            continue;
        }
        let opens = line.trim_start().starts_with(['{', '[']);
        return if opens { &content[offset..] } else { content };
    }
    content
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Result of a single guarded write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    SkippedExisting,
}

/// Write `contents` to `path`, creating parent directories.
///
/// Without `overwrite`, an existing file is left untouched. The existence
/// check and the create are one `create_new` open, so nothing is clobbered
/// even if the file appears in between.
///
/// # Errors
/// Propagates directory creation and write failures.
pub fn write_if_missing(path: &Path, contents: &str, overwrite: bool) -> io::Result<WriteOutcome> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if overwrite {
        fs::write(path, contents)?;
        return Ok(WriteOutcome::Written);
    }
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(contents.as_bytes())?;
            Ok(WriteOutcome::Written)
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(WriteOutcome::SkippedExisting),
        Err(err) => Err(err),
    }
}

// ---------------------------------------------------------------------------
// Unpacker
// ---------------------------------------------------------------------------

/// An entry that was not written because of its path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedEntry {
    pub original_path: String,
    pub reason: String,
}

/// A destination that could not be written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedWrite {
    pub path: PathBuf,
    pub reason: String,
}

/// Two entries of the same run that map to one destination.
///
/// Without overwrite mode the earlier entry is kept and `original_path` is
/// lost; with it, the earlier one is replaced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub original_path: String,
    /// The entry that claimed `destination` first in this run.
    pub clashes_with: String,
    pub destination: PathBuf,
}

/// Summary of an unpack run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UnpackReport {
    pub written: Vec<PathBuf>,
    /// Destinations that existed before this run.
    pub skipped_existing: Vec<PathBuf>,
    pub collisions: Vec<Collision>,
    /// Entries that matched no prefix (also counted in written/skipped).
    pub unclassified: usize,
    pub rejected: Vec<RejectedEntry>,
    pub failed: Vec<FailedWrite>,
    pub bootstrap_written: Vec<PathBuf>,
}

impl UnpackReport {
    /// True when nothing went wrong.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.failed.is_empty() && self.collisions.is_empty()
    }
}

/// Restores entries under a root according to an [`UnpackConfig`].
#[derive(Clone, Debug)]
pub struct Unpacker {
    map: PrefixMap,
    overwrite: bool,
    structured: BTreeSet<String>,
    bootstrap: Vec<BootstrapFile>,
}

impl Unpacker {
    #[must_use]
    pub fn from_config(config: &UnpackConfig) -> Self {
        Self {
            map: PrefixMap::from_config(config),
            overwrite: config.overwrite,
            structured: config
                .structured_extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            bootstrap: config.bootstrap.clone(),
        }
    }

    /// Force overwrite mode on (last entry for a path wins).
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub const fn prefix_map(&self) -> &PrefixMap {
        &self.map
    }

    /// Write every entry, then the bootstrap files.
    #[must_use]
    pub fn unpack(&self, entries: &[ArchiveEntry], restore_root: &Path) -> UnpackReport {
        self.unpack_at(entries, restore_root, Local::now())
    }

    /// As [`Unpacker::unpack`], stamping bootstrap files with `generated_at`.
    #[must_use]
    pub fn unpack_at(
        &self,
        entries: &[ArchiveEntry],
        restore_root: &Path,
        generated_at: DateTime<Local>,
    ) -> UnpackReport {
        let mut report = UnpackReport::default();
        // Destination -> original path of the entry that claimed it.
        let mut claimed: HashMap<PathBuf, String> = HashMap::new();

        for entry in entries {
            let relative = match self.map.destination(&entry.original_path) {
                Destination::Mapped(relative) => relative,
                Destination::Unclassified(relative) => {
                    debug!(path = %entry.original_path, "no prefix matched");
                    report.unclassified += 1;
                    relative
                }
                Destination::Rejected(reason) => {
                    warn!(path = %entry.original_path, "entry rejected: {reason}");
                    report.rejected.push(RejectedEntry {
                        original_path: entry.original_path.clone(),
                        reason,
                    });
                    continue;
                }
            };

            let dest = restore_root.join(&relative);
            if let Some(earlier) = claimed.get(&dest) {
                warn!(
                    path = %entry.original_path,
                    earlier = %earlier,
                    dest = %dest.display(),
                    "two entries restore to the same file"
                );
                report.collisions.push(Collision {
                    original_path: entry.original_path.clone(),
                    clashes_with: earlier.clone(),
                    destination: dest.clone(),
                });
                if !self.overwrite {
                    continue;
                }
            }
            let content = if self.structured.contains(&extension_key(&dest)) {
                strip_structured_preamble(&entry.content)
            } else {
                entry.content.as_str()
            };
            self.record(&mut report, &dest, content, false);
            claimed.insert(dest, entry.original_path.clone());
        }

        let stamp = generated_at.to_rfc3339_opts(SecondsFormat::Secs, false);
        for file in &self.bootstrap {
            let Some(relative) = safe_relative(&foreign_components(&file.path)) else {
                warn!(path = %file.path, "bootstrap path is unusable; skipped");
                continue;
            };
            let dest = restore_root.join(relative);
            let contents = file.contents.replace(GENERATED_PLACEHOLDER, &stamp);
            self.record(&mut report, &dest, &contents, true);
        }

        info!(
            written = report.written.len(),
            skipped = report.skipped_existing.len(),
            collisions = report.collisions.len(),
            rejected = report.rejected.len(),
            failed = report.failed.len(),
            "unpack finished"
        );
        report
    }

    fn record(&self, report: &mut UnpackReport, dest: &Path, contents: &str, bootstrap: bool) {
        // Bootstrap files are never replaced, whatever the entry policy.
        let overwrite = self.overwrite && !bootstrap;
        match write_if_missing(dest, contents, overwrite) {
            Ok(WriteOutcome::Written) => {
                debug!(path = %dest.display(), "written");
                if bootstrap {
                    report.bootstrap_written.push(dest.to_owned());
                } else {
                    report.written.push(dest.to_owned());
                }
            }
            Ok(WriteOutcome::SkippedExisting) => {
                debug!(path = %dest.display(), "exists; skipped");
                report.skipped_existing.push(dest.to_owned());
            }
            Err(err) => {
                warn!(path = %dest.display(), "write failed: {err}");
                report.failed.push(FailedWrite {
                    path: dest.to_owned(),
                    reason: err.to_string(),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
