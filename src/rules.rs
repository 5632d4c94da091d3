//! Rule file parsing.
//!
//! A rule file is line oriented:
//!
//! ```text
//! # comment
//! C:\src, py, .json          include *.py and *.json under C:\src
//! C:\src\vendor, none        exclude everything under C:\src\vendor
//! C:\tools\build.ps1         include a single file
//! C:\legacy                  directory with no tokens: default extensions
//! ```
//!
//! Parsing never fails as a whole. Records that cannot be used are dropped
//! and reported as [`RuleDiagnostic`]s.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::encoding::read_text;
use crate::error::SrcpackError;
use crate::matcher::ExcludeSet;
use crate::paths::{clean_raw, extension_key, resolve_root};

/// Token that turns a record into an exclude rule.
pub const EXCLUDE_TOKEN: &str = "none";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What an include root pointed at when the rules were parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootKind {
    Directory,
    File,
}

/// A root to collect from and the extensions it admits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeRule {
    /// Absolute, lexically normalized root.
    pub root: PathBuf,
    pub kind: RootKind,
    /// Lowercase, without a leading dot. Never empty.
    pub extensions: BTreeSet<String>,
    /// 1-based line in the rule file.
    pub line: usize,
}

impl IncludeRule {
    /// True if the extension of `path` is admitted by this rule.
    #[must_use]
    pub fn admits(&self, path: &Path) -> bool {
        self.extensions.contains(&extension_key(path))
    }
}

/// A record that was dropped or needs attention.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuleDiagnostic {
    /// 1-based line in the rule file.
    pub line: usize,
    pub message: String,
}

/// Everything parsed from one rule file.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    /// Include rules in file order.
    pub includes: Vec<IncludeRule>,
    pub excludes: ExcludeSet,
    pub diagnostics: Vec<RuleDiagnostic>,
}

impl RuleSet {
    fn diagnose(&mut self, line: usize, message: String) {
        warn!(line, "{message}");
        self.diagnostics.push(RuleDiagnostic { line, message });
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Lowercase a token and strip leading dots. `None` when nothing remains.
#[must_use]
pub fn normalize_extension(token: &str) -> Option<String> {
    let ext = token.trim().trim_start_matches('.').to_lowercase();
    (!ext.is_empty()).then_some(ext)
}

/// Parse rule-file text. Relative roots resolve against `base_dir`.
///
/// `default_extensions` applies to directory records that carry no tokens
/// at all. A directory record whose tokens are all blank is dropped.
#[must_use]
pub fn parse_rules(text: &str, base_dir: &Path, default_extensions: &[String]) -> RuleSet {
    let defaults: BTreeSet<String> = default_extensions
        .iter()
        .filter_map(|e| normalize_extension(e))
        .collect();

    let mut set = RuleSet::default();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split(',');
        let raw_root = parts.next().unwrap_or_default();
        let tokens: Vec<&str> = parts.map(str::trim).collect();

        if clean_raw(raw_root).is_empty() {
            set.diagnose(line, "empty path; record skipped".to_owned());
            continue;
        }
        let root = resolve_root(raw_root, base_dir);

        let keywords: Vec<String> = tokens
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        if keywords.len() == 1 && keywords[0] == EXCLUDE_TOKEN {
            if !root.exists() {
                debug!(line, root = %root.display(), "exclude rule for a path that does not exist yet");
            }
            set.excludes.insert(&root);
            continue;
        }
        if keywords.iter().any(|k| k == EXCLUDE_TOKEN) {
            set.diagnose(
                line,
                format!(
                    "'{EXCLUDE_TOKEN}' mixed with other tokens is read as an extension; \
                     put '{EXCLUDE_TOKEN}' alone to exclude '{}'",
                    root.display()
                ),
            );
        }

        let listed: BTreeSet<String> = keywords
            .iter()
            .filter_map(|k| normalize_extension(k))
            .collect();

        if root.is_dir() {
            let extensions = if tokens.is_empty() {
                defaults.clone()
            } else {
                listed
            };
            if extensions.is_empty() {
                set.diagnose(
                    line,
                    format!(
                        "directory '{}' has no usable extensions; nothing will be collected from it",
                        root.display()
                    ),
                );
                continue;
            }
            set.includes.push(IncludeRule {
                root,
                kind: RootKind::Directory,
                extensions,
                line,
            });
        } else if root.is_file() {
            // A direct file with no tokens is always wanted.
            let extensions = if listed.is_empty() {
                BTreeSet::from([extension_key(&root)])
            } else {
                listed
            };
            set.includes.push(IncludeRule {
                root,
                kind: RootKind::File,
                extensions,
                line,
            });
        } else {
            set.diagnose(
                line,
                format!(
                    "path '{}' is not a file or directory; record skipped",
                    root.display()
                ),
            );
        }
    }

    set
}

/// Read and parse a rule file. Relative roots resolve against its directory.
///
/// # Errors
/// Returns [`SrcpackError::RulesNotFound`] if the file is missing and
/// [`SrcpackError::Io`] if it cannot be read.
pub fn load_rules(path: &Path, default_extensions: &[String]) -> Result<RuleSet, SrcpackError> {
    if !path.is_file() {
        return Err(SrcpackError::RulesNotFound {
            path: path.to_owned(),
        });
    }
    let absolute = std::path::absolute(path)?;
    let base_dir = absolute.parent().unwrap_or(Path::new("/"));
    let decoded = read_text(&absolute)?;
    let text = decoded.text.strip_prefix('\u{feff}').unwrap_or(&decoded.text);
    Ok(parse_rules(text, base_dir, default_extensions))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
