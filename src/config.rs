//! srcpack configuration (`srcpack.toml`).
//!
//! Defines the typed configuration shared by both directions: the folder
//! denylist and default extensions used while collecting, and the prefix
//! mapping, overwrite policy and bootstrap files used while unpacking.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::paths::foreign_components;

/// Default config file name, looked up next to the executable.
pub const CONFIG_FILE: &str = "srcpack.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level srcpack configuration.
///
/// Missing fields use defaults. Missing file → all defaults (no error).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SrcpackConfig {
    /// Collection settings (pack direction).
    #[serde(default)]
    pub collect: CollectConfig,

    /// Restore settings (unpack direction).
    #[serde(default)]
    pub unpack: UnpackConfig,
}

// ---------------------------------------------------------------------------
// CollectConfig
// ---------------------------------------------------------------------------

/// Settings consumed by the rule parser and the collector.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CollectConfig {
    /// Folder names that are never descended into, wherever they appear in a
    /// path. Compared case-insensitively.
    #[serde(default = "default_exclude_folders")]
    pub exclude_folders: Vec<String>,

    /// Extensions used for a directory rule that names none.
    #[serde(default = "default_extensions")]
    pub default_extensions: Vec<String>,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            exclude_folders: default_exclude_folders(),
            default_extensions: default_extensions(),
        }
    }
}

fn default_exclude_folders() -> Vec<String> {
    vec![".vs".to_owned(), "obj".to_owned(), "properties".to_owned()]
}

fn default_extensions() -> Vec<String> {
    vec!["cs".to_owned()]
}

// ---------------------------------------------------------------------------
// UnpackConfig
// ---------------------------------------------------------------------------

/// Settings consumed by the unpacker.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UnpackConfig {
    /// Replace files that already exist under the restore root.
    ///
    /// Off by default: a re-run never clobbers earlier output, and when an
    /// archive declares the same path twice the first entry is kept.
    #[serde(default)]
    pub overwrite: bool,

    /// Bucket for entries whose path matches no prefix (keyed by file name).
    #[serde(default = "default_unclassified_dir")]
    pub unclassified_dir: String,

    /// Extensions whose leading blank and separator lines are stripped
    /// before the first `{` or `[`.
    #[serde(default = "default_structured_extensions")]
    pub structured_extensions: Vec<String>,

    /// Known source roots, tried in order. First match wins.
    #[serde(default)]
    pub prefixes: Vec<PrefixConfig>,

    /// Fixed files written once after a restore, never overwritten.
    #[serde(default)]
    pub bootstrap: Vec<BootstrapFile>,
}

impl Default for UnpackConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            unclassified_dir: default_unclassified_dir(),
            structured_extensions: default_structured_extensions(),
            prefixes: Vec::new(),
            bootstrap: Vec::new(),
        }
    }
}

fn default_unclassified_dir() -> String {
    "_misc".to_owned()
}

fn default_structured_extensions() -> Vec<String> {
    vec!["json".to_owned()]
}

/// A source root recorded at pack time and the folder it restores into.
///
/// ```toml
/// [[unpack.prefixes]]
/// source = 'C:\DEV\backend'
/// target = "backend"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrefixConfig {
    /// The absolute root as it appears in archive headers.
    pub source: String,

    /// Output subfolder under the restore root. Defaults to the last
    /// component of `source`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl PrefixConfig {
    /// The subfolder this prefix restores into.
    #[must_use]
    pub fn target_dir(&self) -> String {
        if let Some(target) = &self.target
            && !target.trim().is_empty()
        {
            return target.trim().to_owned();
        }
        foreign_components(&self.source)
            .last()
            .map(|s| (*s).to_owned())
            .unwrap_or_default()
    }
}

/// A fixed-content file written after unpacking.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapFile {
    /// Path relative to the restore root.
    pub path: String,

    /// File contents. `{generated}` is replaced by the restore timestamp.
    pub contents: String,
}

impl UnpackConfig {
    /// Pairs of prefix indices where one source is an ancestor of (or equal
    /// to) the other, ignoring case.
    ///
    /// With first-match semantics the later prefix of such a pair is partly
    /// or wholly shadowed, which is almost never intended.
    #[must_use]
    pub fn overlapping_prefixes(&self) -> Vec<(usize, usize)> {
        let folded: Vec<Vec<String>> = self
            .prefixes
            .iter()
            .map(|p| {
                foreign_components(&p.source)
                    .into_iter()
                    .map(str::to_lowercase)
                    .collect()
            })
            .collect();

        let mut overlaps = Vec::new();
        for (i, a) in folded.iter().enumerate() {
            for (j, b) in folded.iter().enumerate().skip(i + 1) {
                if a.starts_with(b) || b.starts_with(a) {
                    overlaps.push((i, j));
                }
            }
        }
        overlaps
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Why `srcpack.toml` was rejected.
#[derive(Debug)]
pub struct ConfigError {
    /// Config file, or `None` when parsing text that came from elsewhere.
    pub path: Option<PathBuf>,
    /// 1-based line the TOML parser pointed at.
    pub line: Option<usize>,
    pub reason: String,
}

impl ConfigError {
    /// `reason`, prefixed with the line when one is known.
    #[must_use]
    pub fn detail(&self) -> String {
        match self.line {
            Some(line) => format!("line {line}: {}", self.reason),
            None => self.reason.clone(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.detail()),
            None => write!(f, "{CONFIG_FILE}: {}", self.detail()),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SrcpackConfig {
    /// Read `srcpack.toml` from `path`. A missing file yields the built-in
    /// defaults so the tool runs with no config at all.
    ///
    /// # Errors
    /// The file exists but cannot be read, is not TOML, or names a key
    /// srcpack does not know.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    line: None,
                    reason: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&text).map_err(|err| ConfigError {
            path: Some(path.to_owned()),
            ..err
        })
    }

    /// Parse the contents of a `srcpack.toml`.
    ///
    /// # Errors
    /// Malformed TOML, a wrongly typed value, or an unknown section or key.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError {
            path: None,
            line: e.span().map(|span| {
                text.as_bytes()[..span.start]
                    .iter()
                    .filter(|&&b| b == b'\n')
                    .count()
                    + 1
            }),
            reason: e.message().to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
