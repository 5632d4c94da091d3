//! Path normalization shared by the rule parser, matcher and collector.
//!
//! Rule files are often written on Windows and consumed elsewhere, so both
//! `\` and `/` are accepted as separators in raw input. Comparisons are
//! lexical: nothing here touches the filesystem.

use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/// Strip surrounding whitespace and one layer of matching quotes.
#[must_use]
pub fn clean_raw(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    trimmed
}

/// Rewrite every `\` and `/` to the platform separator.
#[must_use]
pub fn to_native_separators(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == '\\' || c == '/' { MAIN_SEPARATOR } else { c })
        .collect()
}

/// Fold `.` and `..` components without consulting the filesystem.
///
/// `..` at the root is dropped, matching what `cd ..` does at `/`.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_in_normal =
                    matches!(out.components().next_back(), Some(Component::Normal(_)));
                if ends_in_normal {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Turn raw rule-file text into an absolute, normalized path.
#[must_use]
pub fn resolve_root(raw: &str, base_dir: &Path) -> PathBuf {
    let native = PathBuf::from(to_native_separators(clean_raw(raw)));
    let absolute = if native.is_absolute() {
        native
    } else {
        base_dir.join(native)
    };
    normalize_lexically(&absolute)
}

/// Case-folded string form used for every case-insensitive comparison.
#[must_use]
pub fn fold_case(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Lowercase extension without the dot; empty when the file has none.
#[must_use]
pub fn extension_key(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Split a recorded path on either separator, dropping empty segments.
///
/// Archive headers carry paths exactly as they were written on the packing
/// machine, which may not be this platform.
#[must_use]
pub fn foreign_components(recorded: &str) -> Vec<&str> {
    recorded
        .split(['\\', '/'])
        .filter(|segment| !segment.is_empty())
        .collect()
}
