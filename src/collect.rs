//! File collection for the pack direction.
//!
//! Walks every include root and produces the ordered, deduplicated list of
//! files that go into the archive.
//!
//! # Invariants
//!
//! - **Determinism**: rules are visited in root order, directories are walked
//!   in file-name order, and the output is sorted case-insensitively (ties
//!   broken by the exact path).
//! - **Deduplication**: a file reachable through several include rules is
//!   listed once, attributed to the first rule that found it.
//! - **Exclusion precedence**: a file under an exclude root is never listed,
//!   whatever include rule reaches it. Excluded directories are not walked.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::matcher::PathMatcher;
use crate::paths::{fold_case, normalize_lexically};
use crate::rules::{IncludeRule, RootKind};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One file selected for packing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CollectedFile {
    /// Absolute, lexically normalized path.
    pub path: PathBuf,
    /// Root of the include rule that found it.
    pub discovered_via: PathBuf,
}

/// The outcome of a collection run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Collection {
    /// Files in archive order.
    pub files: Vec<CollectedFile>,
    /// Directory roots and the parents of direct-file roots, sorted.
    pub processed_roots: Vec<PathBuf>,
}

impl Collection {
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

// ---------------------------------------------------------------------------
// collect
// ---------------------------------------------------------------------------

/// Collect every file admitted by `includes` and not excluded by `matcher`.
#[must_use]
pub fn collect(includes: &[IncludeRule], matcher: &PathMatcher) -> Collection {
    let mut ordered: Vec<&IncludeRule> = includes.iter().collect();
    ordered.sort_by(|a, b| a.root.cmp(&b.root));

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files: Vec<CollectedFile> = Vec::new();
    let mut roots: BTreeSet<PathBuf> = BTreeSet::new();

    for rule in ordered {
        let mut found = Vec::new();
        match rule.kind {
            RootKind::File => {
                if !rule.root.is_file() {
                    debug!(root = %rule.root.display(), "file root no longer exists; skipped");
                    continue;
                }
                if let Some(parent) = rule.root.parent() {
                    roots.insert(parent.to_owned());
                }
                collect_file(rule, matcher, &mut found);
            }
            RootKind::Directory => {
                if !rule.root.is_dir() {
                    debug!(root = %rule.root.display(), "directory root no longer exists; skipped");
                    continue;
                }
                roots.insert(rule.root.clone());
                collect_dir(rule, matcher, &mut found);
            }
        }

        for path in found {
            if seen.insert(path.clone()) {
                files.push(CollectedFile {
                    path,
                    discovered_via: rule.root.clone(),
                });
            }
        }
    }

    files.sort_by(|a, b| {
        fold_case(&a.path)
            .cmp(&fold_case(&b.path))
            .then_with(|| a.path.cmp(&b.path))
    });

    // Final pass over the explicit excludes: direct-file rules never went
    // through the walk's pruning.
    files.retain(|file| {
        let excluded = matcher.excludes().is_excluded(&file.path);
        if excluded {
            debug!(path = %file.path.display(), "dropped by exclude rule");
        }
        !excluded
    });

    Collection {
        files,
        processed_roots: roots.into_iter().collect(),
    }
}

fn collect_file(rule: &IncludeRule, matcher: &PathMatcher, found: &mut Vec<PathBuf>) {
    if !rule.admits(&rule.root) {
        debug!(
            path = %rule.root.display(),
            "direct file skipped: extension not in {:?}",
            rule.extensions
        );
        return;
    }
    if matcher.is_excluded(&rule.root) {
        debug!(path = %rule.root.display(), "direct file excluded");
        return;
    }
    found.push(rule.root.clone());
}

fn collect_dir(rule: &IncludeRule, matcher: &PathMatcher, found: &mut Vec<PathBuf>) {
    if matcher.prunes_dir(&rule.root) {
        debug!(root = %rule.root.display(), "include root is excluded; not walked");
        return;
    }

    let walker = WalkDir::new(&rule.root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_type().is_dir() || !matcher.prunes_dir(entry.path())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry under {}: {err}", rule.root.display());
                continue;
            }
        };
        if !is_regular_file(&entry) {
            continue;
        }
        let path = normalize_lexically(entry.path());
        if rule.admits(&path) && !matcher.is_excluded(&path) {
            found.push(path);
        }
    }
}

fn is_regular_file(entry: &walkdir::DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
