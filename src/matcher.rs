//! Exclusion predicates for collection.
//!
//! Two independent sources decide whether a path is skipped:
//!
//! - [`ExcludeSet`]: explicit `path, none` records from the rule file. A path
//!   is excluded when it equals a rule root or lies beneath one.
//! - [`FolderDenylist`]: fixed folder names from config (`.vs`, `obj`, ...)
//!   that exclude anything with such a folder anywhere in its ancestry.
//!
//! [`PathMatcher`] ORs the two. Both compare case-insensitively.

use std::collections::BTreeSet;
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

use crate::paths::{fold_case, normalize_lexically};

// ---------------------------------------------------------------------------
// ExcludeSet
// ---------------------------------------------------------------------------

/// A root under which nothing is collected.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExcludeRule {
    /// Absolute, lexically normalized root.
    pub root: PathBuf,
}

/// The set of explicit exclude rules for one run.
#[derive(Clone, Debug, Default)]
pub struct ExcludeSet {
    rules: BTreeSet<ExcludeRule>,
    /// Folded roots with a trailing separator, kept in step with `rules`.
    folded: Vec<(String, String)>,
}

impl ExcludeSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root. Returns `false` if an equal root was already present.
    pub fn insert(&mut self, root: &Path) -> bool {
        let root = normalize_lexically(root);
        let exact = fold_case(&root);
        let rule = ExcludeRule { root };
        if !self.rules.insert(rule) {
            return false;
        }
        let prefix = if exact.ends_with(MAIN_SEPARATOR) {
            exact.clone()
        } else {
            format!("{exact}{MAIN_SEPARATOR}")
        };
        self.folded.push((exact, prefix));
        true
    }

    /// Iterate the rules in path order.
    pub fn iter(&self) -> impl Iterator<Item = &ExcludeRule> {
        self.rules.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if `path` is an exclude root or lies beneath one.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.folded.is_empty() {
            return false;
        }
        let candidate = fold_case(&normalize_lexically(path));
        self.folded
            .iter()
            .any(|(exact, prefix)| candidate == *exact || candidate.starts_with(prefix.as_str()))
    }
}

impl FromIterator<PathBuf> for ExcludeSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut set = Self::new();
        for root in iter {
            set.insert(&root);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// FolderDenylist
// ---------------------------------------------------------------------------

/// Folder names that are excluded wherever they appear.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FolderDenylist {
    names: BTreeSet<String>,
}

impl FolderDenylist {
    /// Build from configured names; blanks are ignored, case is folded.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    /// True if `name` (a single folder name) is denylisted.
    #[must_use]
    pub fn denies_name(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// True if any folder in the ancestry of `path` is denylisted.
    ///
    /// The final component is the file itself and is not consulted.
    #[must_use]
    pub fn denies_ancestry(&self, path: &Path) -> bool {
        if self.names.is_empty() {
            return false;
        }
        path.parent().is_some_and(|parent| {
            parent.components().any(|c| match c {
                Component::Normal(name) => self.denies_name(&name.to_string_lossy()),
                _ => false,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// PathMatcher
// ---------------------------------------------------------------------------

/// Both exclusion mechanisms, composed with a logical OR.
#[derive(Clone, Debug, Default)]
pub struct PathMatcher {
    excludes: ExcludeSet,
    denylist: FolderDenylist,
}

impl PathMatcher {
    #[must_use]
    pub const fn new(excludes: ExcludeSet, denylist: FolderDenylist) -> Self {
        Self { excludes, denylist }
    }

    #[must_use]
    pub const fn excludes(&self) -> &ExcludeSet {
        &self.excludes
    }

    #[must_use]
    pub const fn denylist(&self) -> &FolderDenylist {
        &self.denylist
    }

    /// Leaf-file check: explicit rule or denylisted ancestor.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.excludes.is_excluded(path) || self.denylist.denies_ancestry(path)
    }

    /// Directory check used to prune a walk before descending.
    #[must_use]
    pub fn prunes_dir(&self, dir: &Path) -> bool {
        let own_name_denied = dir
            .file_name()
            .is_some_and(|name| self.denylist.denies_name(&name.to_string_lossy()));
        own_name_denied || self.is_excluded(dir)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
