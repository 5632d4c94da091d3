//! Error types for srcpack.
//!
//! Defines [`SrcpackError`], the error type for the fatal conditions of a
//! pack or unpack run. Everything else (an unreadable source file, a
//! malformed rule, an archive path that matches no prefix) is recovered
//! locally and surfaces in a report instead.
//!
//! Messages follow the same shape: what went wrong, then a `To fix:` line.

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// SrcpackError
// ---------------------------------------------------------------------------

/// Fatal error for a pack or unpack run.
#[derive(Debug)]
pub enum SrcpackError {
    /// The rule file passed to `pack` does not exist.
    RulesNotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The archive passed to `unpack` or `list` does not exist.
    ArchiveNotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// A configuration file could not be loaded or parsed.
    ConfigError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// An I/O error that aborts the run (e.g. the archive cannot be written).
    Io(std::io::Error),
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for SrcpackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RulesNotFound { path } => {
                write!(
                    f,
                    "rule file '{}' not found.\n  To fix: create it with one `path, ext1, ext2` record per line, or pass --rules <file>.",
                    path.display()
                )
            }
            Self::ArchiveNotFound { path } => {
                write!(
                    f,
                    "archive '{}' not found.\n  To fix: check the path, or create one first:\n    srcpack pack --output <file>",
                    path.display()
                )
            }
            Self::ConfigError { path, detail } => {
                write!(
                    f,
                    "configuration error in '{}': {}\n  To fix: edit the config file and correct the issue.",
                    path.display(),
                    detail
                )
            }
            Self::Io(err) => {
                write!(
                    f,
                    "I/O error: {err}\n  To fix: check file permissions and disk space."
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// std::error::Error
// ---------------------------------------------------------------------------

impl std::error::Error for SrcpackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// From impls
// ---------------------------------------------------------------------------

impl From<std::io::Error> for SrcpackError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<crate::config::ConfigError> for SrcpackError {
    fn from(err: crate::config::ConfigError) -> Self {
        let detail = err.detail();
        Self::ConfigError {
            path: err.path.unwrap_or_default(),
            detail,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_rules_not_found() {
        let err = SrcpackError::RulesNotFound {
            path: PathBuf::from("/tools/paths.txt"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("/tools/paths.txt"));
        assert!(msg.contains("not found"));
        assert!(msg.contains("--rules"));
    }

    #[test]
    fn display_archive_not_found() {
        let err = SrcpackError::ArchiveNotFound {
            path: PathBuf::from("dump.txt"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("dump.txt"));
        assert!(msg.contains("srcpack pack"));
    }

    #[test]
    fn display_config_error() {
        let err = SrcpackError::ConfigError {
            path: PathBuf::from("srcpack.toml"),
            detail: "unknown field 'foo'".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("srcpack.toml"));
        assert!(msg.contains("unknown field 'foo'"));
        assert!(msg.contains("edit the config file"));
    }

    #[test]
    fn display_io_error() {
        let err = SrcpackError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        ));
        let msg = format!("{err}");
        assert!(msg.contains("permission denied"));
        assert!(msg.contains("file permissions"));
    }

    #[test]
    fn error_source_io() {
        let err = SrcpackError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn error_source_non_io_is_none() {
        let err = SrcpackError::ArchiveNotFound {
            path: PathBuf::from("x"),
        };
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn from_config_error() {
        let cfg_err = crate::config::ConfigError {
            path: Some(PathBuf::from("/tools/srcpack.toml")),
            line: Some(2),
            reason: "bad syntax".to_owned(),
        };
        let err: SrcpackError = cfg_err.into();
        match err {
            SrcpackError::ConfigError { path, detail } => {
                assert_eq!(path, PathBuf::from("/tools/srcpack.toml"));
                assert_eq!(detail, "line 2: bad syntax");
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn from_io_error() {
        let err: SrcpackError = std::io::Error::other("disk full").into();
        assert!(matches!(err, SrcpackError::Io(_)));
    }
}
