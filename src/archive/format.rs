//! The archive line grammar shared by the writer and the reader.
//!
//! ```text
//! /* ================================================== */   separator
//! /* [3/120] FILE: C:\DEV\app\src\index.js */                header
//! /* ================================================== */   separator
//!
//! ...raw content...
//!
//! /* [END OF ARCHIVE] 120 file(s) */                         footer
//! ```
//!
//! Any change here changes the archive format for both directions.

use std::sync::LazyLock;

use regex::Regex;

/// Characters a separator line may be built from (besides spaces).
pub const SEPARATOR_SYMBOLS: [char; 3] = ['=', '-', '_'];

/// Minimum number of symbol characters for a line to count as a separator.
pub const MIN_SEPARATOR_SYMBOLS: usize = 5;

/// The separator the writer emits around every header.
pub const SEPARATOR_LINE: &str = "/* ================================================== */";

/// Rule closing the banner. Not a separator: it is not a comment.
pub const BANNER_RULE: &str = "========================================";

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*/\*\s*\[(\d+)/(\d+)\]\s*FILE:\s*(\S.*?)\s*\*/\s*$")
        .expect("header pattern is valid")
});

static FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*/\*\s*\[END OF ARCHIVE\]\s*\d+\s+file\(s\)\s*\*/\s*$")
        .expect("footer pattern is valid")
});

/// A parsed header line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// 1-based position declared by the writer.
    pub ordinal: usize,
    /// Total entry count declared by the writer.
    pub total: usize,
    /// Original path, exactly as recorded.
    pub path: String,
}

/// Render the header line for one entry (no line terminator).
#[must_use]
pub fn header_line(ordinal: usize, total: usize, path: &str) -> String {
    format!("/* [{ordinal}/{total}] FILE: {path} */")
}

/// Render the footer line (no line terminator).
#[must_use]
pub fn footer_line(total: usize) -> String {
    format!("/* [END OF ARCHIVE] {total} file(s) */")
}

/// Inline marker written in place of content that could not be read.
#[must_use]
pub fn read_error_marker(reason: &str) -> String {
    format!("/* ERROR: could not read file: {reason} */\n")
}

/// Parse a header line, if `line` is one.
#[must_use]
pub fn parse_header(line: &str) -> Option<Header> {
    let caps = HEADER_RE.captures(line)?;
    Some(Header {
        ordinal: caps[1].parse().ok()?,
        total: caps[2].parse().ok()?,
        path: caps[3].to_owned(),
    })
}

/// True if `line` is the footer.
#[must_use]
pub fn is_footer(line: &str) -> bool {
    FOOTER_RE.is_match(line)
}

/// True if `line` is an artificial separator.
///
/// A separator is a `/* ... */` or `// ...` comment whose inside holds only
/// separator symbols and spaces, with at least [`MIN_SEPARATOR_SYMBOLS`]
/// symbols. Comments with any other character are ordinary content.
#[must_use]
pub fn is_separator_line(line: &str) -> bool {
    let s = line.trim();
    let inner = if let Some(body) = s.strip_prefix("/*").and_then(|r| r.strip_suffix("*/")) {
        body
    } else if let Some(body) = s.strip_prefix("//") {
        body
    } else {
        return false;
    };

    let mut symbols = 0usize;
    for c in inner.chars() {
        if SEPARATOR_SYMBOLS.contains(&c) {
            symbols += 1;
        } else if c != ' ' {
            return false;
        }
    }
    symbols >= MIN_SEPARATOR_SYMBOLS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_renders_and_parses() {
        let line = header_line(3, 120, r"C:\DEV\app\src\index.js");
        assert_eq!(line, r"/* [3/120] FILE: C:\DEV\app\src\index.js */");
        let h = parse_header(&line).unwrap();
        assert_eq!(h.ordinal, 3);
        assert_eq!(h.total, 120);
        assert_eq!(h.path, r"C:\DEV\app\src\index.js");
    }

    #[test]
    fn header_tolerates_whitespace_and_line_endings() {
        let h = parse_header("  /*[1/2]   FILE:   /a b/c.py   */  \r\n").unwrap();
        assert_eq!(h.path, "/a b/c.py");
    }

    #[test]
    fn lookalike_headers_are_not_headers() {
        for line in [
            "// FILE: /a/b.py",
            "FILE: /a/b.py",
            "/* FILE: /a/b.py */",
            "/* [a/b] FILE: /a/b.py */",
            "/* [1/2] FILE: /a/b.py",
            "x = 1 /* [1/2] FILE: /a/b.py */",
            "/* [1/2] FILE: */",
        ] {
            assert!(parse_header(line).is_none(), "matched: {line}");
        }
    }

    #[test]
    fn footer_is_recognized() {
        assert!(is_footer(&footer_line(0)));
        assert!(is_footer("/* [END OF ARCHIVE] 12 file(s) */\n"));
        assert!(!is_footer("/* END OF ARCHIVE */"));
    }

    #[test]
    fn writer_separator_is_a_separator() {
        assert!(is_separator_line(SEPARATOR_LINE));
        assert!(is_separator_line(&format!("{SEPARATOR_LINE}\r\n")));
    }

    #[test]
    fn separator_variants() {
        assert!(is_separator_line("// ------------------------"));
        assert!(is_separator_line("//____________"));
        assert!(is_separator_line("   /* = = = = = */   "));
        assert!(is_separator_line("/* =-_=- */"));
    }

    #[test]
    fn short_or_mixed_comments_are_content() {
        assert!(!is_separator_line("// ----"));
        assert!(!is_separator_line("/* ==== */"));
        assert!(!is_separator_line("// --- Section ---"));
        assert!(!is_separator_line("/* ===== 1 ===== */"));
        assert!(!is_separator_line("//"));
        assert!(!is_separator_line("/**/"));
    }

    #[test]
    fn bare_rules_are_content() {
        assert!(!is_separator_line(BANNER_RULE));
        assert!(!is_separator_line("-----"));
        assert!(!is_separator_line("# ======="));
        assert!(!is_separator_line(""));
    }

    #[test]
    fn read_error_marker_is_not_structural() {
        let marker = read_error_marker("permission denied");
        assert!(!is_separator_line(&marker));
        assert!(parse_header(&marker).is_none());
        assert!(!is_footer(&marker));
    }
}
