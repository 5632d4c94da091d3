//! Archive reader.
//!
//! Parses an archive back into entries with an explicit two-state machine.
//! Writer artifacts are removed on the way: separator lines anywhere, the
//! blank spacer after each header block, and the two trailing newlines
//! appended after each content block.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, trace};

use super::format::{is_footer, is_separator_line, parse_header};
use crate::encoding::read_text;
use crate::error::SrcpackError;

/// One file recovered from an archive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    /// Ordinal declared by the header (1-based).
    pub ordinal: usize,
    /// Entry count declared by the header.
    pub total: usize,
    /// Path exactly as recorded by the writer.
    pub original_path: String,
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReaderState {
    Outside,
    InFile,
}

/// Entry under construction.
struct Pending {
    ordinal: usize,
    total: usize,
    original_path: String,
    content: String,
    /// The next non-separator line may be the writer's blank spacer.
    expect_spacer: bool,
}

impl Pending {
    fn finish(mut self) -> ArchiveEntry {
        if self.content.ends_with("\n\n") {
            self.content.truncate(self.content.len() - 2);
        }
        ArchiveEntry {
            ordinal: self.ordinal,
            total: self.total,
            original_path: self.original_path,
            content: self.content,
        }
    }
}

struct Parser {
    state: ReaderState,
    pending: Option<Pending>,
    entries: Vec<ArchiveEntry>,
}

impl Parser {
    const fn new() -> Self {
        Self {
            state: ReaderState::Outside,
            pending: None,
            entries: Vec::new(),
        }
    }

    fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            let entry = pending.finish();
            debug!(
                ordinal = entry.ordinal,
                path = %entry.original_path,
                bytes = entry.content.len(),
                "entry parsed"
            );
            self.entries.push(entry);
        }
    }

    fn feed(&mut self, line: &str) {
        if let Some(header) = parse_header(line) {
            self.flush();
            self.pending = Some(Pending {
                ordinal: header.ordinal,
                total: header.total,
                original_path: header.path,
                content: String::new(),
                expect_spacer: true,
            });
            self.state = ReaderState::InFile;
            return;
        }

        match self.state {
            ReaderState::Outside => {
                trace!("outside entry: {}", line.trim_end());
            }
            ReaderState::InFile => {
                if is_footer(line) {
                    self.flush();
                    self.state = ReaderState::Outside;
                    return;
                }
                if is_separator_line(line) {
                    return;
                }
                let Some(pending) = self.pending.as_mut() else {
                    return;
                };
                if std::mem::take(&mut pending.expect_spacer) && line == "\n" {
                    return;
                }
                pending.content.push_str(line);
            }
        }
    }

    fn finish(mut self) -> Vec<ArchiveEntry> {
        self.flush();
        self.entries
    }
}

/// Parse archive text into entries, in archive order.
///
/// Duplicate headers yield duplicate entries; resolving them is the
/// caller's policy. Text before the first header is ignored, as is anything
/// after the footer that is not a header.
#[must_use]
pub fn parse_archive(text: &str) -> Vec<ArchiveEntry> {
    let mut parser = Parser::new();
    for line in text.split_inclusive('\n') {
        parser.feed(line);
    }
    parser.finish()
}

/// Read and parse an archive file.
///
/// # Errors
/// Returns [`SrcpackError::ArchiveNotFound`] if `path` is not a file and
/// [`SrcpackError::Io`] if it cannot be read.
pub fn read_archive(path: &Path) -> Result<Vec<ArchiveEntry>, SrcpackError> {
    if !path.is_file() {
        return Err(SrcpackError::ArchiveNotFound {
            path: path.to_owned(),
        });
    }
    let decoded = read_text(path)?;
    Ok(parse_archive(&decoded.text))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::format::{SEPARATOR_LINE, footer_line, header_line};
    use crate::archive::write::{ArchiveWriter, Banner};
    use chrono::Local;
    use std::path::PathBuf;

    fn pack(entries: &[(&str, &str)]) -> String {
        let banner = Banner {
            tool: "srcpack test".to_owned(),
            generated_at: Local::now(),
            rules_file: PathBuf::from("paths.txt"),
            processed_roots: Vec::new(),
        };
        let mut w = ArchiveWriter::new(Vec::new(), entries.len());
        w.write_banner(&banner).unwrap();
        for (path, content) in entries {
            w.write_entry(path, content).unwrap();
        }
        String::from_utf8(w.finish().unwrap()).unwrap()
    }

    fn contents(text: &str) -> Vec<(String, String)> {
        parse_archive(text)
            .into_iter()
            .map(|e| (e.original_path, e.content))
            .collect()
    }

    #[test]
    fn round_trip_is_byte_exact() {
        let cases = [
            ("/a/plain.py", "x = 1\n"),
            ("/a/no_newline.py", "x = 1"),
            ("/a/empty.py", ""),
            ("/a/crlf.cs", "class A\r\n{\r\n}\r\n"),
            ("/a/leading_blank.md", "\n\n# Title\n"),
            ("/a/trailing_blank.txt", "end\n\n\n"),
            ("/a/only_newline.txt", "\n"),
            ("/a/markdown.md", "Title\n-----\n\n========\n"),
        ];
        let parsed = contents(&pack(&cases));
        assert_eq!(parsed.len(), cases.len());
        for ((path, content), (got_path, got)) in cases.iter().zip(&parsed) {
            assert_eq!(got_path, path);
            assert_eq!(got, content, "content mismatch for {path}");
        }
    }

    #[test]
    fn ordinals_and_order_are_preserved() {
        let entries = parse_archive(&pack(&[("/z", "1"), ("/a", "2")]));
        assert_eq!(entries[0].original_path, "/z");
        assert_eq!(entries[0].ordinal, 1);
        assert_eq!(entries[1].ordinal, 2);
        assert!(entries.iter().all(|e| e.total == 2));
    }

    #[test]
    fn banner_and_empty_notice_produce_no_entries() {
        assert!(parse_archive(&pack(&[])).is_empty());
        assert!(parse_archive("").is_empty());
    }

    #[test]
    fn separator_lines_inside_content_are_stripped() {
        let parsed = contents(&pack(&[("/a.js", "a();\n// ==========\nb();\n")]));
        assert_eq!(parsed[0].1, "a();\nb();\n");
    }

    #[test]
    fn lookalike_header_lines_stay_in_content() {
        let body = "// FILE: x\nFILE: x\n/* [a/b] FILE: x */\n";
        let parsed = contents(&pack(&[("/a.txt", body)]));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].1, body);
    }

    #[test]
    fn duplicate_headers_yield_two_entries_in_order() {
        let text = format!(
            "{h}\n\nfirst\n\n{h}\n\nsecond\n\n{f}\n",
            h = header_line(1, 1, "/dup.txt"),
            f = footer_line(1)
        );
        let parsed = contents(&text);
        assert_eq!(
            parsed,
            vec![
                ("/dup.txt".to_owned(), "first".to_owned()),
                ("/dup.txt".to_owned(), "second".to_owned()),
            ]
        );
    }

    #[test]
    fn text_after_footer_is_ignored() {
        let mut text = pack(&[("/a.txt", "a\n")]);
        text.push_str("trailing notes\n");
        let parsed = contents(&text);
        assert_eq!(parsed, vec![("/a.txt".to_owned(), "a\n".to_owned())]);
    }

    #[test]
    fn truncated_archive_flushes_last_entry() {
        let text = format!(
            "{SEPARATOR_LINE}\n{}\n{SEPARATOR_LINE}\n\nhalf a file\n",
            header_line(1, 3, "/cut.txt")
        );
        let parsed = contents(&text);
        assert_eq!(parsed, vec![("/cut.txt".to_owned(), "half a file\n".to_owned())]);
    }

    #[test]
    fn crlf_archive_structure_is_recognized() {
        let text = format!(
            "{SEPARATOR_LINE}\r\n{}\r\n{SEPARATOR_LINE}\r\n\r\nbody\r\n{}\r\n",
            header_line(1, 1, r"C:\src\a.cs"),
            footer_line(1)
        );
        let parsed = contents(&text);
        assert_eq!(parsed[0].0, r"C:\src\a.cs");
        assert_eq!(parsed[0].1, "\r\nbody\r\n");
    }

    #[test]
    fn read_archive_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_archive(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, SrcpackError::ArchiveNotFound { .. }));
    }

    #[test]
    fn read_archive_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.txt");
        std::fs::write(&path, pack(&[("/x.py", "pass\n")])).unwrap();
        let entries = read_archive(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "pass\n");
    }
}
