use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use srcpack::archive::write::UnreadableFile;
use srcpack::archive::{Banner, write_archive_file};
use srcpack::collect::collect;
use srcpack::config::SrcpackConfig;
use srcpack::encoding::TextEncoding;
use srcpack::matcher::{FolderDenylist, PathMatcher};
use srcpack::rules::{RuleDiagnostic, load_rules};

use crate::beside_exe;
use crate::format::OutputFormat;

/// Rule file name used when `--rules` is not given.
pub const DEFAULT_RULES: &str = "paths.txt";
/// Archive name used when `--output` is not given.
pub const DEFAULT_ARCHIVE: &str = "extracted_code.txt";

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Rule file [default: paths.txt next to the executable]
    #[arg(long, short, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Archive to write [default: extracted_code.txt next to the executable]
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct PackSummary {
    rules_file: PathBuf,
    archive: PathBuf,
    files: usize,
    processed_roots: Vec<PathBuf>,
    excludes: usize,
    diagnostics: Vec<RuleDiagnostic>,
    unreadable: Vec<UnreadableFile>,
    encodings: BTreeMap<TextEncoding, usize>,
}

pub fn run(args: &PackArgs, config: &SrcpackConfig, format: OutputFormat) -> Result<()> {
    let rules_file = args
        .rules
        .clone()
        .unwrap_or_else(|| beside_exe(DEFAULT_RULES));
    let archive = args
        .output
        .clone()
        .unwrap_or_else(|| beside_exe(DEFAULT_ARCHIVE));

    let rules = load_rules(&rules_file, &config.collect.default_extensions)?;
    let matcher = PathMatcher::new(
        rules.excludes.clone(),
        FolderDenylist::new(&config.collect.exclude_folders),
    );
    let collection = collect(&rules.includes, &matcher);

    let rules_display = std::path::absolute(&rules_file).unwrap_or_else(|_| rules_file.clone());
    let banner = Banner::now(&rules_display, &collection.processed_roots);
    let report = write_archive_file(&archive, &collection, &banner)
        .with_context(|| format!("failed to write archive {}", archive.display()))?;

    let summary = PackSummary {
        rules_file: rules_display,
        archive,
        files: report.entries,
        processed_roots: collection.processed_roots,
        excludes: rules.excludes.len(),
        diagnostics: rules.diagnostics,
        unreadable: report.unreadable,
        encodings: report.encodings,
    };

    format.emit(&summary, || print_text(&summary))
}

fn print_text(summary: &PackSummary) {
    for diag in &summary.diagnostics {
        println!("[WARN] rules line {}: {}", diag.line, diag.message);
    }
    for file in &summary.unreadable {
        println!(
            "[WARN] could not read {}: {}",
            file.path.display(),
            file.reason
        );
    }
    if summary.files == 0 {
        println!("[WARN] no files matched the rules");
    }
    println!(
        "[OK] packed {} file(s) from {} root(s) into {}",
        summary.files,
        summary.processed_roots.len(),
        summary.archive.display()
    );
    let non_utf8: usize = summary
        .encodings
        .iter()
        .filter(|(enc, _)| **enc != TextEncoding::Utf8)
        .map(|(_, n)| n)
        .sum();
    if non_utf8 > 0 {
        println!("       {non_utf8} file(s) were not UTF-8 and were re-encoded");
    }
}
