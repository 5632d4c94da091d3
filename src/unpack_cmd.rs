use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use srcpack::archive::read_archive;
use srcpack::config::SrcpackConfig;
use srcpack::unpack::{UnpackReport, Unpacker};

use crate::format::OutputFormat;

#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Archive produced by `srcpack pack`
    pub archive: PathBuf,

    /// Directory to restore into (created if missing)
    pub restore_root: PathBuf,

    /// Replace files that already exist (the last entry for a path wins)
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Serialize)]
struct UnpackSummary<'a> {
    archive: &'a PathBuf,
    restore_root: &'a PathBuf,
    entries: usize,
    overwrite: bool,
    #[serde(flatten)]
    report: &'a UnpackReport,
}

pub fn run(args: &UnpackArgs, config: &SrcpackConfig, format: OutputFormat) -> Result<()> {
    let entries = read_archive(&args.archive)?;
    let overwrite = config.unpack.overwrite || args.overwrite;
    let unpacker = Unpacker::from_config(&config.unpack).with_overwrite(overwrite);
    let report = unpacker.unpack(&entries, &args.restore_root);

    let summary = UnpackSummary {
        archive: &args.archive,
        restore_root: &args.restore_root,
        entries: entries.len(),
        overwrite,
        report: &report,
    };
    format.emit(&summary, || print_text(&summary))
}

fn print_text(summary: &UnpackSummary<'_>) {
    let report = summary.report;
    for rejected in &report.rejected {
        println!("[WARN] skipped {}: {}", rejected.original_path, rejected.reason);
    }
    let kept = if summary.overwrite { "kept the later one" } else { "kept the first" };
    for collision in &report.collisions {
        println!(
            "[WARN] {} and {} both restore to {}; {kept}",
            collision.clashes_with,
            collision.original_path,
            collision.destination.display()
        );
    }
    for failed in &report.failed {
        println!("[WARN] could not write {}: {}", failed.path.display(), failed.reason);
    }
    if report.unclassified > 0 {
        println!(
            "[WARN] {} file(s) matched no prefix and were placed by file name only",
            report.unclassified
        );
        println!("       Add [[unpack.prefixes]] entries to srcpack.toml to keep their folders.");
    }
    if summary.entries == 0 {
        println!("[WARN] archive has no entries");
    }
    println!(
        "[OK] restored {} of {} file(s) into {}",
        report.written.len(),
        summary.entries,
        summary.restore_root.display()
    );
    if !report.skipped_existing.is_empty() {
        println!(
            "       {} already existed and were left untouched",
            report.skipped_existing.len()
        );
    }
    if !report.bootstrap_written.is_empty() {
        println!(
            "[OK] wrote {} bootstrap file(s)",
            report.bootstrap_written.len()
        );
    }
}
