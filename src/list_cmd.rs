use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use srcpack::archive::read_archive;

use crate::format::OutputFormat;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Archive produced by `srcpack pack`
    pub archive: PathBuf,
}

#[derive(Serialize)]
struct ListedEntry {
    ordinal: usize,
    path: String,
    bytes: usize,
    lines: usize,
}

pub fn run(args: &ListArgs, format: OutputFormat) -> Result<()> {
    let listed: Vec<ListedEntry> = read_archive(&args.archive)?
        .into_iter()
        .map(|e| ListedEntry {
            ordinal: e.ordinal,
            lines: e.content.lines().count(),
            bytes: e.content.len(),
            path: e.original_path,
        })
        .collect();

    format.emit(&listed, || {
        let width = listed.len().to_string().len();
        for entry in &listed {
            println!(
                "{:>width$}  {:>8}  {}",
                entry.ordinal, entry.bytes, entry.path
            );
        }
        println!("{} entr{}", listed.len(), if listed.len() == 1 { "y" } else { "ies" });
    })
}
