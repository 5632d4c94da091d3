use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use srcpack::config::SrcpackConfig;

use crate::format::OutputFormat;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print only the path of the config file in use
    #[arg(long)]
    pub path: bool,
}

#[derive(Serialize)]
struct ConfigReport<'a> {
    path: &'a Path,
    exists: bool,
    config: &'a SrcpackConfig,
    warnings: Vec<String>,
}

pub fn run(
    args: &ConfigArgs,
    config: &SrcpackConfig,
    config_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    if args.path {
        println!("{}", config_path.display());
        return Ok(());
    }

    let warnings: Vec<String> = config
        .unpack
        .overlapping_prefixes()
        .into_iter()
        .map(|(first, second)| {
            format!(
                "prefix '{}' overlaps '{}'; the first one listed wins for paths under both",
                config.unpack.prefixes[first].source, config.unpack.prefixes[second].source
            )
        })
        .collect();

    let report = ConfigReport {
        path: config_path,
        exists: config_path.exists(),
        config,
        warnings,
    };

    if format.is_json() {
        println!("{}", format.serialize(&report)?);
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
    if report.exists {
        println!("# {}", config_path.display());
    } else {
        println!("# {} (not found; showing defaults)", config_path.display());
    }
    print!("{rendered}");
    if report.warnings.is_empty() {
        println!("[OK] configuration is consistent");
    }
    for warning in &report.warnings {
        println!("[WARN] {warning}");
    }
    Ok(())
}
