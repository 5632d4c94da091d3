use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use srcpack::config::{CONFIG_FILE, SrcpackConfig};
use srcpack::error::SrcpackError;

mod config_cmd;
mod format;
mod list_cmd;
mod pack_cmd;
mod telemetry;
mod unpack_cmd;

use format::OutputFormat;

/// Snapshot source trees into one text archive, and restore them from it
///
/// PACK reads a rule file and writes every matching file into a single
/// archive. Each file becomes a block with a numbered header carrying its
/// original absolute path.
///
/// UNPACK parses an archive and writes each file back under a restore
/// root, mapping original paths through the prefixes in srcpack.toml.
/// Existing files are never overwritten unless asked.
///
/// RULE FILE (one record per line, '#' starts a comment):
///
///   C:\DEV\api, cs, json      include *.cs and *.json under C:\DEV\api
///   C:\DEV\api\bin, none      exclude everything under C:\DEV\api\bin
///   tools\build.ps1           include a single file
///   ..\shared                 relative to the rule file's folder
///
/// QUICK START:
///
///   srcpack pack --rules paths.txt --output snapshot.txt
///   srcpack list snapshot.txt
///   srcpack unpack snapshot.txt ./restored
///
/// Logging goes to stderr; set SRCPACK_LOG=debug to see per-file decisions.
#[derive(Parser)]
#[command(name = "srcpack")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(
    after_help = "See 'srcpack <command> --help' for more information on a specific command."
)]
struct Cli {
    /// Configuration file [default: srcpack.toml next to the executable]
    #[arg(long, global = true, env = "SRCPACK_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format for summaries: text or json
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect files named by a rule file into one archive
    ///
    /// The archive is truncated and rewritten on every run. Files that
    /// cannot be read get an inline error marker instead of content.
    Pack(pack_cmd::PackArgs),

    /// Restore the files in an archive under a restore root
    ///
    /// Safe to run repeatedly: files that already exist are skipped.
    Unpack(unpack_cmd::UnpackArgs),

    /// Show the entries of an archive without writing anything
    List(list_cmd::ListArgs),

    /// Print the effective configuration and check it for problems
    Config(config_cmd::ConfigArgs),
}

/// Resolve `name` in the directory holding the executable.
///
/// Falls back to the current directory when the executable path is unknown.
pub fn beside_exe(name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init();

    let explicit_config = cli.config.is_some();
    let config_path = cli.config.unwrap_or_else(|| beside_exe(CONFIG_FILE));
    if explicit_config && !config_path.exists() {
        tracing::warn!(path = %config_path.display(), "config file not found; using defaults");
    }
    let config = SrcpackConfig::load(&config_path).map_err(SrcpackError::from)?;

    match cli.command {
        Commands::Pack(ref args) => pack_cmd::run(args, &config, cli.format),
        Commands::Unpack(ref args) => unpack_cmd::run(args, &config, cli.format),
        Commands::List(ref args) => list_cmd::run(args, cli.format),
        Commands::Config(ref args) => config_cmd::run(args, &config, &config_path, cli.format),
    }
}
