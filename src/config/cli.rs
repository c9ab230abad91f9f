//! Command line interface

use super::{Config, FileConfig, Operation};
use crate::types::{
    CompareProperty, CompareSpec, ConflictPolicy, FerryError, SearchTarget, SyncMode,
    SyncPreference,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ferry", version, about = "Copy, move and sync matched files")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy matched entries into the target directory
    Copy(CopyArgs),
    /// Move matched entries into the target directory
    Move(CopyArgs),
    /// Synchronize one source directory with the target directory
    Sync(SyncArgs),
}

/// Options shared by every command
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Source directories
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<PathBuf>,

    /// Target directory
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Show what would happen without changing anything
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Properties deciding whether an existing file is equal (comma separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub compare: Vec<CompareProperty>,

    /// What to do when the destination already exists
    #[arg(long, value_enum)]
    pub conflict: Option<ConflictPolicy>,

    /// Only match paths matching this glob (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip paths matching this glob (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Which entry kinds to match
    #[arg(long, value_enum)]
    pub kind: Option<SearchTarget>,

    /// Also honor .gitignore and .ignore files
    #[arg(long)]
    pub ignore_files: bool,

    /// Do not print a line per entry
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not print skipped entries
    #[arg(long)]
    pub hide_skipped: bool,

    /// Print the final counters as JSON
    #[arg(long)]
    pub summary_json: bool,

    /// Read defaults from a TOML file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CopyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Put matched files directly into the target directory
    #[arg(long)]
    pub flatten: bool,

    /// Copy only the directory structure and individually matched files
    #[arg(long)]
    pub structure_only: bool,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// contribute adds only, mirror also deletes, synchronize works both ways
    #[arg(long, value_enum)]
    pub mode: Option<SyncMode>,

    /// Let the newer file win a two-way conflict
    #[arg(long)]
    pub prefer_newer: bool,

    /// Which side wins a two-way conflict
    #[arg(long, value_enum)]
    pub prefer: Option<SyncPreference>,
}

impl TryFrom<Cli> for Config {
    type Error = FerryError;

    /// Merge CLI values over the config file over defaults, then validate
    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let config = match cli.command {
            Command::Copy(args) => from_copy_args(Operation::Copy, args)?,
            Command::Move(args) => from_copy_args(Operation::Move, args)?,
            Command::Sync(args) => {
                let file = load_file(&args.common)?;
                let mut config = from_common(Operation::Sync, args.common, &file);
                config.flatten = file.flatten.unwrap_or(false);
                config.sync_mode = args.mode.or(file.mode).unwrap_or_default();
                config.prefer_newer = args.prefer_newer || file.prefer_newer.unwrap_or(false);
                config.sync_preference = args.prefer.or(file.prefer).unwrap_or_default();
                config
            }
        };

        config.validate()?;
        Ok(config)
    }
}

fn from_copy_args(operation: Operation, args: CopyArgs) -> Result<Config, FerryError> {
    let file = load_file(&args.common)?;
    let mut config = from_common(operation, args.common, &file);
    config.flatten = args.flatten || file.flatten.unwrap_or(false);
    config.structure_only = args.structure_only || file.structure_only.unwrap_or(false);
    Ok(config)
}

fn load_file(common: &CommonArgs) -> Result<FileConfig, FerryError> {
    match &common.config {
        Some(path) => FileConfig::load(path),
        None => Ok(FileConfig::default()),
    }
}

fn from_common(operation: Operation, common: CommonArgs, file: &FileConfig) -> Config {
    let compare = if !common.compare.is_empty() {
        CompareSpec::from_properties(&common.compare)
    } else if let Some(properties) = &file.compare {
        CompareSpec::from_properties(properties)
    } else {
        CompareSpec::default()
    };

    let mut include_patterns = file.include.clone();
    include_patterns.extend(common.include);
    let mut exclude_patterns = file.exclude.clone();
    exclude_patterns.extend(common.exclude);

    Config {
        operation,
        sources: common.sources,
        target: common.target.or_else(|| file.target.clone()).unwrap_or_default(),
        dry_run: common.dry_run || file.dry_run.unwrap_or(false),
        compare,
        conflict_policy: common
            .conflict
            .or(file.conflict)
            .unwrap_or(ConflictPolicy::Ask),
        include_patterns,
        exclude_patterns,
        search_target: common.kind.or(file.kind).unwrap_or_default(),
        respect_ignore_files: common.ignore_files || file.ignore_files.unwrap_or(false),
        quiet: common.quiet || file.quiet.unwrap_or(false),
        omit_skipped: common.hide_skipped || file.hide_skipped.unwrap_or(false),
        json_summary: common.summary_json || file.summary_json.unwrap_or(false),
        ..Config::default()
    }
}
