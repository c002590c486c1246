//! Analyze a music folder and rename every track to `"<Key> - <BPM> BPM - <Title>"`
//!
//! Usage:
//!   harmonic-renamer [OPTIONS] <FOLDER>
//!
//! Rules can come from a YAML file (`--rules`) and be overridden by flags.
//! A CSV (or JSON) report is written into the folder on every run.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use harmonic_renamer::config::{parse_remove_terms, parse_replacements};
use harmonic_renamer::{
    AnalysisConfig, BatchOptions, BatchProcessor, NotationKind, ReportFormat, UserRules,
};

#[derive(Parser)]
#[command(name = "harmonic-renamer")]
#[command(version, about = "Detect key and BPM, then rename DJ tracks with Camelot awareness")]
struct Args {
    /// Folder containing the audio files
    folder: PathBuf,

    /// Key notation written into file names
    #[arg(short, long, value_enum)]
    notation: Option<NotationArg>,

    /// Analyze and report only, never rename or tag
    #[arg(long)]
    no_rename: bool,

    /// Comma-separated terms removed from titles, e.g. "Official Video,[HD]"
    #[arg(short, long)]
    remove: Option<String>,

    /// Comma-separated old:new replacements, e.g. "_: ,–:-"
    #[arg(long)]
    replace: Option<String>,

    /// YAML rules file (flags override its values)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Match removal terms case-insensitively
    #[arg(long)]
    ignore_case: bool,

    /// Do not write the Title tag
    #[arg(long)]
    no_tags: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,

    /// Include subfolders
    #[arg(short = 'R', long)]
    recursive: bool,

    /// Analysis worker threads (default: available CPU threads - 1)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum NotationArg {
    Classic,
    Camelot,
}

impl From<NotationArg> for NotationKind {
    fn from(arg: NotationArg) -> Self {
        match arg {
            NotationArg::Classic => NotationKind::Classic,
            NotationArg::Camelot => NotationKind::Camelot,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ReportFormat::Csv,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1)
}

fn build_rules(args: &Args) -> Result<UserRules> {
    let mut rules = match &args.rules {
        Some(path) => UserRules::load(path)?,
        None => UserRules::default(),
    };

    if let Some(notation) = args.notation {
        rules.target_notation = notation.into();
    }
    if let Some(remove) = &args.remove {
        rules.remove_terms = parse_remove_terms(remove);
    }
    if let Some(replace) = &args.replace {
        rules.char_replacements =
            parse_replacements(replace).context("invalid --replace value")?;
    }
    if args.no_rename {
        rules.rename_enabled = false;
    }
    if args.ignore_case {
        rules.case_insensitive_removal = true;
    }
    if args.no_tags {
        rules.write_tags = false;
    }

    Ok(rules)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if !args.folder.is_dir() {
        bail!("{} is not a folder", args.folder.display());
    }

    let rules = build_rules(&args)?;
    let options = BatchOptions {
        recursive: args.recursive,
        jobs: args.jobs.unwrap_or_else(default_jobs).max(1),
        report_format: args.format.into(),
    };

    log::info!(
        "Notation: {:?}, rename: {}, jobs: {}",
        rules.target_notation,
        rules.rename_enabled,
        options.jobs
    );

    let processor = BatchProcessor::new(AnalysisConfig::default(), rules, options);
    let outcome = processor
        .run(&args.folder)
        .with_context(|| format!("processing {} failed", args.folder.display()))?;

    println!("Report: {}", outcome.report_path.display());
    Ok(())
}
