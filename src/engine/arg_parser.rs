use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::ResumeGranularity;

/// Audit registry URLs for reachability and redirects.
#[derive(Clone, Parser)]
#[command(name = "urlaudit")]
#[command(about = "Check registry URLs and report results. Re-running resumes an interrupted check.")]
pub struct Cli {
    /// Data directory holding protocol-urls.jsonl. Default: $DATA_DIR or ./data.
    #[arg(long, short = 'd', global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output.
    #[arg(long, short = 'v', global = true, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Fetch the registry, check every URL and write the result log.
    Check(CheckArgs),
    /// Print one page of stored results as JSON.
    Report(ReportArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResumeBy {
    Url,
    Property,
}

impl From<ResumeBy> for ResumeGranularity {
    fn from(r: ResumeBy) -> Self {
        match r {
            ResumeBy::Url => ResumeGranularity::Url,
            ResumeBy::Property => ResumeGranularity::Property,
        }
    }
}

#[derive(Clone, Args)]
pub struct CheckArgs {
    /// Registry endpoint returning a JSON array of entities.
    #[arg(long, conflicts_with = "source_file")]
    pub source_url: Option<String>,

    /// Read entities from a local JSON file instead of the registry.
    #[arg(long)]
    pub source_file: Option<PathBuf>,

    /// Request timeout in seconds (whole redirect chain).
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,

    /// Worker count for the default class.
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Worker count for GitHub.
    #[arg(long)]
    pub github_workers: Option<usize>,

    /// Pause per GitHub worker between requests, in milliseconds.
    #[arg(long)]
    pub github_delay_ms: Option<u64>,

    /// Also check Twitter/X handles (unreliable: missing accounts answer 200).
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub include_twitter: Option<bool>,

    /// What counts as already checked when resuming.
    #[arg(long, value_enum)]
    pub resume_by: Option<ResumeBy>,
}

#[derive(Clone, Args)]
pub struct ReportArgs {
    /// Substring match on entity name.
    #[arg(long)]
    pub name: Option<String>,

    /// Exact property type (url, referral_url, audit_link, github, twitter).
    #[arg(long = "type")]
    pub property_type: Option<String>,

    /// Exact classification (OK, NOT_FOUND, ...).
    #[arg(long)]
    pub result: Option<String>,

    /// Substring match on URL.
    #[arg(long)]
    pub url: Option<String>,

    /// Sort as column:direction, column in {name, tvl}. Default: tvl:desc.
    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, default_value_t = crate::utils::DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}
