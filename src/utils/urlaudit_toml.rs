//! Load `.urlaudit.toml` from a directory (CLI only). Lib callers build [`Opts`] directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::config::PackagePaths;
use crate::{ClassPolicy, EntitySource, Opts, ResumeGranularity};

#[derive(Debug, Deserialize)]
pub struct UrlauditToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    data_dir: Option<String>,
    source_url: Option<String>,
    source_file: Option<String>,
    timeout_secs: Option<u64>,
    default_workers: Option<usize>,
    default_delay_ms: Option<u64>,
    github_workers: Option<usize>,
    github_delay_ms: Option<u64>,
    twitter_workers: Option<usize>,
    twitter_delay_ms: Option<u64>,
    include_twitter: Option<bool>,
    resume_by: Option<ResumeGranularity>,
    verbose: Option<bool>,
}

/// Load `.urlaudit.toml` from `dir` if present. Returns None if file missing or unparsable.
pub fn load_urlaudit_toml(dir: &Path) -> Option<UrlauditToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_urlaudit_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_urlaudit_toml(s: &str) -> Result<UrlauditToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($idx:expr, $opts:expr, $idx_field:ident => $opts_field:ident) => {
        if let Some(v) = $idx.$idx_field {
            $opts.$opts_field = v;
        }
    };
}

fn apply_class(policy: &mut ClassPolicy, workers: Option<usize>, delay_ms: Option<u64>) {
    if let Some(w) = workers {
        policy.workers = w.max(1);
    }
    if let Some(ms) = delay_ms {
        policy.delay = Duration::from_millis(ms);
    }
}

/// Apply file config to opts (only set fields present in the file). Call before applying CLI.
/// `data_dir` is returned raw so the caller can resolve it against cwd and the environment.
pub fn apply_file_to_opts(file: &UrlauditToml, opts: &mut Opts) -> Option<PathBuf> {
    let s = &file.settings;
    if let Some(ref u) = s.source_url {
        opts.source = EntitySource::Url(u.clone());
    }
    // A local file beats a URL when both are set.
    if let Some(ref f) = s.source_file {
        opts.source = EntitySource::File(PathBuf::from(f));
    }
    if let Some(secs) = s.timeout_secs {
        opts.request_timeout = Duration::from_secs(secs);
    }
    apply_class(&mut opts.default_class, s.default_workers, s.default_delay_ms);
    apply_class(&mut opts.github_class, s.github_workers, s.github_delay_ms);
    apply_class(&mut opts.twitter_class, s.twitter_workers, s.twitter_delay_ms);
    if let Some(on) = s.include_twitter {
        opts.twitter_class.enabled = on;
    }
    apply_file_opt!(s, opts, resume_by => resume_by);
    apply_file_opt!(s, opts, verbose => verbose);
    s.data_dir.as_ref().map(PathBuf::from)
}
