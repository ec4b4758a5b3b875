//! CLI command handlers: `check` runs the batch job, `report` prints stored results.

use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::audit::audit_urls;
use crate::engine::arg_parser::{CheckArgs, Cli, Commands, ReportArgs};
use crate::engine::log_ops::ResultCache;
use crate::report::{FilterField, ResultQuery, query_cache};
use crate::utils::urlaudit_toml::{apply_file_to_opts, load_urlaudit_toml};
use crate::utils::{resolve_data_dir, result_paths, setup_logging};
use crate::{EntitySource, Opts};

/// Defaults, then `.urlaudit.toml` in cwd, then env for the data dir, then global CLI flags.
/// For the data dir, DATA_DIR (env or `.env`) beats the file and the CLI flag beats both.
fn base_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let file_data_dir = load_urlaudit_toml(&cwd).and_then(|f| apply_file_to_opts(&f, &mut opts));
    opts.data_dir = resolve_data_dir(cli.data_dir.as_deref(), file_data_dir.as_deref());
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    opts
}

fn apply_check_args(args: &CheckArgs, opts: &mut Opts) {
    if let Some(ref u) = args.source_url {
        opts.source = EntitySource::Url(u.clone());
    }
    if let Some(ref f) = args.source_file {
        opts.source = EntitySource::File(f.clone());
    }
    if let Some(secs) = args.timeout {
        opts.request_timeout = Duration::from_secs(secs);
    }
    if let Some(w) = args.workers {
        opts.default_class.workers = w.max(1);
    }
    if let Some(w) = args.github_workers {
        opts.github_class.workers = w.max(1);
    }
    if let Some(ms) = args.github_delay_ms {
        opts.github_class.delay = Duration::from_millis(ms);
    }
    if let Some(on) = args.include_twitter {
        opts.twitter_class.enabled = on;
    }
    if let Some(r) = args.resume_by {
        opts.resume_by = r.into();
    }
}

fn report_query(args: &ReportArgs) -> ResultQuery {
    let filters = FilterField::ALL
        .iter()
        .filter_map(|f| {
            let value = match f {
                FilterField::Name => &args.name,
                FilterField::Type => &args.property_type,
                FilterField::Result => &args.result,
                FilterField::Url => &args.url,
            };
            value.clone().map(|v| (*f, v))
        })
        .collect();
    ResultQuery {
        filters,
        sort: args.sort.clone(),
        page: Some(args.page),
        page_size: Some(args.page_size),
    }
}

fn handle_check(args: &CheckArgs, mut opts: Opts) -> Result<()> {
    apply_check_args(args, &mut opts);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_handler = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        cancel_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    audit_urls(&opts, Some(cancel))?;
    Ok(())
}

fn handle_report(args: &ReportArgs, opts: &Opts) -> Result<()> {
    let (final_path, _) = result_paths(&opts.data_dir);
    let cache = ResultCache::new(&final_path);
    let page = query_cache(&cache, &report_query(args))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&page).context("serialize report page")?
    );
    Ok(())
}

/// Dispatch the parsed command line.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = base_opts(cli);
    setup_logging(opts.verbose);
    match &cli.command {
        Commands::Check(args) => handle_check(args, opts),
        Commands::Report(args) => handle_report(args, &opts),
    }
}
