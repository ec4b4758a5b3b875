//! URL verification run: ledger → source → plan → per-class pools → sink → finalize.

use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::engine::classifier::{Classify, UrlClassifier};
use crate::engine::log_ops::{ResultSink, SkipSet, load_skip_set};
use crate::engine::progress::{BatchedProgress, create_progress_bar};
use crate::engine::source::load_entities;
use crate::pipeline::{RunContext, check_for_first_error_or_interrupt, plan_tasks, run_classes};
use crate::utils::{Colors, PROGRESS_UPDATE_BATCH_SIZE, prepare_data_dir, result_paths};
use crate::{Entity, Opts, PropertyType, RunSummary, TaskClass};

/// Run a full verification batch with the HTTP classifier and the configured source.
///
/// Reads resume state first (a corrupt temporary log fails before any request), then loads
/// entities (a source failure fails before anything is written).
/// `cancel`: set it (e.g. from a Ctrl+C handler) to stop claiming tasks; the run then
/// returns an error and leaves the temporary log for the next run.
pub fn audit_urls(opts: &Opts, cancel: Option<Arc<AtomicBool>>) -> Result<RunSummary> {
    let classifier = UrlClassifier::new(opts.request_timeout)?;
    let (_, temp_path) = result_paths(&opts.data_dir);
    let skip = load_skip_set(&temp_path, opts.resume_by)?;
    let entities = load_entities(classifier.client(), &opts.source)?;
    run_audit(opts, &entities, skip, &classifier, cancel)
}

/// Plan, check and persist. `skip` holds what the temporary log already covers.
/// On success the temporary log has been renamed over the canonical one.
pub fn run_audit(
    opts: &Opts,
    entities: &[Entity],
    skip: SkipSet,
    classifier: &dyn Classify,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<RunSummary> {
    let (final_path, temp_path) = result_paths(&opts.data_dir);
    let plan = plan_tasks(entities, &skip);
    info!(
        "Planned {} tasks from {} entities ({} already checked)",
        plan.total(),
        entities.len(),
        plan.skipped
    );
    for (class, tasks) in plan.iter() {
        debug!("  {}: {}", class, tasks.len());
    }
    let by_property: Vec<String> = PropertyType::ALL
        .iter()
        .map(|p| (p, plan.count_property(*p)))
        .filter(|(_, n)| *n > 0)
        .map(|(p, n)| format!("{}: {}", p.label(), n))
        .collect();
    if !by_property.is_empty() {
        info!("  by property: {}", by_property.join(" | "));
    }

    let scheduled: usize = TaskClass::ALL
        .iter()
        .filter(|c| opts.policy(**c).enabled)
        .map(|c| plan.tasks(*c).len())
        .sum();
    let mut summary = RunSummary {
        entities: entities.len(),
        resumed: skip.len(),
        planned: plan.total(),
        ..Default::default()
    };

    prepare_data_dir(&opts.data_dir)?;
    let sink = ResultSink::open(&temp_path, &final_path)?;
    let bar = opts
        .verbose
        .then(|| create_progress_bar(scheduled, "Checking"));
    let ctx = RunContext::new(
        classifier,
        &sink,
        BatchedProgress::new(bar, PROGRESS_UPDATE_BATCH_SIZE),
        cancel.unwrap_or_default(),
    );

    let (executed, not_scheduled) = run_classes(plan, opts, &ctx);
    ctx.progress.finish();
    summary.executed = executed;
    summary.not_scheduled = not_scheduled;
    summary.counts = ctx.take_counts();
    check_for_first_error_or_interrupt(&ctx.first_error, &ctx.cancel, &temp_path)?;
    drop(ctx);

    let final_path = sink.finalize()?;
    info!("Results written to {}", final_path.display());
    print_summary(&summary);
    Ok(summary)
}

/// Log classification counts, colored by severity.
fn print_summary(summary: &RunSummary) {
    if summary.counts.is_empty() {
        info!("No URLs checked this run.");
        return;
    }
    let parts: Vec<String> = summary
        .counts
        .iter()
        .map(|(c, n)| {
            Colors::colorize(
                Colors::for_classification(*c),
                &format!("{}: {}", c.label(), n),
            )
            .to_string()
        })
        .collect();
    info!("{}", parts.join(" | "));
}
