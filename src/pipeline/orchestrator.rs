use log::{error, info, warn};
use std::thread;

use crate::pipeline::{RunContext, TaskPlan, run_with_concurrency};
use crate::utils::cap_workers;
use crate::{Opts, TaskClass};

/// Counts from [`run_classes`]: (executed, not_scheduled).
pub type ClassRunCounts = (usize, usize);

/// Run every enabled class as its own pool, all classes at once. Returns when every class
/// has settled. Tasks in disabled classes are counted but never run.
pub fn run_classes(mut plan: TaskPlan, opts: &Opts, ctx: &RunContext<'_>) -> ClassRunCounts {
    let mut not_scheduled = 0;
    let mut runs = Vec::new();
    for class in TaskClass::ALL {
        let tasks = plan.take(class);
        if tasks.is_empty() {
            continue;
        }
        let mut policy = opts.policy(class);
        if !policy.enabled {
            warn!(
                "Not checking {} {} tasks (class disabled)",
                tasks.len(),
                class
            );
            not_scheduled += tasks.len();
            continue;
        }
        policy.workers = cap_workers(policy.workers);
        runs.push((class, policy, tasks));
    }

    let executed = thread::scope(|s| {
        let handles: Vec<_> = runs
            .into_iter()
            .map(|(class, policy, tasks)| {
                let handle = s.spawn(move || {
                    info!(
                        "Class {}: {} tasks, {} workers, {:?} delay",
                        class,
                        tasks.len(),
                        policy.workers,
                        policy.delay
                    );
                    let n = run_with_concurrency(tasks, policy, Some(ctx.cancel.as_ref()), |task| {
                        ctx.handle_task(task)
                    });
                    info!("Class {} finished: {} checked", class, n);
                    n
                });
                (class, handle)
            })
            .collect();
        handles
            .into_iter()
            .map(|(class, h)| match h.join() {
                Ok(n) => n,
                Err(_) => {
                    error!("Class {} worker panicked", class);
                    ctx.fail(format!("{class} worker panicked; class left unfinished"));
                    0
                }
            })
            .sum::<usize>()
    });
    (executed, not_scheduled)
}
