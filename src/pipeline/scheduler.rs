//! Bounded worker pool: W workers drain one shared queue, optionally pausing between tasks.

use crossbeam_channel::{Receiver, bounded};
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::ClassPolicy;

/// Single worker: claim the next item until the queue is empty or `cancel` is set.
fn worker_loop<T, F>(
    queue: Receiver<T>,
    handler: &F,
    delay: Duration,
    cancel: Option<&AtomicBool>,
    done: &AtomicUsize,
) where
    F: Fn(T) + Sync,
{
    loop {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            break;
        }
        let Ok(item) = queue.recv() else {
            break;
        };
        handler(item);
        done.fetch_add(1, Ordering::Relaxed);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

/// Run `handler` once per item with `policy.workers` threads and `policy.delay` between tasks
/// per worker. Returns when every claimed item has settled; the count of handled items.
///
/// `handler` must not fail: record errors in the result, not by panicking.
/// Setting `cancel` stops workers from claiming more; in-flight items still finish.
pub fn run_with_concurrency<T, F>(
    items: Vec<T>,
    policy: ClassPolicy,
    cancel: Option<&AtomicBool>,
    handler: F,
) -> usize
where
    T: Send,
    F: Fn(T) + Sync,
{
    let total = items.len();
    if total == 0 {
        return 0;
    }
    let (tx, rx) = bounded::<T>(total);
    for item in items {
        // Receiver is alive and capacity == total, so this never blocks or fails.
        let _ = tx.send(item);
    }
    // Dropping the sender lets workers see an empty, closed queue and exit.
    drop(tx);

    let workers = policy.workers.clamp(1, total);
    let done = AtomicUsize::new(0);
    debug!(
        "Running {} tasks on {} workers (delay {:?})",
        total, workers, policy.delay
    );
    thread::scope(|s| {
        for _ in 0..workers {
            let rx = rx.clone();
            let handler = &handler;
            let done = &done;
            s.spawn(move || worker_loop(rx, handler, policy.delay, cancel, done));
        }
    });
    done.into_inner()
}
