//! Progress bar utilities for displaying check status

use kdam::{Animation, Bar, BarExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Create a progress bar over `total` tasks.
pub fn create_progress_bar(total: usize, desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = total,
        desc = desc,
        animation = Animation::Classic,
        unit = " urls"
    )))
}

/// Update progress bar if available
/// Uses try_lock to avoid blocking workers
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    // If lock is contended, skip update (progress bar will catch up on next update)
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Shared completion counter that pushes to the bar every `chunk_size` tasks.
pub struct BatchedProgress {
    bar: Option<ProgressBar>,
    done: AtomicUsize,
    chunk_size: usize,
}

impl BatchedProgress {
    pub fn new(bar: Option<ProgressBar>, chunk_size: usize) -> Self {
        Self {
            bar,
            done: AtomicUsize::new(0),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Record one finished task. Call from workers.
    pub fn tick(&self) {
        let count = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(bar) = &self.bar
            && count.is_multiple_of(self.chunk_size)
        {
            update_progress_bar(bar, self.chunk_size);
        }
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Set the bar to the true completed count (batches skipped under contention included).
    /// Call once after all workers join.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            if let Ok(mut pb) = bar.lock() {
                let _ = pb.update_to(self.done());
                let _ = pb.refresh();
            }
            eprintln!();
        }
    }
}
