//! Run context: the state every worker of every class shares.

use log::error;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::classifier::Classify;
use crate::engine::log_ops::ResultSink;
use crate::engine::progress::BatchedProgress;
use crate::{Classification, VerificationTask};

/// Shared context for the scheduler's task handler. The sink and classifier are the only
/// shared resources a task touches; everything else here is bookkeeping.
pub struct RunContext<'a> {
    pub classifier: &'a dyn Classify,
    pub sink: &'a ResultSink,
    pub progress: BatchedProgress,
    /// Set by Ctrl+C or by a failed append. Workers stop claiming once set.
    pub cancel: Arc<AtomicBool>,
    /// First sink failure or worker panic; the run fails with it after workers join.
    pub first_error: Arc<Mutex<Option<String>>>,
    pub counts: Mutex<BTreeMap<Classification, usize>>,
}

impl<'a> RunContext<'a> {
    pub fn new(
        classifier: &'a dyn Classify,
        sink: &'a ResultSink,
        progress: BatchedProgress,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            classifier,
            sink,
            progress,
            cancel,
            first_error: Arc::new(Mutex::new(None)),
            counts: Mutex::new(BTreeMap::new()),
        }
    }

    /// Classify one task and append its result. Never panics on I/O: a failed append is
    /// recorded as the run's first error and stops further claims.
    pub fn handle_task(&self, task: VerificationTask) {
        let result = self.classifier.classify(&task);
        match self.sink.append(&result) {
            Ok(()) => {
                if let Ok(mut counts) = self.counts.lock() {
                    *counts.entry(result.classification).or_default() += 1;
                }
            }
            Err(e) => {
                error!("{:#}", e);
                self.fail(format!("{:#}", e));
            }
        }
        self.progress.tick();
    }

    /// Record `msg` as the run's first error (later ones are dropped) and stop all claims.
    pub fn fail(&self, msg: String) {
        if let Ok(mut slot) = self.first_error.lock() {
            slot.get_or_insert(msg);
        }
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn take_counts(&self) -> BTreeMap<Classification, usize> {
        self.counts
            .lock()
            .map(|mut c| std::mem::take(&mut *c))
            .unwrap_or_default()
    }
}
