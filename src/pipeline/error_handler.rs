use anyhow::Result;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Check run state after all classes joined: a recorded sink error fails the run first,
/// then an interrupt. Either way the temporary log stays in place for the next run.
pub fn check_for_first_error_or_interrupt(
    first_error: &Arc<Mutex<Option<String>>>,
    cancel: &AtomicBool,
    temp_path: &Path,
) -> Result<()> {
    if let Some(msg) = first_error.lock().ok().and_then(|mut e| e.take()) {
        return Err(anyhow::anyhow!(
            "{}; partial results kept in {}",
            msg,
            temp_path.display()
        ));
    }
    if cancel.load(Ordering::Relaxed) {
        log::warn!(
            "Interrupted; re-run to resume from {}",
            temp_path.display()
        );
        return Err(anyhow::anyhow!(
            "URL check interrupted; partial results kept in {}",
            temp_path.display()
        ));
    }
    Ok(())
}
