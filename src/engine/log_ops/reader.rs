//! Read side for the reporting layer: the canonical log, cached by modification time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use super::{LogError, read_results};
use crate::ClassificationResult;

pub type Records = Arc<Vec<ClassificationResult>>;

#[derive(Default)]
struct CacheState {
    mtime: Option<SystemTime>,
    records: Option<Records>,
}

/// Parsed canonical log keyed by its mtime. The state lock is held across a reload, so
/// concurrent callers wait for the one in-flight parse and then share its result.
pub struct ResultCache {
    path: PathBuf,
    state: Mutex<CacheState>,
    empty: Records,
    loads: AtomicUsize,
}

impl ResultCache {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            state: Mutex::new(CacheState::default()),
            empty: Arc::new(Vec::new()),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of times the file was actually read and parsed.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// All persisted records. A log that was never finalized reads as empty.
    pub fn get_data(&self) -> Result<Records, LogError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let meta = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                *state = CacheState::default();
                return Ok(Arc::clone(&self.empty));
            }
            Err(source) => {
                return Err(LogError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let mtime = meta.modified().ok();

        if let Some(records) = &state.records
            && mtime.is_some()
            && state.mtime == mtime
        {
            return Ok(Arc::clone(records));
        }

        let records: Records = Arc::new(read_results(&self.path)?);
        self.loads.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "Loaded {} records from {}",
            records.len(),
            self.path.display()
        );
        state.mtime = mtime;
        state.records = Some(Arc::clone(&records));
        Ok(records)
    }
}
