//! Resume ledger: which tasks an interrupted prior run already recorded.

use log::debug;
use std::collections::HashSet;
use std::path::Path;

use super::{LogError, read_results};
use crate::{PropertyType, ResumeGranularity, ResumeKey};

/// Read-only set of already-checked keys, built once at startup.
#[derive(Clone, Debug, Default)]
pub struct SkipSet {
    granularity: ResumeGranularity,
    keys: HashSet<ResumeKey>,
}

impl SkipSet {
    pub fn new(granularity: ResumeGranularity) -> Self {
        Self {
            granularity,
            keys: HashSet::new(),
        }
    }

    pub fn insert(&mut self, entity_id: &str, property: PropertyType, url: &str) {
        self.keys
            .insert(ResumeKey::new(self.granularity, entity_id, property, url));
    }

    pub fn contains(&self, entity_id: &str, property: PropertyType, url: &str) -> bool {
        self.keys
            .contains(&ResumeKey::new(self.granularity, entity_id, property, url))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Build the skip-set from the temporary log at `temp_path`. Missing file → empty set.
/// A malformed line fails the load instead of silently dropping resume state.
pub fn load_skip_set(temp_path: &Path, granularity: ResumeGranularity) -> Result<SkipSet, LogError> {
    let mut skip = SkipSet::new(granularity);
    if !temp_path.exists() {
        debug!("No temporary log at {}; starting fresh", temp_path.display());
        return Ok(skip);
    }
    for r in read_results(temp_path)? {
        skip.insert(&r.entity_id, r.property, &r.url);
    }
    debug!(
        "Loaded {} resume keys from {}",
        skip.len(),
        temp_path.display()
    );
    Ok(skip)
}
