//! Append-only result sink over the temporary log, promoted to the canonical path on finalize.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::to_line;
use crate::ClassificationResult;
use crate::utils::rename_temp_to_final;

/// Shared by every worker of every class. One mutex serializes whole-line appends.
pub struct ResultSink {
    temp_path: PathBuf,
    final_path: PathBuf,
    file: Mutex<File>,
}

impl ResultSink {
    /// Open (or create) the temporary log for appending. An existing file from a crashed run is kept.
    pub fn open(temp_path: &Path, final_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(temp_path)
            .with_context(|| format!("open temporary log {}", temp_path.display()))?;
        Ok(Self {
            temp_path: temp_path.to_path_buf(),
            final_path: final_path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Append one record as one line and sync it to disk before returning.
    pub fn append(&self, result: &ClassificationResult) -> Result<()> {
        let line = to_line(result).context("serialize result record")?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("result sink lock poisoned"))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.sync_data())
            .with_context(|| format!("append to {}", self.temp_path.display()))
    }

    /// Close the temp log and atomically rename it over the canonical log.
    pub fn finalize(self) -> Result<PathBuf> {
        let Self {
            temp_path,
            final_path,
            file,
        } = self;
        let file = file
            .into_inner()
            .map_err(|_| anyhow::anyhow!("result sink lock poisoned"))?;
        file.sync_all()
            .with_context(|| format!("sync {}", temp_path.display()))?;
        drop(file);
        rename_temp_to_final(&temp_path, &final_path)?;
        Ok(final_path)
    }
}
