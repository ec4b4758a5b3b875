use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;

/// Get the temporary (in-progress) path for a result log: `<name>.tmp` next to it.
pub fn temp_path_for(log_path: &Path) -> PathBuf {
    let name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_else(|| PackagePaths::get().results_filename());
    log_path
        .parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.tmp"))
}

/// Canonical and temporary log paths inside `data_dir`.
pub fn result_paths(data_dir: &Path) -> (PathBuf, PathBuf) {
    let final_path = data_dir.join(PackagePaths::get().results_filename());
    let temp_path = temp_path_for(&final_path);
    (final_path, temp_path)
}

/// Make sure the data directory exists before the sink opens its temp log.
pub fn prepare_data_dir(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data directory {}", data_dir.display()))
}

pub fn rename_temp_to_final(temp_path: &Path, final_path: &Path) -> Result<()> {
    fs::rename(temp_path, final_path).with_context(|| {
        format!(
            "atomic rename temp log to final path ({} -> {})",
            temp_path.display(),
            final_path.display()
        )
    })
}
