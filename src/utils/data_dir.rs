//! Data directory resolution: CLI → DATA_DIR env → .env in cwd → config file → `./data`.

use std::path::{Path, PathBuf};

use crate::utils::config::{DATA_DIR_ENV, DEFAULT_DATA_DIR};

fn try_env_then_dotenv(dir: &Path) -> Option<String> {
    if let Ok(s) = std::env::var(DATA_DIR_ENV) {
        let s = s.trim().to_string();
        if !s.is_empty() {
            return Some(s);
        }
    }
    let env_path = dir.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
        if let Ok(s) = std::env::var(DATA_DIR_ENV) {
            let s = s.trim().to_string();
            if !s.is_empty() {
                return Some(s);
            }
        }
    }
    None
}

/// Absolute form of `raw`, resolved against `cwd` when relative.
pub fn absolutize(raw: &Path, cwd: &Path) -> PathBuf {
    if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        cwd.join(raw)
    }
}

/// Pick the raw data directory by precedence: CLI, then environment, then config file,
/// then `./data`.
pub fn choose_data_dir(cli: Option<&Path>, env: Option<&str>, file: Option<&Path>) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| env.map(PathBuf::from))
        .or_else(|| file.map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Resolve the data directory against the process environment and cwd.
/// The environment is consulted only when `cli` is unset.
pub fn resolve_data_dir(cli: Option<&Path>, file: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env = match cli {
        Some(_) => None,
        None => try_env_then_dotenv(&cwd),
    };
    absolutize(&choose_data_dir(cli, env.as_deref(), file), &cwd)
}
