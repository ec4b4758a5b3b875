//! Application configuration constants.
//! Defaults and filenames in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    /// Per-directory settings file (`.urlaudit.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Canonical result log name inside the data directory.
    pub fn results_filename(&self) -> &'static str {
        RESULTS_FILENAME
    }
}

/// Canonical result log. Its `.tmp` sibling is the in-progress, resumable copy.
pub const RESULTS_FILENAME: &str = "protocol-urls.jsonl";

// ---- Data dir ----

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Data directory when nothing overrides it; relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "./data";

// ---- Source ----

/// Registry endpoint returning a JSON array of entities.
pub const DEFAULT_SOURCE_URL: &str = "https://api.llama.fi/protocols";

// ---- HTTP ----

/// Per-request timeout, covering the whole redirect chain.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Browser-like request headers. Bot-looking requests get 403s from many sites.
pub struct RequestHeaders;

impl RequestHeaders {
    pub const USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
    pub const ACCEPT: &'static str =
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
    pub const ACCEPT_LANGUAGE: &'static str = "en-US,en;q=0.9";
}

// ---- Task classes ----

/// Worker counts and pacing per task class.
pub struct ClassDefaults;

impl ClassDefaults {
    /// Generic websites tolerate high parallelism.
    pub const DEFAULT_WORKERS: usize = 10;
    /// GitHub rate-limits anything but serial, paced requests.
    pub const GITHUB_WORKERS: usize = 1;
    pub const GITHUB_DELAY_MS: u64 = 150;
    pub const TWITTER_WORKERS: usize = 5;
}

// ---- Reporting ----

/// Rows per page when the caller does not ask for a size.
pub const DEFAULT_PAGE_SIZE: usize = 25;

// ---- Progress ----

/// Progress bar refresh batch (completed tasks between updates).
pub const PROGRESS_UPDATE_BATCH_SIZE: usize = 10;
