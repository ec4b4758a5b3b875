//! urlaudit: batch URL auditor for registry entries, with resumable JSONL results.

pub mod audit;
pub mod engine;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use audit::{audit_urls, run_audit};
pub use engine::log_ops::ResultCache;
pub use report::{ResultPage, ResultQuery, query_cache, query_results};

/// Result alias used by public urlaudit API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
