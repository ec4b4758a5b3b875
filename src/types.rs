//! Public and internal types for the urlaudit API and pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::config::{ClassDefaults, DEFAULT_SOURCE_URL, DEFAULT_TIMEOUT_SECS};

/// One registry record as served by the upstream source. Read-only for the duration of a run.
///
/// Optional string fields treat `""` the same as absent.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tvl: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub referral_url: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    /// GitHub handles, not URLs.
    #[serde(default)]
    pub github: Option<Vec<String>>,
    #[serde(default, alias = "audit_links")]
    pub audit_links: Option<Vec<String>>,
}

/// Which entity property a URL came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Url,
    ReferralUrl,
    AuditLink,
    Github,
    Twitter,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::Url,
        PropertyType::ReferralUrl,
        PropertyType::AuditLink,
        PropertyType::Github,
        PropertyType::Twitter,
    ];

    /// Wire name, as stored in the `type` field of a result line.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Url => "url",
            PropertyType::ReferralUrl => "referral_url",
            PropertyType::AuditLink => "audit_link",
            PropertyType::Github => "github",
            PropertyType::Twitter => "twitter",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Url => "Url",
            PropertyType::ReferralUrl => "Referral url",
            PropertyType::AuditLink => "Audit link",
            PropertyType::Github => "Github",
            PropertyType::Twitter => "Twitter",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome for one checked URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Ok,
    OkDomainChanged,
    NotFound,
    Forbidden,
    RateLimited,
    ServerError,
    BadStatus,
    ParsingError,
    FetchError,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Ok => "OK",
            Classification::OkDomainChanged => "OK_DOMAIN_CHANGED",
            Classification::NotFound => "NOT_FOUND",
            Classification::Forbidden => "FORBIDDEN",
            Classification::RateLimited => "RATE_LIMITED",
            Classification::ServerError => "SERVER_ERROR",
            Classification::BadStatus => "BAD_STATUS",
            Classification::ParsingError => "PARSING_ERROR",
            Classification::FetchError => "FETCH_ERROR",
        }
    }

    /// Human-readable label for summaries and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Ok => "OK",
            Classification::OkDomainChanged => "OK (Domain Changed)",
            Classification::NotFound => "Not Found (404)",
            Classification::Forbidden => "Forbidden (403)",
            Classification::RateLimited => "Rate Limited (429)",
            Classification::ServerError => "Server Error (5xx)",
            Classification::BadStatus => "Unexpected Status",
            Classification::ParsingError => "Invalid URL",
            Classification::FetchError => "Fetch Error",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Classification::Ok | Classification::OkDomainChanged)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named group of tasks sharing one concurrency/pacing policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskClass {
    Default,
    Github,
    Twitter,
}

impl TaskClass {
    pub const ALL: [TaskClass; 3] = [TaskClass::Default, TaskClass::Github, TaskClass::Twitter];

    pub fn name(&self) -> &'static str {
        match self {
            TaskClass::Default => "default",
            TaskClass::Github => "github",
            TaskClass::Twitter => "twitter",
        }
    }
}

impl fmt::Display for TaskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One URL to check, derived from one entity property.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationTask {
    pub entity_id: String,
    pub entity_name: String,
    pub entity_tvl: Option<f64>,
    pub property: PropertyType,
    pub url: String,
}

/// Outcome of checking one task. One JSON line in the result log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    #[serde(rename = "id")]
    pub entity_id: String,
    #[serde(rename = "name")]
    pub entity_name: String,
    #[serde(rename = "tvl")]
    pub entity_tvl: Option<f64>,
    #[serde(rename = "type")]
    pub property: PropertyType,
    pub url: String,
    #[serde(rename = "result")]
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_url: Option<String>,
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ClassificationResult {
    /// Result skeleton for `task` with everything but the classification unset.
    pub fn for_task(task: &VerificationTask, classification: Classification) -> Self {
        Self {
            entity_id: task.entity_id.clone(),
            entity_name: task.entity_name.clone(),
            entity_tvl: task.entity_tvl,
            property: task.property,
            url: task.url.clone(),
            classification,
            response_status: None,
            response_status_text: None,
            response_url: None,
            error_message: None,
        }
    }
}

/// How finely previously checked work is recognized on re-run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeGranularity {
    /// `(entityId, propertyType, url)`: new URLs under an already-checked property still run.
    #[default]
    Url,
    /// `(entityId, propertyType)`: any checked URL skips the whole property.
    Property,
}

/// Key for run-to-run idempotence. `url` is `None` under [`ResumeGranularity::Property`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResumeKey {
    pub entity_id: String,
    pub property: PropertyType,
    pub url: Option<String>,
}

impl ResumeKey {
    pub fn new(
        granularity: ResumeGranularity,
        entity_id: &str,
        property: PropertyType,
        url: &str,
    ) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            property,
            url: match granularity {
                ResumeGranularity::Url => Some(url.to_string()),
                ResumeGranularity::Property => None,
            },
        }
    }
}

/// Worker count and pacing for one task class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassPolicy {
    pub workers: usize,
    /// Pause per worker after each task, before claiming the next.
    pub delay: Duration,
    pub enabled: bool,
}

impl ClassPolicy {
    pub fn new(workers: usize, delay_ms: u64, enabled: bool) -> Self {
        Self {
            workers: workers.max(1),
            delay: Duration::from_millis(delay_ms),
            enabled,
        }
    }
}

/// Where the entity list comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntitySource {
    Url(String),
    File(PathBuf),
}

/// Full options for a verification run (CLI, config file and lib callers).
#[derive(Clone, Debug)]
pub struct Opts {
    /// Directory holding the canonical log and its `.tmp` sibling.
    pub data_dir: PathBuf,
    pub source: EntitySource,
    pub request_timeout: Duration,
    pub default_class: ClassPolicy,
    pub github_class: ClassPolicy,
    /// Disabled unless explicitly turned on: found and missing accounts answer identically.
    pub twitter_class: ClassPolicy,
    pub resume_by: ResumeGranularity,
    /// Show progress bar and per-task debug lines.
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            data_dir: crate::utils::resolve_data_dir(None, None),
            source: EntitySource::Url(DEFAULT_SOURCE_URL.to_string()),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_class: ClassPolicy::new(ClassDefaults::DEFAULT_WORKERS, 0, true),
            github_class: ClassPolicy::new(
                ClassDefaults::GITHUB_WORKERS,
                ClassDefaults::GITHUB_DELAY_MS,
                true,
            ),
            twitter_class: ClassPolicy::new(ClassDefaults::TWITTER_WORKERS, 0, false),
            resume_by: ResumeGranularity::default(),
            verbose: false,
        }
    }
}

impl Opts {
    pub fn policy(&self, class: TaskClass) -> ClassPolicy {
        match class {
            TaskClass::Default => self.default_class,
            TaskClass::Github => self.github_class,
            TaskClass::Twitter => self.twitter_class,
        }
    }
}

/// What a finished (or interrupted) run did.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub entities: usize,
    /// Keys already present in the temporary log at startup.
    pub resumed: usize,
    pub planned: usize,
    pub executed: usize,
    /// Tasks planned in a disabled class.
    pub not_scheduled: usize,
    pub counts: BTreeMap<Classification, usize>,
}
