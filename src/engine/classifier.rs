//! URL classifier: one GET per task, redirects followed, response mapped to a [`Classification`].

use anyhow::{Context, Result};
use log::debug;
use hyper::ext::ReasonPhrase;
use reqwest::blocking::{Client, ClientBuilder, Response};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use url::Url;

use crate::engine::tools::{error_chain, normalized_hostname};
use crate::utils::config::RequestHeaders;
use crate::{Classification, ClassificationResult, VerificationTask};

/// Anything that turns a task into exactly one result. Must not fail: errors become results.
pub trait Classify: Sync {
    fn classify(&self, task: &VerificationTask) -> ClassificationResult;
}

fn document_headers() -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(
        header::ACCEPT,
        HeaderValue::from_static(RequestHeaders::ACCEPT),
    );
    h.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(RequestHeaders::ACCEPT_LANGUAGE),
    );
    h.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    h.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    h
}

/// Client builder with browser headers, the request timeout and default redirect following.
pub fn client_builder(timeout: Duration) -> ClientBuilder {
    Client::builder()
        .user_agent(RequestHeaders::USER_AGENT)
        .default_headers(document_headers())
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
}

/// Map a final HTTP status (after redirects) to a classification.
pub fn classify_response(status: u16, requested_url: &str, final_url: &str) -> Classification {
    match status {
        200..=399 => match (
            normalized_hostname(requested_url),
            normalized_hostname(final_url),
        ) {
            (Some(original), Some(last)) if original == last => Classification::Ok,
            (Some(_), Some(_)) => Classification::OkDomainChanged,
            _ => Classification::ParsingError,
        },
        404 | 410 => Classification::NotFound,
        403 => Classification::Forbidden,
        429 => Classification::RateLimited,
        500.. => Classification::ServerError,
        _ => Classification::BadStatus,
    }
}

/// Map a transport failure to a classification: URL problems are parsing errors, the rest fetch errors.
pub fn classify_error(err: &reqwest::Error) -> Classification {
    let msg = error_chain(err);
    if err.is_builder() || msg.contains("Failed to parse") || msg.contains("relative URL") {
        Classification::ParsingError
    } else {
        Classification::FetchError
    }
}

/// Reason phrase the server actually sent. hyper only keeps it when it differs from the
/// canonical one, so fall back to that.
fn reason_phrase(response: &Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Blocking HTTP classifier. Cheap to share across worker threads.
pub struct UrlClassifier {
    client: Client,
}

impl UrlClassifier {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = client_builder(timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Classify for UrlClassifier {
    fn classify(&self, task: &VerificationTask) -> ClassificationResult {
        if let Err(e) = Url::parse(task.url.trim()) {
            let mut result = ClassificationResult::for_task(task, Classification::ParsingError);
            result.error_message = Some(format!("Failed to parse URL: {e}"));
            debug!("{} -> {}", task.url, result.classification);
            return result;
        }

        let result = match self.client.get(task.url.trim()).send() {
            Ok(response) => {
                let status = response.status();
                let final_url = response.url().to_string();
                let mut r = ClassificationResult::for_task(
                    task,
                    classify_response(status.as_u16(), &task.url, &final_url),
                );
                r.response_status = Some(status.as_u16());
                r.response_status_text = Some(reason_phrase(&response));
                r.response_url = Some(final_url);
                r
            }
            Err(e) => {
                let mut r = ClassificationResult::for_task(task, classify_error(&e));
                r.error_message = Some(error_chain(&e));
                r
            }
        };
        debug!("{} -> {}", task.url, result.classification);
        result
    }
}
