//! HTTP gateway client
//!
//! Translates domain operations into GET requests against the messaging
//! gateway. Failures never escape as raw transport errors: reads collapse to
//! an absence (the caller falls back to synthetic data), probes and mark-read
//! collapse to booleans, deletes aggregate per-batch outcomes. Only send
//! returns a typed error, because its failure modes are surfaced to the user
//! verbatim.

pub mod validator;

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::types::error::{Result, SmsError};
use crate::types::{Message, ReadPayload};
use validator::{KeywordValidator, ResponseValidator};

const READ_ENDPOINT: &str = "cgi-bin/sms-read";
const SEND_ENDPOINT: &str = "cgi-bin/sms-send";
const DELETE_ENDPOINT: &str = "cgi-bin/sms-delete";
const MARK_READ_ENDPOINT: &str = "cgi-bin/sms-mark-read";

const READ_TIMEOUT: Duration = Duration::from_secs(15);
const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10);

/// Up to this many ids per delete request
const DELETE_BATCH_SIZE: usize = 10;
/// Keep delete URLs clear of the usual 2048-character server limit
const MAX_DELETE_URL_LEN: usize = 2000;
const DELETE_BATCH_DELAY: Duration = Duration::from_millis(500);
const DELETE_MAX_ATTEMPTS: u32 = 2;
const PROBE_ATTEMPTS: u32 = 3;

/// Aggregate result of a batched delete
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    /// Ids the gateway confirmed deleted
    pub deleted: HashSet<String>,
    /// Ids that failed (gateway-reported plus whole failed batches)
    pub failed: usize,
}

/// Delete endpoint response body
#[derive(Debug, Default, serde::Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    deleted_count: u64,
    #[serde(default)]
    deleted: Vec<serde_json::Value>,
    #[serde(default)]
    failed_count: u64,
}

pub struct GatewayClient {
    base_url: Url,
    http: reqwest::Client,
    validator: Box<dyn ResponseValidator>,
    read_timeout: Duration,
}

impl GatewayClient {
    /// Create a client against `base_url` (the gateway origin)
    pub fn new(mut base_url: Url) -> Result<Self> {
        // Endpoint joins need a trailing slash on the base path
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SmsError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            http,
            validator: Box::new(KeywordValidator::default()),
            read_timeout: READ_TIMEOUT,
        })
    }

    /// Swap the in-band failure detector
    pub fn with_validator(mut self, validator: impl ResponseValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Override the read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        self.base_url
            .join(name)
            .map_err(|e| SmsError::Config(format!("Bad endpoint {}: {}", name, e)))
    }

    /// Fetch the full message list
    ///
    /// `None` on any failure (transport, status, malformed body); the caller
    /// decides whether to fall back to synthetic data.
    pub async fn fetch_messages(&self) -> Option<Vec<Message>> {
        let url = self.endpoint(READ_ENDPOINT).ok()?;

        let response = match self.http.get(url).timeout(self.read_timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Gateway read failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Gateway read returned HTTP {}", response.status());
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Gateway read body unreadable: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<ReadPayload>(&body) {
            Ok(payload) => {
                let messages: Vec<Message> = payload
                    .into_records()
                    .into_iter()
                    .map(|r| r.into_message())
                    .collect();
                debug!("Fetched {} messages from gateway", messages.len());
                Some(messages)
            }
            Err(e) => {
                warn!("Gateway read body is not valid JSON: {}", e);
                None
            }
        }
    }

    /// Send one message
    ///
    /// Validates the phone number before any network call, then checks both
    /// the HTTP status and the body for in-band failure markers.
    pub async fn send_message(&self, phone: &str, content: &str) -> Result<()> {
        let normalized = validate_phone(phone)?;
        if content.trim().is_empty() {
            return Err(SmsError::Validation("Message content is empty".into()));
        }

        let url = self.endpoint(SEND_ENDPOINT)?;
        let response = self
            .http
            .get(url)
            .query(&[("number", normalized.as_str()), ("text", content)])
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SmsError::Server(format!(
                "Gateway returned HTTP {} on send",
                status
            )));
        }

        let body = response.text().await?;
        if let Err(reason) = self.validator.check(&body) {
            return Err(SmsError::Server(format!("Gateway reported failure: {}", reason)));
        }

        info!("Message sent to {}", normalized);
        Ok(())
    }

    /// Delete a set of messages, batching to keep URLs short
    ///
    /// Batches run sequentially with a short delay in between; a batch is
    /// retried on 5xx with a backoff of attempt-number seconds. A batch that
    /// still fails counts all of its ids as failed; the rest of the batches
    /// proceed regardless.
    pub async fn delete_messages(&self, ids: &[String]) -> DeleteOutcome {
        let mut outcome = DeleteOutcome::default();
        if ids.is_empty() {
            return outcome;
        }

        let base_len = self
            .endpoint(DELETE_ENDPOINT)
            .map(|u| u.as_str().len() + "?ids=".len())
            .unwrap_or(64);
        let batches = build_batches(ids, DELETE_BATCH_SIZE, MAX_DELETE_URL_LEN, base_len);
        let total = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            debug!("Delete batch {}/{} ({} ids)", index + 1, total, batch.len());

            match self.delete_batch_with_retry(&batch).await {
                Ok(response) => {
                    if response.deleted.is_empty() && response.success && response.failed_count == 0
                    {
                        // Count-only success report, gateways vary here
                        outcome.deleted.extend(batch.iter().cloned());
                    }
                    for value in response.deleted {
                        let id = match value {
                            serde_json::Value::String(s) => s,
                            serde_json::Value::Number(n) => n.to_string(),
                            _ => continue,
                        };
                        outcome.deleted.insert(id);
                    }
                    outcome.failed += response.failed_count as usize;
                    debug!(
                        "Batch {} done: {} deleted, {} failed",
                        index + 1,
                        response.deleted_count,
                        response.failed_count
                    );
                }
                Err(e) => {
                    warn!("Delete batch {} failed entirely: {}", index + 1, e);
                    outcome.failed += batch.len();
                }
            }

            if index + 1 < total {
                tokio::time::sleep(DELETE_BATCH_DELAY).await;
            }
        }

        outcome
    }

    async fn delete_batch_with_retry(&self, batch: &[String]) -> Result<DeleteResponse> {
        let url = self.endpoint(DELETE_ENDPOINT)?;
        let ids_param = batch.join(",");

        let mut last_err = SmsError::Network("delete not attempted".into());
        for attempt in 1..=DELETE_MAX_ATTEMPTS {
            let result = self
                .http
                .get(url.clone())
                .query(&[("ids", ids_param.as_str())])
                .timeout(DELETE_TIMEOUT)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<DeleteResponse>()
                        .await
                        .map_err(|e| SmsError::Parse(format!("Bad delete response: {}", e)));
                }
                Ok(response) if response.status().is_server_error() => {
                    last_err =
                        SmsError::Server(format!("Delete returned HTTP {}", response.status()));
                    if attempt < DELETE_MAX_ATTEMPTS {
                        debug!("Delete batch hit {}, retrying", response.status());
                        tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                    }
                }
                // 4xx is terminal, no point retrying the same URL
                Ok(response) => {
                    return Err(SmsError::Server(format!(
                        "Delete returned HTTP {}",
                        response.status()
                    )));
                }
                Err(e) => {
                    last_err = e.into();
                    if attempt < DELETE_MAX_ATTEMPTS {
                        tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                    }
                }
            }
        }

        Err(last_err)
    }

    /// Flip the read flag on the gateway; plain boolean outcome
    pub async fn set_read_status(&self, id: &str, read: bool) -> bool {
        let Ok(url) = self.endpoint(MARK_READ_ENDPOINT) else {
            return false;
        };

        let result = self
            .http
            .get(url)
            .query(&[("id", id), ("read", if read { "1" } else { "0" })])
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Mark-read for {} returned HTTP {}", id, response.status());
                false
            }
            Err(e) => {
                warn!("Mark-read for {} failed: {}", id, e);
                false
            }
        }
    }

    /// Lightweight reachability probe (5s timeout, 2xx = reachable)
    pub async fn test_connection(&self) -> bool {
        let Ok(url) = self.endpoint(SEND_ENDPOINT) else {
            return false;
        };

        match self.http.get(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Connection probe failed: {}", e);
                false
            }
        }
    }

    /// Probe with up to three attempts, one second apart
    pub async fn test_connection_with_retry(&self) -> bool {
        for attempt in 1..=PROBE_ATTEMPTS {
            if self.test_connection().await {
                return true;
            }
            debug!("Connection probe attempt {}/{} failed", attempt, PROBE_ATTEMPTS);
            if attempt < PROBE_ATTEMPTS {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
        false
    }
}

/// Validate and normalize a phone number
///
/// Separators (spaces, dashes, parentheses, a leading `+`) are stripped; the
/// remainder must be 3 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<String> {
    let cleaned: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '+'))
        .collect();

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(SmsError::Validation(format!(
            "Phone number '{}' contains invalid characters",
            phone
        )));
    }
    if cleaned.len() < 3 || cleaned.len() > 15 {
        return Err(SmsError::Validation(format!(
            "Phone number '{}' must be 3-15 digits",
            phone
        )));
    }

    Ok(cleaned)
}

/// Split ids into delete batches bounded by both a count and the resulting
/// URL length (`base_len` covers everything before the ids parameter value)
fn build_batches(
    ids: &[String],
    max_per_batch: usize,
    max_url_len: usize,
    base_len: usize,
) -> Vec<Vec<String>> {
    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = base_len;

    for id in ids {
        // A comma URL-encodes to three characters
        let added = id.len() + if current.is_empty() { 0 } else { 3 };
        if !current.is_empty()
            && (current.len() >= max_per_batch || current_len + added > max_url_len)
        {
            batches.push(std::mem::take(&mut current));
            current_len = base_len;
        }
        current_len += if current.is_empty() { id.len() } else { added };
        current.push(id.clone());
    }
    if !current.is_empty() {
        batches.push(current);
    }

    batches
}
