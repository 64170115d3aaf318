//! HTTP implementation of [`TrackerBackend`] for a DefectDojo-compatible
//! `/api/v2` REST API.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` so that no
//! request blocks the async runtime. Every call shares one agent configured
//! with a global timeout; HTTP error statuses are returned as responses, not
//! transport errors, so each operation decides what a status means.

use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use time::{Date, Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::record::{Engagement, FindingImport, ImportMode, Page, TestRecord, UploadReceipt};
use crate::traits::TrackerBackend;

/// Page size requested from listing endpoints.
const PAGE_LIMIT: u32 = 100;

/// Upper bound on `next` links followed by a single listing.
pub const MAX_PAGES: usize = 20;

/// Engagements are created to run for one year.
const ENGAGEMENT_SPAN_DAYS: i64 = 365;

/// Filename of the report part in upload requests.
const REPORT_FILENAME: &str = "report.json";

/// Tracker client over HTTP.
#[derive(Clone)]
pub struct HttpTracker {
    config: TrackerConfig,
    agent: ureq::Agent,
}

impl HttpTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.request_timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { config, agent }
    }

    /// Fetch every page of a listing, following `next` links.
    ///
    /// The whole listing shares one `request_timeout` budget; each page gets
    /// whatever is left of it. Links that leave the tracker's origin are not
    /// followed, so the credential never goes to another host.
    async fn list_all<T>(
        &self,
        operation: &'static str,
        first_url: String,
    ) -> Result<Vec<T>, TrackerError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        let authorization = self.config.authorization();
        let base_url = self.config.base_url.clone();
        let budget = self.config.request_timeout;

        run_blocking(move || {
            let deadline = Instant::now() + budget;
            let mut items = Vec::new();
            let mut url = first_url;
            for _ in 0..MAX_PAGES {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(TrackerError::Transport {
                        operation: operation.to_string(),
                        detail: format!("listing did not finish within {:?}", budget),
                    });
                }
                debug!(operation, %url, "tracker GET");
                let page: Page<T> = get_page(&agent, &authorization, operation, &url, remaining)?;
                items.extend(page.results);
                let Some(next) = page.next.filter(|n| !n.is_empty()) else {
                    return Ok(items);
                };
                match next_url(&base_url, &next) {
                    Some(next) => url = next,
                    None => {
                        warn!(
                            operation,
                            link = %next,
                            "next link leaves the tracker origin; listing truncated"
                        );
                        return Ok(items);
                    }
                }
            }
            warn!(operation, pages = MAX_PAGES, "listing truncated at page limit");
            Ok(items)
        })
        .await
    }
}

#[async_trait]
impl TrackerBackend for HttpTracker {
    async fn list_engagements(&self, product_id: u64) -> Result<Vec<Engagement>, TrackerError> {
        let url = format!(
            "{}?product={}&limit={}",
            self.config.api_url("engagements/"),
            product_id,
            PAGE_LIMIT
        );
        self.list_all("list engagements", url).await
    }

    async fn list_tests(&self, engagement_id: u64) -> Result<Vec<TestRecord>, TrackerError> {
        let url = format!(
            "{}?engagement={}&limit={}",
            self.config.api_url("tests/"),
            engagement_id,
            PAGE_LIMIT
        );
        self.list_all("list tests", url).await
    }

    async fn create_engagement(&self, name: &str, product_id: u64) -> Result<u16, TrackerError> {
        let agent = self.agent.clone();
        let authorization = self.config.authorization();
        let url = self.config.api_url("engagements/");

        let (target_start, target_end) = engagement_window(today());
        let form = form_encode(&[
            ("name", name),
            ("product", &product_id.to_string()),
            ("target_start", &format_date(target_start)),
            ("target_end", &format_date(target_end)),
        ]);

        run_blocking(move || {
            let operation = "create engagement";
            debug!(operation, %url, "tracker POST");
            let response = agent
                .post(&url)
                .header("Authorization", &authorization)
                .header("Accept", "application/json")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .send(form.as_bytes())
                .map_err(|e| transport(operation, e))?;

            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                let body = response.into_body().read_to_string().unwrap_or_default();
                warn!(operation, status, %body, "tracker refused engagement creation");
            }
            Ok(status)
        })
        .await
    }

    async fn upload_findings(
        &self,
        import: FindingImport,
        mode: ImportMode,
    ) -> Result<UploadReceipt, TrackerError> {
        let agent = self.agent.clone();
        let authorization = self.config.authorization();
        let url = self.config.api_url(&format!("{}/", mode.endpoint()));

        let boundary = format!("scanbridge-{:016x}", rand::random::<u64>());
        let body = multipart_body(&boundary, &import);
        let content_type = format!("multipart/form-data; boundary={boundary}");

        run_blocking(move || {
            let operation = mode.endpoint();
            debug!(operation, %url, bytes = body.len(), "tracker POST");
            let response = agent
                .post(&url)
                .header("Authorization", &authorization)
                .header("Accept", "application/json")
                .header("Content-Type", &content_type)
                .send(&body)
                .map_err(|e| transport(operation, e))?;

            let status = response.status().as_u16();
            let text = response
                .into_body()
                .read_to_string()
                .map_err(|e| TrackerError::Transport {
                    operation: operation.to_string(),
                    detail: format!("status {status}, body unreadable: {e}"),
                })?;

            if (200..300).contains(&status) {
                Ok(UploadReceipt { status, body: text })
            } else {
                Err(TrackerError::Rejected {
                    operation: operation.to_string(),
                    status,
                    body: text,
                })
            }
        })
        .await
    }
}

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

/// Run a blocking request on tokio's blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, TrackerError>
where
    F: FnOnce() -> Result<T, TrackerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TrackerError::Runtime(e.to_string()))?
}

fn get_page<T: DeserializeOwned>(
    agent: &ureq::Agent,
    authorization: &str,
    operation: &str,
    url: &str,
    timeout: std::time::Duration,
) -> Result<Page<T>, TrackerError> {
    let response = agent
        .get(url)
        .header("Authorization", authorization)
        .header("Accept", "application/json")
        .config()
        .timeout_global(Some(timeout))
        .build()
        .call()
        .map_err(|e| transport(operation, e))?;

    let status = response.status().as_u16();
    let text = response
        .into_body()
        .read_to_string()
        .map_err(|e| transport(operation, e))?;

    if status != 200 {
        return Err(TrackerError::Rejected {
            operation: operation.to_string(),
            status,
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| TrackerError::Decode {
        operation: operation.to_string(),
        detail: e.to_string(),
    })
}

fn transport(operation: &str, err: ureq::Error) -> TrackerError {
    TrackerError::Transport {
        operation: operation.to_string(),
        detail: err.to_string(),
    }
}

/// Resolve a pagination link against the tracker base URL. `None` when an
/// absolute link points at a different origin.
fn next_url(base_url: &str, link: &str) -> Option<String> {
    if link.starts_with("http://") || link.starts_with("https://") {
        origin(link)
            .eq_ignore_ascii_case(origin(base_url))
            .then(|| link.to_string())
    } else {
        Some(format!("{}/{}", origin(base_url), link.trim_start_matches('/')))
    }
}

/// `scheme://host[:port]` of an absolute URL.
fn origin(url: &str) -> &str {
    let after_scheme = url.find("://").map_or(0, |i| i + 3);
    match url[after_scheme..].find(['/', '?', '#']) {
        Some(end) => &url[..after_scheme + end],
        None => url,
    }
}

/// Today's date in UTC.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// `(target_start, target_end)` for an engagement created on `start`.
pub fn engagement_window(start: Date) -> (Date, Date) {
    (start, start.saturating_add(Duration::days(ENGAGEMENT_SPAN_DAYS)))
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(time::macros::format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Encode `application/x-www-form-urlencoded` pairs.
fn form_encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoded(k), urlencoded(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode a form value. Only unreserved characters pass through.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Build the multipart upload body.
///
/// ureq v3 does not bundle multipart support, so the body is assembled by
/// hand: one text part per form field, then the report as a file part.
fn multipart_body(boundary: &str, import: &FindingImport) -> Vec<u8> {
    let mut body: Vec<u8> = Vec::with_capacity(import.report.len() + 2048);

    for (name, value) in import.form_fields() {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{REPORT_FILENAME}\"\r\nContent-Type: application/json\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(&import.report);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
