/// Upstream launch API clients
use crate::config::HttpSettings;
use crate::domain::{RawPage, YearMonth};
use crate::errors::{ApiResult, FeedError, FeedResult};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(test)]
pub mod fake;

/// HTTP client wrapper with common configuration
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(settings: &HttpSettings) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

/// Source of raw upcoming-launch pages. Retries are the caller's business.
#[async_trait]
pub trait LaunchSource: Send + Sync {
    /// `page` is 1-based
    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        month: Option<YearMonth>,
    ) -> FeedResult<RawPage>;
}

/// Upstream list envelope
#[derive(Debug, Deserialize)]
struct PageEnvelope {
    results: Vec<Value>,
    #[serde(default)]
    next: Option<String>,
}

impl From<PageEnvelope> for RawPage {
    fn from(envelope: PageEnvelope) -> Self {
        RawPage {
            records: envelope.results,
            has_next: envelope.next.is_some(),
        }
    }
}

/// Query string for one page: zero-based offset, ascending by launch time,
/// optionally bounded to one calendar month (UTC, both ends inclusive).
pub fn page_query(page: u32, page_size: u32, month: Option<YearMonth>) -> Vec<(&'static str, String)> {
    let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
    let mut query = vec![
        ("limit", page_size.to_string()),
        ("offset", offset.to_string()),
        ("ordering", "net".to_string()),
        ("mode", "detailed".to_string()),
    ];
    if let Some(month) = month {
        query.push((
            "net__gte",
            month
                .first_instant()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ));
        query.push((
            "net__lte",
            month
                .last_instant()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ));
    }
    query
}

/// Launch Library 2 client
pub struct LaunchLibraryClient {
    http_client: HttpClient,
    base_url: String,
}

impl LaunchLibraryClient {
    pub fn new(base_url: String, settings: &HttpSettings) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(settings)?,
            base_url,
        })
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LaunchSource for LaunchLibraryClient {
    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        month: Option<YearMonth>,
    ) -> FeedResult<RawPage> {
        let url = format!("{}/launch/upcoming/", self.base_url);
        let query = page_query(page, page_size, month);
        debug!(page, page_size, month = ?month.map(|m| m.to_string()), "requesting launch page");

        let resp = self
            .http_client
            .get_client()
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&query)
            .send()
            .await
            .map_err(|e| FeedError::transport(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            // upstream puts a human readable reason in `detail`
            let detail = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("detail").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            warn!(page, status = status.as_u16(), "launch page request rejected: {}", detail);
            return Err(FeedError::transport(Some(status.as_u16()), detail));
        }

        let envelope: PageEnvelope = resp.json().await.map_err(|e| {
            FeedError::transport(Some(status.as_u16()), format!("invalid response body: {}", e))
        })?;
        Ok(envelope.into())
    }
}
