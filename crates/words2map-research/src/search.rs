use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use words2map_core::{Words2MapError, Words2MapResult};

/// The Custom Search API returns at most this many results per request.
const MAX_RESULTS_PER_REQUEST: u32 = 10;

/// One web search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page address.
    pub url: String,
    /// Page title as reported by the engine.
    pub title: String,
}

/// Trait for web search backends.
///
/// Implementations report an exhausted quota or rejected key as
/// [`Words2MapError::QuotaExhausted`] and anything worth retrying as
/// [`Words2MapError::Transient`].
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Up to `count` results for `query`, starting at 1-based rank `start`.
    async fn search(&self, query: &str, start: u32, count: u32) -> Words2MapResult<Vec<SearchHit>>;
}

/// Google Custom Search credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// API key from the Google API console.
    #[serde(default)]
    pub api_key: String,
    /// Programmable search engine id (`cx`).
    #[serde(default)]
    pub engine_id: String,
    /// API root, overridable for testing.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            engine_id: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Google Custom Search JSON API client.
pub struct GoogleSearch {
    config: SearchConfig,
    http: reqwest::Client,
}

impl GoogleSearch {
    /// Create a client. Fails when the key or engine id is missing.
    pub fn new(config: SearchConfig) -> Words2MapResult<Self> {
        if config.api_key.is_empty() {
            return Err(Words2MapError::Config(
                "search.api_key is not set".to_string(),
            ));
        }
        if config.engine_id.is_empty() {
            return Err(Words2MapError::Config(
                "search.engine_id is not set".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Words2MapError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, http })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    link: String,
    #[serde(default)]
    title: String,
}

#[async_trait]
impl SearchEngine for GoogleSearch {
    async fn search(&self, query: &str, start: u32, count: u32) -> Words2MapResult<Vec<SearchHit>> {
        let url = format!(
            "{}/customsearch/v1",
            self.config.base_url.trim_end_matches('/')
        );
        let num = count.clamp(1, MAX_RESULTS_PER_REQUEST);

        info!(query = %query, start, num, "Web search");
        let start = start.max(1).to_string();
        let num = num.to_string();

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.engine_id.as_str()),
                ("q", query),
                ("start", start.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Words2MapError::Transient(format!("Search request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_status(status, &body));
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| Words2MapError::Transient(format!("Malformed search response: {e}")))?;

        let hits: Vec<SearchHit> = body
            .items
            .into_iter()
            .map(|item| SearchHit {
                url: item.link,
                title: item.title,
            })
            .collect();
        debug!(query = %query, hits = hits.len(), "Search complete");
        Ok(hits)
    }
}

/// Map a non-success search status to the error taxonomy.
fn classify_status(status: StatusCode, body: &str) -> Words2MapError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            Words2MapError::QuotaExhausted(format!("Search API returned {status}: {body}"))
        }
        _ => Words2MapError::Transient(format!("Search API returned {status}: {body}")),
    }
}
