use crate::html::extract_text;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use words2map_core::{Words2MapError, Words2MapResult};

/// Pages larger than this are not mined.
const MAX_PAGE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Trait for downloading a page as plain text.
///
/// Every failure is a [`Words2MapError::Fetch`]: one bad page never stops the
/// research of a phrase.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Visible text of the page at `url`.
    async fn fetch(&self, url: &str) -> Words2MapResult<String>;
}

/// Page fetcher over reqwest.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Words2MapResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("words2map/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Words2MapError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Words2MapResult<String> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| Words2MapError::Fetch(format!("Invalid URL '{url}': {e}")))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Words2MapError::Fetch(format!(
                    "Unsupported scheme '{scheme}' in {url}"
                )));
            }
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| Words2MapError::Fetch(format!("Failed to fetch '{url}': {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Words2MapError::Fetch(format!("HTTP {status} from {url}")));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();
        if !content_type.starts_with("text/") && !content_type.contains("html") {
            return Err(Words2MapError::Fetch(format!(
                "Unsupported content type '{content_type}' from {url}"
            )));
        }

        let too_large = |bytes: u64| {
            Words2MapError::Fetch(format!(
                "Page too large: {bytes} bytes (max {MAX_PAGE_SIZE}) at {url}"
            ))
        };
        if let Some(declared) = response.content_length() {
            if declared > MAX_PAGE_SIZE as u64 {
                return Err(too_large(declared));
            }
        }

        // Content-Length may be absent or wrong; enforce the cap while reading.
        let mut response = response;
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Words2MapError::Fetch(format!("Failed to read body of {url}: {e}")))?
        {
            let total = body.len() + chunk.len();
            if total > MAX_PAGE_SIZE {
                return Err(too_large(total as u64));
            }
            body.extend_from_slice(&chunk);
        }

        let raw = String::from_utf8_lossy(&body);
        let text = if content_type.starts_with("text/plain") {
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            extract_text(&raw)
        };

        debug!(url = %url, bytes = body.len(), chars = text.len(), "Page fetched");
        Ok(text)
    }
}
