use std::time::Duration;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use url::Url;
use log::{debug, error};

use super::{DictionaryEntry, DictionaryService, SearchResponse};
use crate::errors::DictionaryError;

/// Default search endpoint
pub const DEFAULT_ENDPOINT: &str = "https://jisho.org/api/v1/search/words";

/// Client for a jisho.org-style word search API
pub struct JishoClient {
    /// HTTP client for API requests
    client: Client,
    /// Search endpoint; the word goes in the `keyword` query parameter
    endpoint: String,
}

impl JishoClient {
    /// Create a new client; fails if the HTTP client cannot be built,
    /// e.g. when `user_agent` is not a valid header value
    pub fn new(endpoint: impl Into<String>, user_agent: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let endpoint = endpoint.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("Failed to build dictionary HTTP client")?;

        Ok(Self {
            client,
            endpoint: if endpoint.is_empty() { DEFAULT_ENDPOINT.to_string() } else { endpoint },
        })
    }

    /// Build the search URL; the word is percent-encoded
    pub fn search_url(&self, word: &str) -> Result<Url, DictionaryError> {
        Url::parse_with_params(&self.endpoint, &[("keyword", word)])
            .map_err(|e| DictionaryError::RequestFailed(format!("Invalid endpoint {}: {}", self.endpoint, e)))
    }
}

#[async_trait]
impl DictionaryService for JishoClient {
    async fn search(&self, word: &str) -> Result<Vec<DictionaryEntry>, DictionaryError> {
        let url = self.search_url(word)?;
        debug!("Dictionary lookup: {}", url);

        let response = self.client.get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    DictionaryError::ConnectionError(e.to_string())
                } else {
                    DictionaryError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DictionaryError::RateLimitExceeded(format!("lookup of '{}' was throttled", word)));
        }
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Dictionary API error ({}): {}", status, error_text);
            return Err(DictionaryError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let body = response.json::<SearchResponse>().await
            .map_err(|e| DictionaryError::ParseError(e.to_string()))?;

        Ok(body.data)
    }
}
