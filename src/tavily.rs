use crate::error::{AccountPlanError, Result};
use crate::search::SearchProvider;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    include_raw_content: bool,
}

/// Tavily search client. Returns the raw response body; normalization is left to the aggregator.
#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl TavilyClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            endpoint: TAVILY_SEARCH_URL.to_string(),
        }
    }

    /// Reads `TAVILY_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY").map_err(|_| {
            AccountPlanError::Configuration("TAVILY_API_KEY must be set".to_string())
        })?;
        Ok(Self::new(api_key))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str, limit: usize, include_raw_content: bool) -> Result<Value> {
        let payload = TavilySearchRequest {
            query,
            max_results: limit,
            include_raw_content,
        };

        debug!("Tavily search: max_results={}", limit);
        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(AccountPlanError::Search(format!(
                "Tavily API Error (status {}): {}",
                status, err_text
            )));
        }

        Ok(res.json().await?)
    }
}
