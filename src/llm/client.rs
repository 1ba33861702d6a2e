use crate::error::{AccountPlanError, Result};
use crate::llm::service::CompletionService;
use crate::llm::types::CompletionResponse;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Gemini REST client.
///
/// Holds no per-call state; clones share the underlying connection pool.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Reads `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            AccountPlanError::Configuration("GEMINI_API_KEY must be set".to_string())
        })?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn post_json<T: Serialize + ?Sized>(&self, url: &str, payload: &T) -> Result<Value> {
        let res = self.client.post(url).json(payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(AccountPlanError::Completion(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        Ok(res.json().await?)
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn generate_content(&self, model: &str, contents: &str) -> Result<CompletionResponse> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        let payload = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: contents }],
            }],
        };

        debug!("Gemini generateContent: model={} prompt_chars={}", model, contents.len());
        let body = self.post_json(&url, &payload).await?;
        Ok(CompletionResponse::from_value(body))
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<CompletionResponse> {
        let url = format!(
            "{}/models/{}:generateText?key={}",
            self.base_url, model, self.api_key
        );
        let payload = json!({ "prompt": { "text": prompt } });

        debug!("Gemini generateText: model={} prompt_chars={}", model, prompt.len());
        let body = self.post_json(&url, &payload).await?;

        // The legacy endpoint answers with `candidates[].output`.
        let legacy_output = body
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("output"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(match legacy_output {
            Some(text) => CompletionResponse::TextField(text),
            None => CompletionResponse::from_value(body),
        })
    }
}
