use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountPlanError {
    #[error("Search provider failed: {0}")]
    Search(String),

    #[error("Completion request failed: {0}")]
    Completion(String),

    #[error("Completion service invocation failed: {primary} / {fallback}")]
    SynthesisTransport { primary: String, fallback: String },

    #[error("Invalid input: {0}")]
    InvalidQuery(String),

    #[error("Section does not exist: {0}")]
    UnknownSection(String),

    #[error("Malformed account plan: {0}")]
    MalformedPlan(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

#[cfg(any(feature = "gemini", feature = "tavily"))]
impl From<reqwest::Error> for AccountPlanError {
    fn from(err: reqwest::Error) -> Self {
        AccountPlanError::Http(err.to_string())
    }
}

impl AccountPlanError {
    /// True for the one failure the pipeline lets escape to its caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AccountPlanError::SynthesisTransport { .. })
    }
}

pub type Result<T> = std::result::Result<T, AccountPlanError>;
