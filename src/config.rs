use crate::error::{AccountPlanError, Result};
use crate::schema::PlanTemplate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SEARCH_LIMIT: usize = 8;
/// Sections shorter than this (in characters) are sent back for expansion.
pub const DEFAULT_MIN_SECTION_CHARS: usize = 300;
pub const DEFAULT_MAX_EVIDENCE_CHARS: usize = 24_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanBuilderConfig {
    pub text_model: String,
    pub search_limit: usize,
    pub min_section_chars: usize,
    /// Evidence embedded in a prompt is cut to this many characters.
    pub max_evidence_chars: usize,
    pub template: PlanTemplate,
}

impl Default for PlanBuilderConfig {
    fn default() -> Self {
        Self {
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            min_section_chars: DEFAULT_MIN_SECTION_CHARS,
            max_evidence_chars: DEFAULT_MAX_EVIDENCE_CHARS,
            template: PlanTemplate::default(),
        }
    }
}

impl PlanBuilderConfig {
    /// Defaults overridden by `GEMINI_TEXT_MODEL` and `ACCOUNT_PLAN_SEARCH_LIMIT` when set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("GEMINI_TEXT_MODEL") {
            if !model.trim().is_empty() {
                config.text_model = model.trim().to_string();
            }
        }

        if let Ok(limit) = std::env::var("ACCOUNT_PLAN_SEARCH_LIMIT") {
            config.search_limit = parse_search_limit(&limit)?;
        }

        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn with_min_section_chars(mut self, min_chars: usize) -> Self {
        self.min_section_chars = min_chars;
        self
    }

    pub fn with_max_evidence_chars(mut self, max_chars: usize) -> Self {
        self.max_evidence_chars = max_chars;
        self
    }

    pub fn with_template(mut self, template: PlanTemplate) -> Self {
        self.template = template;
        self
    }
}

fn parse_search_limit(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(AccountPlanError::Configuration(format!(
            "ACCOUNT_PLAN_SEARCH_LIMIT must be a positive integer, got '{}'",
            raw
        ))),
    }
}
