use std::sync::Arc;

use log::info;

use crate::error::Result;
use crate::llm::{complete_with_fallback, extract_text, prompts, CompletionService};
use crate::schema::AccountPlan;
use crate::utils::excerpt;

const SECTION_EXCERPT_CHARS: usize = 1200;
const MAX_CONTEXT_SOURCES: usize = 6;

pub const EMPTY_ANSWER: &str =
    "I couldn't generate an answer. Try rephrasing the question or ask for a specific section of the plan.";

/// Answers follow-up questions using a finished plan as read-only context.
pub struct PlanChat {
    service: Arc<dyn CompletionService>,
    model: String,
}

impl PlanChat {
    pub fn new(service: Arc<dyn CompletionService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }

    pub async fn answer(&self, question: &str, plan: &AccountPlan) -> Result<String> {
        let prompt = prompts::chat_prompt(&plan_context(plan), question);

        info!("Answering plan question ({} chars)", question.len());
        let response = complete_with_fallback(self.service.as_ref(), &self.model, &prompt).await?;
        let answer = extract_text(&response);

        if answer.is_empty() {
            Ok(EMPTY_ANSWER.to_string())
        } else {
            Ok(answer)
        }
    }
}

/// Non-empty sections, each cut to a bounded excerpt, followed by the first few sources.
pub fn plan_context(plan: &AccountPlan) -> String {
    let mut blocks: Vec<String> = plan
        .sections()
        .iter()
        .filter(|s| !s.content.trim().is_empty())
        .map(|s| {
            format!(
                "{}:\n{}\n",
                s.key,
                excerpt(s.content.trim(), SECTION_EXCERPT_CHARS)
            )
        })
        .collect();

    if !plan.sources.is_empty() {
        let sources: Vec<&str> = plan
            .sources
            .iter()
            .take(MAX_CONTEXT_SOURCES)
            .map(String::as_str)
            .collect();
        blocks.push(format!(
            "sources (first {}):\n{}\n",
            MAX_CONTEXT_SOURCES,
            sources.join("\n")
        ));
    }

    blocks.join("\n\n")
}
