use log::{info, warn};
use serde_json::{Map, Value};

use crate::config::PlanBuilderConfig;
use crate::error::Result;
use crate::llm::{complete_with_fallback, extract_json, extract_text, prompts, CompletionService};
use crate::schema::{AccountPlan, EvidenceBundle, PlanTemplate};
use crate::utils::{excerpt, is_truthy};

/// Ask the completion service for a full plan and coerce the answer into the template.
///
/// Only a transport failure on both completion paths is an error. Output that cannot be parsed
/// produces a degenerate plan instead.
pub async fn synthesize_plan(
    service: &dyn CompletionService,
    config: &PlanBuilderConfig,
    evidence: &EvidenceBundle,
    company_name: &str,
) -> Result<AccountPlan> {
    let research = excerpt(&evidence.text, config.max_evidence_chars);
    let prompt = prompts::synthesis_prompt(company_name, &config.template, &research);

    info!("Synthesizing account plan for {}", company_name);
    let response = complete_with_fallback(service, &config.text_model, &prompt).await?;
    let text_output = extract_text(&response);

    Ok(plan_from_output(&text_output, &config.template))
}

/// Turn raw model text into a plan carrying exactly the template's sections.
pub fn plan_from_output(text_output: &str, template: &PlanTemplate) -> AccountPlan {
    let parsed = extract_json(text_output);

    if !parsed.values().any(is_truthy) {
        warn!("Model did not return usable JSON, falling back to raw text");
        return degenerate_plan(text_output, template);
    }

    plan_from_object(&parsed, template)
}

/// The raw text becomes the first section; everything else stays empty.
pub fn degenerate_plan(text_output: &str, template: &PlanTemplate) -> AccountPlan {
    let mut plan = AccountPlan::empty(template);
    if let Some(first) = template.keys().first() {
        plan.set_section(first, text_output.trim());
    }
    plan
}

fn plan_from_object(parsed: &Map<String, Value>, template: &PlanTemplate) -> AccountPlan {
    let mut plan = AccountPlan::empty(template);
    for key in template.keys() {
        let content = parsed.get(key).map(stringify).unwrap_or_default();
        plan.set_section(key, content.trim());
    }
    plan
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
