use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::config::PlanBuilderConfig;
use crate::llm::{complete_with_fallback, extract_json, extract_text, prompts, CompletionService};
use crate::schema::{AccountPlan, EvidenceBundle};
use crate::utils::{char_len, excerpt};

/// Keys whose content is shorter than `min_chars` characters, in plan order.
pub fn sections_to_expand(plan: &AccountPlan, min_chars: usize) -> Vec<String> {
    plan.sections()
        .iter()
        .filter(|s| char_len(&s.content) < min_chars)
        .map(|s| s.key.clone())
        .collect()
}

/// Re-ask the model for every under-length section and merge what comes back.
///
/// Best effort: with nothing to expand no request is made, and any failure leaves the plan as it
/// was.
pub async fn ensure_long_sections(
    service: &dyn CompletionService,
    config: &PlanBuilderConfig,
    plan: AccountPlan,
    evidence: &EvidenceBundle,
    company_name: &str,
) -> AccountPlan {
    ensure_long_sections_with(service, config, plan, evidence, company_name, |_| {}).await
}

/// Same as [`ensure_long_sections`], calling `on_expand` with the candidate keys before the
/// expansion request goes out. Not called when nothing needs expanding.
pub async fn ensure_long_sections_with<F>(
    service: &dyn CompletionService,
    config: &PlanBuilderConfig,
    plan: AccountPlan,
    evidence: &EvidenceBundle,
    company_name: &str,
    on_expand: F,
) -> AccountPlan
where
    F: FnOnce(&[String]) + Send,
{
    let candidates = sections_to_expand(&plan, config.min_section_chars);
    if candidates.is_empty() {
        debug!("All sections meet the length threshold, skipping expansion");
        return plan;
    }

    on_expand(&candidates);
    expand_sections(service, config, plan, &candidates, evidence, company_name).await
}

async fn expand_sections(
    service: &dyn CompletionService,
    config: &PlanBuilderConfig,
    mut plan: AccountPlan,
    candidates: &[String],
    evidence: &EvidenceBundle,
    company_name: &str,
) -> AccountPlan {
    info!("Expanding short sections: {:?}", candidates);
    let research = excerpt(&evidence.text, config.max_evidence_chars);
    let prompt = prompts::expansion_prompt(company_name, candidates, &research);

    let response = match complete_with_fallback(service, &config.text_model, &prompt).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Section expansion failed, keeping current plan: {}", e);
            return plan;
        }
    };

    let expanded = extract_json(&extract_text(&response));
    let replaced = merge_expansion(&mut plan, candidates, &expanded);
    info!("Expansion improved {} of {} sections", replaced.len(), candidates.len());

    plan
}

/// Replace a candidate section only with a non-empty string that is strictly longer than what
/// the plan already holds. Returns the keys that were replaced.
pub fn merge_expansion(
    plan: &mut AccountPlan,
    candidates: &[String],
    expanded: &Map<String, Value>,
) -> Vec<String> {
    let mut replaced = Vec::new();

    for key in candidates {
        let Some(new_text) = expanded.get(key).and_then(Value::as_str).map(str::trim) else {
            continue;
        };
        let current_len = plan.section(key).map(char_len).unwrap_or(0);

        if new_text.is_empty() || char_len(new_text) <= current_len {
            continue;
        }
        if plan.set_section(key, new_text) {
            replaced.push(key.clone());
        }
    }

    replaced
}
