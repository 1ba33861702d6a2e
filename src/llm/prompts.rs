// Prompt templates for synthesis, section expansion and plan follow-up questions.

use crate::schema::PlanTemplate;

pub const ANALYST_PERSONA: &str = "You are an expert enterprise sales analyst.";

pub fn synthesis_prompt(company_name: &str, template: &PlanTemplate, research: &str) -> String {
    format!(
        r#"
{persona} Parse the following research text and produce a JSON object
with these keys (exact): {keys}

For EACH key produce a detailed, multi-paragraph, well-written section (aim for ~150-400 words per section).
Use evidence from the research. Where helpful, include brief inline citations in parentheses (e.g., 'According to [source]...').

Important:
- Output ONLY valid JSON (no explanatory text). Each value must be a plain string (you may include newlines).
- Keep JSON parsable (avoid trailing commas).

Company: {company}

Research:
{research}
"#,
        persona = ANALYST_PERSONA,
        keys = template.key_list(),
        company = company_name,
        research = research,
    )
}

pub fn expansion_prompt(company_name: &str, sections: &[String], research: &str) -> String {
    format!(
        r#"
{persona} Expand the following sections into much more detailed content.
Company: {company}

Sections to expand: {sections}

For each requested section, produce a long, well-structured plain-text value (not bullet fragments) of about 150-400 words each, using the research provided. Output ONLY valid JSON with keys exactly matching the section names and values as strings.

Research context (use for evidence):
{research}
"#,
        persona = ANALYST_PERSONA,
        company = company_name,
        sections = sections.join(", "),
        research = research,
    )
}

pub fn chat_prompt(plan_context: &str, question: &str) -> String {
    format!(
        r#"
You are a helpful, concise business research assistant.

CONTEXT: Here is the account plan (do not change it). Use it to answer the user's question. If the plan does not contain enough info to answer, say you don't know and suggest what extra info you need or which external sources to check. Do NOT invent facts. If you cite something, indicate whether it comes from the plan or say 'outside plan - needs web check'.

Account plan context (shortened):
{context}

QUESTION:
{question}

REQUIREMENTS:
- Answer concisely (2-6 sentences) unless user asks for details.
- If you are uncertain, say so and list 1-3 next steps for the user to verify the claim.
- Indicate any plan section you referenced in square brackets, e.g. [Pain Points].
- Output plain text only.
"#,
        context = plan_context,
        question = question,
    )
}
