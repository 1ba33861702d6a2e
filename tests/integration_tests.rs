use account_plan_builder::*;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct FakeSearch {
    response: Option<Value>,
    calls: Mutex<Vec<(String, usize, bool)>>,
}

impl FakeSearch {
    fn returning(response: Value) -> Arc<Self> {
        Arc::new(Self {
            response: Some(response),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str, limit: usize, include_raw_content: bool) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), limit, include_raw_content));
        self.response
            .clone()
            .ok_or_else(|| AccountPlanError::Search("connection reset".to_string()))
    }
}

type Scripted = Mutex<VecDeque<Result<CompletionResponse>>>;

/// Replays queued answers; an exhausted queue behaves like an unreachable service.
#[derive(Default)]
struct ScriptedCompletion {
    primary: Scripted,
    fallback: Scripted,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    fn new() -> Self {
        Self::default()
    }

    fn primary(self, answer: Result<CompletionResponse>) -> Self {
        self.primary.lock().unwrap().push_back(answer);
        self
    }

    fn fallback(self, answer: Result<CompletionResponse>) -> Self {
        self.fallback.lock().unwrap().push_back(answer);
        self
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next(queue: &Scripted, path: &str) -> Result<CompletionResponse> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AccountPlanError::Completion(format!("{} unreachable", path))))
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn generate_content(&self, _model: &str, contents: &str) -> Result<CompletionResponse> {
        self.prompts.lock().unwrap().push(contents.to_string());
        Self::next(&self.primary, "primary")
    }

    async fn generate(&self, _model: &str, prompt: &str) -> Result<CompletionResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Self::next(&self.fallback, "fallback")
    }
}

fn search_results() -> Value {
    json!({
        "query": "Acme Corp company overview",
        "results": [
            { "title": "Acme", "content": "Acme Corp manufactures anvils.", "url": "https://acme.example" },
            { "snippet": "Acme raised a Series B.", "link": "https://news.example/acme" },
            { "content": "Acme competes with Roadrunner Inc.", "url": "https://acme.example" },
            { "summary": "Acme is expanding to Europe.", "href": "https://eu.example" }
        ]
    })
}

fn long_text(label: &str) -> String {
    format!("{} ", label).repeat(60).trim().to_string()
}

fn full_plan_json() -> String {
    let mut obj = serde_json::Map::new();
    for key in PlanTemplate::default().keys() {
        obj.insert(key.clone(), Value::String(long_text(key)));
    }
    Value::Object(obj).to_string()
}

fn assert_schema_complete(plan: &AccountPlan) {
    let value = serde_json::to_value(plan).unwrap();
    let keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();

    let mut expected: Vec<String> = PlanTemplate::default().keys().to_vec();
    expected.push("sources".to_string());
    expected.push("confidence_estimate".to_string());

    assert_eq!(keys, expected);
    for key in PlanTemplate::default().keys() {
        assert!(value[key].is_string(), "{} should be a string", key);
    }
}

#[tokio::test]
async fn test_complete_plan_needs_no_expansion() {
    let search = FakeSearch::returning(search_results());
    let completion = Arc::new(
        ScriptedCompletion::new().primary(Ok(CompletionResponse::text(format!(
            "Here is your plan:\n```json\n{}\n```",
            full_plan_json()
        )))),
    );

    let plan = build_account_plan(search.clone(), completion.clone(), "Acme Corp", 8)
        .await
        .unwrap();

    assert_schema_complete(&plan);
    assert_eq!(
        plan.sources,
        vec![
            "https://acme.example",
            "https://news.example/acme",
            "https://eu.example"
        ]
    );
    assert_eq!(plan.confidence_estimate, "50%");
    assert_eq!(plan.section("competitors"), Some(long_text("competitors").as_str()));

    // One synthesis call and no expansion call.
    let prompts = completion.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Acme Corp manufactures anvils.\n\nAcme raised a Series B."));
    assert!(prompts[0].contains("Company: Acme Corp"));

    let calls = search.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![(
            "Acme Corp company overview business model latest news competitors funding".to_string(),
            8,
            true
        )]
    );
}

#[tokio::test]
async fn test_short_sections_are_expanded_monotonically() {
    let first = json!({
        "company_overview": long_text("overview"),
        "key_findings": "Thin findings.",
        "pain_points": "p".repeat(50),
        "opportunities": "",
        "competitors": "Roadrunner Inc.",
        "recommended_strategy": "Sell more anvils."
    });
    let expansion = json!({
        "key_findings": long_text("findings"),
        "pain_points": "q".repeat(40),
        "opportunities": "   ",
        "competitors": "Roadrunner Inc. and Coyote Supplies compete on price and delivery."
    });

    let completion = Arc::new(
        ScriptedCompletion::new()
            .primary(Ok(CompletionResponse::text(first.to_string())))
            .primary(Ok(CompletionResponse::from_value(json!({
                "output": [{ "content": [{ "text": expansion.to_string() }] }]
            })))),
    );

    let plan = build_account_plan(
        FakeSearch::returning(search_results()),
        completion.clone(),
        "Acme Corp",
        8,
    )
    .await
    .unwrap();

    assert_schema_complete(&plan);
    assert_eq!(plan.section("company_overview"), Some(long_text("overview").as_str()));
    assert_eq!(plan.section("key_findings"), Some(long_text("findings").as_str()));
    assert_eq!(plan.section("pain_points"), Some("p".repeat(50).as_str()));
    assert_eq!(plan.section("opportunities"), Some(""));
    assert_eq!(
        plan.section("competitors"),
        Some("Roadrunner Inc. and Coyote Supplies compete on price and delivery.")
    );
    assert_eq!(plan.section("recommended_strategy"), Some("Sell more anvils."));

    let prompts = completion.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains(
        "Sections to expand: key_findings, pain_points, opportunities, competitors, recommended_strategy"
    ));
}

#[tokio::test]
async fn test_graceful_degradation_end_to_end() {
    let search = FakeSearch::failing();
    let completion = Arc::new(
        ScriptedCompletion::new()
            .primary(Ok(CompletionResponse::text(
                "Sorry, I could not find structured data.",
            )))
            .primary(Ok(CompletionResponse::text("still {not json"))),
    );

    let plan = build_account_plan(search.clone(), completion.clone(), "Nobody Ltd", 8)
        .await
        .unwrap();

    assert_schema_complete(&plan);
    assert_eq!(
        plan.section("company_overview"),
        Some("Sorry, I could not find structured data.")
    );
    for key in PlanTemplate::default().keys().iter().skip(1) {
        assert_eq!(plan.section(key), Some(""));
    }
    assert!(plan.sources.is_empty());
    assert_eq!(plan.confidence_estimate, "20%");
    assert_eq!(search.call_count(), 1);

    // Synthesis prompt still issued without evidence.
    assert!(completion.prompts()[0].contains("Research:\n\n"));
}

#[tokio::test]
async fn test_total_transport_failure_is_fatal() {
    let completion = Arc::new(
        ScriptedCompletion::new()
            .primary(Err(AccountPlanError::Completion("503 primary".into())))
            .fallback(Err(AccountPlanError::Completion("timeout fallback".into()))),
    );

    let err = build_account_plan(
        FakeSearch::returning(search_results()),
        completion,
        "Acme Corp",
        8,
    )
    .await
    .unwrap_err();

    assert!(err.is_fatal());
    let message = err.to_string();
    assert!(message.contains("503 primary"));
    assert!(message.contains("timeout fallback"));
}

#[tokio::test]
async fn test_fallback_path_used_for_synthesis() {
    let completion = Arc::new(
        ScriptedCompletion::new()
            .primary(Err(AccountPlanError::Completion("primary down".into())))
            .fallback(Ok(CompletionResponse::text(full_plan_json()))),
    );

    let plan = build_account_plan(
        FakeSearch::returning(search_results()),
        completion.clone(),
        "Acme Corp",
        8,
    )
    .await
    .unwrap();

    assert_eq!(plan.section("pain_points"), Some(long_text("pain_points").as_str()));
    assert_eq!(completion.prompts().len(), 2);
}

#[tokio::test]
async fn test_expansion_failure_is_swallowed() {
    let completion = Arc::new(
        ScriptedCompletion::new().primary(Ok(CompletionResponse::text(
            r#"{"company_overview": "Short overview.", "competitors": "Beta",}"#,
        ))),
    );

    let plan = build_account_plan(
        FakeSearch::returning(search_results()),
        completion.clone(),
        "Acme Corp",
        8,
    )
    .await
    .unwrap();

    assert_schema_complete(&plan);
    assert_eq!(plan.section("company_overview"), Some("Short overview."));
    assert_eq!(plan.section("competitors"), Some("Beta"));
    // Synthesis, then the expansion attempt on both paths.
    assert_eq!(completion.prompts().len(), 3);
}

#[tokio::test]
async fn test_progress_events() {
    let (tx, rx) = futures::channel::mpsc::unbounded();
    let completion = Arc::new(
        ScriptedCompletion::new().primary(Ok(CompletionResponse::text(full_plan_json()))),
    );

    let builder = AccountPlanBuilder::new(FakeSearch::returning(search_results()), completion)
        .with_progress(tx);
    builder.build("Acme Corp").await.unwrap();
    drop(builder);

    let events: Vec<PlanEvent> = rx.collect().await;
    assert_eq!(
        events,
        vec![
            PlanEvent::Searching,
            PlanEvent::EvidenceCollected {
                chars: "Acme Corp manufactures anvils.\n\nAcme raised a Series B.\n\nAcme competes with Roadrunner Inc.\n\nAcme is expanding to Europe."
                    .chars()
                    .count(),
                sources: 3
            },
            PlanEvent::Synthesizing,
            PlanEvent::Finalizing,
            PlanEvent::Completed,
        ]
    );
}

#[tokio::test]
async fn test_invalid_query_rejected_before_search() {
    let search = FakeSearch::returning(search_results());
    let builder = AccountPlanBuilder::new(search.clone(), Arc::new(ScriptedCompletion::new()));

    let err = builder.build_for_query("research 1234!!").await.unwrap_err();
    assert!(matches!(err, AccountPlanError::InvalidQuery(_)));
    assert_eq!(search.call_count(), 0);
}

#[tokio::test]
async fn test_query_keyword_stripped_before_search() {
    let search = FakeSearch::returning(search_results());
    let completion = Arc::new(
        ScriptedCompletion::new().primary(Ok(CompletionResponse::text(full_plan_json()))),
    );
    let builder = AccountPlanBuilder::new(search.clone(), completion.clone())
        .with_config(PlanBuilderConfig::default().with_search_limit(2));

    let plan = builder.build_for_query("Research Acme Corp").await.unwrap();

    let calls = search.calls.lock().unwrap().clone();
    assert!(calls[0].0.starts_with("Acme Corp company overview"));
    assert_eq!(calls[0].1, 2);
    assert_eq!(plan.sources.len(), 2);
    assert!(completion.prompts()[0].contains("Company: Acme Corp\n"));
}

#[tokio::test]
async fn test_custom_template_and_evidence_truncation() {
    let template = PlanTemplate::new(["summary", "risks"]).unwrap();
    let config = PlanBuilderConfig::default()
        .with_template(template)
        .with_min_section_chars(5)
        .with_max_evidence_chars(10);

    let completion = Arc::new(ScriptedCompletion::new().primary(Ok(CompletionResponse::text(
        r#"{"summary": "Summary text", "risks": "Risk text", "company_overview": "dropped"}"#,
    ))));
    let builder = AccountPlanBuilder::new(FakeSearch::returning(search_results()), completion.clone())
        .with_config(config);

    let plan = builder.build("Acme Corp").await.unwrap();
    let value = serde_json::to_value(&plan).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["summary", "risks", "sources", "confidence_estimate"]);

    let prompts = completion.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("with these keys (exact): summary, risks"));
    assert!(prompts[0].contains("Research:\nAcme Corp  ...\n"));
}

#[tokio::test]
async fn test_plan_chat_answers_and_falls_back_to_apology() {
    let mut plan = AccountPlan::empty(&PlanTemplate::default());
    plan.edit_section("pain_points", "Legacy ERP.").unwrap();

    let completion = Arc::new(
        ScriptedCompletion::new()
            .primary(Ok(CompletionResponse::text("  Their ERP is dated [Pain Points].  ")))
            .primary(Ok(CompletionResponse::text("   "))),
    );
    let chat = PlanChat::new(completion.clone(), "test-model");

    let answer = chat.answer("What hurts?", &plan).await.unwrap();
    assert_eq!(answer, "Their ERP is dated [Pain Points].");
    assert!(completion.prompts()[0].contains("pain_points:\nLegacy ERP."));
    assert!(completion.prompts()[0].contains("QUESTION:\nWhat hurts?"));

    let answer = chat.answer("Anything else?", &plan).await.unwrap();
    assert_eq!(answer, account_plan_builder::chat::EMPTY_ANSWER);
}

#[tokio::test]
async fn test_edited_plan_round_trips_through_json() {
    let completion = Arc::new(
        ScriptedCompletion::new().primary(Ok(CompletionResponse::text(full_plan_json()))),
    );
    let mut plan = build_account_plan(
        FakeSearch::returning(search_results()),
        completion,
        "Acme Corp",
        8,
    )
    .await
    .unwrap();

    plan.edit_section("recommended_strategy", "Lead with the Europe expansion.")
        .unwrap();
    assert!(plan.edit_section("budget", "n/a").is_err());

    let restored: AccountPlan =
        serde_json::from_str(&serde_json::to_string(&plan).unwrap()).unwrap();
    assert_eq!(restored, plan);
    assert_eq!(
        restored.section("recommended_strategy"),
        Some("Lead with the Europe expansion.")
    );
}

#[tokio::test]
async fn test_company_name_starting_with_keyword_searched_whole() {
    let search = FakeSearch::returning(search_results());
    let completion = Arc::new(
        ScriptedCompletion::new().primary(Ok(CompletionResponse::text(full_plan_json()))),
    );
    let builder = AccountPlanBuilder::new(search.clone(), completion.clone());

    builder.build_for_query("ResearchGate").await.unwrap();

    let calls = search.calls.lock().unwrap().clone();
    assert!(calls[0].0.starts_with("ResearchGate company overview"));
    assert!(completion.prompts()[0].contains("Company: ResearchGate\n"));
}

#[tokio::test]
async fn test_progress_reports_sections_being_expanded() {
    let (tx, rx) = futures::channel::mpsc::unbounded();
    let completion = Arc::new(
        ScriptedCompletion::new()
            .primary(Ok(CompletionResponse::text(
                r#"{"summary": "Short.", "risks": "Also short."}"#,
            )))
            .primary(Ok(CompletionResponse::text(
                r#"{"risks": "Currency exposure across European expansion."}"#,
            ))),
    );
    let config = PlanBuilderConfig::default()
        .with_template(PlanTemplate::new(["summary", "risks"]).unwrap())
        .with_min_section_chars(20);

    let builder = AccountPlanBuilder::new(FakeSearch::returning(search_results()), completion)
        .with_config(config)
        .with_progress(tx);
    let plan = builder.build("Acme Corp").await.unwrap();
    drop(builder);

    let events: Vec<PlanEvent> = rx.collect().await;
    assert!(events.contains(&PlanEvent::Expanding {
        sections: vec!["summary".to_string(), "risks".to_string()],
    }));
    assert_eq!(plan.section("summary"), Some("Short."));
    assert_eq!(
        plan.section("risks"),
        Some("Currency exposure across European expansion.")
    );
}

#[tokio::test]
async fn test_expansion_hook_skipped_when_sections_are_long() {
    let completion = ScriptedCompletion::new();
    let config = PlanBuilderConfig::default().with_min_section_chars(1);
    let mut plan = AccountPlan::empty(&PlanTemplate::default());
    for key in PlanTemplate::default().keys() {
        plan.edit_section(key, "filled").unwrap();
    }

    let mut notified = false;
    let plan = ensure_long_sections_with(
        &completion,
        &config,
        plan,
        &EvidenceBundle::empty(),
        "Acme Corp",
        |_| notified = true,
    )
    .await;

    assert!(!notified);
    assert!(completion.prompts().is_empty());
    assert_eq!(plan.section("competitors"), Some("filled"));
}

#[test]
fn test_loaded_plan_cannot_smuggle_foreign_sections() {
    assert!(serde_json::from_str::<AccountPlan>(r#"{"sources": []}"#).is_err());

    let template = PlanTemplate::default();
    let err = AccountPlan::from_value_with_template(json!({ "ceo_gossip": "x" }), &template)
        .unwrap_err();
    assert!(matches!(err, AccountPlanError::MalformedPlan(_)));

    let mut plan = AccountPlan::from_value_with_template(
        json!({ "company_overview": "Acme builds anvils.", "sources": [] }),
        &template,
    )
    .unwrap();
    assert_eq!(plan.section("pain_points"), Some(""));
    assert!(plan.edit_section("ceo_gossip", "y").is_err());
}
