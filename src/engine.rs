use std::sync::Arc;

use futures::channel::mpsc::UnboundedSender;
use log::info;
use serde::{Deserialize, Serialize};

use crate::assembler::finalize;
use crate::config::PlanBuilderConfig;
use crate::error::Result;
use crate::expander::ensure_long_sections_with;
use crate::llm::CompletionService;
use crate::query::CompanyQuery;
use crate::schema::{AccountPlan, EvidenceBundle};
use crate::search::{SearchAggregator, SearchProvider};
use crate::synthesis::synthesize_plan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanEvent {
    Searching,
    EvidenceCollected { chars: usize, sources: usize },
    Synthesizing,
    Expanding { sections: Vec<String> },
    Finalizing,
    Completed,
}

/// Runs search, synthesis, expansion and assembly for one company at a time.
///
/// Holds no per-run state, so one builder can serve concurrent requests.
pub struct AccountPlanBuilder {
    search: SearchAggregator,
    completion: Arc<dyn CompletionService>,
    config: PlanBuilderConfig,
    progress: Option<UnboundedSender<PlanEvent>>,
}

impl AccountPlanBuilder {
    pub fn new(search: Arc<dyn SearchProvider>, completion: Arc<dyn CompletionService>) -> Self {
        Self {
            search: SearchAggregator::new(search),
            completion,
            config: PlanBuilderConfig::default(),
            progress: None,
        }
    }

    pub fn with_config(mut self, config: PlanBuilderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_progress(mut self, progress: UnboundedSender<PlanEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &PlanBuilderConfig {
        &self.config
    }

    /// Build a plan using the configured search limit.
    pub async fn build(&self, company_name: &str) -> Result<AccountPlan> {
        self.build_with_limit(company_name, self.config.search_limit)
            .await
    }

    /// Validate free-form input ("Research Tesla") before building.
    pub async fn build_for_query(&self, raw_query: &str) -> Result<AccountPlan> {
        let query = CompanyQuery::parse(raw_query)?;
        self.build(query.company_name()).await
    }

    pub async fn build_with_limit(&self, company_name: &str, limit: usize) -> Result<AccountPlan> {
        self.send_event(PlanEvent::Searching);
        let evidence = self.search.aggregate(company_name, limit).await;
        self.send_event(PlanEvent::EvidenceCollected {
            chars: evidence.text.chars().count(),
            sources: evidence.sources.len(),
        });

        self.plan_from_evidence(&evidence, company_name).await
    }

    /// Everything after search: synthesis, optional expansion, then assembly.
    pub async fn plan_from_evidence(
        &self,
        evidence: &EvidenceBundle,
        company_name: &str,
    ) -> Result<AccountPlan> {
        self.send_event(PlanEvent::Synthesizing);
        let plan =
            synthesize_plan(self.completion.as_ref(), &self.config, evidence, company_name).await?;

        let plan = ensure_long_sections_with(
            self.completion.as_ref(),
            &self.config,
            plan,
            evidence,
            company_name,
            |sections| {
                self.send_event(PlanEvent::Expanding {
                    sections: sections.to_vec(),
                })
            },
        )
        .await;

        self.send_event(PlanEvent::Finalizing);
        let plan = finalize(plan, &evidence.sources);

        info!(
            "Generated account plan with keys: {:?}",
            plan.section_keys().collect::<Vec<_>>()
        );
        self.send_event(PlanEvent::Completed);
        Ok(plan)
    }

    fn send_event(&self, event: PlanEvent) {
        if let Some(tx) = &self.progress {
            let _ = tx.unbounded_send(event);
        }
    }
}

/// One-shot convenience over [`AccountPlanBuilder`] with default configuration.
pub async fn build_account_plan(
    search: Arc<dyn SearchProvider>,
    completion: Arc<dyn CompletionService>,
    company_name: &str,
    search_limit: usize,
) -> Result<AccountPlan> {
    AccountPlanBuilder::new(search, completion)
        .build_with_limit(company_name, search_limit)
        .await
}
