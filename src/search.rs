use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use serde_json::Value;

use crate::error::Result;
use crate::schema::EvidenceBundle;
use crate::utils::dedup_preserving_order;

/// Topical hints appended to the company name to form the search query.
pub const QUERY_HINTS: &str = "company overview business model latest news competitors funding";

const LIST_FIELDS: [&str; 3] = ["results", "hits", "items"];
const BODY_FIELDS: [&str; 4] = ["content", "snippet", "text", "summary"];
const URL_FIELDS: [&str; 4] = ["url", "link", "source", "href"];

/// A web-search backend.
///
/// The returned value may be an object holding the result list under `results`, `hits` or
/// `items`, or a bare list of records.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize, include_raw_content: bool) -> Result<Value>;
}

pub fn company_query(company_name: &str) -> String {
    format!("{} {}", company_name, QUERY_HINTS)
}

pub struct SearchAggregator {
    provider: Arc<dyn SearchProvider>,
}

impl SearchAggregator {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Search for the company and fold the results into one evidence bundle.
    ///
    /// A failing provider degrades to empty evidence rather than an error.
    pub async fn aggregate(&self, company_name: &str, limit: usize) -> EvidenceBundle {
        let query = company_query(company_name);
        info!("Running search for query: {}", query);

        let raw = match self.provider.search(&query, limit, true).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Search failed, continuing without evidence: {}", e);
                return EvidenceBundle::empty();
            }
        };

        let evidence = collect_evidence(raw, limit);
        info!(
            "Search collected {} chars and {} sources",
            evidence.text.chars().count(),
            evidence.sources.len()
        );
        evidence
    }
}

/// Normalize a raw result set into evidence text and de-duplicated sources.
pub fn collect_evidence(raw: Value, limit: usize) -> EvidenceBundle {
    let mut text = String::new();
    let mut sources = Vec::new();

    for record in result_records(raw).iter().take(limit) {
        if let Some(body) = record_body(record) {
            text.push_str(body);
            text.push_str("\n\n");
        }
        if let Some(url) = record_url(record) {
            sources.push(url.to_string());
        }
    }

    EvidenceBundle {
        text: text.trim_end().to_string(),
        sources: dedup_preserving_order(sources),
    }
}

fn result_records(raw: Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items,
        Value::Object(mut map) => LIST_FIELDS
            .iter()
            .find_map(|field| match map.remove(*field) {
                Some(Value::Array(items)) if !items.is_empty() => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn record_body(record: &Value) -> Option<&str> {
    match record {
        Value::String(s) if !s.is_empty() => Some(s.as_str()),
        Value::Object(_) => first_non_empty(record, &BODY_FIELDS),
        _ => None,
    }
}

fn record_url(record: &Value) -> Option<&str> {
    first_non_empty(record, &URL_FIELDS)
}

fn first_non_empty<'a>(record: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields.iter().find_map(|field| {
        record
            .get(*field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    })
}
