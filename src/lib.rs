//! # Account Plan Builder
//!
//! A library for turning free-text web-search results about a company into a structured,
//! fixed-schema account plan, with a large language model doing the synthesis.
//!
//! ## Core Concepts
//!
//! - **Evidence Bundle**: Search result bodies concatenated into one text blob, plus the
//!   de-duplicated source URLs they came from
//! - **Plan Template**: The ordered section keys every plan must carry
//! - **Synthesis**: One completion call asking for a JSON object with every template section,
//!   parsed leniently out of whatever text the model returns
//! - **Expansion**: A second, optional completion call for sections that came back too short;
//!   merged only where the new text is longer
//! - **Degenerate Plan**: When no JSON can be recovered the raw model text becomes the first
//!   section and every other section stays empty
//! - **Confidence Estimate**: `min(95, 20 + 10 * sources)` percent, a heuristic for evidence
//!   breadth rather than a statistical measure
//!
//! Search and completion backends are injected as trait objects, so any provider (or a
//! deterministic fake) can be plugged in.
//!
//! ## Example
//!
//! ```rust,ignore
//! use account_plan_builder::*;
//! use std::sync::Arc;
//!
//! let search = Arc::new(TavilyClient::from_env()?);
//! let completion = Arc::new(GeminiClient::from_env()?);
//!
//! let builder = AccountPlanBuilder::new(search, completion)
//!     .with_config(PlanBuilderConfig::from_env()?);
//!
//! let plan = builder.build_for_query("Research Acme Corp").await?;
//! println!("{}", plan);
//! ```

pub mod assembler;
pub mod chat;
pub mod config;
pub mod engine;
pub mod error;
pub mod expander;
pub mod llm;
pub mod query;
pub mod schema;
pub mod search;
pub mod synthesis;
pub mod utils;

#[cfg(feature = "tavily")]
pub mod tavily;

pub use assembler::{confidence_estimate, confidence_percent, finalize};
pub use chat::PlanChat;
pub use config::PlanBuilderConfig;
pub use engine::{build_account_plan, AccountPlanBuilder, PlanEvent};
pub use error::{AccountPlanError, Result};
pub use expander::{
    ensure_long_sections, ensure_long_sections_with, merge_expansion, sections_to_expand,
};
pub use llm::{
    complete_with_fallback, extract_json, extract_text, CompletionResponse, CompletionService,
    Part, TextBlock,
};
#[cfg(feature = "gemini")]
pub use llm::GeminiClient;
pub use query::CompanyQuery;
pub use schema::*;
pub use search::{collect_evidence, SearchAggregator, SearchProvider};
pub use synthesis::{degenerate_plan, plan_from_output, synthesize_plan};
#[cfg(feature = "tavily")]
pub use tavily::TavilyClient;
