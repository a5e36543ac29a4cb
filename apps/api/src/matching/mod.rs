//! Match scoring: a pluggable, trait-based scorer that rates postings against a candidate.
//!
//! Default: `KeywordMatchScorer` (pure Rust, deterministic).
//! `SemanticMatchScorer` asks Claude and falls back to keyword scores.
//!
//! The aggregator holds an `Arc<dyn MatchScorer>`, chosen at startup via config.

pub mod keyword;
pub mod prompts;
pub mod semantic;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::llm_client::{self, LlmClient};
use crate::models::{CandidateProfile, Posting};

pub use keyword::KeywordMatchScorer;
pub use semantic::SemanticMatchScorer;

/// Implement this to swap scoring backends without touching the pipeline.
///
/// Returns exactly one score per posting, in the same order, and never fails.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(&self, postings: &[Posting], profile: &CandidateProfile) -> Vec<u32>;

    /// Short backend label for logs.
    fn backend(&self) -> &'static str;
}

/// Picks the scorer: semantic when an Anthropic key is present and LLM
/// scoring is enabled, keyword otherwise.
pub fn build_scorer(config: &Config) -> anyhow::Result<Arc<dyn MatchScorer>> {
    match (&config.anthropic_api_key, config.enable_llm_fit_scoring) {
        (Some(key), true) => {
            let client = LlmClient::new(key.clone(), config.llm_timeout())?;
            info!("Semantic match scoring enabled (model: {})", llm_client::MODEL);
            Ok(Arc::new(SemanticMatchScorer::new(Arc::new(client))))
        }
        (Some(_), false) => {
            info!("ENABLE_LLM_FIT_SCORING is off; using keyword match scoring");
            Ok(Arc::new(KeywordMatchScorer))
        }
        (None, _) => {
            info!("ANTHROPIC_API_KEY not set; using keyword match scoring");
            Ok(Arc::new(KeywordMatchScorer))
        }
    }
}
