use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::aggregation::collector::collect;
use crate::aggregation::dedup::dedupe;
use crate::aggregation::ranking::rank;
use crate::errors::AppError;
use crate::matching::MatchScorer;
use crate::models::{AggregationRequest, Posting};
use crate::sources::SourceAdapter;

/// Ranked, deduplicated postings for one request.
#[derive(Debug, Serialize)]
pub struct AggregationResult {
    pub jobs: Vec<Posting>,
    pub count: usize,
}

/// Runs one aggregation per request. Holds no per-request state.
pub struct Aggregator {
    sources: Vec<Arc<dyn SourceAdapter>>,
    scorer: Arc<dyn MatchScorer>,
    source_timeout: Duration,
}

impl Aggregator {
    pub fn new(
        sources: Vec<Arc<dyn SourceAdapter>>,
        scorer: Arc<dyn MatchScorer>,
        source_timeout: Duration,
    ) -> Self {
        Self {
            sources,
            scorer,
            source_timeout,
        }
    }

    /// Collect → dedupe → score → rank.
    ///
    /// Fails only when the request itself is invalid, and then before any
    /// provider is contacted. No results is an empty list, not an error.
    pub async fn aggregate(&self, request: &AggregationRequest) -> Result<AggregationResult, AppError> {
        let criteria = request.criteria()?;
        info!(
            role = %criteria.role,
            location = criteria.location.as_deref().unwrap_or("-"),
            companies = criteria.companies.len(),
            sources = self.sources.len(),
            "Aggregating job postings"
        );

        let collection = collect(&self.sources, &criteria, self.source_timeout).await;
        for outcome in &collection.outcomes {
            debug!(
                source = %outcome.source,
                ok = outcome.succeeded(),
                count = outcome.postings,
                "Source outcome"
            );
        }
        let collected = collection.postings.len();
        let succeeded = collection.succeeded();

        let mut unique = dedupe(collection.postings);
        let scores = self.scorer.score(&unique, &request.profile).await;
        for (posting, score) in unique.iter_mut().zip(scores) {
            posting.match_score = Some(score.min(100));
        }
        let jobs = rank(unique);

        info!(
            collected,
            unique = jobs.len(),
            sources_ok = succeeded,
            sources_total = self.sources.len(),
            scorer = self.scorer.backend(),
            "Aggregation complete"
        );

        Ok(AggregationResult {
            count: jobs.len(),
            jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::test_support::{posting, Behavior, ScriptedSource};
    use crate::llm_client::{CompletionBackend, LlmError};
    use crate::matching::{KeywordMatchScorer, SemanticMatchScorer};
    use crate::models::CandidateProfile;
    use crate::sources::SourceKind;
    use async_trait::async_trait;

    struct DownBackend;

    #[async_trait]
    impl CompletionBackend for DownBackend {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    fn request(roles: &[&str], skills: &[&str]) -> AggregationRequest {
        AggregationRequest {
            profile: CandidateProfile {
                name: "Ada".to_string(),
                target_roles: roles.iter().map(|r| r.to_string()).collect(),
                skills: skills.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            companies: vec![],
        }
    }

    fn with_text(title: &str, company: &str, source: &str, description: &str) -> Posting {
        let mut p = posting(title, company, source);
        p.description = description.to_string();
        p
    }

    #[tokio::test]
    async fn test_invalid_request_contacts_no_source() {
        let source = Arc::new(ScriptedSource::new(
            SourceKind::JSearch,
            Behavior::Return(vec![posting("Engineer", "Acme", "JSearch")]),
        ));
        let sources: Vec<Arc<dyn SourceAdapter>> = vec![source.clone()];
        let aggregator =
            Aggregator::new(sources, Arc::new(KeywordMatchScorer), Duration::from_secs(1));

        let err = aggregator.aggregate(&request(&[], &["rust"])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_dedupes_scores_and_ranks() {
        let sources: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(ScriptedSource::new(
                SourceKind::JSearch,
                Behavior::Return(vec![
                    with_text("Designer", "Acme", "JSearch", "figma"),
                    with_text("Rust Engineer", "Acme", "LinkedIn", "rust and sql"),
                ]),
            )),
            Arc::new(ScriptedSource::new(SourceKind::GoogleJobs, Behavior::Fail)),
            Arc::new(ScriptedSource::new(
                SourceKind::LinkedIn,
                Behavior::Return(vec![
                    with_text("rust engineer", "ACME", "Indeed", "rust and sql"),
                    with_text("Backend Engineer", "Hooli", "LinkedIn", "sql"),
                ]),
            )),
        ];
        let aggregator =
            Aggregator::new(sources, Arc::new(KeywordMatchScorer), Duration::from_secs(1));

        let result = aggregator
            .aggregate(&request(&["Engineer"], &["rust", "sql"]))
            .await
            .unwrap();

        assert_eq!(result.count, 3);
        let ranked: Vec<(&str, &str, Option<u32>)> = result
            .jobs
            .iter()
            .map(|p| (p.title.as_str(), p.source.as_str(), p.match_score))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("Rust Engineer", "LinkedIn", Some(95)),
                // 60 + 1/2 * 35 = 77.5 → 78
                ("Backend Engineer", "LinkedIn", Some(78)),
                ("Designer", "JSearch", Some(60)),
            ]
        );
    }

    #[tokio::test]
    async fn test_semantic_backend_down_still_scores_everything() {
        let postings: Vec<Posting> = (0..10)
            .map(|i| posting(&format!("Engineer {i}"), "Acme", "JSearch"))
            .collect();
        let sources: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(ScriptedSource::new(
            SourceKind::JSearch,
            Behavior::Return(postings),
        ))];
        let scorer = Arc::new(SemanticMatchScorer::new(Arc::new(DownBackend)));
        let aggregator = Aggregator::new(sources, scorer, Duration::from_secs(1));

        let result = aggregator
            .aggregate(&request(&["Engineer"], &["python"]))
            .await
            .unwrap();
        assert_eq!(result.count, 10);
        assert!(result.jobs.iter().all(|p| p.match_score == Some(60)));
    }

    #[tokio::test]
    async fn test_no_results_is_empty_success() {
        let sources: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(ScriptedSource::new(
            SourceKind::JSearch,
            Behavior::Fail,
        ))];
        let aggregator =
            Aggregator::new(sources, Arc::new(KeywordMatchScorer), Duration::from_secs(1));

        let result = aggregator.aggregate(&request(&["Engineer"], &[])).await.unwrap();
        assert_eq!(result.count, 0);
        assert!(result.jobs.is_empty());
    }
}
