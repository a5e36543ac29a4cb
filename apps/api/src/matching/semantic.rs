//! Semantic match scoring via Claude, with keyword scores as the fallback.
//!
//! One completion call scores the first [`BATCH_LIMIT`] postings. The model's
//! reply is untrusted free text: the first bracketed integer list is pulled
//! out and every value is clamped into [`MIN_SCORE`, `MAX_SCORE`]. Anything
//! that cannot be used degrades to keyword scores; this scorer never fails.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::{CompletionBackend, LlmError};
use crate::matching::keyword::keyword_score;
use crate::matching::prompts::{MATCH_SCORE_PROMPT_TEMPLATE, MATCH_SCORE_SYSTEM};
use crate::matching::MatchScorer;
use crate::models::posting::REQUIREMENTS_MAX;
use crate::models::{CandidateProfile, Posting, Salary};
use crate::sources::normalize::truncate_chars;

/// Postings sent to the model in one call; the rest get keyword scores.
pub const BATCH_LIMIT: usize = 30;
pub const MIN_SCORE: u32 = 70;
pub const MAX_SCORE: u32 = 95;
const PROMPT_DESCRIPTION_CHARS: usize = 200;

static SCORE_ARRAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\s*\d+(?:\s*,\s*\d+)*\s*\]").expect("score array pattern is valid")
});

/// Why a semantic batch fell back to keyword scores. Never escapes the scorer.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("completion backend failed: {0}")]
    Backend(#[from] LlmError),

    #[error("failed to build scoring prompt: {0}")]
    Prompt(#[from] serde_json::Error),

    #[error("no score array in model output")]
    NoScoreArray,

    #[error("unparsable score '{0}'")]
    BadScore(String),
}

pub struct SemanticMatchScorer {
    backend: Arc<dyn CompletionBackend>,
}

impl SemanticMatchScorer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    async fn score_batch(
        &self,
        batch: &[Posting],
        profile: &CandidateProfile,
    ) -> Result<Vec<u32>, ScoringError> {
        let prompt = build_prompt(batch, profile)?;
        let reply = self.backend.complete(&prompt, MATCH_SCORE_SYSTEM).await?;
        parse_scores(&reply)
    }
}

#[async_trait]
impl MatchScorer for SemanticMatchScorer {
    async fn score(&self, postings: &[Posting], profile: &CandidateProfile) -> Vec<u32> {
        if postings.is_empty() {
            return Vec::new();
        }

        let skills = profile.normalized_skills();
        let batch = &postings[..postings.len().min(BATCH_LIMIT)];

        let mut scores = match self.score_batch(batch, profile).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(error = %e, postings = postings.len(), "Semantic scoring degraded; using keyword scores");
                return postings.iter().map(|p| keyword_score(p, &skills)).collect();
            }
        };

        if scores.len() < batch.len() {
            warn!(
                expected = batch.len(),
                received = scores.len(),
                "Model returned too few scores; filling the rest with keyword scores"
            );
        }
        scores.truncate(batch.len());
        debug!(scored = scores.len(), total = postings.len(), "Semantic scores received");

        postings
            .iter()
            .enumerate()
            .map(|(i, p)| scores.get(i).copied().unwrap_or_else(|| keyword_score(p, &skills)))
            .collect()
    }

    fn backend(&self) -> &'static str {
        "semantic"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt building
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSummary<'a> {
    name: &'a str,
    role: Option<&'a str>,
    years_experience: Option<u32>,
    skills: &'a [String],
    location: Option<&'a str>,
    industries: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostingSummary<'a> {
    index: usize,
    title: &'a str,
    company: &'a str,
    location: Option<&'a str>,
    description: String,
    requirements: &'a [String],
    employment_type: Option<&'a str>,
    salary: Option<&'a Salary>,
}

fn build_prompt(batch: &[Posting], profile: &CandidateProfile) -> Result<String, serde_json::Error> {
    let profile_json = serde_json::to_string_pretty(&ProfileSummary {
        name: &profile.name,
        role: profile
            .current_role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .or_else(|| profile.primary_role()),
        years_experience: profile.years_experience,
        skills: &profile.skills,
        location: profile.primary_location(),
        industries: &profile.industries,
    })?;

    let summaries: Vec<PostingSummary<'_>> = batch
        .iter()
        .enumerate()
        .map(|(i, p)| PostingSummary {
            index: i + 1,
            title: &p.title,
            company: &p.company,
            location: p.location.as_deref(),
            description: truncate_chars(&p.description, PROMPT_DESCRIPTION_CHARS),
            requirements: &p.requirements[..p.requirements.len().min(REQUIREMENTS_MAX)],
            employment_type: p.employment_type.as_deref(),
            salary: p.salary.as_ref(),
        })
        .collect();
    let jobs_json = serde_json::to_string_pretty(&summaries)?;

    Ok(MATCH_SCORE_PROMPT_TEMPLATE
        .replace("{profile}", &profile_json)
        .replace("{jobs}", &jobs_json)
        .replace("{count}", &batch.len().to_string()))
}

/// Extracts the first bracketed integer list from `reply`, clamped to the score range.
fn parse_scores(reply: &str) -> Result<Vec<u32>, ScoringError> {
    let array = SCORE_ARRAY.find(reply).ok_or(ScoringError::NoScoreArray)?;
    array
        .as_str()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|raw| {
            let raw = raw.trim();
            raw.parse::<u32>()
                .map(|score| score.clamp(MIN_SCORE, MAX_SCORE))
                .map_err(|_| ScoringError::BadScore(raw.to_string()))
        })
        .collect()
}
