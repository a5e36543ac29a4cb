//! Keyword match scoring. Pure Rust and deterministic, no network.
//!
//! Algorithm:
//! 1. Normalize the candidate's skills (trim, lowercase, dedupe).
//! 2. A skill matches when it appears as a substring of the lowercased
//!    title, description and requirements of the posting.
//! 3. score = 60 + matched / total × 35, plus 5 when posted under a week ago,
//!    rounded half-to-even and capped at 100.
//!
//! A profile with no usable skills gets a flat [`NO_SKILLS_SCORE`].

use async_trait::async_trait;

use crate::matching::MatchScorer;
use crate::models::{CandidateProfile, Posting};

pub const BASE_SCORE: f64 = 60.0;
pub const SKILL_WEIGHT: f64 = 35.0;
pub const RECENCY_BONUS: f64 = 5.0;
pub const RECENT_DAYS: u32 = 7;
pub const NO_SKILLS_SCORE: u32 = 70;
pub const MAX_SCORE: u32 = 100;

pub struct KeywordMatchScorer;

#[async_trait]
impl MatchScorer for KeywordMatchScorer {
    async fn score(&self, postings: &[Posting], profile: &CandidateProfile) -> Vec<u32> {
        let skills = profile.normalized_skills();
        postings.iter().map(|p| keyword_score(p, &skills)).collect()
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

/// Scores one posting against already-normalized skills.
pub fn keyword_score(posting: &Posting, skills: &[String]) -> u32 {
    if skills.is_empty() {
        return NO_SKILLS_SCORE;
    }

    let haystack = format!(
        "{} {} {}",
        posting.title,
        posting.description,
        posting.requirements.join(" ")
    )
    .to_lowercase();

    let matched = skills.iter().filter(|s| haystack.contains(s.as_str())).count();
    let recency = if posting.posted_days_ago < RECENT_DAYS {
        RECENCY_BONUS
    } else {
        0.0
    };

    let raw = BASE_SCORE + (matched as f64 / skills.len() as f64) * SKILL_WEIGHT + recency;
    (raw.round_ties_even() as u32).min(MAX_SCORE)
}
