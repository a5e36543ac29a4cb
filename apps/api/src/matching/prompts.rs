// Prompt constants for semantic match scoring.

/// System prompt for match scoring. The model answers with a bare score array.
pub const MATCH_SCORE_SYSTEM: &str = "You are an expert career advisor and recruiter. \
    You rate how well job postings fit a candidate. \
    Respond with a JSON array of integers only. \
    Do NOT include any text outside the array. \
    Do NOT use markdown code fences.";

/// Match scoring prompt template. Replace `{profile}`, `{jobs}` and `{count}` before sending.
pub const MATCH_SCORE_PROMPT_TEMPLATE: &str = r#"Score how well each job below matches the candidate.

CANDIDATE:
{profile}

JOBS (in order):
{jobs}

Scoring rules:
- Weigh skills alignment, role fit, seniority and experience level, location, and industry.
- Every score is an integer between 70 and 95 inclusive.
- Return exactly {count} scores, one per job, in the same order as the jobs.

Respond with the array only, for example: [85, 72, 91]"#;
