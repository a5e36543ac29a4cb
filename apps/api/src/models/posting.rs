use serde::{Deserialize, Serialize};

/// Maximum characters kept from a provider's job description.
pub const DESCRIPTION_MAX_CHARS: usize = 400;
/// Maximum number of requirement strings kept per posting.
pub const REQUIREMENTS_MAX: usize = 5;
/// Maximum characters kept per requirement string.
pub const REQUIREMENT_MAX_CHARS: usize = 200;

/// Pay information as exposed by the provider.
///
/// Structured pay becomes a numeric range; anything else is passed through as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Salary {
    Range { min: f64, max: f64 },
    Text(String),
}

/// One normalized job listing. Every source adapter emits this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    /// Provider-scoped id, e.g. `jsearch-abc123`. Not unique across providers.
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<Salary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    pub description: String,
    pub requirements: Vec<String>,
    pub posted_days_ago: u32,
    pub apply_url: String,
    pub source: String,
    /// Set once by the scorer; absent before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u32>,
}

/// Provider fields after extraction but before validation and truncation.
///
/// Adapters fill this in and hand it to [`crate::sources::normalize::finalize`],
/// which enforces the `Posting` invariants in one place.
#[derive(Debug, Clone, Default)]
pub struct RawPosting {
    pub id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<Salary>,
    pub employment_type: Option<String>,
    pub description: Option<String>,
    pub requirements: Vec<String>,
    pub posted_days_ago: u32,
    pub apply_url: Option<String>,
    pub fallback_url: String,
    pub source: String,
}
