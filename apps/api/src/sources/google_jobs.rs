//! Google Jobs through SerpAPI, which indexes Indeed, LinkedIn, Glassdoor and others.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Posting, RawPosting, SearchCriteria};
use crate::sources::normalize::{self, days_ago, salary_from_text};
use crate::sources::{http, SourceAdapter, SourceError, SourceKind};

const DEFAULT_BASE_URL: &str = "https://serpapi.com";
const RESULT_CAP: usize = 20;
const DEFAULT_LOCATION: &str = "United States";

pub struct GoogleJobsAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    jobs_results: Vec<Value>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleJob {
    job_id: Option<String>,
    title: Option<String>,
    company_name: Option<String>,
    location: Option<String>,
    via: Option<String>,
    description: Option<String>,
    job_highlights: Option<Value>,
    detected_extensions: Option<DetectedExtensions>,
    apply_options: Option<Vec<ApplyOption>>,
    share_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetectedExtensions {
    posted_at: Option<String>,
    schedule_type: Option<String>,
    work_from_home: Option<bool>,
    salary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApplyOption {
    link: Option<String>,
}

impl GoogleJobsAdapter {
    pub fn new(client: reqwest::Client, api_key: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceAdapter for GoogleJobsAdapter {
    async fn fetch(&self, criteria: &SearchCriteria) -> Result<Vec<Posting>, SourceError> {
        if self.api_key.is_empty() {
            return Err(SourceError::NotConfigured("SERPAPI_KEY"));
        }

        let location = criteria.location.as_deref().unwrap_or(DEFAULT_LOCATION);
        let request = self
            .client
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("engine", "google_jobs"),
                ("q", criteria.role.as_str()),
                ("location", location),
                ("api_key", self.api_key.as_str()),
            ]);

        let response: SerpApiResponse = http::send_json(request).await?;
        if let Some(error) = response.error {
            // SerpAPI reports "no results" through the error field too.
            if response.jobs_results.is_empty() && !error.contains("hasn't returned any results") {
                return Err(SourceError::Payload(error));
            }
        }
        debug!(count = response.jobs_results.len(), "SerpAPI response received");

        let jobs = normalize::lenient_items(response.jobs_results, SourceKind::GoogleJobs);
        Ok(map_jobs(jobs, &criteria.role, Utc::now()))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::GoogleJobs
    }
}

fn map_jobs(jobs: Vec<GoogleJob>, role: &str, now: DateTime<Utc>) -> Vec<Posting> {
    let fallback_url = format!(
        "https://www.google.com/search?q={}&ibp=htl;jobs",
        normalize::encode_query(&format!("{role} jobs"))
    );

    jobs.into_iter()
        .take(RESULT_CAP)
        .filter_map(|job| normalize::finalize(to_raw(job, &fallback_url, now)))
        .collect()
}

fn to_raw(job: GoogleJob, fallback_url: &str, now: DateTime<Utc>) -> RawPosting {
    let apply_link = job
        .apply_options
        .iter()
        .flatten()
        .find_map(|option| option.link.clone())
        .or_else(|| job.share_link.clone());

    let source = normalize::infer_board(&[
        job.via.as_deref().unwrap_or_default(),
        apply_link.as_deref().unwrap_or_default(),
    ])
    .unwrap_or(SourceKind::GoogleJobs.name())
    .to_string();

    let extensions = job.detected_extensions.unwrap_or_default();
    let employment_type = if extensions.work_from_home == Some(true) {
        Some("Remote".to_string())
    } else {
        extensions.schedule_type.clone()
    };

    RawPosting {
        id: format!(
            "{}-{}",
            SourceKind::GoogleJobs.id_prefix(),
            job.job_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string())
        ),
        salary: salary_from_text(extensions.salary.as_deref()),
        posted_days_ago: days_ago(extensions.posted_at.as_deref(), now),
        employment_type,
        requirements: qualifications(job.job_highlights.as_ref()),
        title: job.title,
        company: job.company_name,
        location: job.location,
        description: job.description,
        apply_url: apply_link,
        fallback_url: fallback_url.to_string(),
        source,
    }
}

/// Qualifications from `job_highlights`, which SerpAPI sends as a list of
/// `{title, items}` sections; a flat `{"Qualifications": [...]}` map is also accepted.
fn qualifications(highlights: Option<&Value>) -> Vec<String> {
    let items = match highlights {
        Some(Value::Array(sections)) => sections
            .iter()
            .find(|s| s.get("title").and_then(Value::as_str) == Some("Qualifications"))
            .and_then(|s| s.get("items")),
        Some(map @ Value::Object(_)) => map.get("Qualifications"),
        _ => None,
    };

    items
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
