//! JSearch (RapidAPI), which aggregates Indeed, LinkedIn, Glassdoor and ZipRecruiter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Posting, RawPosting, SearchCriteria};
use crate::sources::normalize::{self, days_ago, days_since_epoch_seconds, salary_from_bounds};
use crate::sources::{http, SourceAdapter, SourceError, SourceKind};

const JSEARCH_HOST: &str = "jsearch.p.rapidapi.com";
const DEFAULT_BASE_URL: &str = "https://jsearch.p.rapidapi.com";
const RESULT_CAP: usize = 30;
const DEFAULT_LOCATION: &str = "Remote";

pub struct JSearchAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct JSearchResponse {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JSearchJob {
    job_id: Option<String>,
    job_title: Option<String>,
    employer_name: Option<String>,
    employer_website: Option<String>,
    job_apply_link: Option<String>,
    job_google_link: Option<String>,
    job_city: Option<String>,
    job_state: Option<String>,
    job_country: Option<String>,
    job_is_remote: Option<bool>,
    job_min_salary: Option<f64>,
    job_max_salary: Option<f64>,
    job_employment_type: Option<String>,
    job_description: Option<String>,
    job_highlights: Option<Value>,
    job_posted_at_datetime_utc: Option<String>,
    job_posted_at_timestamp: Option<i64>,
}

impl JSearchAdapter {
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
impl SourceAdapter for JSearchAdapter {
    async fn fetch(&self, criteria: &SearchCriteria) -> Result<Vec<Posting>, SourceError> {
        if self.api_key.is_empty() {
            return Err(SourceError::NotConfigured("RAPIDAPI_KEY"));
        }

        let location = criteria.location.as_deref().unwrap_or(DEFAULT_LOCATION);
        let query = format!("{} {}", criteria.role, location);

        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("query", query.as_str()), ("page", "1"), ("num_pages", "2")])
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", JSEARCH_HOST);

        let response: JSearchResponse = http::send_json(request).await?;
        debug!(count = response.data.len(), "JSearch response received");

        let jobs = normalize::lenient_items(response.data, SourceKind::JSearch);
        Ok(map_jobs(jobs, &criteria.role, Utc::now()))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::JSearch
    }
}

fn map_jobs(jobs: Vec<JSearchJob>, role: &str, now: DateTime<Utc>) -> Vec<Posting> {
    let fallback_url = format!(
        "https://www.google.com/search?q={}&ibp=htl;jobs",
        normalize::encode_query(&format!("{role} jobs"))
    );

    jobs.into_iter()
        .take(RESULT_CAP)
        .filter_map(|job| normalize::finalize(to_raw(job, &fallback_url, now)))
        .collect()
}

fn to_raw(job: JSearchJob, fallback_url: &str, now: DateTime<Utc>) -> RawPosting {
    let apply_link = job
        .job_apply_link
        .clone()
        .or_else(|| job.job_google_link.clone());

    let source = match normalize::infer_board(&[apply_link.as_deref().unwrap_or_default()]) {
        Some(board) => board.to_string(),
        None => match (&job.employer_website, &job.employer_name) {
            (Some(_), Some(employer)) if !employer.trim().is_empty() => {
                format!("{} Careers", employer.trim())
            }
            _ => SourceKind::JSearch.name().to_string(),
        },
    };

    let location = match (&job.job_city, &job.job_state) {
        (Some(city), Some(state)) => Some(format!("{city}, {state}")),
        _ if job.job_is_remote == Some(true) => Some("Remote".to_string()),
        _ => job.job_country.clone(),
    };

    let posted_days_ago = match job.job_posted_at_datetime_utc.as_deref() {
        Some(posted) => days_ago(Some(posted), now),
        None => job
            .job_posted_at_timestamp
            .map(|secs| days_since_epoch_seconds(secs, now))
            .unwrap_or(0),
    };

    RawPosting {
        id: format!(
            "{}-{}",
            SourceKind::JSearch.id_prefix(),
            job.job_id.unwrap_or_else(|| Uuid::new_v4().to_string())
        ),
        title: job.job_title,
        company: job.employer_name,
        location,
        salary: salary_from_bounds(job.job_min_salary, job.job_max_salary),
        employment_type: job.job_employment_type,
        description: job.job_description,
        requirements: qualifications(job.job_highlights.as_ref()),
        posted_days_ago,
        apply_url: apply_link,
        fallback_url: fallback_url.to_string(),
        source,
    }
}

/// `job_highlights.Qualifications` as strings; tolerant of missing or odd shapes.
fn qualifications(highlights: Option<&Value>) -> Vec<String> {
    highlights
        .and_then(|h| h.get("Qualifications"))
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
